//! Estado do celular via KDE Connect (`kdeconnect-cli -l`).

use super::{Provider, Reading, run_command};

/// Classificação da conexão com o celular.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneLink {
    Reachable,
    Paired,
    Absent,
}

impl PhoneLink {
    pub fn display(self) -> &'static str {
        match self {
            PhoneLink::Reachable => "Phone: connected",
            PhoneLink::Paired => "Phone: paired",
            PhoneLink::Absent => "",
        }
    }
}

pub struct PhoneProvider {
    device: String,
}

impl PhoneProvider {
    pub fn new(device: String) -> Self {
        Self { device }
    }
}

impl Provider for PhoneProvider {
    fn poll(&mut self) -> Reading {
        let result = run_command("kdeconnect-cli", &["-l"])
            .map(|out| classify(&out, &self.device).display().to_string());
        Reading::from_result(result, "Phone: ?")
    }
}

/// Linhas no formato `- Pixel 7: 1a2b3c (paired and reachable)`.
///
/// Com `device` vazio vale o melhor estado entre todos os dispositivos.
pub fn classify(listing: &str, device: &str) -> PhoneLink {
    listing
        .lines()
        .filter_map(|line| line.trim().strip_prefix("- "))
        .filter(|entry| {
            device.is_empty()
                || entry
                    .split_once(':')
                    .is_some_and(|(name, _)| name.trim() == device)
        })
        .map(|entry| {
            if entry.contains("reachable") && !entry.contains("unreachable") {
                PhoneLink::Reachable
            } else if entry.contains("paired") && !entry.contains("unpaired") {
                PhoneLink::Paired
            } else {
                PhoneLink::Absent
            }
        })
        .min_by_key(|link| match link {
            PhoneLink::Reachable => 0,
            PhoneLink::Paired => 1,
            PhoneLink::Absent => 2,
        })
        .unwrap_or(PhoneLink::Absent)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
- Pixel 7: 1a2b3c (paired and reachable)
- Tablet: 4d5e6f (paired)
- Laptop: 778899 (unpaired)
3 devices found
";

    #[test]
    fn any_device_picks_best_state() {
        assert_eq!(classify(LISTING, ""), PhoneLink::Reachable);
    }

    #[test]
    fn named_device_is_filtered() {
        assert_eq!(classify(LISTING, "Tablet"), PhoneLink::Paired);
        assert_eq!(classify(LISTING, "Laptop"), PhoneLink::Absent);
        assert_eq!(classify(LISTING, "Watch"), PhoneLink::Absent);
    }

    #[test]
    fn empty_listing_is_absent() {
        assert_eq!(classify("0 devices found\n", ""), PhoneLink::Absent);
        assert_eq!(PhoneLink::Absent.display(), "");
    }
}

//! Atualizações pendentes do pacman via `checkupdates` (pacman-contrib).

use super::{Provider, ProviderError, Reading, run_command};

/// `checkupdates` sai com 2 quando não há atualizações.
const NO_UPDATES_STATUS: i32 = 2;

#[derive(Debug, Default)]
pub struct PacmanProvider;

impl Provider for PacmanProvider {
    fn poll(&mut self) -> Reading {
        let result = match run_command("checkupdates", &[]) {
            Ok(out) => Ok(format_updates(&out)),
            Err(ProviderError::Exit { status, .. }) if status == NO_UPDATES_STATUS => Ok(String::new()),
            Err(e) => Err(e),
        };
        Reading::from_result(result, "Updates: ?")
    }
}

/// Uma linha por pacote; zero pacotes omite a chave.
fn format_updates(output: &str) -> String {
    let count = output.lines().filter(|l| !l.trim().is_empty()).count();
    if count == 0 {
        String::new()
    } else {
        format!("Updates: {count}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_packages() {
        let out = "linux 6.8.1-1 -> 6.8.2-1\nmesa 24.0.3-1 -> 24.0.4-1\n\n";
        assert_eq!(format_updates(out), "Updates: 2");
    }

    #[test]
    fn no_packages_is_omitted() {
        assert_eq!(format_updates(""), "");
    }
}

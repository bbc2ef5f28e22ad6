//! Previsão do tempo raspada da página do weather.com.
//!
//! A busca é refeita até `attempts` vezes com `delay` entre tentativas;
//! esgotadas as tentativas o texto de fallback vai para a barra. A espera
//! entre tentativas é interrompida pelo shutdown.

use super::{Provider, ProviderError, Reading};
use crate::shutdown::ShutdownSignal;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// Texto exibido quando todas as tentativas falham.
pub const WEATHER_FALLBACK: &str = "Unable to retrieve weather data";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// ──────────────────────────────────────────────
// Retry
// ──────────────────────────────────────────────

/// Número fixo de tentativas com espera fixa entre elas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Executa `op` até ter sucesso ou esgotar as tentativas.
    ///
    /// `sleep` é chamado uma vez entre cada par de tentativas, nunca depois
    /// da última, e retorna `true` para cancelar as tentativas restantes.
    /// `op` recebe o número da tentativa (1-based).
    pub fn run<T, E, Op, Sleep>(&self, mut op: Op, mut sleep: Sleep) -> Result<T, E>
    where
        Op: FnMut(u32) -> Result<T, E>,
        Sleep: FnMut(Duration) -> bool,
        E: std::fmt::Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    debug!("Tentativa {attempt}/{attempts} falhou: {e}");
                    if sleep(self.delay) {
                        debug!("Retry cancelado após {attempt}/{attempts} tentativas");
                        return Err(e);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ──────────────────────────────────────────────
// Fetch
// ──────────────────────────────────────────────

/// Busca o HTML de uma URL.
pub trait Fetch: Send {
    fn fetch(&mut self, url: &str) -> Result<String, ProviderError>;
}

/// [`Fetch`] via `reqwest` bloqueante. O client é criado na primeira busca.
#[derive(Default)]
pub struct HttpFetcher {
    client: Option<reqwest::blocking::Client>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<String, ProviderError> {
        let client = match self.client.take() {
            Some(client) => client,
            None => reqwest::blocking::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .map_err(|e| ProviderError::Http(e.to_string()))?,
        };
        let result = client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| ProviderError::Http(e.to_string()));
        self.client = Some(client);
        result
    }
}

// ──────────────────────────────────────────────
// Provider
// ──────────────────────────────────────────────

pub struct WeatherProvider<F: Fetch> {
    fetcher: F,
    url: String,
    policy: RetryPolicy,
    sleeper: Box<dyn FnMut(Duration) -> bool + Send>,
}

impl<F: Fetch> WeatherProvider<F> {
    /// A espera entre tentativas termina cedo quando `shutdown` dispara.
    pub fn new(fetcher: F, url: String, policy: RetryPolicy, shutdown: ShutdownSignal) -> Self {
        Self {
            fetcher,
            url,
            policy,
            sleeper: Box::new(move |delay| shutdown.wait(delay)),
        }
    }

    /// Troca a espera entre tentativas; `true` cancela o retry (testes).
    pub fn with_sleeper(mut self, sleeper: impl FnMut(Duration) -> bool + Send + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }
}

impl<F: Fetch> Provider for WeatherProvider<F> {
    fn poll(&mut self) -> Reading {
        let Self {
            fetcher,
            url,
            policy,
            sleeper,
        } = self;
        let result = policy.run(
            |_| fetcher.fetch(url).and_then(|html| parse_report(&html)),
            |delay| sleeper(delay),
        );
        Reading::from_result(result, WEATHER_FALLBACK)
    }
}

// ──────────────────────────────────────────────
// Parsing
// ──────────────────────────────────────────────

static CURRENT_TEMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="[^"]*\btoday_nowcard-temp\b[^"]*"[^>]*>\s*<span[^>]*>(.*?)</span>"#)
        .expect("regex válida")
});
static PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="[^"]*\btoday_nowcard-phrase\b[^"]*"[^>]*>(.*?)</"#).expect("regex válida")
});
static WARNING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<span[^>]*class="[^"]*\bwarning-text\b[^"]*"[^>]*>(.*?)</span>"#)
        .expect("regex válida")
});
static HILO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class="[^"]*\bdeg-hilo-nowcard\b[^"]*"[^>]*>.*?<span[^>]*>(.*?)</span>"#)
        .expect("regex válida")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("regex válida"));

fn text_of(fragment: &str) -> String {
    TAG.replace_all(fragment, "").trim().to_string()
}

fn capture(re: &Regex, html: &str, what: &str) -> Result<String, ProviderError> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| text_of(m.as_str()))
        .ok_or_else(|| ProviderError::Parse(format!("{what} não encontrado")))
}

/// Monta `Desc 72° (60°▼, 80°▲)` a partir do HTML da página.
pub fn parse_report(html: &str) -> Result<String, ProviderError> {
    let current = capture(&CURRENT_TEMP, html, "temperatura atual")?;
    let mut desc = capture(&PHRASE, html, "descrição")?;
    if let Ok(warning) = capture(&WARNING, html, "alerta") {
        desc.push_str(&format!(" ({})", warning.to_uppercase()));
    }

    let mut hilo: Vec<String> = HILO
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| text_of(m.as_str())))
        .collect();
    if hilo.len() != 2 {
        return Err(ProviderError::Parse(format!(
            "esperava 2 temperaturas máx/mín, achei {}",
            hilo.len()
        )));
    }
    hilo.sort();
    let (low, high) = (&hilo[0], &hilo[1]);

    if low == "--" {
        Ok(format!("{desc} {current} ({high}▼)"))
    } else {
        Ok(format!("{desc} {current} ({low}▼, {high}▲)"))
    }
}

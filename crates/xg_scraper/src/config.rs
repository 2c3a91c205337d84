use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Nastavení renderu. Čte se jednou (typicky v `main`) a předává se
/// rendereru při konstrukci.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub headless: bool,
    /// Krokový trace renderu na úrovni info
    pub debug: bool,
    pub chrome_path: Option<PathBuf>,
    /// Celkový limit na navigate → settle → marker → settle → capture
    pub timeout: Duration,
    /// Pauza před i po čekání na marker
    pub settle: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            debug: false,
            chrome_path: None,
            timeout: Duration::from_secs(60),
            settle: Duration::from_secs(5),
        }
    }
}

impl ScraperConfig {
    /// SCRAPER_HEADLESS, SCRAPER_DEBUG, CHROME_PATH, SCRAPER_TIMEOUT_SECS,
    /// SCRAPER_SETTLE_SECS
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            // jen doslovné "false" vypíná headless, jen "true" zapíná debug
            headless: lookup("SCRAPER_HEADLESS").as_deref() != Some("false"),
            debug: lookup("SCRAPER_DEBUG").as_deref() == Some("true"),
            chrome_path: lookup("CHROME_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            timeout: secs("SCRAPER_TIMEOUT_SECS", defaults.timeout),
            settle: secs("SCRAPER_SETTLE_SECS", defaults.settle),
        }
    }
}

//! Headless Chrome renderer.
//!
//! Pořadí kroků je navigate → settle → marker visible → settle → capture.
//! Viditelný nadpis ještě neznamená, že SVG data pod ním jsou dotažená,
//! proto settle i po čekání na marker.

use crate::config::ScraperConfig;
use crate::error::RenderError;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Nadpis shot map sekce; dokud není vidět, stránka nemá co nabídnout
pub const SHOT_MAP_MARKER_XPATH: &str =
    "//h3[contains(@class, 'text-card-title') and contains(text(), 'xG Shot Map')]";

const HIDE_WEBDRIVER_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });
"#;

const MARKER_POLL: Duration = Duration::from_millis(250);

/// Vyrenderuje stránku a vrátí kompletní markup.
///
/// Blokující; async volající to má pouštět přes `spawn_blocking`.
pub trait PageRenderer: Send + Sync {
    fn render(&self, url: &str) -> Result<String, RenderError>;
}

pub struct ChromeRenderer {
    config: ScraperConfig,
}

impl ChromeRenderer {
    pub fn new(config: ScraperConfig) -> Self {
        if !config.headless {
            info!("🔍 Scraper running in VISIBLE mode - browser will be shown");
        }
        if config.debug {
            info!("🐛 Scraper debug mode enabled");
        }
        Self { config }
    }

    fn step(&self, msg: &str) {
        if self.config.debug {
            info!("{msg}");
        } else {
            debug!("{msg}");
        }
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, RenderError> {
        // Bez tohohle stránka automatizaci pozná a shot map nevyrenderuje
        let stealth_args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-setuid-sandbox"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--no-first-run"),
            OsStr::new("--no-default-browser-check"),
        ];

        LaunchOptions::default_builder()
            .headless(self.config.headless)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .path(self.config.chrome_path.clone())
            .args(stealth_args)
            .ignore_default_args(vec![OsStr::new("--enable-automation")])
            .idle_browser_timeout(self.config.timeout + Duration::from_secs(30))
            .build()
            .map_err(|e| RenderError::Launch(format!("invalid launch options: {e}")))
    }

    /// Pauza omezená zbytkem rozpočtu; vyčerpaný rozpočet = timeout
    fn settle(&self, url: &str, deadline: Instant) -> Result<(), RenderError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(RenderError::Timeout { url: url.to_string(), limit: self.config.timeout });
        }
        std::thread::sleep(self.config.settle.min(remaining));
        Ok(())
    }

    fn wait_marker_visible(&self, tab: &Tab, url: &str, deadline: Instant) -> Result<(), RenderError> {
        let started = Instant::now();
        let probe = format!(
            "(() => {{ const el = document.evaluate({xpath:?}, document, null, \
             XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue; \
             return !!el && el.getClientRects().length > 0; }})()",
            xpath = SHOT_MAP_MARKER_XPATH,
        );

        loop {
            match tab.evaluate(&probe, false) {
                Ok(obj) if obj.value == Some(serde_json::Value::Bool(true)) => return Ok(()),
                Ok(_) => {}
                // během dotahování SPA může evaluate selhat, zkusíme znovu
                Err(e) => debug!("marker probe failed on {}: {}", url, e),
            }

            if Instant::now() >= deadline {
                return Err(RenderError::MarkerNotVisible {
                    url: url.to_string(),
                    waited: started.elapsed(),
                });
            }
            std::thread::sleep(MARKER_POLL);
        }
    }
}

impl PageRenderer for ChromeRenderer {
    fn render(&self, url: &str) -> Result<String, RenderError> {
        let deadline = Instant::now() + self.config.timeout;
        self.step(&format!("🌐 Starting xG stat render for: {url}"));

        if let Some(path) = &self.config.chrome_path {
            self.step(&format!("🔧 Using Chrome at: {}", path.display()));
        }

        // Browser drží Chrome proces; drop na jakékoliv cestě ho ukončí
        let browser = Browser::new(self.launch_options()?)
            .map_err(|e| RenderError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| RenderError::Launch(format!("failed to create tab: {e}")))?;

        tab.set_default_timeout(self.config.timeout);
        tab.set_user_agent(USER_AGENT, Some("en-US,en;q=0.9"), None)
            .map_err(|e| RenderError::Launch(format!("failed to set user agent: {e}")))?;
        tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
            source: HIDE_WEBDRIVER_JS.to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        })
        .map_err(|e| RenderError::Launch(format!("failed to install stealth script: {e}")))?;

        let nav_err = |e: anyhow::Error| RenderError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        self.step("➡️  navigate");
        tab.navigate_to(url).map_err(nav_err)?;
        tab.wait_until_navigated().map_err(nav_err)?;

        self.step("⏳ settle before marker");
        self.settle(url, deadline)?;

        self.step("👀 waiting for shot map marker");
        self.wait_marker_visible(&tab, url, deadline)?;

        self.step("⏳ settle after marker");
        self.settle(url, deadline)?;

        let html = tab.get_content().map_err(|e| RenderError::Navigation {
            url: url.to_string(),
            reason: format!("failed to read HTML from tab: {e}"),
        })?;

        if html.trim().is_empty() {
            return Err(RenderError::EmptyMarkup { url: url.to_string() });
        }

        self.step(&format!("📄 captured {} bytes", html.len()));
        Ok(html)
    }
}

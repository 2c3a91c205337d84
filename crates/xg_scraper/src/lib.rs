//! xgstat.com scraper - xG shot mapy z klientsky renderované stránky
//!
//! Pipeline:
//!   URL → renderer (headless Chrome, markup jako text)
//!       → field pravidla (týmy, skóre, xG, GW, datum) + ID z URL
//!       → sekce shot mapy pro každý tým → střely
//!       → `Fixture`
//!
//! Jediná fatální chyba je render (`RenderError`). Parsování je lenientní:
//! co nejde najít, zůstane na nule.

mod assemble;
mod config;
mod error;
mod fields;
mod model;
mod render;
mod section;
mod shots;

pub use assemble::assemble;
pub use config::ScraperConfig;
pub use error::RenderError;
pub use fields::{extract_id_from_url, FieldExtractor, FixtureFields};
pub use model::{Fixture, MatchDate, Shot, ShotType};
pub use render::{ChromeRenderer, PageRenderer, SHOT_MAP_MARKER_XPATH, USER_AGENT};
pub use section::locate_section;
pub use shots::{PlayerLine, PlayerTable, ShotExtractor, TeamShots};

use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, info, warn};

/// Scraper nad libovolným rendererem. Nedrží žádný stav mezi voláními
/// (žádná cache, žádná session), souběžná volání jsou nezávislá.
pub struct XgScraper<R> {
    renderer: Arc<R>,
    fields: FieldExtractor,
    shots: ShotExtractor,
    /// rozpočet rendereru (jeho vlastní deadline)
    timeout: Duration,
}

/// Vnější limit, vždy delší než deadline rendereru: chyby rendereru
/// (marker, navigace) mají přednost před `Timeout`.
fn outer_limit(timeout: Duration) -> Duration {
    timeout + timeout / 2
}

impl XgScraper<ChromeRenderer> {
    pub fn chrome(config: ScraperConfig) -> anyhow::Result<Self> {
        let timeout = config.timeout;
        Self::new(ChromeRenderer::new(config), timeout)
    }
}

impl<R: PageRenderer + 'static> XgScraper<R> {
    pub fn new(renderer: R, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            renderer: Arc::new(renderer),
            fields: FieldExtractor::new()?,
            shots: ShotExtractor::new()?,
            timeout,
        })
    }

    /// Render + parse. Žádné retry, to je věc volajícího.
    pub async fn scrape(&self, url: &str) -> Result<Fixture, RenderError> {
        let markup = self.render(url).await.inspect_err(|e| {
            warn!("❌ Failed to scrape {}: {}", url, e);
        })?;

        let fixture = self.parse(&markup, url);
        info!(
            "✅ Successfully scraped xG stats: {} vs {} ({} shots)",
            fixture.home_team,
            fixture.away_team,
            fixture.total_shots()
        );
        Ok(fixture)
    }

    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let renderer = Arc::clone(&self.renderer);
        let owned_url = url.to_string();
        let job = task::spawn_blocking(move || renderer.render(&owned_url));

        // Po timeoutu worker doběhne sám (renderer má vlastní deadline)
        // a drop Browseru ukončí Chrome.
        match tokio::time::timeout(outer_limit(self.timeout), job).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(RenderError::Worker(join_err.to_string())),
            Err(_) => Err(RenderError::Timeout { url: url.to_string(), limit: self.timeout }),
        }
    }

    /// Čistá část pipeline nad už vyrenderovaným markupem
    pub fn parse(&self, markup: &str, url: &str) -> Fixture {
        let fields = self.fields.extract(markup);
        let id = extract_id_from_url(url);

        let home = self.shots.extract(locate_section(markup, &fields.home_team));
        let away = self.shots.extract(locate_section(markup, &fields.away_team));
        debug!(
            "🔍 Found {} home / {} away shots, {} / {} player rows",
            home.shots.len(),
            away.shots.len(),
            home.players.len(),
            away.players.len()
        );

        assemble(fields, id, home, away)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ARSENAL_CHELSEA: &str = concat!(
        r#"<html><body><header>"#,
        r#"<span class="text-muted">GW23</span>"#,
        r#"<a href="/teams/arsenal"><span class="hidden lg:inline">Arsenal</span><span class="lg:hidden">ARS</span></a>"#,
        r#"<span class="font-bold"> 2 - 1 </span>"#,
        r#"<a href="/teams/chelsea"><span class="hidden lg:inline">Chelsea</span><span class="lg:hidden">CHE</span></a>"#,
        r#"</header>"#,
        r#"<div><span class="tabular-nums">1.25</span><span class="px-1">-</span><span class="tabular-nums">0.87</span></div>"#,
        r#"<div class="card"><h3 class="text-card-title">Arsenal xG Shot Map</h3>"#,
        r#"<div class="relative"><div><svg viewBox="0 0 100 70">"#,
        r#"<circle r="1.5" cx="50.2" cy="30.1" fill="var(--foreground)" fill-opacity="0.3"></circle>"#,
        r#"</svg></div></div></div>"#,
        r#"</body></html>"#,
    );

    struct StubRenderer {
        result: Result<String, fn(&str) -> RenderError>,
        calls: AtomicUsize,
    }

    impl StubRenderer {
        fn markup(markup: &str) -> Self {
            Self { result: Ok(markup.to_string()), calls: AtomicUsize::new(0) }
        }

        fn failing(make: fn(&str) -> RenderError) -> Self {
            Self { result: Err(make), calls: AtomicUsize::new(0) }
        }
    }

    impl PageRenderer for StubRenderer {
        fn render(&self, url: &str) -> Result<String, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(m) => Ok(m.clone()),
                Err(make) => Err(make(url)),
            }
        }
    }

    struct SlowRenderer;

    /// Stránka se načte, ale nadpis shot mapy se nikdy neukáže:
    /// polluje do vlastního deadline a pak vzdá
    struct HiddenMarkerRenderer {
        budget: Duration,
    }

    impl PageRenderer for HiddenMarkerRenderer {
        fn render(&self, url: &str) -> Result<String, RenderError> {
            let started = std::time::Instant::now();
            let deadline = started + self.budget;
            while std::time::Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(RenderError::MarkerNotVisible { url: url.to_string(), waited: started.elapsed() })
        }
    }

    impl PageRenderer for SlowRenderer {
        fn render(&self, _url: &str) -> Result<String, RenderError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok("<html></html>".to_string())
        }
    }

    fn scraper(renderer: StubRenderer) -> XgScraper<StubRenderer> {
        XgScraper::new(renderer, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn end_to_end_single_off_target_shot() {
        let s = scraper(StubRenderer::markup(ARSENAL_CHELSEA));
        let f = s.scrape("https://xgstat.com/matches/2024/4821").await.unwrap();

        assert_eq!(f.id, 4821);
        assert_eq!(f.home_team, "Arsenal");
        assert_eq!(f.away_team, "Chelsea");
        assert_eq!((f.home_score, f.away_score), (2, 1));
        assert_eq!((f.home_xg, f.away_xg), (1.25, 0.87));
        assert_eq!(f.gameweek, 23);
        assert_eq!(f.date, None);
        assert_eq!(f.home_shots, vec![Shot::at(50.2, 30.1, ShotType::OffTarget)]);
        assert!(f.away_shots.is_empty());
    }

    #[tokio::test]
    async fn render_failure_aborts() {
        let s = scraper(StubRenderer::failing(|url| RenderError::Navigation {
            url: url.to_string(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        }));
        let err = s.scrape("https://nope.invalid/1").await.unwrap_err();
        assert_eq!(err.kind(), "navigation");
        assert!(err.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
    }

    #[tokio::test]
    async fn overall_timeout_is_enforced() {
        let s = XgScraper::new(SlowRenderer, Duration::from_millis(50)).unwrap();
        let err = s.scrape("https://xgstat.com/matches/1").await.unwrap_err();
        assert!(matches!(err, RenderError::Timeout { .. }));
    }

    #[tokio::test]
    async fn hidden_marker_is_reported_as_such() {
        let budget = Duration::from_millis(400);
        let s = XgScraper::new(HiddenMarkerRenderer { budget }, budget).unwrap();
        let err = s.scrape("https://xgstat.com/matches/12").await.unwrap_err();
        assert_eq!(err.kind(), "marker_not_visible");
    }

    #[test]
    fn outer_limit_exceeds_renderer_budget() {
        assert_eq!(outer_limit(Duration::from_secs(60)), Duration::from_secs(90));
        assert!(outer_limit(Duration::from_millis(400)) > Duration::from_millis(400));
    }

    #[tokio::test]
    async fn each_scrape_renders_fresh() {
        let s = scraper(StubRenderer::markup(ARSENAL_CHELSEA));
        let a = s.scrape("https://xgstat.com/matches/1").await.unwrap();
        let b = s.scrape("https://xgstat.com/matches/1").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(s.renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_page_parses_to_empty_fixture() {
        let s = scraper(StubRenderer::markup(""));
        let f = s.parse("<html><body>maintenance</body></html>", "https://xgstat.com/");
        assert_eq!(f, Fixture::default());
    }

    #[test]
    fn missing_team_block_keeps_xg_and_drops_shots() {
        // bez jmen týmů nejde najít ani sekce, střely zůstanou prázdné
        let markup = ARSENAL_CHELSEA.replace(r#"<span class="font-bold"> 2 - 1 </span>"#, "");
        let s = scraper(StubRenderer::markup(""));
        let f = s.parse(&markup, "https://xgstat.com/matches/9");
        assert_eq!(f.home_team, "");
        assert_eq!((f.home_xg, f.away_xg), (1.25, 0.87));
        assert_eq!(f.gameweek, 23);
        assert!(f.home_shots.is_empty() && f.away_shots.is_empty());
    }
}

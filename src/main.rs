/// XgStat Live - xG API
///
/// Co dělá:
///   1. POST /api/scrape/xgstats → vyrenderuje stránku zápasu, vytáhne xG
///      shot mapu a uloží ji do SQLite
///   2. GET /api/xgstats?id=N → poslední uložená verze zápasu
///   3. Analýza: statistiky týmu, predikce zápasu, vzájemné zápasy
///
/// Spuštění:
///   cargo run --bin xg-api

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use xgstat_live::fixture_db::{spawn_db_worker, DbConfig, FixtureDb};
use logger::{now_iso, EventLogger, FixtureSavedEvent, ScrapeFailedEvent, ScrapeOkEvent};
use prediction_engine::{calculate_team_stats, head_to_head, predict_match, MatchRecord};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use xg_scraper::{ChromeRenderer, Fixture, PageRenderer, ScraperConfig, XgScraper};

const MAX_REQUEST_BYTES: usize = 1 << 20;
const READ_CHUNK: usize = 8192;

struct ApiState<R> {
    scraper: XgScraper<R>,
    db: FixtureDb,
    logger: EventLogger,
}

// ── HTTP ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct HttpRequest {
    method: String,
    path: String,
    query: String,
    body: Vec<u8>,
}

#[derive(Debug, PartialEq)]
struct HttpResponse {
    status: u16,
    body: String,
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl HttpResponse {
    fn ok<T: Serialize>(data: T) -> Self {
        Self::envelope(200, Envelope { success: true, data: Some(data), error: None })
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::envelope(status, Envelope::<()> { success: false, data: None, error: Some(message.into()) })
    }

    fn envelope<T: Serialize>(status: u16, env: Envelope<T>) -> Self {
        match serde_json::to_string(&env) {
            Ok(body) => Self { status, body },
            Err(e) => Self {
                status: 500,
                body: format!(r#"{{"success":false,"error":"serialize: {e}"}}"#),
            },
        }
    }

    fn status_line(&self) -> &'static str {
        match self.status {
            200 => "HTTP/1.1 200 OK",
            400 => "HTTP/1.1 400 Bad Request",
            404 => "HTTP/1.1 404 Not Found",
            405 => "HTTP/1.1 405 Method Not Allowed",
            _ => "HTTP/1.1 500 Internal Server Error",
        }
    }
}

/// Request line + Content-Length z hlavičky (bez prázdného řádku)
fn parse_head(head: &str) -> Option<(String, String, String, usize)> {
    let mut lines = head.lines();
    let mut parts = lines.next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    Some((method, path.to_string(), query.to_string(), content_length))
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Přečte hlavičky a pak tělo podle Content-Length. None = klient zavřel bez dat.
async fn read_request(stream: &mut TcpStream) -> Result<Option<HttpRequest>> {
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.context("http read")?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            bail!("connection closed inside headers");
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_REQUEST_BYTES {
            bail!("request headers too large");
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let Some((method, path, query, content_length)) = parse_head(&head) else {
        bail!("malformed request line");
    };
    if content_length > MAX_REQUEST_BYTES {
        bail!("request body too large ({content_length} bytes)");
    }

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = stream.read(&mut chunk).await.context("http read body")?;
        if n == 0 {
            bail!("connection closed inside body");
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(HttpRequest {
        method,
        path,
        query,
        body: buf[body_start..body_start + content_length].to_vec(),
    }))
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

async fn handle_http_connection<R: PageRenderer + 'static>(
    mut stream: TcpStream,
    state: Arc<ApiState<R>>,
) -> Result<()> {
    let Some(req) = read_request(&mut stream).await? else {
        return Ok(());
    };
    debug!("{} {}", req.method, req.path);

    let resp = route(&state, &req).await;
    let out = format!(
        "{}\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        resp.status_line(),
        resp.body.len(),
        resp.body
    );
    stream.write_all(out.as_bytes()).await.context("http write")?;
    Ok(())
}

async fn start_http_server<R: PageRenderer + 'static>(state: Arc<ApiState<R>>, bind: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(bind).await.context("http bind")?;
    info!("🌐 xg-api listening on http://{}", bind);
    info!("   GET  /health");
    info!("   POST /api/scrape/xgstats   GET /api/xgstats?id=N");
    info!("   POST /api/analyze-team     POST /api/predict-match   POST /api/head-to-head");

    loop {
        let (stream, peer) = listener.accept().await.context("http accept")?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_http_connection(stream, state).await {
                debug!("http handler err {}: {}", peer, e);
            }
        });
    }
}

// ── Routy ─────────────────────────────────────────────────────────────────────

const ROUTE_PATHS: &[&str] = &[
    "/health",
    "/api/scrape/xgstats",
    "/api/xgstats",
    "/api/analyze-team",
    "/api/predict-match",
    "/api/head-to-head",
];

async fn route<R: PageRenderer + 'static>(state: &ApiState<R>, req: &HttpRequest) -> HttpResponse {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/health") => HttpResponse::ok(serde_json::json!({
            "status": "healthy",
            "service": "xgstat-api",
        })),
        ("POST", "/api/scrape/xgstats") => scrape_xgstats(state, &req.body).await,
        ("GET", "/api/xgstats") => get_xgstats(state, &req.query).await,
        ("POST", "/api/analyze-team") => analyze_team(state, &req.body).await,
        ("POST", "/api/predict-match") => predict(&req.body),
        ("POST", "/api/head-to-head") => h2h(&req.body),
        (_, path) if ROUTE_PATHS.contains(&path) => {
            HttpResponse::error(405, "Method not allowed")
        }
        _ => HttpResponse::error(404, "Not found"),
    }
}

#[derive(Deserialize)]
struct ScrapeRequest {
    #[serde(default)]
    url: String,
}

async fn scrape_xgstats<R: PageRenderer + 'static>(state: &ApiState<R>, body: &[u8]) -> HttpResponse {
    let req: ScrapeRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(_) => return HttpResponse::error(400, "Invalid request body"),
    };
    let url = req.url.trim();
    if url.is_empty() {
        return HttpResponse::error(400, "URL is required");
    }

    let started = Instant::now();
    let fixture = match state.scraper.scrape(url).await {
        Ok(f) => f,
        Err(e) => {
            let _ = state.logger.log(&ScrapeFailedEvent {
                ts: now_iso(),
                event: "SCRAPE_FAILED",
                url: url.to_string(),
                kind: e.kind().to_string(),
                message: e.to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });
            return HttpResponse::error(500, e.to_string());
        }
    };

    let _ = state.logger.log(&ScrapeOkEvent {
        ts: now_iso(),
        event: "SCRAPE_OK",
        url: url.to_string(),
        fixture_id: fixture.id,
        gameweek: fixture.gameweek,
        home: fixture.home_team.clone(),
        away: fixture.away_team.clone(),
        home_shots: fixture.home_shots.len(),
        away_shots: fixture.away_shots.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    });

    if let Err(e) = state.db.save(fixture.clone()).await {
        warn!("💾 Failed to save fixture {}: {:#}", fixture.id, e);
        return HttpResponse::error(500, format!("Failed to save data: {e:#}"));
    }
    info!("💾 Fixture {} (GW{}) saved", fixture.id, fixture.gameweek);
    let _ = state.logger.log(&FixtureSavedEvent {
        ts: now_iso(),
        event: "FIXTURE_SAVED",
        fixture_id: fixture.id,
        gameweek: fixture.gameweek,
        shots: fixture.total_shots(),
    });

    HttpResponse::ok(fixture)
}

async fn get_xgstats<R>(state: &ApiState<R>, query: &str) -> HttpResponse {
    let Some(raw) = query_param(query, "id").filter(|v| !v.is_empty()) else {
        return HttpResponse::error(400, "Fixture ID is required");
    };
    let Ok(id) = raw.parse::<i64>() else {
        return HttpResponse::error(400, "Invalid fixture ID");
    };

    match state.db.get(id).await {
        Ok(Some(fixture)) => HttpResponse::ok(fixture),
        Ok(None) => HttpResponse::error(404, "Fixture not found"),
        Err(e) => HttpResponse::error(500, format!("Failed to load data: {e:#}")),
    }
}

/// Uložený fixture jako vstup pro analýzu
fn match_record(f: &Fixture) -> MatchRecord {
    MatchRecord {
        id: f.id.to_string(),
        home_team: f.home_team.clone(),
        away_team: f.away_team.clone(),
        home_score: f.home_score,
        away_score: f.away_score,
        match_date: f.date.as_ref().map(|d| d.label()).unwrap_or_default(),
        ..Default::default()
    }
}

#[derive(Deserialize)]
struct AnalyzeTeamRequest {
    #[serde(default)]
    team_name: String,
    #[serde(default)]
    matches: Vec<MatchRecord>,
    /// Uložené zápasy, přidají se k `matches`
    #[serde(default)]
    fixture_ids: Vec<i64>,
}

async fn analyze_team<R>(state: &ApiState<R>, body: &[u8]) -> HttpResponse {
    let req: AnalyzeTeamRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(_) => return HttpResponse::error(400, "Invalid request body"),
    };
    if req.team_name.trim().is_empty() {
        return HttpResponse::error(400, "team_name is required");
    }

    let mut matches = req.matches;
    for id in req.fixture_ids {
        match state.db.get(id).await {
            Ok(Some(f)) => matches.push(match_record(&f)),
            Ok(None) => return HttpResponse::error(404, format!("Fixture {id} not found")),
            Err(e) => return HttpResponse::error(500, format!("Failed to load data: {e:#}")),
        }
    }

    HttpResponse::ok(calculate_team_stats(&req.team_name, &matches))
}

#[derive(Deserialize)]
struct PredictMatchRequest {
    #[serde(default)]
    home_team: String,
    #[serde(default)]
    away_team: String,
    #[serde(default)]
    home_matches: Vec<MatchRecord>,
    #[serde(default)]
    away_matches: Vec<MatchRecord>,
}

fn predict(body: &[u8]) -> HttpResponse {
    let req: PredictMatchRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(_) => return HttpResponse::error(400, "Invalid request body"),
    };
    if req.home_team.trim().is_empty() || req.away_team.trim().is_empty() {
        return HttpResponse::error(400, "home_team and away_team are required");
    }

    let home = calculate_team_stats(&req.home_team, &req.home_matches);
    let away = calculate_team_stats(&req.away_team, &req.away_matches);
    HttpResponse::ok(predict_match(&home, &away))
}

#[derive(Deserialize)]
struct HeadToHeadRequest {
    #[serde(default)]
    team1: String,
    #[serde(default)]
    team2: String,
    #[serde(default)]
    matches: Vec<MatchRecord>,
}

fn h2h(body: &[u8]) -> HttpResponse {
    let req: HeadToHeadRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(_) => return HttpResponse::error(400, "Invalid request body"),
    };
    if req.team1.trim().is_empty() || req.team2.trim().is_empty() {
        return HttpResponse::error(400, "team1 and team2 are required");
    }
    HttpResponse::ok(head_to_head(&req.team1, &req.team2, &req.matches))
}

// ── Start ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!("=== XgStat Live - xG API ===");

    let bind: SocketAddr = env::var("XG_API_BIND")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .context("XG_API_BIND")?;
    let db_path = env::var("XG_DB_PATH").unwrap_or_else(|_| "data/xgstat.db".to_string());
    let log_dir = env::var("XG_LOG_DIR").unwrap_or_else(|_| "logs".to_string());

    let config = ScraperConfig::from_env();
    info!(
        "Scraper: headless={} debug={} timeout={}s settle={}s",
        config.headless,
        config.debug,
        config.timeout.as_secs(),
        config.settle.as_secs()
    );
    let scraper: XgScraper<ChromeRenderer> = XgScraper::chrome(config)?;
    let db = spawn_db_worker(DbConfig { path: db_path })?;
    let logger = EventLogger::new(&log_dir);
    info!("Logs: ./{}/", log_dir);

    let state = Arc::new(ApiState { scraper, db, logger });

    tokio::select! {
        res = start_http_server(state, bind) => res?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    Ok(())
}

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::info;
use xg_scraper::{Fixture, MatchDate, Shot, ShotType};

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub path: String,
}

/// Fixture + střely nad SQLite. Klíč fixture je (fixture_id, gameweek).
pub struct FixtureStore {
    conn: Connection,
}

impl FixtureStore {
    pub fn open(cfg: &DbConfig) -> Result<Self> {
        let db_path = Path::new(&cfg.path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(db_path).context("open sqlite db")?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("open in-memory db")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON").ok();
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Upsert podle (id, gameweek) a kompletní náhrada střel, v jedné transakci
    pub fn save_fixture(&mut self, fixture: &Fixture) -> Result<()> {
        let tx = self.conn.transaction().context("begin transaction")?;

        let row_id: i64 = tx
            .query_row(
                r#"
                INSERT INTO xgstat_fixtures(
                    gameweek, fixture_id, fixture_date,
                    home_team, away_team,
                    home_score, away_score,
                    home_xg, away_xg,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(fixture_id, gameweek) DO UPDATE SET
                    fixture_date=excluded.fixture_date,
                    home_team=excluded.home_team,
                    away_team=excluded.away_team,
                    home_score=excluded.home_score,
                    away_score=excluded.away_score,
                    home_xg=excluded.home_xg,
                    away_xg=excluded.away_xg,
                    updated_at=excluded.updated_at
                RETURNING id
                "#,
                params![
                    fixture.gameweek,
                    fixture.id,
                    fixture.date.as_ref().map(MatchDate::label),
                    fixture.home_team,
                    fixture.away_team,
                    fixture.home_score,
                    fixture.away_score,
                    fixture.home_xg,
                    fixture.away_xg,
                    Utc::now().to_rfc3339(),
                ],
                |r| r.get(0),
            )
            .context("insert fixture")?;

        tx.execute("DELETE FROM xgstat_shots WHERE fixture_row = ?1", params![row_id])
            .context("delete existing shots")?;

        for (side, shots) in [("home", &fixture.home_shots), ("away", &fixture.away_shots)] {
            for shot in shots {
                insert_shot(&tx, row_id, shot, side)
                    .with_context(|| format!("insert {side} shot"))?;
            }
        }

        tx.commit().context("commit transaction")?;
        Ok(())
    }

    /// Naposledy aktualizovaný záznam pro dané externí ID
    pub fn fixture_by_id(&self, fixture_id: i64) -> Result<Option<Fixture>> {
        let found = self
            .conn
            .query_row(
                r#"
                SELECT id, gameweek, fixture_id, fixture_date,
                       home_team, away_team, home_score, away_score,
                       home_xg, away_xg
                FROM xgstat_fixtures
                WHERE fixture_id = ?1
                ORDER BY updated_at DESC, id DESC
                LIMIT 1
                "#,
                params![fixture_id],
                |r| {
                    let date: Option<String> = r.get(3)?;
                    Ok((
                        r.get::<_, i64>(0)?,
                        Fixture {
                            gameweek: r.get(1)?,
                            id: r.get(2)?,
                            date: date.as_deref().and_then(MatchDate::from_label),
                            home_team: r.get(4)?,
                            away_team: r.get(5)?,
                            home_score: r.get(6)?,
                            away_score: r.get(7)?,
                            home_xg: r.get(8)?,
                            away_xg: r.get(9)?,
                            home_shots: Vec::new(),
                            away_shots: Vec::new(),
                        },
                    ))
                },
            )
            .optional()
            .context("query fixture")?;

        let Some((row_id, mut fixture)) = found else {
            return Ok(None);
        };

        // minute je zatím vždy 0, id drží pořadí z dokumentu
        let mut stmt = self.conn.prepare(
            r#"
            SELECT x, y, xg, is_goal, shot_type, player_name, minute, team_side
            FROM xgstat_shots
            WHERE fixture_row = ?1
            ORDER BY minute, id
            "#,
        )?;
        let rows = stmt.query_map(params![row_id], |r| {
            Ok((
                r.get::<_, f64>(0)?,
                r.get::<_, f64>(1)?,
                r.get::<_, f64>(2)?,
                r.get::<_, bool>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, u32>(6)?,
                r.get::<_, String>(7)?,
            ))
        })?;

        for row in rows {
            let (x, y, xg, is_goal, shot_type, player_name, minute, side) =
                row.context("scan shot")?;
            let Some(shot_type) = ShotType::parse(&shot_type) else {
                bail!("unknown shot_type {shot_type:?} for fixture {fixture_id}");
            };
            let shot = Shot { x, y, xg, is_goal, shot_type, player_name, minute };
            if side == "home" {
                fixture.home_shots.push(shot);
            } else {
                fixture.away_shots.push(shot);
            }
        }

        Ok(Some(fixture))
    }

    pub fn count_fixtures(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(1) FROM xgstat_fixtures", [], |r| r.get(0))
            .context("count fixtures")
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS xgstat_fixtures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            gameweek INTEGER NOT NULL,
            fixture_id INTEGER NOT NULL,
            fixture_date TEXT,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_score INTEGER NOT NULL,
            away_score INTEGER NOT NULL,
            home_xg REAL NOT NULL,
            away_xg REAL NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(fixture_id, gameweek)
        );

        CREATE INDEX IF NOT EXISTS idx_fixtures_fixture_id ON xgstat_fixtures(fixture_id);

        CREATE TABLE IF NOT EXISTS xgstat_shots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fixture_row INTEGER NOT NULL REFERENCES xgstat_fixtures(id) ON DELETE CASCADE,
            x REAL NOT NULL,
            y REAL NOT NULL,
            xg REAL NOT NULL,
            is_goal INTEGER NOT NULL,
            shot_type TEXT NOT NULL,
            player_name TEXT NOT NULL,
            minute INTEGER NOT NULL,
            team_side TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_shots_fixture_row ON xgstat_shots(fixture_row);
        "#,
    )
    .context("init schema")?;

    Ok(())
}

fn insert_shot(conn: &Connection, row_id: i64, shot: &Shot, side: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO xgstat_shots(fixture_row, x, y, xg, is_goal, shot_type, player_name, minute, team_side)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            row_id,
            shot.x,
            shot.y,
            shot.xg,
            shot.is_goal,
            shot.shot_type.as_str(),
            shot.player_name,
            shot.minute,
            side,
        ],
    )?;
    Ok(())
}

// ── DB vlákno ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum DbMsg {
    Save {
        fixture: Box<Fixture>,
        reply: oneshot::Sender<Result<()>>,
    },
    Get {
        fixture_id: i64,
        reply: oneshot::Sender<Result<Option<Fixture>>>,
    },
}

/// Async handle na DB vlákno; SQLite spojení vlastní jediné vlákno
#[derive(Clone)]
pub struct FixtureDb {
    tx: mpsc::Sender<DbMsg>,
}

impl FixtureDb {
    pub async fn save(&self, fixture: Fixture) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DbMsg::Save { fixture: Box::new(fixture), reply })
            .await
            .context("db worker gone")?;
        rx.await.context("db worker dropped reply")?
    }

    pub async fn get(&self, fixture_id: i64) -> Result<Option<Fixture>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(DbMsg::Get { fixture_id, reply })
            .await
            .context("db worker gone")?;
        rx.await.context("db worker dropped reply")?
    }
}

/// Otevře DB hned (chyby schématu vyletí při startu) a pustí worker vlákno
pub fn spawn_db_worker(cfg: DbConfig) -> Result<FixtureDb> {
    let mut store = FixtureStore::open(&cfg)?;
    info!("fixture DB {}: {} fixtures stored", cfg.path, store.count_fixtures()?);
    let (tx, mut rx) = mpsc::channel::<DbMsg>(256);

    std::thread::spawn(move || {
        while let Some(msg) = rx.blocking_recv() {
            match msg {
                DbMsg::Save { fixture, reply } => {
                    let _ = reply.send(store.save_fixture(&fixture));
                }
                DbMsg::Get { fixture_id, reply } => {
                    let _ = reply.send(store.fixture_by_id(fixture_id));
                }
            }
        }
    });

    Ok(FixtureDb { tx })
}

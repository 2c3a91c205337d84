//! Fixture / shot model.
//!
//! Serializované názvy polí jsou kontrakt pro volající (HTTP odpověď, DB),
//! nepřejmenovávat.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vizuální druh markeru ve shot mapě
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    OffTarget,
    Blocked,
    OnTarget,
    Goal,
}

impl ShotType {
    /// pořadí = pořadí druhů ve výstupu extrakce
    pub const ALL: [ShotType; 4] = [
        ShotType::OffTarget,
        ShotType::Blocked,
        ShotType::OnTarget,
        ShotType::Goal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::OffTarget => "off_target",
            ShotType::Blocked => "blocked",
            ShotType::OnTarget => "on_target",
            ShotType::Goal => "goal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Jedna střela. Souřadnice jsou v prostoru SVG shot mapy, ne normalizované.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub x: f64,
    pub y: f64,
    /// 0.0 = neznámé
    pub xg: f64,
    pub is_goal: bool,
    pub shot_type: ShotType,
    /// Prázdné pokud se nepodařilo spárovat s hráčem
    pub player_name: String,
    /// 0 = neznámá minuta
    pub minute: u32,
}

impl Shot {
    pub fn at(x: f64, y: f64, shot_type: ShotType) -> Self {
        Self {
            x,
            y,
            xg: 0.0,
            is_goal: shot_type == ShotType::Goal,
            shot_type,
            player_name: String::new(),
            minute: 0,
        }
    }
}

/// Datum zápasu tak, jak ho stránka ukazuje ("25 Jan 16:30").
///
/// Stránka neobsahuje rok, takže se nic nedopočítává a tokeny zůstávají
/// nerozparsované.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDate {
    pub day: u32,
    pub month: String,
    pub kickoff: String,
}

impl MatchDate {
    pub fn label(&self) -> String {
        format!("{} {} {}", self.day, self.month, self.kickoff)
    }

    /// Inverze k `label()`; cokoliv jiného než tři tokeny vrací None.
    pub fn from_label(label: &str) -> Option<Self> {
        let mut parts = label.split_whitespace();
        let day = parts.next()?.parse().ok()?;
        let month = parts.next()?.to_string();
        let kickoff = parts.next()?.to_string();
        if parts.next().is_some() {
            return None;
        }
        Some(Self { day, month, kickoff })
    }
}

/// xG záznam jednoho zápasu.
///
/// Nulové hodnoty znamenají "neznámé", ne "potvrzená nula" (extrakce je
/// lenientní, viz `fields`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub gameweek: u32,
    pub id: i64,
    pub date: Option<MatchDate>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub home_xg: f64,
    pub away_xg: f64,
    pub home_shots: Vec<Shot>,
    pub away_shots: Vec<Shot>,
}

impl Fixture {
    pub fn total_shots(&self) -> usize {
        self.home_shots.len() + self.away_shots.len()
    }
}

//! Shot extraction ze sekce jednoho týmu.
//!
//! Dva průchody:
//!   1. tabulka hráčů → `PlayerTable` (jméno → xG, góly)
//!   2. SVG markery → `Shot` pro každý match, po druzích markerů
//!
//! Markery a řádky tabulky spolu nic pozičně nespojuje, takže se střely
//! s hráči nespárují; `player_name`/`xg` zůstávají na nule. Tabulka se
//! vrací vedle střel pro diagnostiku a pak se zahazuje.
//!
//! Signatury markerů jsou disjunktní (fill / opacity), deduplikace se
//! nedělá.

use crate::fields::lenient;
use crate::model::{Shot, ShotType};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Agregát hráče z tabulky pod shot mapou
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerLine {
    pub shirt_number: u32,
    pub xg: f64,
    pub goals: u32,
}

/// Jméno → řádek. Stejné jméno dvakrát = vyhrává poslední.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerTable {
    rows: HashMap<String, PlayerLine>,
}

impl PlayerTable {
    pub fn insert(&mut self, name: &str, line: PlayerLine) {
        self.rows.insert(name.to_string(), line);
    }

    pub fn get(&self, name: &str) -> Option<&PlayerLine> {
        self.rows.get(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_goals(&self) -> u32 {
        self.rows.values().map(|l| l.goals).sum()
    }
}

/// Výsledek nad jednou sekcí
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamShots {
    pub shots: Vec<Shot>,
    pub players: PlayerTable,
}

struct MarkerRule {
    kind: ShotType,
    pattern: Regex,
}

pub struct ShotExtractor {
    player_row: Regex,
    markers: Vec<MarkerRule>,
}

impl ShotExtractor {
    pub fn new() -> Result<Self> {
        let rule = |kind: ShotType, pattern: &str| -> Result<MarkerRule> {
            Ok(MarkerRule { kind, pattern: Regex::new(pattern)? })
        };

        Ok(Self {
            player_row: Regex::new(
                r#"(?s)<span class="flex size-4[^>]*>(\d+)</span><span[^>]*>([^<]+)</span>.*?<div class="rounded[^>]*>(\d+\.?\d*)</div>.*?<div class="rounded[^>]*>(\d+)</div>"#,
            )?,
            markers: vec![
                rule(
                    ShotType::OffTarget,
                    r#"<circle r="[\d.]+" cx="([\d.]+)" cy="([\d.]+)"[^>]*fill="var\(--foreground\)" fill-opacity="0\.3""#,
                )?,
                rule(
                    ShotType::Blocked,
                    r#"<circle r="[\d.]+" cx="([\d.]+)" cy="([\d.]+)"[^>]*fill="var\(--chart-red\)""#,
                )?,
                rule(
                    ShotType::OnTarget,
                    r#"<circle r="[\d.]+" cx="([\d.]+)" cy="([\d.]+)"[^>]*fill="var\(--foreground\)" fill-opacity="0\.9""#,
                )?,
                // góly jsou hvězdička (vnořené svg), ne circle
                rule(
                    ShotType::Goal,
                    r#"<svg[^>]*x="([\d.]+)" y="([\d.]+)"[^>]*fill="var\(--brand-yellow\)""#,
                )?,
            ],
        })
    }

    pub fn extract(&self, section: &str) -> TeamShots {
        if section.is_empty() {
            return TeamShots::default();
        }

        let players = self.players(section);
        let mut shots = Vec::new();
        for kind in ShotType::ALL {
            shots.extend(self.shots_of(kind, section));
        }

        debug!(
            "🔍 Extracted {} shots, {} player rows ({} goals in table) from section",
            shots.len(),
            players.len(),
            players.total_goals()
        );
        TeamShots { shots, players }
    }

    /// Tabulkový průchod
    pub fn players(&self, section: &str) -> PlayerTable {
        let mut table = PlayerTable::default();
        for caps in self.player_row.captures_iter(section) {
            table.insert(
                caps[2].trim(),
                PlayerLine {
                    shirt_number: lenient(&caps[1]),
                    xg: lenient(&caps[3]),
                    goals: lenient(&caps[4]),
                },
            );
        }
        table
    }

    /// Střely jednoho druhu v pořadí výskytu v dokumentu
    pub fn shots_of(&self, kind: ShotType, section: &str) -> Vec<Shot> {
        self.markers
            .iter()
            .filter(|r| r.kind == kind)
            .flat_map(|r| Self::markers(&r.pattern, r.kind, section))
            .collect()
    }

    fn markers(pattern: &Regex, kind: ShotType, section: &str) -> Vec<Shot> {
        pattern
            .captures_iter(section)
            .map(|caps| Shot::at(lenient(&caps[1]), lenient(&caps[2]), kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ShotExtractor {
        ShotExtractor::new().unwrap()
    }

    fn circle(cx: &str, cy: &str, paint: &str) -> String {
        format!(r#"<circle r="1.2" cx="{cx}" cy="{cy}" stroke="none" {paint}></circle>"#)
    }

    const OFF: &str = r#"fill="var(--foreground)" fill-opacity="0.3""#;
    const ON: &str = r#"fill="var(--foreground)" fill-opacity="0.9""#;
    const BLOCKED: &str = r#"fill="var(--chart-red)""#;

    fn goal(x: &str, y: &str) -> String {
        format!(r#"<svg width="4" height="4" x="{x}" y="{y}" viewBox="0 0 24 24" fill="var(--brand-yellow)"><path d="M12 2"/></svg>"#)
    }

    fn player_row(num: u32, name: &str, xg: &str, goals: u32) -> String {
        format!(
            r#"<tr><td><span class="flex size-4 items-center">{num}</span><span class="truncate">{name}</span></td><td><div class="rounded px-1">{xg}</div></td><td><div class="rounded px-1">{goals}</div></td></tr>"#
        )
    }

    #[test]
    fn each_marker_kind_is_tagged() {
        let section = [
            circle("10.5", "20", OFF),
            circle("11", "21", BLOCKED),
            circle("12", "22.25", ON),
            goal("13", "23"),
        ]
        .concat();

        let out = extractor().extract(&section);
        let kinds: Vec<_> = out.shots.iter().map(|s| s.shot_type).collect();
        assert_eq!(
            kinds,
            vec![ShotType::OffTarget, ShotType::Blocked, ShotType::OnTarget, ShotType::Goal]
        );
        assert_eq!((out.shots[0].x, out.shots[0].y), (10.5, 20.0));
        assert_eq!((out.shots[2].x, out.shots[2].y), (12.0, 22.25));
        assert!(out.shots[3].is_goal);
        assert!(out.shots[..3].iter().all(|s| !s.is_goal));
    }

    #[test]
    fn kind_groups_keep_document_order() {
        let section = [
            circle("3", "3", ON),
            circle("1", "1", OFF),
            circle("4", "4", OFF),
            circle("2", "2", ON),
        ]
        .concat();

        let xs: Vec<f64> = extractor().extract(&section).shots.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![1.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn extract_concatenates_kinds_in_fixed_order() {
        let section = [goal("9", "9"), circle("2", "2", BLOCKED), circle("1", "1", OFF)].concat();
        let ex = extractor();
        let by_kind: Vec<Shot> = ShotType::ALL
            .into_iter()
            .flat_map(|kind| ex.shots_of(kind, &section))
            .collect();
        assert_eq!(ex.extract(&section).shots, by_kind);
        assert_eq!(by_kind.iter().map(|s| s.x).collect::<Vec<_>>(), vec![1.0, 2.0, 9.0]);
    }

    #[test]
    fn absent_kind_yields_empty_vec() {
        let section = circle("1", "1", OFF);
        let ex = extractor();
        assert!(ex.shots_of(ShotType::Blocked, &section).is_empty());
        assert!(ex.shots_of(ShotType::Goal, &section).is_empty());
        assert_eq!(ex.shots_of(ShotType::OffTarget, &section).len(), 1);
    }

    #[test]
    fn matching_is_repeatable() {
        let section = [circle("5", "6", OFF), circle("7", "8", BLOCKED), goal("1", "2")].concat();
        let ex = extractor();
        for kind in ShotType::ALL {
            assert_eq!(ex.shots_of(kind, &section), ex.shots_of(kind, &section));
        }
        assert_eq!(ex.extract(&section), ex.extract(&section));
    }

    #[test]
    fn empty_section_yields_nothing() {
        let out = extractor().extract("");
        assert!(out.shots.is_empty());
        assert!(out.players.is_empty());
    }

    #[test]
    fn player_rows_are_collected() {
        let section = [
            player_row(7, "Saka", "0.82", 1),
            player_row(29, "Havertz", "0.4", 0),
        ]
        .concat();

        let table = extractor().players(&section);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Saka"), Some(&PlayerLine { shirt_number: 7, xg: 0.82, goals: 1 }));
        assert_eq!(table.get("Havertz").map(|l| l.goals), Some(0));
        assert_eq!(table.total_goals(), 1);
    }

    #[test]
    fn duplicate_player_name_last_row_wins() {
        let section = [
            player_row(9, "Jesus", "0.10", 0),
            player_row(9, "Jesus", "0.55", 2),
        ]
        .concat();

        let table = extractor().players(&section);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Jesus"), Some(&PlayerLine { shirt_number: 9, xg: 0.55, goals: 2 }));
    }

    #[test]
    fn shots_are_not_joined_to_players() {
        let section = [player_row(7, "Saka", "0.82", 1), goal("40", "12")].concat();
        let out = extractor().extract(&section);
        assert_eq!(out.players.len(), 1);
        assert_eq!(out.shots.len(), 1);
        assert_eq!(out.shots[0].player_name, "");
        assert_eq!(out.shots[0].xg, 0.0);
    }
}

//! Top-level fixture fields.
//!
//! Každé pravidlo je nezávislé: nematch nechá svoje pole na nule / prázdné
//! a ostatní pravidla běží dál. Stránka se podle stavu zápasu renderuje
//! jen s částí sekcí, částečná data jsou lepší než žádná.

use crate::model::MatchDate;
use anyhow::Result;
use regex::Regex;
use std::str::FromStr;
use tracing::debug;

/// Výsledek field pravidel; nulové hodnoty = neznámé
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureFields {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub home_xg: f64,
    pub away_xg: f64,
    pub gameweek: u32,
    pub date: Option<MatchDate>,
}

pub struct FieldExtractor {
    /// <span hidden lg:inline>Home</span>...<span font-bold> 2 - 1 </span>...<span hidden lg:inline>Away</span>
    teams_score: Regex,
    /// <span tabular-nums>1.25</span><span>-</span><span tabular-nums>0.87</span>
    aggregate_xg: Regex,
    /// >GW23</span>
    gameweek: Regex,
    /// <span text-foreground text-nowrap>25 Jan 16:30</span>
    date: Regex,
}

impl FieldExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            teams_score: Regex::new(
                r#"<span class="hidden lg:inline">([^<]+)</span><span class="lg:hidden">[^<]+</span></a><span class="font-bold">\s*(\d+)\s*-\s*(\d+)\s*</span><a[^>]*><span class="hidden lg:inline">([^<]+)</span>"#,
            )?,
            aggregate_xg: Regex::new(
                r#"<span class="tabular-nums">(\d+\.\d+)</span><span[^>]*>-</span><span class="tabular-nums">(\d+\.\d+)</span>"#,
            )?,
            gameweek: Regex::new(r#">GW(\d+)</span>"#)?,
            date: Regex::new(
                r#"<span class="text-foreground text-nowrap">(\d+)\s+(\w+)\s+(\d+:\d+)</span>"#,
            )?,
        })
    }

    pub fn extract(&self, markup: &str) -> FixtureFields {
        let mut fields = FixtureFields::default();
        self.apply_teams_score(markup, &mut fields);
        self.apply_aggregate_xg(markup, &mut fields);
        self.apply_gameweek(markup, &mut fields);
        self.apply_date(markup, &mut fields);
        fields
    }

    fn apply_teams_score(&self, markup: &str, fields: &mut FixtureFields) {
        let Some(caps) = self.teams_score.captures(markup) else {
            debug!("teams/score pattern not found");
            return;
        };
        fields.home_team = caps[1].trim().to_string();
        fields.home_score = lenient(&caps[2]);
        fields.away_score = lenient(&caps[3]);
        fields.away_team = caps[4].trim().to_string();
        debug!(
            "🔍 Found teams: {} ({}) vs {} ({})",
            fields.home_team, fields.home_score, fields.away_team, fields.away_score
        );
    }

    fn apply_aggregate_xg(&self, markup: &str, fields: &mut FixtureFields) {
        let Some(caps) = self.aggregate_xg.captures(markup) else {
            debug!("aggregate xG pattern not found");
            return;
        };
        fields.home_xg = lenient(&caps[1]);
        fields.away_xg = lenient(&caps[2]);
        debug!("🔍 Found xG: {:.2} - {:.2}", fields.home_xg, fields.away_xg);
    }

    fn apply_gameweek(&self, markup: &str, fields: &mut FixtureFields) {
        if let Some(caps) = self.gameweek.captures(markup) {
            fields.gameweek = lenient(&caps[1]);
            debug!("🔍 Found gameweek: {}", fields.gameweek);
        }
    }

    fn apply_date(&self, markup: &str, fields: &mut FixtureFields) {
        if let Some(caps) = self.date.captures(markup) {
            // rok na stránce není, tokeny necháváme tak jak jsou
            fields.date = Some(MatchDate {
                day: lenient(&caps[1]),
                month: caps[2].to_string(),
                kickoff: caps[3].to_string(),
            });
            debug!("🔍 Found date: {} {} {}", &caps[1], &caps[2], &caps[3]);
        }
    }
}

/// Číslo, nebo nula když text nejde naparsovat (přetečení apod.)
pub(crate) fn lenient<T: FromStr + Default>(s: &str) -> T {
    s.trim().parse().unwrap_or_default()
}

/// ID zápasu = poslední běh číslic v URL, bez číslic 0.
///
/// Běh, který se nevejde do i64, se přeskočí a bere se předchozí.
pub fn extract_id_from_url(url: &str) -> i64 {
    let bytes = url.as_bytes();
    let mut runs = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            runs.push(&url[start..i]);
        } else {
            i += 1;
        }
    }

    runs.iter()
        .rev()
        .find_map(|run| run.parse::<i64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEAMS: &str = r#"<a href="/t/1"><span class="hidden lg:inline">Arsenal</span><span class="lg:hidden">ARS</span></a><span class="font-bold"> 2 - 1 </span><a href="/t/2"><span class="hidden lg:inline">Chelsea</span>"#;
    const XG: &str = r#"<span class="tabular-nums">1.25</span><span class="mx-1">-</span><span class="tabular-nums">0.87</span>"#;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new().unwrap()
    }

    #[test]
    fn all_rules_match() {
        let markup = format!(
            r#"<div>{TEAMS}</div><span class="badge">GW23</span>{XG}<span class="text-foreground text-nowrap">25 Jan 16:30</span>"#
        );
        let f = extractor().extract(&markup);
        assert_eq!(f.home_team, "Arsenal");
        assert_eq!(f.away_team, "Chelsea");
        assert_eq!((f.home_score, f.away_score), (2, 1));
        assert_eq!((f.home_xg, f.away_xg), (1.25, 0.87));
        assert_eq!(f.gameweek, 23);
        assert_eq!(
            f.date,
            Some(MatchDate { day: 25, month: "Jan".into(), kickoff: "16:30".into() })
        );
    }

    #[test]
    fn rules_fail_independently() {
        // bez team bloku, xG musí projít
        let f = extractor().extract(XG);
        assert_eq!(f.home_team, "");
        assert_eq!(f.away_team, "");
        assert_eq!((f.home_score, f.away_score), (0, 0));
        assert_eq!((f.home_xg, f.away_xg), (1.25, 0.87));
        assert_eq!(f.gameweek, 0);
        assert_eq!(f.date, None);

        let f = extractor().extract(TEAMS);
        assert_eq!(f.home_team, "Arsenal");
        assert_eq!((f.home_xg, f.away_xg), (0.0, 0.0));
    }

    #[test]
    fn empty_markup_gives_defaults() {
        assert_eq!(extractor().extract(""), FixtureFields::default());
    }

    #[test]
    fn overflowing_number_is_zero() {
        let f = extractor().extract(r#"<span>GW99999999999999999999</span>"#);
        assert_eq!(f.gameweek, 0);
        assert_eq!(lenient::<f64>("abc"), 0.0);
        assert_eq!(lenient::<u32>(" 7 "), 7);
    }

    #[test]
    fn id_is_last_digit_run() {
        assert_eq!(extract_id_from_url("https://site/match/2024/ 4821"), 4821);
        assert_eq!(extract_id_from_url("https://xgstat.com/matches/123/arsenal-vs-chelsea"), 123);
        assert_eq!(extract_id_from_url("https://xgstat.com/matches/arsenal-chelsea"), 0);
        assert_eq!(extract_id_from_url(""), 0);
    }

    #[test]
    fn id_skips_unparsable_trailing_run() {
        let url = "https://site/match/77/99999999999999999999999";
        assert_eq!(extract_id_from_url(url), 77);
    }
}

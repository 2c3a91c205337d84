use regex::Regex;
use tracing::{debug, warn};

/// Vyřízne z markupu shot map sekci daného týmu: od nadpisu
/// "<Team> xG Shot Map" po nejbližší trojici zavíracích `</div>`.
///
/// Chybějící nadpis (zkrácené jméno apod.) nebo prázdné jméno týmu vrací
/// prázdný řetězec, extrakce nad ním dá prázdný seznam střel.
pub fn locate_section<'a>(markup: &'a str, team: &str) -> &'a str {
    let team = team.trim();
    if team.is_empty() {
        return "";
    }

    // jméno může obsahovat tečky, závorky apod.
    let pattern = format!(
        r"(?s)<h3[^>]*>{} xG Shot Map</h3>.*?</div>\s*</div>\s*</div>",
        regex::escape(team)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("section pattern for {:?} did not compile: {}", team, e);
            return "";
        }
    };

    match re.find(markup) {
        Some(m) => m.as_str(),
        None => {
            debug!("no shot map section for {:?}", team);
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = concat!(
        r#"<h3 class="text-card-title">Arsenal xG Shot Map</h3>"#,
        r#"<div><div><svg><circle r="1" cx="1" cy="2"/></svg></div></div>"#,
        "\n  </div>",
        r#"<h3 class="text-card-title">Brighton &amp; Hove (A.) xG Shot Map</h3>"#,
        r#"<div><div>B</div></div></div><p>tail</p>"#,
    );

    #[test]
    fn section_spans_heading_to_block_end() {
        let s = locate_section(MARKUP, "Arsenal");
        assert!(s.starts_with(r#"<h3 class="text-card-title">Arsenal xG Shot Map</h3>"#));
        assert!(s.ends_with("</div></div>\n  </div>"));
        assert!(!s.contains("Brighton"));
    }

    #[test]
    fn team_name_is_escaped() {
        let s = locate_section(MARKUP, "Brighton &amp; Hove (A.)");
        assert!(s.contains("<div>B</div>"));
        assert!(!s.contains("tail"));
        // "." ani "(" nesmí fungovat jako regex metaznaky
        assert_eq!(locate_section(MARKUP, "Brighton &amp; Hove (AX)"), "");
    }

    #[test]
    fn missing_heading_gives_empty_section() {
        assert_eq!(locate_section(MARKUP, "Chelsea"), "");
        assert_eq!(locate_section(MARKUP, ""), "");
        assert_eq!(locate_section("", "Arsenal"), "");
    }
}

use crate::fields::FixtureFields;
use crate::model::Fixture;
use crate::shots::TeamShots;

/// Složí fixture z výsledků jednotlivých kroků. Žádné další matchování;
/// strana střely je daná sekcí, ze které pochází. Tabulky hráčů se tu
/// zahazují.
pub fn assemble(fields: FixtureFields, id: i64, home: TeamShots, away: TeamShots) -> Fixture {
    Fixture {
        gameweek: fields.gameweek,
        id,
        date: fields.date,
        home_team: fields.home_team,
        away_team: fields.away_team,
        home_score: fields.home_score,
        away_score: fields.away_score,
        home_xg: fields.home_xg,
        away_xg: fields.away_xg,
        home_shots: home.shots,
        away_shots: away.shots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Shot, ShotType};

    #[test]
    fn sides_stay_partitioned() {
        let fields = FixtureFields {
            home_team: "Arsenal".into(),
            away_team: "Chelsea".into(),
            gameweek: 5,
            ..Default::default()
        };
        let home = TeamShots { shots: vec![Shot::at(1.0, 1.0, ShotType::Goal)], ..Default::default() };
        let away = TeamShots {
            shots: vec![Shot::at(2.0, 2.0, ShotType::Blocked), Shot::at(3.0, 3.0, ShotType::OnTarget)],
            ..Default::default()
        };

        let f = assemble(fields, 42, home, away);
        assert_eq!(f.id, 42);
        assert_eq!(f.gameweek, 5);
        assert_eq!(f.home_shots.len(), 1);
        assert_eq!(f.away_shots.iter().map(|s| s.x).collect::<Vec<_>>(), vec![2.0, 3.0]);
    }

    #[test]
    fn zero_fields_still_assemble() {
        let f = assemble(FixtureFields::default(), 0, TeamShots::default(), TeamShots::default());
        assert_eq!(f, Fixture::default());
    }
}

use common::filters::Direction;
use common::types::{Team, TeamRating};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TeamEntry {
    pub team: Team,
    /// 1 = best defense in the season.
    pub defense_rank: Option<u32>,
    pub pace: Option<f64>,
}

/// Teams of a slate enriched with season defensive rank and pace.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    teams: HashMap<i64, TeamEntry>,
    league_pace: Option<f64>,
}

impl TeamDirectory {
    /// `ratings` covers every team of the season so ranks are league-wide; it may be
    /// empty when ratings are unavailable.
    pub fn build(teams: Vec<Team>, ratings: &[TeamRating]) -> Self {
        let ranks = defense_ranks(ratings);
        let pace_by_team: HashMap<i64, f64> = ratings
            .iter()
            .filter_map(|r| r.pace.filter(|p| p.is_finite()).map(|p| (r.team_id, p)))
            .collect();
        let league_pace = if pace_by_team.is_empty() {
            None
        } else {
            Some(pace_by_team.values().sum::<f64>() / pace_by_team.len() as f64)
        };

        let teams = teams
            .into_iter()
            .map(|team| {
                let entry = TeamEntry {
                    defense_rank: ranks.get(&team.id).copied(),
                    pace: pace_by_team.get(&team.id).copied(),
                    team,
                };
                (entry.team.id, entry)
            })
            .collect();

        Self { teams, league_pace }
    }

    pub fn get(&self, team_id: i64) -> Option<&TeamEntry> {
        self.teams.get(&team_id)
    }

    /// How much the opponent's pace favors the pick: faster than league average
    /// helps an over, slower helps an under.
    pub fn pace_bonus(&self, opponent_id: i64, direction: Direction) -> Option<f64> {
        let league = self.league_pace?;
        let pace = self.teams.get(&opponent_id)?.pace?;
        Some(match direction {
            Direction::Over => pace - league,
            Direction::Under => league - pace,
        })
    }
}

/// Rank teams by defensive rating ascending (1 = best). Teams without a rating are unranked.
pub fn defense_ranks(ratings: &[TeamRating]) -> HashMap<i64, u32> {
    let mut rated: Vec<(i64, f64)> = ratings
        .iter()
        .filter_map(|r| {
            r.defensive_rating
                .filter(|d| d.is_finite())
                .map(|d| (r.team_id, d))
        })
        .collect();
    rated.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    rated
        .into_iter()
        .enumerate()
        .map(|(i, (team_id, _))| (team_id, (i + 1) as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: i64, abbr: &str) -> Team {
        Team {
            id,
            full_name: format!("Team {abbr}"),
            abbreviation: abbr.to_string(),
        }
    }

    fn rating(team_id: i64, drtg: Option<f64>, pace: Option<f64>) -> TeamRating {
        TeamRating {
            team_id,
            season: "2024-25".to_string(),
            defensive_rating: drtg,
            pace,
        }
    }

    #[test]
    fn test_defense_rank_lowest_rating_is_best() {
        let ranks = defense_ranks(&[
            rating(1, Some(115.0), None),
            rating(2, Some(108.5), None),
            rating(3, Some(111.0), None),
            rating(4, None, None),
        ]);
        assert_eq!(ranks[&2], 1);
        assert_eq!(ranks[&3], 2);
        assert_eq!(ranks[&1], 3);
        assert!(!ranks.contains_key(&4));
    }

    #[test]
    fn test_directory_enriches_and_computes_pace_bonus() {
        let ratings = [
            rating(1, Some(110.0), Some(102.0)),
            rating(2, Some(112.0), Some(98.0)),
            rating(3, Some(109.0), Some(100.0)),
        ];
        let dir = TeamDirectory::build(vec![team(1, "AAA"), team(2, "BBB")], &ratings);
        assert_eq!(dir.get(1).unwrap().defense_rank, Some(2));
        assert!(dir.get(3).is_none());
        // league pace = 100
        assert!((dir.pace_bonus(1, Direction::Over).unwrap() - 2.0).abs() < 1e-9);
        assert!((dir.pace_bonus(2, Direction::Under).unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_directory_without_ratings_has_no_enrichment() {
        let dir = TeamDirectory::build(vec![team(1, "AAA")], &[]);
        assert_eq!(dir.get(1).unwrap().defense_rank, None);
        assert_eq!(dir.pace_bonus(1, Direction::Over), None);
    }
}

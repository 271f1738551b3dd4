use chrono::NaiveDate;
use common::types::{Game, GameStatus, GameType, PlayerGameStat, StatType};
use std::collections::HashMap;

/// A box-score row joined to its game.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub stat: PlayerGameStat,
    pub game: Game,
}

impl HistoryEntry {
    pub fn was_home(&self) -> bool {
        self.game.is_home(self.stat.team_id)
    }

    pub fn opponent_id(&self) -> i64 {
        self.game.opponent_of(self.stat.team_id)
    }
}

/// The slate whose games are being picked. History is only taken from before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlateContext {
    pub date: NaiveDate,
    pub game_type: GameType,
    pub separate_playoff_stats: bool,
}

/// Per-player histories, most recent game first.
#[derive(Debug, Default)]
pub struct HistoryIndex {
    by_player: HashMap<i64, Vec<HistoryEntry>>,
}

impl HistoryIndex {
    pub fn build(
        rows: Vec<PlayerGameStat>,
        games: &HashMap<i64, Game>,
        slate: &SlateContext,
    ) -> Self {
        let mut by_player: HashMap<i64, Vec<HistoryEntry>> = HashMap::new();
        let mut orphaned = 0_usize;

        for stat in rows {
            let Some(game) = games.get(&stat.game_id) else {
                orphaned += 1;
                continue;
            };
            if game.status != GameStatus::Completed || game.game_date >= slate.date {
                continue;
            }
            if slate.separate_playoff_stats && game.game_type != slate.game_type {
                continue;
            }
            by_player.entry(stat.player_id).or_default().push(HistoryEntry {
                stat,
                game: game.clone(),
            });
        }

        for entries in by_player.values_mut() {
            entries.sort_by(|a, b| {
                b.game
                    .game_date
                    .cmp(&a.game.game_date)
                    .then(b.game.id.cmp(&a.game.id))
            });
        }

        if orphaned > 0 {
            tracing::debug!(orphaned, "stat rows without game metadata dropped");
        }

        Self { by_player }
    }

    pub fn get(&self, player_id: i64) -> Option<&[HistoryEntry]> {
        self.by_player
            .get(&player_id)
            .map(Vec::as_slice)
            .filter(|h| !h.is_empty())
    }

    pub fn player_count(&self) -> usize {
        self.by_player.len()
    }
}

/// Games where the player's home/away status matches the upcoming game.
pub fn contextual_split<'a>(
    history: &'a [HistoryEntry],
    upcoming: &Game,
    player_team_id: i64,
) -> Vec<&'a HistoryEntry> {
    let home = upcoming.is_home(player_team_id);
    history.iter().filter(|e| e.was_home() == home).collect()
}

/// Games against the upcoming opponent.
pub fn head_to_head_split<'a>(
    history: &'a [HistoryEntry],
    upcoming: &Game,
    player_team_id: i64,
) -> Vec<&'a HistoryEntry> {
    let opponent = upcoming.opponent_of(player_team_id);
    history.iter().filter(|e| e.opponent_id() == opponent).collect()
}

/// Stat values of a newest-first window, returned oldest first.
pub fn chronological_values<'a, I>(window: I, stat: StatType) -> Vec<f64>
where
    I: DoubleEndedIterator<Item = &'a HistoryEntry>,
{
    window.rev().map(|e| stat.actual(&e.stat)).collect()
}

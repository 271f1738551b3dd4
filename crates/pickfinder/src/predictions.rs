use common::types::{Prediction, StatType};
use std::collections::HashMap;

/// Mean of every selected model's prediction for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AveragedPrediction {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub three_pointers_made: f64,
    pub confidence: f64,
    pub model_count: u32,
}

impl AveragedPrediction {
    pub fn stat(&self, stat: StatType) -> f64 {
        match stat {
            StatType::Points => self.points,
            StatType::Rebounds => self.rebounds,
            StatType::Assists => self.assists,
            StatType::Steals => self.steals,
            StatType::Blocks => self.blocks,
            StatType::Turnovers => self.turnovers,
            StatType::ThreePointersMade => self.three_pointers_made,
        }
    }

    fn accumulate(&mut self, p: &Prediction) {
        self.points += p.points;
        self.rebounds += p.rebounds;
        self.assists += p.assists;
        self.steals += p.steals;
        self.blocks += p.blocks;
        self.turnovers += p.turnovers;
        self.three_pointers_made += p.three_pointers_made;
        self.confidence += p.confidence;
        self.model_count += 1;
    }

    fn finish(mut self) -> Self {
        let n = f64::from(self.model_count.max(1));
        self.points /= n;
        self.rebounds /= n;
        self.assists /= n;
        self.steals /= n;
        self.blocks /= n;
        self.turnovers /= n;
        self.three_pointers_made /= n;
        self.confidence /= n;
        self
    }
}

/// Average prediction rows per player. Rows from models outside `model_versions`
/// are ignored; players with no selected-model rows get no entry.
pub fn average_predictions(
    rows: &[Prediction],
    model_versions: &[String],
) -> HashMap<i64, AveragedPrediction> {
    let mut sums: HashMap<i64, AveragedPrediction> = HashMap::new();
    for row in rows {
        if !model_versions.iter().any(|m| *m == row.model_version) {
            continue;
        }
        sums.entry(row.player_id).or_default().accumulate(row);
    }
    sums.into_iter()
        .map(|(player_id, sum)| (player_id, sum.finish()))
        .collect()
}

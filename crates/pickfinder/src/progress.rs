use serde::Serialize;
use std::fmt;

/// Checkpoints of one direction pass, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Games,
    Players,
    Predictions,
    History,
    Filtering,
    Scoring,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Games => "games",
            Self::Players => "players",
            Self::Predictions => "predictions",
            Self::History => "history",
            Self::Filtering => "filtering",
            Self::Scoring => "scoring",
        }
    }

    /// Progress within a single pass when this stage starts.
    pub fn percent(self) -> u8 {
        match self {
            Self::Games => 5,
            Self::Players => 15,
            Self::Predictions => 25,
            Self::History => 45,
            Self::Filtering => 70,
            Self::Scoring => 95,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub stage: Stage,
    /// 0..=100
    pub percent: u8,
}

impl Progress {
    pub fn at(stage: Stage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
        }
    }
}

/// Share of overall progress spread across passes; the last part is the final merge.
const PASSES_SHARE: u32 = 90;

/// Maps one pass's 0..=100 progress into its even slice of the overall 0..=90 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSlice {
    index: u32,
    total: u32,
}

impl PassSlice {
    pub fn new(index: usize, total: usize) -> Self {
        let total = u32::try_from(total.max(1)).unwrap_or(u32::MAX);
        let index = u32::try_from(index).unwrap_or(u32::MAX).min(total - 1);
        Self { index, total }
    }

    /// Stage label stays `filtering` after the first pass so repeated passes read as one stage.
    pub fn map(&self, p: Progress) -> Progress {
        let local = u32::from(p.percent.min(100));
        let percent = (self.index * PASSES_SHARE + local * PASSES_SHARE / 100) / self.total;
        let stage = if self.index == 0 {
            p.stage
        } else {
            Stage::Filtering
        };
        Progress {
            stage,
            percent: u8::try_from(percent).unwrap_or(100),
        }
    }
}

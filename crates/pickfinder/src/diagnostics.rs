use serde::Serialize;

/// Why a player/game pair produced no pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InsufficientHistory,
    MissingTeam,
    InsufficientContext,
    NoH2hGames,
    LowMinutes,
    LowConfidence,
    HitRate,
    ContextHitRate,
    ContextConsecutive,
    H2hHitRate,
    H2hConsecutive,
    Consecutive,
    AiAgreement,
    SkippedNoHistory,
    SkippedNoPrediction,
    EvaluationError,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientHistory => "insufficient_history",
            Self::MissingTeam => "missing_team",
            Self::InsufficientContext => "insufficient_context",
            Self::NoH2hGames => "no_h2h_games",
            Self::LowMinutes => "low_minutes",
            Self::LowConfidence => "low_confidence",
            Self::HitRate => "hit_rate",
            Self::ContextHitRate => "context_hit_rate",
            Self::ContextConsecutive => "context_consecutive",
            Self::H2hHitRate => "h2h_hit_rate",
            Self::H2hConsecutive => "h2h_consecutive",
            Self::Consecutive => "consecutive",
            Self::AiAgreement => "ai_agreement",
            Self::SkippedNoHistory => "skipped_no_history",
            Self::SkippedNoPrediction => "skipped_no_prediction",
            Self::EvaluationError => "evaluation_errors",
        }
    }
}

/// Counts of every rejection path, plus how many pairs were evaluated and passed.
/// Explains an empty result set without re-running the search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounters {
    pub insufficient_history: u32,
    pub missing_team: u32,
    pub insufficient_context: u32,
    pub no_h2h_games: u32,
    pub low_minutes: u32,
    pub low_confidence: u32,
    pub hit_rate: u32,
    pub context_hit_rate: u32,
    pub context_consecutive: u32,
    pub h2h_hit_rate: u32,
    pub h2h_consecutive: u32,
    pub consecutive: u32,
    pub ai_agreement: u32,
    pub skipped_no_history: u32,
    pub skipped_no_prediction: u32,
    pub evaluation_errors: u32,
    pub evaluated: u32,
    pub passed: u32,
}

impl RejectionCounters {
    pub fn record(&mut self, rejection: Rejection) {
        *self.slot(rejection) += 1;
    }

    pub fn get(&self, rejection: Rejection) -> u32 {
        match rejection {
            Rejection::InsufficientHistory => self.insufficient_history,
            Rejection::MissingTeam => self.missing_team,
            Rejection::InsufficientContext => self.insufficient_context,
            Rejection::NoH2hGames => self.no_h2h_games,
            Rejection::LowMinutes => self.low_minutes,
            Rejection::LowConfidence => self.low_confidence,
            Rejection::HitRate => self.hit_rate,
            Rejection::ContextHitRate => self.context_hit_rate,
            Rejection::ContextConsecutive => self.context_consecutive,
            Rejection::H2hHitRate => self.h2h_hit_rate,
            Rejection::H2hConsecutive => self.h2h_consecutive,
            Rejection::Consecutive => self.consecutive,
            Rejection::AiAgreement => self.ai_agreement,
            Rejection::SkippedNoHistory => self.skipped_no_history,
            Rejection::SkippedNoPrediction => self.skipped_no_prediction,
            Rejection::EvaluationError => self.evaluation_errors,
        }
    }

    fn slot(&mut self, rejection: Rejection) -> &mut u32 {
        match rejection {
            Rejection::InsufficientHistory => &mut self.insufficient_history,
            Rejection::MissingTeam => &mut self.missing_team,
            Rejection::InsufficientContext => &mut self.insufficient_context,
            Rejection::NoH2hGames => &mut self.no_h2h_games,
            Rejection::LowMinutes => &mut self.low_minutes,
            Rejection::LowConfidence => &mut self.low_confidence,
            Rejection::HitRate => &mut self.hit_rate,
            Rejection::ContextHitRate => &mut self.context_hit_rate,
            Rejection::ContextConsecutive => &mut self.context_consecutive,
            Rejection::H2hHitRate => &mut self.h2h_hit_rate,
            Rejection::H2hConsecutive => &mut self.h2h_consecutive,
            Rejection::Consecutive => &mut self.consecutive,
            Rejection::AiAgreement => &mut self.ai_agreement,
            Rejection::SkippedNoHistory => &mut self.skipped_no_history,
            Rejection::SkippedNoPrediction => &mut self.skipped_no_prediction,
            Rejection::EvaluationError => &mut self.evaluation_errors,
        }
    }

    pub fn merge(&mut self, other: &Self) {
        for r in ALL_REJECTIONS {
            *self.slot(r) += other.get(r);
        }
        self.evaluated += other.evaluated;
        self.passed += other.passed;
    }

    pub fn total_rejected(&self) -> u32 {
        ALL_REJECTIONS.iter().map(|r| self.get(*r)).sum()
    }

    /// Non-zero rejection counts, for logging and metrics.
    pub fn nonzero(&self) -> impl Iterator<Item = (Rejection, u32)> + '_ {
        ALL_REJECTIONS
            .iter()
            .map(|r| (*r, self.get(*r)))
            .filter(|(_, n)| *n > 0)
    }
}

const ALL_REJECTIONS: [Rejection; 16] = [
    Rejection::InsufficientHistory,
    Rejection::MissingTeam,
    Rejection::InsufficientContext,
    Rejection::NoH2hGames,
    Rejection::LowMinutes,
    Rejection::LowConfidence,
    Rejection::HitRate,
    Rejection::ContextHitRate,
    Rejection::ContextConsecutive,
    Rejection::H2hHitRate,
    Rejection::H2hConsecutive,
    Rejection::Consecutive,
    Rejection::AiAgreement,
    Rejection::SkippedNoHistory,
    Rejection::SkippedNoPrediction,
    Rejection::EvaluationError,
];

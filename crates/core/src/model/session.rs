use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ItemId, SessionId};
use crate::model::item_stat::{AttemptOutcome, StatsSnapshot};
use crate::model::settings::Mode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many answers for a single session: {len}")]
    TooManyAnswers { len: usize },
}

//
// ─── ANSWER RESULT ─────────────────────────────────────────────────────────────
//

/// One terminal answer (or pass) logged during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub item_id: ItemId,
    pub user_answer: String,
    pub correct_name: Option<String>,
    pub is_correct: bool,
    pub passed: bool,
    pub elapsed_seconds: u32,
}

impl AnswerResult {
    /// The stats outcome this answer is recorded as.
    #[must_use]
    pub fn outcome(&self) -> AttemptOutcome {
        if self.passed {
            AttemptOutcome::Pass
        } else if self.is_correct {
            AttemptOutcome::Success
        } else {
            AttemptOutcome::Failure
        }
    }
}

/// Whole seconds between two instants, rounded to nearest and clamped at zero.
#[must_use]
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let millis = to.signed_duration_since(from).num_milliseconds().max(0);
    let rounded = (millis + 500) / 1000;
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// User-facing score of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionScore {
    /// Correct answers out of the planned queue length.
    Ratio { correct: u32, out_of: u32 },
    /// Progressive sessions only end once every item is found, so the count of
    /// answers it took is the score.
    AnswersGiven(u32),
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Aggregate of a completed session's answer log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    session_id: SessionId,
    mode: Mode,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    planned: u32,
    answers_given: u32,
    correct: u32,
    incorrect: u32,
    passed: u32,
    total_elapsed_seconds: u64,
}

impl SessionSummary {
    /// Build a summary from the answer log.
    ///
    /// `planned` is the queue length the session started with.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::TooManyAnswers` if the log length cannot fit in `u32`.
    pub fn from_results(
        session_id: SessionId,
        mode: Mode,
        planned: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        results: &[AnswerResult],
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        let answers_given = u32::try_from(results.len())
            .map_err(|_| SessionSummaryError::TooManyAnswers { len: results.len() })?;

        let mut correct = 0_u32;
        let mut incorrect = 0_u32;
        let mut passed = 0_u32;
        let mut total_elapsed_seconds = 0_u64;
        for result in results {
            match result.outcome() {
                AttemptOutcome::Success => correct = correct.saturating_add(1),
                AttemptOutcome::Failure => incorrect = incorrect.saturating_add(1),
                AttemptOutcome::Pass => passed = passed.saturating_add(1),
            }
            total_elapsed_seconds += u64::from(result.elapsed_seconds);
        }

        Ok(Self {
            session_id,
            mode,
            started_at,
            completed_at,
            planned,
            answers_given,
            correct,
            incorrect,
            passed,
            total_elapsed_seconds,
        })
    }

    #[must_use]
    pub fn score(&self) -> SessionScore {
        match self.mode {
            Mode::Progressive => SessionScore::AnswersGiven(self.answers_given),
            Mode::Normal | Mode::Revision => SessionScore::Ratio {
                correct: self.correct,
                out_of: self.planned,
            },
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn planned(&self) -> u32 {
        self.planned
    }

    #[must_use]
    pub fn answers_given(&self) -> u32 {
        self.answers_given
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn passed(&self) -> u32 {
        self.passed
    }

    #[must_use]
    pub fn total_elapsed_seconds(&self) -> u64 {
        self.total_elapsed_seconds
    }
}

/// One line of the end-of-session recap: the answer plus the item's lifetime record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecapRow {
    pub result: AnswerResult,
    pub lifetime_successes: u32,
    pub lifetime_attempts: u32,
}

/// Join the answer log with lifetime stats; missing stats read as `0 / 0`.
#[must_use]
pub fn recap(results: &[AnswerResult], stats: &StatsSnapshot) -> Vec<RecapRow> {
    results
        .iter()
        .map(|result| {
            let (lifetime_successes, lifetime_attempts) = stats
                .get(result.item_id)
                .map_or((0, 0), |stat| (stat.successes(), stat.attempts()));
            RecapRow {
                result: result.clone(),
                lifetime_successes,
                lifetime_attempts,
            }
        })
        .collect()
}

use chrono::{DateTime, Utc};

use guessr_core::model::session::elapsed_seconds;
use guessr_core::model::{
    AnswerResult, AttemptOutcome, ItemId, Mode, SessionConfig, SessionId, SessionSummary,
    StreakChange, StreakTracker,
};
use guessr_core::normalize::names_match;

use super::queue::SessionQueue;
use crate::error::SessionError;

/// Terminal result for one item: logged, counted, and scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalAnswer {
    pub result: AnswerResult,
    pub outcome: AttemptOutcome,
    /// Index the item was moved to when requeued (progressive mode only).
    pub requeued_at: Option<usize>,
    pub finished: bool,
}

/// What a submission or pass did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Wrong, but tries remain. Not logged and the streak is untouched.
    Retry { attempts_used: u32, attempts_left: u32 },
    Terminal(TerminalAnswer),
}

/// Per-question state machine of one session.
///
/// Pure: no I/O. The caller resolves the expected name and counts each step in
/// the stats.
#[derive(Debug, Clone)]
pub struct SessionRunner {
    id: SessionId,
    mode: Mode,
    max_attempts_per_item: u32,
    queue: SessionQueue,
    planned: u32,
    attempts_on_item: u32,
    streak: StreakTracker,
    log: Vec<AnswerResult>,
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl SessionRunner {
    /// Start presenting `items[0]`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `items` is empty.
    pub fn new(
        id: SessionId,
        config: &SessionConfig,
        items: Vec<ItemId>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::Empty);
        }
        let planned = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Ok(Self {
            id,
            mode: config.mode(),
            max_attempts_per_item: config.max_attempts_per_item(),
            queue: SessionQueue::new(items),
            planned,
            attempts_on_item: 0,
            streak: StreakTracker::new(),
            log: Vec::new(),
            started_at,
            question_started_at: started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    /// Queue length at start.
    #[must_use]
    pub fn planned(&self) -> u32 {
        self.planned
    }

    #[must_use]
    pub fn current(&self) -> Option<ItemId> {
        if self.is_finished() {
            None
        } else {
            self.queue.current()
        }
    }

    /// Wrong submissions so far on the current question.
    #[must_use]
    pub fn attempts_on_item(&self) -> u32 {
        self.attempts_on_item
    }

    #[must_use]
    pub fn streak(&self) -> &StreakTracker {
        &self.streak
    }

    /// Acknowledge the last streak change.
    pub fn settle_streak(&mut self) -> StreakChange {
        self.streak.settle()
    }

    #[must_use]
    pub fn log(&self) -> &[AnswerResult] {
        &self.log
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Score `answer` against the current item's `solution`.
    ///
    /// An unresolved solution never matches.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is finished.
    pub fn submit(
        &mut self,
        answer: &str,
        solution: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Step, SessionError> {
        let id = self.current().ok_or(SessionError::Completed)?;

        if names_match(answer, solution) {
            return Ok(Step::Terminal(self.conclude(
                id,
                answer,
                solution,
                AttemptOutcome::Success,
                now,
            )));
        }

        self.attempts_on_item = self.attempts_on_item.saturating_add(1);
        if self.attempts_on_item < self.max_attempts_per_item {
            return Ok(Step::Retry {
                attempts_used: self.attempts_on_item,
                attempts_left: self.max_attempts_per_item - self.attempts_on_item,
            });
        }
        Ok(Step::Terminal(self.conclude(
            id,
            answer,
            solution,
            AttemptOutcome::Failure,
            now,
        )))
    }

    /// Give up on the current item regardless of attempts so far.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the session is finished.
    pub fn pass(
        &mut self,
        answer: &str,
        solution: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TerminalAnswer, SessionError> {
        let id = self.current().ok_or(SessionError::Completed)?;
        Ok(self.conclude(id, answer, solution, AttemptOutcome::Pass, now))
    }

    /// Aggregate of the answer log.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while the session is still running, or
    /// `SessionError::Summary` if the log cannot be aggregated.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotFinished)?;
        Ok(SessionSummary::from_results(
            self.id,
            self.mode,
            self.planned,
            self.started_at,
            completed_at,
            &self.log,
        )?)
    }

    fn conclude(
        &mut self,
        id: ItemId,
        answer: &str,
        solution: Option<&str>,
        outcome: AttemptOutcome,
        now: DateTime<Utc>,
    ) -> TerminalAnswer {
        let result = AnswerResult {
            item_id: id,
            user_answer: answer.to_owned(),
            correct_name: solution.map(str::to_owned),
            is_correct: outcome == AttemptOutcome::Success,
            passed: outcome == AttemptOutcome::Pass,
            elapsed_seconds: elapsed_seconds(self.question_started_at, now),
        };
        self.log.push(result.clone());
        self.streak.apply(result.is_correct);

        let mut requeued_at = None;
        if self.mode == Mode::Progressive && outcome != AttemptOutcome::Success {
            requeued_at = self.queue.requeue_current();
        } else if self.queue.advance() {
            self.completed_at = Some(now);
        }

        self.attempts_on_item = 0;
        self.question_started_at = now;

        TerminalAnswer {
            result,
            outcome,
            requeued_at,
            finished: self.is_finished(),
        }
    }
}

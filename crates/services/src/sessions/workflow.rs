use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use guessr_core::model::session::recap;
use guessr_core::model::{
    AttemptOutcome, CategoryId, ItemId, ItemStat, RecapRow, SessionConfig, SessionId,
    SessionSummary,
};

use super::plan::{SessionPlan, SessionPlanner};
use super::readiness::ReadinessGate;
use super::runner::{SessionRunner, Step};
use crate::Clock;
use crate::catalog::ItemCatalog;
use crate::error::{ReadinessError, SessionError};
use crate::stats_service::StatsService;

/// The item on screen with whatever the catalog could tell about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub item_id: ItemId,
    /// Expected answer; `None` when the lookup failed.
    pub name: Option<String>,
    pub category: Option<CategoryId>,
}

/// A running session plus the resolved current question.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    generation: u64,
    runner: SessionRunner,
    question: Option<Question>,
}

impl ActiveSession {
    /// Settings generation this session was planned for.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn runner(&self) -> &SessionRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut SessionRunner {
        &mut self.runner
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.runner.is_finished()
    }
}

/// Result of answering or passing in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerResult {
    pub step: Step,
    /// Lifetime record of the item after this answer was counted.
    pub stat: ItemStat,
    pub is_complete: bool,
}

/// Orchestrates readiness, planning, lookups and persisted answering.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    catalog: Arc<dyn ItemCatalog>,
    stats: StatsService,
    gate: ReadinessGate,
    seed: Option<u64>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn ItemCatalog>,
        stats: StatsService,
        gate: ReadinessGate,
    ) -> Self {
        Self {
            clock,
            catalog,
            stats,
            gate,
            seed: None,
        }
    }

    /// Plan sessions from a fixed seed instead of the thread rng.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Wait for the catalog, then plan and start a session for `config`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Readiness` if the catalog is unusable or the settings
    /// changed meanwhile, `SessionError::Empty` if nothing could be planned, and
    /// storage errors from loading stats.
    pub async fn start_session(
        &self,
        config: &SessionConfig,
        generation: u64,
    ) -> Result<ActiveSession, SessionError> {
        let pool = self.gate.wait(config, generation).await?;
        let stats = self.stats.snapshot().await?;

        let planner = SessionPlanner::new(config, &stats);
        let plan: SessionPlan = match self.seed {
            Some(seed) => planner.build(&pool, &mut StdRng::seed_from_u64(seed)),
            None => planner.build(&pool, &mut rand::rng()),
        };
        if !self.gate.generation().is_current(generation) {
            return Err(ReadinessError::Stale.into());
        }

        let runner =
            SessionRunner::new(SessionId::generate(), config, plan.items, self.clock.now())?;
        info!(
            session = %runner.id(),
            mode = %config.mode(),
            items = runner.planned(),
            weak = plan.weak_selected,
            "session started"
        );
        Ok(ActiveSession {
            generation,
            runner,
            question: None,
        })
    }

    /// Resolve the current question's name and category, once per item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is finished.
    pub async fn present(&self, session: &mut ActiveSession) -> Result<Question, SessionError> {
        let id = session.runner.current().ok_or(SessionError::Completed)?;
        if let Some(question) = session.question.as_ref().filter(|q| q.item_id == id) {
            return Ok(question.clone());
        }
        let question = Question {
            item_id: id,
            name: self.catalog.canonical_name(id).await,
            category: self.catalog.category_of(id).await,
        };
        session.question = Some(question.clone());
        Ok(question)
    }

    /// Score `answer` for the current question.
    ///
    /// Every scored submission is one attempt in the stats, so a wrong answer that
    /// still allows a retry is counted as a failure too. If the write fails the
    /// session has already moved on and the error is returned. Nothing is scored
    /// while the expected name is unresolved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is finished,
    /// `SessionError::Unresolved` if the name lookup failed (the session and the
    /// stats are left untouched), or `SessionError::Stats` if the stats write fails.
    pub async fn submit(
        &self,
        session: &mut ActiveSession,
        answer: &str,
    ) -> Result<SessionAnswerResult, SessionError> {
        let question = self.present(session).await?;
        let Some(name) = question.name.as_deref() else {
            debug!(item_id = %question.item_id, "submission ignored, name unresolved");
            return Err(SessionError::Unresolved);
        };
        let step = session.runner.submit(answer, Some(name), self.clock.now())?;
        let outcome = match &step {
            Step::Retry { .. } => AttemptOutcome::Failure,
            Step::Terminal(terminal) => terminal.outcome,
        };
        let stat = self.persist(&question, outcome).await?;
        Ok(self.answered(session, step, stat))
    }

    /// Pass on the current question.
    ///
    /// # Errors
    ///
    /// Same as [`SessionLoopService::submit`].
    pub async fn pass(
        &self,
        session: &mut ActiveSession,
        answer: &str,
    ) -> Result<SessionAnswerResult, SessionError> {
        let question = self.present(session).await?;
        let terminal = session
            .runner
            .pass(answer, question.name.as_deref(), self.clock.now())?;
        let stat = self.persist(&question, terminal.outcome).await?;
        Ok(self.answered(session, Step::Terminal(terminal), stat))
    }

    /// Summary and per-answer recap of a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while the session is running, or storage
    /// errors from loading stats.
    pub async fn finish(
        &self,
        session: &ActiveSession,
    ) -> Result<(SessionSummary, Vec<RecapRow>), SessionError> {
        let summary = session.runner.summary()?;
        let stats = self.stats.snapshot().await?;
        Ok((summary, recap(session.runner.log(), &stats)))
    }

    async fn persist(
        &self,
        question: &Question,
        outcome: AttemptOutcome,
    ) -> Result<ItemStat, SessionError> {
        Ok(self
            .stats
            .record_attempt(question.item_id, question.category, outcome)
            .await?)
    }

    fn answered(
        &self,
        session: &ActiveSession,
        step: Step,
        stat: ItemStat,
    ) -> SessionAnswerResult {
        let is_complete = session.is_complete();
        if is_complete {
            info!(
                session = %session.runner.id(),
                answers = session.runner.log().len(),
                "session finished"
            );
        }
        SessionAnswerResult {
            step,
            stat,
            is_complete,
        }
    }
}

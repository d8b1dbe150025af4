use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use quiz_core::model::{HistoryEntry, HistoryLog, QuestionBank, ResultSummary, SessionConfig};

use super::countdown::Countdown;
use super::progress::{QuestionMapItem, QuestionView, SessionProgress};
use super::service::{AnswerOutcome, Direction, QuizSession, TickOutcome};
use crate::Clock;
use crate::error::QuizError;
use crate::history_service::HistoryService;

/// Default countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Home,
    InProgress,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Home => "no quiz is running",
            Phase::InProgress => "a quiz is in progress",
            Phase::Finished => "the quiz is finished",
        })
    }
}

/// Published after every transition and countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizStatus {
    pub phase: Phase,
    pub remaining_secs: u32,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

enum Stage {
    Home,
    InProgress(QuizSession),
    Finished {
        session: QuizSession,
        summary: ResultSummary,
    },
}

impl Stage {
    fn phase(&self) -> Phase {
        match self {
            Stage::Home => Phase::Home,
            Stage::InProgress(_) => Phase::InProgress,
            Stage::Finished { .. } => Phase::Finished,
        }
    }

    fn session(&self) -> Option<&QuizSession> {
        match self {
            Stage::Home => None,
            Stage::InProgress(session) | Stage::Finished { session, .. } => Some(session),
        }
    }
}

struct ControllerState {
    stage: Stage,
    /// Bumped on every start; a countdown only acts on its own generation.
    generation: u64,
    countdown: Option<Countdown>,
    history: HistoryLog,
}

impl ControllerState {
    fn status(&self) -> QuizStatus {
        QuizStatus {
            phase: self.stage.phase(),
            remaining_secs: self.stage.session().map_or(0, QuizSession::remaining_secs),
        }
    }

    fn running_session(&mut self, operation: &'static str) -> Result<&mut QuizSession, QuizError> {
        match &mut self.stage {
            Stage::InProgress(session) => Ok(session),
            other => Err(QuizError::WrongPhase {
                operation,
                phase: other.phase(),
            }),
        }
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn finish(&mut self) -> Result<ResultSummary, QuizError> {
        let summary = match &self.stage {
            Stage::Finished { summary, .. } => return Ok(*summary),
            Stage::Home => {
                return Err(QuizError::WrongPhase {
                    operation: "finish",
                    phase: Phase::Home,
                });
            }
            Stage::InProgress(session) => session.summarize()?,
        };

        self.stop_countdown();
        if let Stage::InProgress(session) = std::mem::replace(&mut self.stage, Stage::Home) {
            self.stage = Stage::Finished { session, summary };
        }
        Ok(summary)
    }

    /// Returns the summary when this tick ran the clock out.
    fn tick(&mut self) -> Result<Option<ResultSummary>, QuizError> {
        let Stage::InProgress(session) = &mut self.stage else {
            return Ok(None);
        };
        match session.tick() {
            TickOutcome::Running { .. } => Ok(None),
            TickOutcome::Expired => {
                log::info!("time is up, finishing quiz");
                self.finish().map(Some)
            }
        }
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Owns the single live quiz session and drives it through its phases.
///
/// Every event, whether a user call or a countdown tick, goes through one
/// async mutex, so transitions never interleave. Clones share the same
/// session.
#[derive(Clone)]
pub struct QuizController {
    clock: Clock,
    bank: Arc<QuestionBank>,
    history: Arc<HistoryService>,
    state: Arc<Mutex<ControllerState>>,
    status: Arc<watch::Sender<QuizStatus>>,
    tick_period: Duration,
}

impl QuizController {
    /// Build a controller in the `Home` phase with the stored history loaded.
    pub async fn new(clock: Clock, bank: Arc<QuestionBank>, history: Arc<HistoryService>) -> Self {
        let log = history.load().await;
        log::debug!("loaded {} history entries", log.len());
        let state = ControllerState {
            stage: Stage::Home,
            generation: 0,
            countdown: None,
            history: log,
        };
        let (status, _) = watch::channel(state.status());
        Self {
            clock,
            bank,
            history,
            state: Arc::new(Mutex::new(state)),
            status: Arc::new(status),
            tick_period: TICK_PERIOD,
        }
    }

    /// Override the countdown resolution. Affects sessions started afterwards.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Watch phase and remaining time, including timer-driven changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QuizStatus> {
        self.status.subscribe()
    }

    pub async fn status(&self) -> QuizStatus {
        self.state.lock().await.status()
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.stage.phase()
    }

    /// Start a new quiz, discarding any current session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Config`, `QuizError::UnknownCategory` or
    /// `QuizError::EmptyCategory`; the current session is untouched on error.
    pub async fn start(
        &self,
        category: &str,
        question_count: usize,
        seconds_per_question: u32,
    ) -> Result<SessionProgress, QuizError> {
        let config = SessionConfig::new(category, question_count, seconds_per_question)?;
        self.start_with_config(config).await
    }

    /// Same as [`QuizController::start`] with a prepared config.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` or `QuizError::EmptyCategory`.
    pub async fn start_with_config(&self, config: SessionConfig) -> Result<SessionProgress, QuizError> {
        let session = QuizSession::start(&self.bank, config, self.clock.now(), &mut rand::rng())?;
        let progress = session.progress();

        let mut state = self.state.lock().await;
        state.stop_countdown();
        state.generation = state.generation.wrapping_add(1);
        state.stage = Stage::InProgress(session);
        state.countdown = Some(self.spawn_countdown(state.generation));
        self.status.send_replace(state.status());

        log::info!(
            "started {} quiz: {} questions, {}s budget",
            progress.category,
            progress.total,
            progress.budget_secs
        );
        Ok(progress)
    }

    fn spawn_countdown(&self, generation: u64) -> Countdown {
        let state = Arc::downgrade(&self.state);
        let status = Arc::clone(&self.status);
        Countdown::spawn(self.tick_period, move || {
            let state: Weak<Mutex<ControllerState>> = Weak::clone(&state);
            let status = Arc::clone(&status);
            async move {
                let Some(state) = state.upgrade() else {
                    return ControlFlow::Break(());
                };
                let mut guard = state.lock().await;
                if guard.generation != generation {
                    return ControlFlow::Break(());
                }
                let flow = match guard.tick() {
                    Ok(None) if guard.stage.phase() == Phase::InProgress => ControlFlow::Continue(()),
                    Ok(_) => ControlFlow::Break(()),
                    Err(err) => {
                        log::warn!("countdown stopped: {err}");
                        ControlFlow::Break(())
                    }
                };
                status.send_replace(guard.status());
                flow
            }
        })
    }

    /// Answer the current question. A second answer is ignored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::WrongPhase` outside `InProgress` and
    /// `QuizError::ChoiceOutOfRange` for an invalid choice.
    pub async fn answer(&self, choice: usize) -> Result<AnswerOutcome, QuizError> {
        let mut state = self.state.lock().await;
        let outcome = state.running_session("answer")?.answer(choice)?;
        if let AnswerOutcome::AlreadyAnswered { kept } = outcome {
            log::debug!("ignoring answer {choice}, choice {kept} already recorded");
        }
        Ok(outcome)
    }

    /// Move to the next or previous question. Returns the new index.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::WrongPhase` outside `InProgress`.
    pub async fn navigate(&self, direction: Direction) -> Result<usize, QuizError> {
        let mut state = self.state.lock().await;
        Ok(state.running_session("navigate")?.navigate(direction))
    }

    /// # Errors
    ///
    /// Returns `QuizError::WrongPhase` outside `InProgress` and
    /// `QuizError::IndexOutOfRange` for an index past the drawn questions.
    pub async fn jump_to(&self, index: usize) -> Result<(), QuizError> {
        let mut state = self.state.lock().await;
        state.running_session("jump to a question")?.jump_to(index)
    }

    /// Advance the countdown by one second by hand.
    ///
    /// Ignored outside `InProgress`. Returns the summary if this tick ran the
    /// clock out.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Summary` if the automatic finish cannot score.
    pub async fn tick(&self) -> Result<Option<ResultSummary>, QuizError> {
        let mut state = self.state.lock().await;
        let result = state.tick();
        self.status.send_replace(state.status());
        result
    }

    /// Stop the quiz and score it. Repeated calls return the same summary.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::WrongPhase` when no quiz has been started.
    pub async fn finish(&self) -> Result<ResultSummary, QuizError> {
        let mut state = self.state.lock().await;
        let was_running = state.stage.phase() == Phase::InProgress;
        let summary = state.finish()?;
        self.status.send_replace(state.status());
        if was_running {
            log::info!(
                "quiz finished: {}/{} in {}s",
                summary.score(),
                summary.total(),
                summary.elapsed_secs()
            );
        }
        Ok(summary)
    }

    /// Append the finished result to the score history and persist it.
    ///
    /// Every call appends a new entry, even for the same result.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::WrongPhase` unless the quiz is finished, and
    /// `QuizError::History` if persisting fails (the in-memory history is
    /// then left unchanged).
    pub async fn save_result(&self) -> Result<HistoryEntry, QuizError> {
        let mut state = self.state.lock().await;
        let Stage::Finished { session, summary } = &state.stage else {
            return Err(QuizError::WrongPhase {
                operation: "save the result",
                phase: state.stage.phase(),
            });
        };
        let entry = HistoryEntry::new(self.clock.now(), session.config().category(), summary);

        let mut updated = state.history.clone();
        updated.record(entry.clone());
        self.history.save(&updated).await?;
        state.history = updated;

        log::info!("saved result for {}", entry.category());
        Ok(entry)
    }

    /// Discard the finished session and return to `Home`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::WrongPhase` unless the quiz is finished.
    pub async fn restart(&self) -> Result<(), QuizError> {
        let mut state = self.state.lock().await;
        let phase = state.stage.phase();
        if phase != Phase::Finished {
            return Err(QuizError::WrongPhase {
                operation: "restart",
                phase,
            });
        }
        state.stop_countdown();
        state.stage = Stage::Home;
        self.status.send_replace(state.status());
        Ok(())
    }

    /// Empty the score history. Allowed in any phase.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::History` if persisting fails.
    pub async fn clear_history(&self) -> Result<(), QuizError> {
        let mut state = self.state.lock().await;
        self.history.clear().await?;
        state.history.clear();
        log::info!("score history cleared");
        Ok(())
    }

    pub async fn history(&self) -> HistoryLog {
        self.state.lock().await.history.clone()
    }

    /// Progress of the running or finished session.
    pub async fn progress(&self) -> Option<SessionProgress> {
        self.state.lock().await.stage.session().map(QuizSession::progress)
    }

    pub async fn current_question(&self) -> Option<QuestionView> {
        let state = self.state.lock().await;
        let session = state.stage.session()?;
        let index = session.current_index();
        Some(QuestionView {
            index,
            total: session.total(),
            question: session.current_question().clone(),
            selected: session.answer_at(index),
        })
    }

    pub async fn question_map(&self) -> Vec<QuestionMapItem> {
        let state = self.state.lock().await;
        state
            .stage
            .session()
            .map(QuizSession::question_map)
            .unwrap_or_default()
    }

    /// Summary of the finished session, if any.
    pub async fn summary(&self) -> Option<ResultSummary> {
        match &self.state.lock().await.stage {
            Stage::Finished { summary, .. } => Some(*summary),
            _ => None,
        }
    }
}

impl fmt::Debug for QuizController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizController")
            .field("clock", &self.clock)
            .field("categories", &self.bank.categories().len())
            .field("tick_period", &self.tick_period)
            .finish_non_exhaustive()
    }
}

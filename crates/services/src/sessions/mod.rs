mod countdown;
mod progress;
mod service;
mod workflow;

// Public API of the quiz session subsystem.
pub use progress::{MapState, QuestionMapItem, QuestionView, SessionProgress};
pub use service::{AnswerOutcome, Direction, QuizSession, TickOutcome, draw_questions};
pub use workflow::{Phase, QuizController, QuizStatus, TICK_PERIOD};

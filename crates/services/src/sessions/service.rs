use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

use quiz_core::model::{CHOICE_COUNT, Question, QuestionBank, ResultSummary, SessionConfig};

use super::progress::{MapState, QuestionMapItem, SessionProgress};
use crate::error::QuizError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Direction for stepping through questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Result of an answer attempt on the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The choice was stored.
    Recorded,
    /// The question already had an answer; the earlier one stays.
    AlreadyAnswered { kept: usize },
}

/// Result of one countdown step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    Expired,
}

//
// ─── DRAW ──────────────────────────────────────────────────────────────────────
//

/// Draw `min(count, pool.len())` distinct questions in random order.
///
/// Shuffles the pool's indices with `rng`; callers pass an unseeded
/// thread RNG in production, so draws are not reproducible.
pub fn draw_questions<R: Rng + ?Sized>(pool: &[Question], count: usize, rng: &mut R) -> Vec<Question> {
    let mut indices: Vec<usize> = (0..pool.len()).collect();
    indices.shuffle(rng);
    indices.truncate(count.min(pool.len()));
    indices.into_iter().map(|i| pool[i].clone()).collect()
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One in-memory quiz attempt.
///
/// Holds the drawn questions, the answer slots, the cursor and the countdown
/// budget. Phase bookkeeping and the timer task live in `QuizController`.
pub struct QuizSession {
    config: SessionConfig,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    current: usize,
    budget_secs: u32,
    remaining_secs: u32,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Draw questions for `config` from `bank` and set up the countdown.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` if the category is not in the bank
    /// and `QuizError::EmptyCategory` if its pool has no questions.
    pub fn start<R: Rng + ?Sized>(
        bank: &QuestionBank,
        config: SessionConfig,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        let category = bank
            .category(config.category())
            .ok_or_else(|| QuizError::UnknownCategory(config.category().to_string()))?;
        if category.is_empty() {
            return Err(QuizError::EmptyCategory(category.name().to_string()));
        }

        let questions = draw_questions(category.questions(), config.question_count(), rng);
        let budget_secs = config.time_budget(questions.len());

        Ok(Self {
            answers: vec![None; questions.len()],
            questions,
            current: 0,
            budget_secs,
            remaining_secs: budget_secs,
            started_at,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    /// Recorded choice for question `index`, if any.
    #[must_use]
    pub fn answer_at(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn budget_secs(&self) -> u32 {
        self.budget_secs
    }

    /// Record `choice` for the current question. First answer wins.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::ChoiceOutOfRange` if `choice` is not a valid choice index.
    pub fn answer(&mut self, choice: usize) -> Result<AnswerOutcome, QuizError> {
        if choice >= CHOICE_COUNT {
            return Err(QuizError::ChoiceOutOfRange { choice });
        }
        let slot = &mut self.answers[self.current];
        if let Some(kept) = *slot {
            return Ok(AnswerOutcome::AlreadyAnswered { kept });
        }
        *slot = Some(choice);
        Ok(AnswerOutcome::Recorded)
    }

    /// Step the cursor, clamped to the drawn range. Returns the new index.
    pub fn navigate(&mut self, direction: Direction) -> usize {
        self.current = match direction {
            Direction::Next => (self.current + 1).min(self.questions.len() - 1),
            Direction::Prev => self.current.saturating_sub(1),
        };
        self.current
    }

    /// # Errors
    ///
    /// Returns `QuizError::IndexOutOfRange` if `index` is not a drawn question.
    pub fn jump_to(&mut self, index: usize) -> Result<(), QuizError> {
        if index >= self.questions.len() {
            return Err(QuizError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    /// Consume one second of the budget.
    pub fn tick(&mut self) -> TickOutcome {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_secs: self.remaining_secs,
            }
        }
    }

    /// Score the session as it stands. Unanswered questions count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Summary` if the counts cannot form a summary.
    pub fn summarize(&self) -> Result<ResultSummary, QuizError> {
        let score = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| answer.is_some_and(|choice| question.is_correct(choice)))
            .count();
        let score = u32::try_from(score).unwrap_or(u32::MAX);
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let elapsed = self.budget_secs - self.remaining_secs;
        Ok(ResultSummary::new(score, total, elapsed)?)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            category: self.config.category().to_string(),
            current: self.current,
            total: self.total(),
            answered: self.answered_count(),
            remaining_secs: self.remaining_secs,
            budget_secs: self.budget_secs,
            started_at: self.started_at,
        }
    }

    /// Per-question overview in draw order.
    #[must_use]
    pub fn question_map(&self) -> Vec<QuestionMapItem> {
        self.questions
            .iter()
            .zip(&self.answers)
            .enumerate()
            .map(|(index, (question, answer))| QuestionMapItem {
                index,
                state: match answer {
                    None => MapState::Unanswered,
                    Some(choice) if question.is_correct(*choice) => MapState::Correct,
                    Some(_) => MapState::Incorrect,
                },
                is_current: index == self.current,
            })
            .collect()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("category", &self.config.category())
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answered_count())
            .field("remaining_secs", &self.remaining_secs)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Category;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn start(category: &str, count: usize, secs: u32) -> QuizSession {
        let config = SessionConfig::new(category, count, secs).unwrap();
        QuizSession::start(&QuestionBank::builtin(), config, fixed_now(), &mut seeded()).unwrap()
    }

    fn answer_all_correctly(session: &mut QuizSession) {
        for i in 0..session.total() {
            session.jump_to(i).unwrap();
            let correct = session.current_question().answer();
            assert_eq!(session.answer(correct).unwrap(), AnswerOutcome::Recorded);
        }
    }

    #[test]
    fn draw_is_distinct_and_clamped() {
        let bank = QuestionBank::builtin();
        let pool = bank.category("Science").unwrap().questions();
        let drawn = draw_questions(pool, 10, &mut seeded());
        assert_eq!(drawn.len(), 2);
        let ids: HashSet<_> = drawn.iter().map(Question::id).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn draw_only_uses_pool_questions() {
        let bank = QuestionBank::builtin();
        let pool = bank.category("Math").unwrap().questions();
        for seed in 0..20 {
            let drawn = draw_questions(pool, 3, &mut StdRng::seed_from_u64(seed));
            assert_eq!(drawn.len(), 3);
            assert!(drawn.iter().all(|q| pool.contains(q)));
            let ids: HashSet<_> = drawn.iter().map(Question::id).collect();
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn math_scenario_scores_full_marks() {
        let mut session = start("Math", 3, 10);
        assert_eq!(session.total(), 3);
        assert_eq!(session.remaining_secs(), 30);

        answer_all_correctly(&mut session);
        let summary = session.summarize().unwrap();
        assert_eq!(summary.score(), 3);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.elapsed_secs(), 0);
    }

    #[test]
    fn progress_reports_counts_and_start_time() {
        let mut session = start("English", 3, 20);
        session.answer(0).unwrap();
        session.navigate(Direction::Next);
        session.tick();

        let progress = session.progress();
        assert_eq!(progress.category, "English");
        assert_eq!((progress.current, progress.total, progress.answered), (1, 3, 1));
        assert_eq!((progress.remaining_secs, progress.budget_secs), (59, 60));
        assert_eq!(progress.started_at, fixed_now());
    }

    #[test]
    fn first_answer_wins() {
        let mut session = start("Math", 2, 10);
        let correct = session.current_question().answer();
        let wrong = (correct + 1) % CHOICE_COUNT;

        assert_eq!(session.answer(wrong).unwrap(), AnswerOutcome::Recorded);
        assert_eq!(
            session.answer(correct).unwrap(),
            AnswerOutcome::AlreadyAnswered { kept: wrong }
        );
        assert_eq!(session.answer_at(0), Some(wrong));
        assert_eq!(session.summarize().unwrap().score(), 0);
    }

    #[test]
    fn answer_rejects_invalid_choice() {
        let mut session = start("Math", 1, 10);
        assert!(matches!(
            session.answer(CHOICE_COUNT),
            Err(QuizError::ChoiceOutOfRange { choice: 4 })
        ));
        assert_eq!(session.answer_at(0), None);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut session = start("Math", 3, 10);
        assert_eq!(session.navigate(Direction::Prev), 0);
        assert_eq!(session.navigate(Direction::Next), 1);
        assert_eq!(session.navigate(Direction::Next), 2);
        assert_eq!(session.navigate(Direction::Next), 2);
    }

    #[test]
    fn jump_to_checks_bounds() {
        let mut session = start("Math", 3, 10);
        session.jump_to(2).unwrap();
        assert_eq!(session.current_index(), 2);
        assert!(matches!(
            session.jump_to(3),
            Err(QuizError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn ticks_run_down_to_zero_exactly() {
        let mut session = start("Science", 1, 10);
        for expected in (1..10).rev() {
            assert_eq!(
                session.tick(),
                TickOutcome::Running {
                    remaining_secs: expected
                }
            );
        }
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.remaining_secs(), 0);
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.remaining_secs(), 0);
        assert_eq!(session.summarize().unwrap().elapsed_secs(), 10);
    }

    #[test]
    fn unanswered_questions_never_score() {
        let session = start("Math", 5, 10);
        let summary = session.summarize().unwrap();
        assert_eq!(summary.score(), 0);
        assert_eq!(summary.total(), 5);
    }

    #[test]
    fn question_map_reflects_answers() {
        let mut session = start("Math", 3, 10);
        let correct = session.current_question().answer();
        session.answer(correct).unwrap();
        session.navigate(Direction::Next);
        let wrong = (session.current_question().answer() + 1) % CHOICE_COUNT;
        session.answer(wrong).unwrap();

        let map = session.question_map();
        assert_eq!(map[0].state, MapState::Correct);
        assert_eq!(map[1].state, MapState::Incorrect);
        assert!(map[1].is_current);
        assert_eq!(map[2].state, MapState::Unanswered);
    }

    #[test]
    fn unknown_and_empty_categories_are_rejected() {
        let bank = QuestionBank::new(vec![
            Category::new("Empty", vec![]).unwrap(),
            QuestionBank::builtin().category("Math").unwrap().clone(),
        ])
        .unwrap();

        let config = SessionConfig::new("Empty", 1, 10).unwrap();
        let err = QuizSession::start(&bank, config, fixed_now(), &mut seeded()).unwrap_err();
        assert!(matches!(err, QuizError::EmptyCategory(name) if name == "Empty"));

        let config = SessionConfig::new("Art", 1, 10).unwrap();
        let err = QuizSession::start(&bank, config, fixed_now(), &mut seeded()).unwrap_err();
        assert!(matches!(err, QuizError::UnknownCategory(name) if name == "Art"));
    }
}

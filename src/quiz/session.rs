// src/quiz/session.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::rewards::rewards_for;
use crate::models::{
    content::{PublicQuestion, Question, QuizSet},
    progress::{Attempt, RewardGrant},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("quiz set '{0}' has no questions")]
    EmptyQuizSet(String),

    #[error("option {option} does not exist; question has {available} options")]
    OptionOutOfRange { option: usize, available: usize },

    #[error("select an option before continuing")]
    NoSelection,

    #[error("already on the last question; submit instead")]
    NoNextQuestion,

    #[error("answer every question before submitting")]
    NotFinished,

    #[error("this quiz has already been submitted")]
    AlreadySubmitted,
}

/// One play-through of a quiz set. Moves forward only.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: Uuid,
    quiz_set: QuizSet,
    current: usize,
    selections: Vec<Option<usize>>,
    started_at: DateTime<Utc>,
    submitted: bool,
}

/// What a submission produced, ready to hand to the progress store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    pub attempt: Attempt,
    pub rewards: RewardGrant,
    pub total_questions: usize,
    pub perfect: bool,
}

/// Client view of a running session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub quiz_set_id: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub question: PublicQuestion,
    pub selected_option: Option<usize>,
    pub is_last: bool,
    pub can_advance: bool,
    pub submitted: bool,
}

impl QuizSession {
    pub fn start(quiz_set: QuizSet, started_at: DateTime<Utc>) -> Result<Self, QuizError> {
        if quiz_set.questions.is_empty() {
            return Err(QuizError::EmptyQuizSet(quiz_set.id));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            selections: vec![None; quiz_set.questions.len()],
            quiz_set,
            current: 0,
            started_at,
            submitted: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_set(&self) -> &QuizSet {
        &self.quiz_set
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz_set.questions[self.current]
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.quiz_set.questions.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Next/Submit is enabled only once the current question has a selection.
    pub fn can_advance(&self) -> bool {
        !self.submitted && self.selections[self.current].is_some()
    }

    pub fn select(&mut self, option: usize) -> Result<(), QuizError> {
        self.ensure_open()?;
        let available = self.current_question().options.len();
        if option >= available {
            return Err(QuizError::OptionOutOfRange { option, available });
        }
        self.selections[self.current] = Some(option);
        Ok(())
    }

    /// Moves to the following question. Returns the new index.
    pub fn next(&mut self) -> Result<usize, QuizError> {
        self.ensure_open()?;
        if self.is_last() {
            return Err(QuizError::NoNextQuestion);
        }
        if self.selections[self.current].is_none() {
            return Err(QuizError::NoSelection);
        }
        self.current += 1;
        Ok(self.current)
    }

    /// Number of selections matching the correct option.
    pub fn score(&self) -> u32 {
        self.quiz_set
            .questions
            .iter()
            .zip(&self.selections)
            .filter(|(q, selected)| **selected == Some(q.correct_option_index))
            .count() as u32
    }

    /// Scores the session and closes it.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<QuizOutcome, QuizError> {
        self.ensure_open()?;
        if !self.is_last() {
            return Err(QuizError::NotFinished);
        }
        if self.selections.iter().any(Option::is_none) {
            return Err(if self.selections[self.current].is_none() {
                QuizError::NoSelection
            } else {
                QuizError::NotFinished
            });
        }

        let total_questions = self.quiz_set.questions.len();
        let score = self.score();
        let accuracy = score as f64 / total_questions as f64 * 100.0;
        let time_taken = (now - self.started_at).num_seconds().max(0) as u64;

        self.submitted = true;

        Ok(QuizOutcome {
            attempt: Attempt {
                quiz_set_id: self.quiz_set.id.clone(),
                score,
                time_taken,
                accuracy,
                timestamp: now.timestamp_millis(),
                user_answers: self.selections.clone(),
            },
            rewards: rewards_for(score, total_questions, time_taken),
            total_questions,
            perfect: score as usize == total_questions,
        })
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            quiz_set_id: self.quiz_set.id.clone(),
            question_index: self.current,
            total_questions: self.quiz_set.questions.len(),
            question: PublicQuestion::from(self.current_question()),
            selected_option: self.selections[self.current],
            is_last: self.is_last(),
            can_advance: self.can_advance(),
            submitted: self.submitted,
        }
    }

    fn ensure_open(&self) -> Result<(), QuizError> {
        if self.submitted {
            Err(QuizError::AlreadySubmitted)
        } else {
            Ok(())
        }
    }
}

// src/models/results.rs

use serde::{Deserialize, Serialize};

use super::content::{Question, QuizSet};

/// Query string of the results page. Every field stays raw so a malformed
/// link can be answered with the pending view instead of a 400.
#[derive(Debug, Default, Deserialize)]
pub struct ResultsParams {
    pub score: Option<String>,
    pub total: Option<String>,
    pub time: Option<String>,
    pub answers: Option<String>,
}

impl ResultsParams {
    /// Parses the parameters against the quiz set they claim to describe.
    ///
    /// Returns `None` when anything is missing or does not fit the set.
    pub fn parse(&self, quiz_set: &QuizSet) -> Option<ParsedResults> {
        let score: u32 = self.score.as_deref()?.trim().parse().ok()?;
        let total: usize = self.total.as_deref()?.trim().parse().ok()?;
        let time_taken: u64 = self.time.as_deref()?.trim().parse().ok()?;
        let answers: Vec<Option<usize>> = serde_json::from_str(self.answers.as_deref()?).ok()?;

        if total != quiz_set.questions.len() || answers.len() != total || score as usize > total {
            return None;
        }

        Some(ParsedResults {
            score,
            total,
            time_taken,
            answers,
        })
    }
}

#[derive(Debug, PartialEq)]
pub struct ParsedResults {
    pub score: u32,
    pub total: usize,
    pub time_taken: u64,
    pub answers: Vec<Option<usize>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub question_id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    pub correct_option_index: usize,
    pub is_correct: bool,
    pub explanation: String,
}

impl ReviewItem {
    pub fn new(question: &Question, selected: Option<usize>) -> Self {
        Self {
            question_id: question.id.clone(),
            question_text: question.question_text.clone(),
            options: question.options.clone(),
            selected_option: selected,
            correct_option_index: question.correct_option_index,
            is_correct: selected == Some(question.correct_option_index),
            explanation: question.explanation.clone(),
        }
    }
}

/// Results page payload.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ResultsView {
    /// The link did not carry a usable result yet.
    Pending,
    Ready {
        quiz_set_id: String,
        quiz_set_title: String,
        score: u32,
        total_questions: usize,
        time_taken: u64,
        accuracy: f64,
        review: Vec<ReviewItem>,
    },
}

impl ResultsView {
    pub fn build(quiz_set: &QuizSet, params: &ResultsParams) -> Self {
        let Some(parsed) = params.parse(quiz_set) else {
            return ResultsView::Pending;
        };

        let accuracy = if parsed.total == 0 {
            0.0
        } else {
            f64::from(parsed.score) / parsed.total as f64 * 100.0
        };

        ResultsView::Ready {
            quiz_set_id: quiz_set.id.clone(),
            quiz_set_title: quiz_set.title.clone(),
            score: parsed.score,
            total_questions: parsed.total,
            time_taken: parsed.time_taken,
            accuracy,
            review: quiz_set
                .questions
                .iter()
                .zip(parsed.answers)
                .map(|(question, selected)| ReviewItem::new(question, selected))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::Difficulty;

    fn set() -> QuizSet {
        QuizSet {
            id: "s1".into(),
            title: "Set".into(),
            chapter_id: "c1".into(),
            difficulty: Difficulty::Easy,
            questions: (0..2)
                .map(|i| Question {
                    id: format!("q{i}"),
                    question_text: "?".into(),
                    options: vec!["a".into(), "b".into()],
                    correct_option_index: 1,
                    explanation: "because".into(),
                })
                .collect(),
        }
    }

    fn params(answers: &str) -> ResultsParams {
        ResultsParams {
            score: Some("1".into()),
            total: Some("2".into()),
            time: Some("40".into()),
            answers: Some(answers.into()),
        }
    }

    #[test]
    fn well_formed_link_builds_review() {
        match ResultsView::build(&set(), &params("[1,null]")) {
            ResultsView::Ready { accuracy, review, .. } => {
                assert_eq!(accuracy, 50.0);
                assert!(review[0].is_correct);
                assert_eq!(review[1].selected_option, None);
                assert!(!review[1].is_correct);
            }
            ResultsView::Pending => panic!("expected a review"),
        }
    }

    #[test]
    fn malformed_answers_are_pending() {
        assert!(matches!(ResultsView::build(&set(), &params("not json")), ResultsView::Pending));
        assert!(matches!(ResultsView::build(&set(), &params("[1]")), ResultsView::Pending));
        assert!(matches!(
            ResultsView::build(&set(), &ResultsParams::default()),
            ResultsView::Pending
        ));
    }
}

// src/quiz/catalog.rs

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::models::content::{ChallengeType, Chapter, Question, QuizSet, Subject};

/// Question bank shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../../content/quiz_data.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog is inconsistent: {0}")]
    Invalid(String),
}

/// Read-only quiz content: subjects, chapters, quiz sets and their questions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    subjects: Vec<Subject>,
    chapters: Vec<Chapter>,
    quiz_sets: Vec<QuizSet>,
}

impl Catalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut question_ids = HashSet::new();
        let mut set_ids = HashSet::new();

        for set in &self.quiz_sets {
            if !set_ids.insert(set.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate quiz set '{}'", set.id)));
            }
            for q in &set.questions {
                if !question_ids.insert(q.id.as_str()) {
                    return Err(CatalogError::Invalid(format!("duplicate question '{}'", q.id)));
                }
                if q.correct_option_index >= q.options.len() {
                    return Err(CatalogError::Invalid(format!(
                        "question '{}' points at option {} of {}",
                        q.id,
                        q.correct_option_index,
                        q.options.len()
                    )));
                }
            }
        }

        for chapter in &self.chapters {
            if let Some(missing) = chapter.quiz_set_ids.iter().find(|id| !set_ids.contains(id.as_str())) {
                return Err(CatalogError::Invalid(format!(
                    "chapter '{}' lists unknown quiz set '{}'",
                    chapter.id, missing
                )));
            }
        }

        Ok(())
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject_by_slug(&self, slug: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.slug == slug)
    }

    pub fn chapters_by_subject(&self, subject_id: &str) -> Vec<&Chapter> {
        self.chapters
            .iter()
            .filter(|c| c.subject_id == subject_id)
            .collect()
    }

    pub fn chapter_by_slug(&self, subject_id: &str, chapter_slug: &str) -> Option<&Chapter> {
        self.chapters
            .iter()
            .find(|c| c.subject_id == subject_id && c.slug == chapter_slug)
    }

    pub fn quiz_sets_by_chapter(&self, chapter_id: &str) -> Vec<&QuizSet> {
        self.quiz_sets
            .iter()
            .filter(|qs| qs.chapter_id == chapter_id)
            .collect()
    }

    pub fn quiz_set_by_id(&self, id: &str) -> Option<&QuizSet> {
        self.quiz_sets.iter().find(|qs| qs.id == id)
    }

    /// Finds a question anywhere in the catalog, with the set it belongs to.
    pub fn question_by_id(&self, question_id: &str) -> Option<(&Question, &QuizSet)> {
        self.quiz_sets.iter().find_map(|set| {
            set.questions
                .iter()
                .find(|q| q.id == question_id)
                .map(|q| (q, set))
        })
    }

    pub fn challenge_title(challenge: ChallengeType) -> &'static str {
        match challenge {
            ChallengeType::Daily => "Daily Challenge",
            ChallengeType::Weekly => "Weekly Challenge",
        }
    }
}

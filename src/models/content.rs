// src/models/content.rs

use serde::{Deserialize, Serialize};

/// A multiple-choice question from the static catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    pub explanation: String,
}

/// DTO for sending a question to the client (excludes answer and explanation).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            question_text: q.question_text.clone(),
            options: q.options.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// Case-insensitive parse of a difficulty label.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn harder(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn easier(self) -> Self {
        match self {
            Difficulty::Hard => Difficulty::Medium,
            _ => Difficulty::Easy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSet {
    pub id: String,
    pub title: String,
    pub chapter_id: String,
    pub difficulty: Difficulty,
    pub questions: Vec<Question>,
}

/// Listing entry for a quiz set, without its questions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSetSummary {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub question_count: usize,
}

impl From<&QuizSet> for QuizSetSummary {
    fn from(set: &QuizSet) -> Self {
        Self {
            id: set.id.clone(),
            title: set.title.clone(),
            difficulty: set.difficulty,
            question_count: set.questions.len(),
        }
    }
}

/// DTO for a quiz set with its public questions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuizSet {
    pub id: String,
    pub title: String,
    pub chapter_id: String,
    pub difficulty: Difficulty,
    pub questions: Vec<PublicQuestion>,
}

impl From<&QuizSet> for PublicQuizSet {
    fn from(set: &QuizSet) -> Self {
        Self {
            id: set.id.clone(),
            title: set.title.clone(),
            chapter_id: set.chapter_id.clone(),
            difficulty: set.difficulty,
            questions: set.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub subject_id: String,
    pub slug: String,
    pub quiz_set_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub chapter_ids: Vec<String>,
    pub icon_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
    Daily,
    Weekly,
}

impl ChallengeType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "daily" => Some(ChallengeType::Daily),
            "weekly" => Some(ChallengeType::Weekly),
            _ => None,
        }
    }
}

/// A bookmarked question resolved against the catalog, answer included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkedQuestion {
    pub quiz_set_id: String,
    pub quiz_set_title: String,
    pub question: Question,
}

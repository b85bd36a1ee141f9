// src/progress/notification.rs

use serde::Serialize;

/// User-visible message produced by a progress mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    LevelUp { level: u32 },
    BookmarkAdded { question_id: String },
    BookmarkRemoved { question_id: String },
}

impl Notification {
    pub fn title(&self) -> &'static str {
        match self {
            Notification::LevelUp { .. } => "Level Up!",
            Notification::BookmarkAdded { .. } => "Bookmarked!",
            Notification::BookmarkRemoved { .. } => "Bookmark Removed",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Notification::LevelUp { level } => {
                format!("Congratulations! You've reached Level {}.", level)
            }
            Notification::BookmarkAdded { .. } => {
                "You can find this question in your bookmarks to review later.".to_string()
            }
            Notification::BookmarkRemoved { .. } => {
                "The question has been removed from your bookmarks.".to_string()
            }
        }
    }
}

/// Wire form with the rendered title and description alongside the payload.
#[derive(Debug, Serialize)]
pub struct Toast {
    pub title: &'static str,
    pub description: String,
    #[serde(flatten)]
    pub notification: Notification,
}

impl From<Notification> for Toast {
    fn from(notification: Notification) -> Self {
        Self {
            title: notification.title(),
            description: notification.description(),
            notification,
        }
    }
}

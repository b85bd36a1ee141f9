// src/progress/outbox.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Mutations waiting to reach storage.
///
/// Writes are whole-document, so one successful flush settles every queued entry.
#[derive(Debug, Default)]
pub struct Outbox {
    items: Vec<PendingWrite>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    /// Idempotency key, copied to `lastMutationId` on the written document.
    pub id: Uuid,
    pub mutation: Mutation,
    pub queued_at: DateTime<Utc>,
    /// Failed flushes since this entry was queued.
    pub retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    Initialize,
    RecordAttempt { quiz_set_id: String },
    GrantRewards,
    ToggleBookmark { question_id: String },
    MarkCompleted { quiz_set_id: String },
    MergeAnonymous { token: Uuid },
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, mutation: Mutation) -> Uuid {
        let id = Uuid::new_v4();
        self.items.push(PendingWrite {
            id,
            mutation,
            queued_at: Utc::now(),
            retries: 0,
            last_error: None,
        });
        id
    }

    /// Key of the newest entry.
    pub fn head(&self) -> Option<Uuid> {
        self.items.last().map(|item| item.id)
    }

    /// Records a failed flush against every pending entry.
    pub fn mark_failed(&mut self, error: &str) {
        for item in &mut self.items {
            item.retries += 1;
            item.last_error = Some(error.to_string());
        }
    }

    /// Drops entries up to and including `id`, keeping anything queued after it.
    pub fn settle(&mut self, id: Uuid) {
        if let Some(pos) = self.items.iter().position(|item| item.id == id) {
            self.items.drain(..=pos);
        }
    }

    pub fn items(&self) -> &[PendingWrite] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

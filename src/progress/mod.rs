// src/progress/mod.rs

pub mod level;
pub mod merge;
pub mod notification;
pub mod outbox;
pub mod registry;
pub mod store;

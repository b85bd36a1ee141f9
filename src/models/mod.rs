// src/models/mod.rs

pub mod account;
pub mod content;
pub mod leaderboard;
pub mod progress;
pub mod results;

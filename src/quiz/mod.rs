// src/quiz/mod.rs

pub mod catalog;
pub mod rewards;
pub mod session;

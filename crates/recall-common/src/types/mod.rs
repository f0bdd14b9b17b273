//! Core data types for Recall

pub mod attempt;
pub mod queue;
pub mod schedule;
pub mod weak_item;

//! Scheduler domain logic
//!
//! Success-rate tracking, weak-item classification, SM-2 scheduling, daily
//! queue composition, and graduation.

pub mod classifier;
pub mod composer;
pub mod graduation;
pub mod scheduler;
pub mod success_rate;

//! Tick sources and subscription management.
//!
//! - `tick_generator`: `TickSource`/`FeedHandle` traits and the periodic synthetic generator.
//! - `manual`: push-driven source for adapters, replays and tests.
//! - `subscription`: one-stream-per-symbol registry with generation-guarded unsubscribe.

pub mod manual;
pub mod subscription;
pub mod tick_generator;

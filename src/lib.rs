//! Vocabulary curriculum tracking for generated reading material.
//!
//! See [`curriculum`] for the state machine and its persistence.

pub mod curriculum;

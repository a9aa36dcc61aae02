//! Staged-diff preparation for commit-message prompts.
//!
//! The interesting part is [`core::engine::DiffEngine`]: it temporarily
//! removes ignored files from the stage, captures the diff of what is left
//! and always puts the stage back the way it found it.

pub mod builders;
pub mod core;
pub mod utils;

#[cfg(test)]
mod tests;

//! CLI module for ReplyBuddy
//!
//! Argument parsing and terminal output.

pub mod args;
pub mod output;

pub use args::{Args, Commands, SuggestArgs};

//! Interactive terminal helpers.

pub mod prompt;

pub use prompt::TerminalPrompter;

//! Numbered-list selection on stderr, answered on stdin.
use std::io::{self, BufRead, Write};

use crate::attach::Prompter;
use crate::errors::{Result, SessionError};
use crate::{color_enabled_stderr, paint};

/// Prompts on the controlling terminal. Reads one line per attempt and re-asks on
/// invalid input; end of input aborts.
pub struct TerminalPrompter;

/// Parse a 1-based choice into an index below `len`.
pub fn parse_choice(line: &str, len: usize) -> Option<usize> {
    match line.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, label: &str, items: &[String]) -> Result<usize> {
        let use_err = color_enabled_stderr();
        eprintln!("{}", paint(use_err, "\x1b[36;1m", label));
        for (i, item) in items.iter().enumerate() {
            eprintln!("  {} {}", paint(use_err, "\x1b[34;1m", &format!("{})", i + 1)), item);
        }

        let stdin = io::stdin();
        let mut lines = stdin.lock();
        loop {
            eprint!(
                "{}",
                paint(use_err, "\x1b[90m", &format!("Select [1-{}]: ", items.len()))
            );
            let _ = io::stderr().flush();

            let mut line = String::new();
            if lines.read_line(&mut line)? == 0 {
                eprintln!();
                return Err(SessionError::NotFound("no container selected".to_string()));
            }
            if let Some(idx) = parse_choice(&line, items.len()) {
                return Ok(idx);
            }
            eprintln!(
                "{}",
                paint(use_err, "\x1b[33m", &format!("invalid choice: {}", line.trim()))
            );
        }
    }
}

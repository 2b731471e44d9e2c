//! Confirmation prompts for destructive commands

use anyhow::Result;
use console::Term;
use tracing::debug;

/// Asks the user a yes/no question
pub trait Prompter: Send + Sync {
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Reads the answer from the terminal. Anything but y/yes declines.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> Result<bool> {
        let term = Term::stderr();

        if !term.is_term() {
            debug!("Not attached to a terminal, treating prompt as declined");
            return Ok(false);
        }

        term.write_str(&format!("{} (y/N) ", message))?;
        let answer = term.read_line()?;

        Ok(is_yes(&answer))
    }
}

/// Accepts every prompt (autoConfirm setting)
pub struct AutoConfirm;

impl Prompter for AutoConfirm {
    fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(true)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Skip the prompt when `force` is set, otherwise ask
pub fn confirm_unless_forced(force: bool, prompter: &dyn Prompter, message: &str) -> Result<bool> {
    if force {
        return Ok(true);
    }

    prompter.confirm(message)
}

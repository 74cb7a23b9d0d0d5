use std::io::{self, IsTerminal};

use console::Term;

use crate::error::{GcbError, Result};

/// Asks the operator a yes/no question.
pub trait Prompt {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Reads the answer from the controlling terminal; anything but yes is a no.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        let term = Term::stderr();
        require_terminal(term.is_term() && io::stdin().is_terminal())?;
        term.write_str(&format!("{question} [y/N]: "))?;
        let answer = term.read_line()?;
        Ok(is_yes(&answer))
    }
}

/// Piped input is never taken as an answer.
fn require_terminal(is_term: bool) -> Result<()> {
    if is_term {
        Ok(())
    } else {
        Err(GcbError::Precondition(
            "confirmation requires an interactive terminal".to_string(),
        ))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_counts() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES \n"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("sure"));
    }

    #[test]
    fn non_terminal_input_is_refused_up_front() {
        let err = require_terminal(false).unwrap_err();
        assert!(matches!(err, GcbError::Precondition(_)));
        assert_eq!(err.to_string(), "confirmation requires an interactive terminal");
        assert!(require_terminal(true).is_ok());
    }
}

use crate::command::{EXIT_FAILURE, EXIT_NOT_FOUND, ExitCode};
use std::io;
use thiserror::Error;

/// Errors that make a line unparseable. Nothing on the line runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `'` or `"` was opened and never closed.
    #[error("unterminated quote: missing closing {0}")]
    UnterminatedQuote(char),
    /// `&&` or `||` at the end of the line.
    #[error("missing command after operator {0}")]
    MissingCommandAfterOperator(&'static str),
    /// `&&` or `||` at the start of the line, or two operators in a row.
    #[error("missing command before operator {0}")]
    MissingCommandBeforeOperator(&'static str),
    /// `>`, `>>` or `<` as the last token of a clause.
    #[error("missing filename for redirection {0}")]
    MissingRedirectTarget(&'static str),
    /// A clause with redirections but no program to run, e.g. `> out.txt`.
    #[error("missing command name")]
    MissingCommandName,
}

/// Errors surfaced while running a line.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}: command not found")]
    CommandNotFound(String),

    /// Spawning, feeding or redirecting a program failed.
    #[error("{command}: {source}")]
    Execution {
        command: String,
        code: ExitCode,
        #[source]
        source: io::Error,
    },

    /// An OS call made on behalf of the shell failed (chdir, kill, /proc).
    #[error("{context}: {source}")]
    System {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("empty command in pipeline")]
    EmptyCommand,
}

impl ShellError {
    pub fn execution(command: impl Into<String>, source: io::Error) -> Self {
        ShellError::Execution {
            command: command.into(),
            code: EXIT_FAILURE,
            source,
        }
    }

    pub fn system(context: impl Into<String>, source: io::Error) -> Self {
        ShellError::System {
            context: context.into(),
            source,
        }
    }

    /// Exit code recorded in the context when this error is surfaced.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShellError::CommandNotFound(_) => EXIT_NOT_FOUND,
            ShellError::Execution { code, .. } => *code,
            ShellError::Parse(_) | ShellError::System { .. } | ShellError::EmptyCommand => {
                EXIT_FAILURE
            }
        }
    }

    /// Hard errors stop the remaining pipelines of the line. An unknown
    /// command is reported like any other failing command and the line goes on.
    pub fn halts_line(&self) -> bool {
        !matches!(self, ShellError::CommandNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_per_kind() {
        assert_eq!(ShellError::CommandNotFound("nope".into()).exit_code(), 127);
        assert_eq!(ShellError::EmptyCommand.exit_code(), 1);
        assert_eq!(
            ShellError::from(ParseError::MissingCommandName).exit_code(),
            1
        );
        let err = ShellError::execution("cat", io::Error::other("broken pipe"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_only_unknown_command_keeps_line_going() {
        assert!(!ShellError::CommandNotFound("nope".into()).halts_line());
        assert!(ShellError::EmptyCommand.halts_line());
        assert!(ShellError::system("cd", io::Error::other("denied")).halts_line());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ShellError::CommandNotFound("frob".into()).to_string(),
            "frob: command not found"
        );
        assert_eq!(
            ShellError::from(ParseError::MissingCommandAfterOperator("&&")).to_string(),
            "parse error: missing command after operator &&"
        );
    }
}

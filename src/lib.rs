//! A small interactive command shell.
//!
//! A line is split on `&&` / `||` into pipelines, every pipeline on `|` into
//! commands, and every command is tokenized with quote handling, `$VAR`
//! expansion and `<`, `>`, `>>` redirections. Pipelines run left to right with
//! short-circuit evaluation; the stages of a pipeline run one after another,
//! each one reading the buffered output of the previous one.
//!
//! The main entry point is [`Interpreter`]. Builtins (`cd`, `pwd`, `echo`,
//! `kill`, `ps`, `exit`) run in-process; everything else goes through the
//! [`System`] trait, implemented for the real operating system by
//! [`OsSystem`].

mod builtin;
pub mod command;
pub mod context;
pub mod error;
mod external;
mod interpreter;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod system;
#[cfg(test)]
mod test_support;

pub use command::{Command, ExitCode, LogicalOp, OutputRedirect, Pipeline};
pub use context::ExecutionContext;
pub use error::{ParseError, ShellError};
pub use external::{OsSystem, find_command_path};
pub use interpreter::Interpreter;
pub use system::{CommandOutput, ProcessInfo, System};

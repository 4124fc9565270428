use crate::command::{Command, ExitCode};
use crate::context::ExecutionContext;
use crate::error::ShellError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Signal sent by `kill` when none is given.
pub const SIGTERM: i32 = 15;

/// Result of running a program to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output. Empty when output went to a file.
    pub stdout: Vec<u8>,
    pub exit_code: ExitCode,
}

/// One row of `ps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: i32,
    pub command_line: String,
}

/// Everything the interpreter needs from the operating system.
///
/// The interpreter never spawns processes or touches the filesystem itself;
/// it goes through this trait so that the engine can be exercised against a
/// scripted implementation. See [`crate::OsSystem`] for the real one.
pub trait System {
    /// Runs `command` to completion.
    ///
    /// Standard input is `input` when given, else the command's input
    /// redirect, else the terminal. Standard output goes to the output
    /// redirect when set, else it is captured into [`CommandOutput::stdout`].
    /// A program that runs and exits non-zero is an `Ok` result; `Err` is
    /// reserved for names that do not resolve and for failures to start,
    /// feed or redirect the program.
    fn execute_command(
        &mut self,
        command: &Command,
        input: Option<&[u8]>,
        context: &ExecutionContext,
    ) -> Result<CommandOutput, ShellError>;

    fn change_directory(&mut self, path: &Path) -> Result<(), ShellError>;

    fn current_directory(&self) -> Result<PathBuf, ShellError>;

    fn environment(&self) -> HashMap<String, String>;

    fn kill_process(&mut self, pid: i32, signal: i32) -> Result<(), ShellError>;

    fn process_list(&self) -> Result<Vec<ProcessInfo>, ShellError>;
}

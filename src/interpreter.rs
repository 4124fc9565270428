use crate::builtin::{Builtin, Usage};
use crate::command::{Command, EXIT_FAILURE, ExitCode, Pipeline};
use crate::context::ExecutionContext;
use crate::error::ShellError;
use crate::external::OsSystem;
use crate::parser;
use crate::system::System;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use std::path::Path;

/// A minimal shell that parses lines and runs them against a [`System`].
///
/// The interpreter owns the [`ExecutionContext`] of the session and threads it
/// through every builtin and program it runs. See [`Default`] for an
/// interpreter backed by the real operating system.
///
/// Example
/// ```
/// use minishell::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let code = sh.execute_line_with_output("echo hello && echo world", &mut out).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(out, b"hello\nworld\n");
/// ```
pub struct Interpreter {
    ctx: ExecutionContext,
    system: Box<dyn System>,
}

impl Interpreter {
    /// Create an interpreter whose context is taken from `system`: its
    /// environment and its current directory.
    pub fn new(system: Box<dyn System>) -> Result<Self, ShellError> {
        let current_directory = system.current_directory()?;
        let ctx = ExecutionContext::new(current_directory, system.environment());
        Ok(Self::with_context(ctx, system))
    }

    pub fn with_context(ctx: ExecutionContext, system: Box<dyn System>) -> Self {
        Self { ctx, system }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.ctx.running
    }

    pub fn last_exit_code(&self) -> ExitCode {
        self.ctx.last_exit_code
    }

    /// Run one line, printing command output to the process stdout.
    pub fn execute_line(&mut self, line: &str) -> Result<ExitCode, ShellError> {
        self.execute_line_with_output(line, &mut io::stdout().lock())
    }

    /// Run one line, writing everything that would reach the terminal to `out`.
    ///
    /// Returns the last exit code after the line. `Err` means the line was
    /// cut short: it did not parse, or a pipeline failed in a way that stops
    /// the rest of the line. The exit code is recorded in either case.
    pub fn execute_line_with_output(
        &mut self,
        line: &str,
        out: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        if line.trim() == "exit" {
            self.ctx.stop();
            return Ok(self.ctx.last_exit_code);
        }

        let pipelines = match parser::parse_line(line, &self.ctx.environment) {
            Ok(pipelines) => pipelines,
            Err(e) => {
                self.ctx.update_exit_code(EXIT_FAILURE);
                return Err(e.into());
            }
        };

        self.execute_pipelines(&pipelines, out)?;
        out.flush()
            .map_err(|e| ShellError::system("write output", e))?;
        Ok(self.ctx.last_exit_code)
    }

    fn execute_pipelines(
        &mut self,
        pipelines: &[Pipeline],
        out: &mut dyn Write,
    ) -> Result<(), ShellError> {
        for (index, pipeline) in pipelines.iter().enumerate() {
            if !self.ctx.running {
                break;
            }
            if !pipeline.should_run(self.ctx.last_exit_code) {
                log::debug!(
                    "skipping pipeline {index}: {:?} after exit code {}",
                    pipeline.operator,
                    self.ctx.last_exit_code
                );
                continue;
            }

            match self.execute_pipeline(pipeline, out) {
                Ok(code) => self.ctx.update_exit_code(code),
                Err(e) => {
                    self.ctx.update_exit_code(e.exit_code());
                    if e.halts_line() {
                        return Err(e);
                    }
                    eprintln!("minishell: {e}");
                }
            }
        }
        Ok(())
    }

    fn execute_pipeline(
        &mut self,
        pipeline: &Pipeline,
        out: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        match pipeline.commands.as_slice() {
            [] | [None] => Err(ShellError::EmptyCommand),
            [Some(command)] => self.execute_single(command, out),
            stages => self.execute_pipe_chain(stages, out),
        }
    }

    fn execute_single(&mut self, command: &Command, out: &mut dyn Write) -> Result<ExitCode, ShellError> {
        warn_background(command);

        // Redirections are only honoured by the system, so a redirected
        // builtin takes the same path as any other program.
        if !command.has_redirection() {
            if let Some(resolved) = Builtin::resolve(&command.name, &command.args) {
                return self.run_builtin(&command.name, resolved, out);
            }
        }

        let output = self.system.execute_command(command, None, &self.ctx)?;
        if !command.redirects_output() {
            write_output(out, &output.stdout)?;
        }
        Ok(output.exit_code)
    }

    /// Runs `stages` left to right, each one reading everything the previous
    /// one wrote. Only the last stage may reach `out`.
    fn execute_pipe_chain(
        &mut self,
        stages: &[Option<Command>],
        out: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        let commands = stages
            .iter()
            .map(|stage| stage.as_ref().ok_or(ShellError::EmptyCommand))
            .collect::<Result<Vec<_>, _>>()?;

        let mut buffer: Option<Vec<u8>> = None;
        let mut exit_code = 0;
        for (index, command) in commands.iter().enumerate() {
            warn_background(command);
            let output = self
                .system
                .execute_command(command, buffer.as_deref(), &self.ctx)?;
            log::debug!(
                "stage {index} `{}` exited with {} ({} bytes)",
                command.name,
                output.exit_code,
                output.stdout.len()
            );
            exit_code = output.exit_code;
            if index + 1 == commands.len() && !command.redirects_output() {
                write_output(out, &output.stdout)?;
            }
            buffer = Some(output.stdout);
        }
        Ok(exit_code)
    }

    fn run_builtin(
        &mut self,
        name: &str,
        resolved: Result<Builtin, Usage>,
        out: &mut dyn Write,
    ) -> Result<ExitCode, ShellError> {
        let builtin = match resolved {
            Ok(builtin) => builtin,
            Err(usage) if usage.is_error => {
                eprintln!("minishell: {name}: {}", usage.output.trim_end());
                return Ok(EXIT_FAILURE);
            }
            Err(usage) => {
                write_output(out, usage.output.as_bytes())?;
                return Ok(0);
            }
        };

        let name = builtin.name();
        match builtin.execute(out, &mut self.ctx, self.system.as_mut()) {
            Ok(code) => Ok(code),
            Err(e) => {
                eprintln!("minishell: {name}: {e:#}");
                Ok(EXIT_FAILURE)
            }
        }
    }

    /// Read-Eval-Print Loop on the terminal.
    ///
    /// Runs until `exit`, end of input (Ctrl-D) or an interrupt (Ctrl-C).
    /// When `history` is given, it is loaded before the first prompt and
    /// saved when the loop ends.
    pub fn repl(&mut self, history: Option<&Path>) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        if let Some(path) = history {
            if let Err(e) = rl.load_history(path) {
                log::info!("no history loaded from {}: {e}", path.display());
            }
        }

        while self.ctx.running {
            match rl.readline(&self.ctx.prompt()) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    if let Err(e) = self.execute_line(&line) {
                        eprintln!("minishell: {e}");
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted");
                    self.ctx.stop();
                }
                Err(ReadlineError::Eof) => {
                    println!("Exit");
                    self.ctx.stop();
                }
                Err(err) => {
                    log::error!("reading input failed: {err}");
                    self.ctx.stop();
                    return Err(err);
                }
            }
        }

        if let Some(path) = history {
            rl.save_history(path)?;
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// Create an interpreter for the current process, running real programs.
    fn default() -> Self {
        Self::with_context(ExecutionContext::from_process(), Box::new(OsSystem::new()))
    }
}

fn warn_background(command: &Command) {
    if command.background {
        log::debug!("`{}` requested background execution; running in foreground", command.name);
    }
}

fn write_output(out: &mut dyn Write, bytes: &[u8]) -> Result<(), ShellError> {
    out.write_all(bytes)
        .map_err(|e| ShellError::system("write output", e))
}

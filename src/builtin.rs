use crate::command::ExitCode;
use crate::context::ExecutionContext;
use crate::system::{SIGTERM, System};
use anyhow::{Context, Result, anyhow, ensure};
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command, writing its output to `stdout`.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdout: &mut dyn Write,
        ctx: &mut ExecutionContext,
        system: &mut dyn System,
    ) -> Result<ExitCode>;
}

/// A builtin with its arguments already validated.
pub(crate) enum Builtin {
    Cd(Cd),
    Pwd(Pwd),
    Echo(Echo),
    Kill(Kill),
    Ps(Ps),
    Exit(Exit),
}

/// Text argh produced instead of a command: a usage error or `--help` output.
#[derive(Debug)]
pub(crate) struct Usage {
    pub output: String,
    pub is_error: bool,
}

impl Builtin {
    /// Resolves `name` into a builtin, parsing `args` into its argument shape.
    ///
    /// Returns `None` when `name` is not a builtin. `echo` never fails to
    /// parse: anything but a leading `-n` is printed as is.
    pub(crate) fn resolve(name: &str, args: &[String]) -> Option<Result<Builtin, Usage>> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let parsed = match name {
            "cd" => parse::<Cd>(&args).map(Builtin::Cd),
            "pwd" => parse::<Pwd>(&args).map(Builtin::Pwd),
            "echo" => Ok(Builtin::Echo(Echo::from_words(&args))),
            "kill" => parse::<Kill>(&args).map(Builtin::Kill),
            "ps" => parse::<Ps>(&args).map(Builtin::Ps),
            "exit" => parse::<Exit>(&args).map(Builtin::Exit),
            _ => return None,
        };
        Some(parsed)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Builtin::Cd(_) => Cd::name(),
            Builtin::Pwd(_) => Pwd::name(),
            Builtin::Echo(_) => Echo::name(),
            Builtin::Kill(_) => Kill::name(),
            Builtin::Ps(_) => Ps::name(),
            Builtin::Exit(_) => Exit::name(),
        }
    }

    pub(crate) fn execute(
        self,
        stdout: &mut dyn Write,
        ctx: &mut ExecutionContext,
        system: &mut dyn System,
    ) -> Result<ExitCode> {
        match self {
            Builtin::Cd(cmd) => cmd.execute(stdout, ctx, system),
            Builtin::Pwd(cmd) => cmd.execute(stdout, ctx, system),
            Builtin::Echo(cmd) => cmd.execute(stdout, ctx, system),
            Builtin::Kill(cmd) => cmd.execute(stdout, ctx, system),
            Builtin::Ps(cmd) => cmd.execute(stdout, ctx, system),
            Builtin::Exit(cmd) => cmd.execute(stdout, ctx, system),
        }
    }
}

fn parse<T: BuiltinCommand>(args: &[&str]) -> Result<T, Usage> {
    T::from_args(&[T::name()], args).map_err(|EarlyExit { output, status }| Usage {
        output,
        is_error: status.is_err(),
    })
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _ctx: &mut ExecutionContext,
        system: &mut dyn System,
    ) -> Result<ExitCode> {
        let dir = system.current_directory()?;
        writeln!(stdout, "{}", dir.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory, `-` for the previous one. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        ctx: &mut ExecutionContext,
        system: &mut dyn System,
    ) -> Result<ExitCode> {
        let back = self.target.as_deref() == Some("-");
        let target = match self.target.as_deref() {
            None | Some("") => ctx
                .environment
                .get("HOME")
                .filter(|home| !home.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("HOME not set"))?,
            Some("-") => ctx
                .environment
                .get("OLDPWD")
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("OLDPWD not set"))?,
            Some(t) => PathBuf::from(t),
        };

        let new_dir = ctx.current_directory.join(&target);
        system.change_directory(&new_dir)?;
        let resolved = system
            .current_directory()
            .with_context(|| format!("can't resolve {}", new_dir.display()))?;

        let previous = std::mem::replace(&mut ctx.current_directory, resolved);
        ctx.set_var("OLDPWD", previous.display().to_string());
        ctx.set_var("PWD", ctx.current_directory.display().to_string());
        if back {
            writeln!(stdout, "{}", ctx.current_directory.display())?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl Echo {
    fn from_words(words: &[&str]) -> Self {
        let (no_newline, rest) = match words.split_first() {
            Some((&"-n", rest)) => (true, rest),
            _ => (false, words),
        };
        Echo {
            no_newline,
            args: rest.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _ctx: &mut ExecutionContext,
        _system: &mut dyn System,
    ) -> Result<ExitCode> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Send a signal to a process.
pub struct Kill {
    #[argh(option, short = 's', default = "SIGTERM")]
    /// signal number to send (default: 15, SIGTERM).
    pub signal: i32,

    #[argh(positional)]
    /// id of the process to signal.
    pub pid: i32,
}

impl BuiltinCommand for Kill {
    fn name() -> &'static str {
        "kill"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        _ctx: &mut ExecutionContext,
        system: &mut dyn System,
    ) -> Result<ExitCode> {
        // 0 and negative ids address process groups, the shell's own included.
        ensure!(self.pid > 0, "({}): invalid process id", self.pid);
        system.kill_process(self.pid, self.signal)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List running processes.
pub struct Ps {}

impl BuiltinCommand for Ps {
    fn name() -> &'static str {
        "ps"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _ctx: &mut ExecutionContext,
        system: &mut dyn System,
    ) -> Result<ExitCode> {
        let processes = system.process_list()?;
        writeln!(stdout, "PID\tCMD")?;
        for process in processes {
            writeln!(stdout, "{}\t{}", process.pid, process.command_line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional)]
    /// exit status; defaults to the status of the last command.
    pub code: Option<i32>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        ctx: &mut ExecutionContext,
        _system: &mut dyn System,
    ) -> Result<ExitCode> {
        ctx.stop();
        Ok(self.code.unwrap_or(ctx.last_exit_code))
    }
}

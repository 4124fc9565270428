use anyhow::Result;
use argh::FromArgs;
use minishell::{Interpreter, logging};
use std::path::PathBuf;

#[derive(FromArgs)]
/// A small interactive shell with pipes, redirections and `&&` / `||`.
struct Args {
    #[argh(option, short = 'c')]
    /// run a single line and exit with its status.
    command: Option<String>,

    #[argh(option)]
    /// log level (off, error, warn, info, debug, trace). Defaults to $MINISHELL_LOG, then warn.
    log_level: Option<String>,

    #[argh(option)]
    /// append diagnostics to this file instead of stderr.
    log_file: Option<PathBuf>,

    #[argh(option)]
    /// file to load line history from and save it to.
    history: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    let level = logging::resolve_level(args.log_level.as_deref())?;
    logging::init(level, args.log_file.as_deref())?;

    let mut sh = Interpreter::default();
    match args.command {
        Some(line) => {
            if let Err(e) = sh.execute_line(&line) {
                eprintln!("minishell: {e}");
            }
        }
        None => sh.repl(args.history.as_deref())?,
    }

    log::debug!("session ended with exit code {}", sh.last_exit_code());
    std::process::exit(sh.last_exit_code());
}

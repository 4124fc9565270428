use anyhow::{Context, Result};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;
use std::path::Path;

/// Environment variable consulted when no level is given on the command line.
pub const LOG_LEVEL_VAR: &str = "MINISHELL_LOG";

/// Picks the level: explicit value, then `$MINISHELL_LOG`, then `warn`.
pub fn resolve_level(explicit: Option<&str>) -> Result<LevelFilter> {
    let from_env = std::env::var(LOG_LEVEL_VAR).ok();
    match explicit.or(from_env.as_deref()) {
        Some(level) => level
            .trim()
            .parse()
            .with_context(|| format!("invalid log level {level:?}")),
        None => Ok(LevelFilter::Warn),
    }
}

/// Install the global logger. Diagnostics go to stderr, or are appended to
/// `log_file` when one is given so they do not mix with command output.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("can't open log file {}", path.display()))?;
            WriteLogger::init(level, Config::default(), file)
        }
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    }
    .context("logger already initialised")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_wins() {
        assert_eq!(resolve_level(Some("debug")).unwrap(), LevelFilter::Debug);
        assert_eq!(resolve_level(Some("OFF")).unwrap(), LevelFilter::Off);
    }

    #[test]
    fn test_bad_level_is_an_error() {
        assert!(resolve_level(Some("chatty")).is_err());
    }
}

use crate::command::ExitCode;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable session state shared by every command executed by the interpreter.
///
/// The context contains:
/// - `environment`: variables visible to expansion and to spawned programs.
/// - `current_directory`: the working directory for command execution.
/// - `last_exit_code`: status of the most recently executed pipeline.
/// - `running`: cleared by `exit`, end of input or an interrupt.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub environment: HashMap<String, String>,
    pub current_directory: PathBuf,
    pub last_exit_code: ExitCode,
    pub running: bool,
}

impl ExecutionContext {
    pub fn new(current_directory: PathBuf, environment: HashMap<String, String>) -> Self {
        Self {
            environment,
            current_directory,
            last_exit_code: 0,
            running: true,
        }
    }

    /// Snapshot the current process: its variables and working directory.
    pub fn from_process() -> Self {
        let current_directory = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(current_directory, stdenv::vars().collect())
    }

    /// Get the value of a variable.
    ///
    /// Looks up the key in `self.environment` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.environment
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.environment.insert(key.into(), val.into());
    }

    pub fn update_exit_code(&mut self, code: ExitCode) {
        self.last_exit_code = code;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn prompt(&self) -> String {
        format!("minishell:{}$ ", self.current_directory.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_context() -> ExecutionContext {
        ExecutionContext::new(PathBuf::from("/tmp"), HashMap::new())
    }

    #[test]
    fn test_set_and_get_var() {
        let mut ctx = empty_context();

        // initially absent
        assert_eq!(ctx.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        ctx.set_var("KEY", "VALUE");
        assert_eq!(ctx.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_get_var_falls_back_to_process_env() {
        let ctx = empty_context();
        assert!(ctx.get_var("PATH").is_some());
    }

    #[test]
    fn test_context_var_shadows_process_env() {
        let mut ctx = empty_context();
        ctx.set_var("PATH", "/nowhere");
        assert_eq!(ctx.get_var("PATH").as_deref(), Some("/nowhere"));
    }

    #[test]
    fn test_prompt_and_stop() {
        let mut ctx = empty_context();
        assert_eq!(ctx.prompt(), "minishell:/tmp$ ");
        assert!(ctx.running);
        ctx.stop();
        assert!(!ctx.running);
    }

    #[test]
    fn test_from_process_captures_cwd() {
        let ctx = ExecutionContext::from_process();
        assert_eq!(ctx.last_exit_code, 0);
        assert!(ctx.environment.contains_key("PATH"));
    }
}

//! Test helpers shared by the unit tests of this crate.

#[cfg(test)]
pub mod mock {
    use crate::command::Command;
    use crate::context::ExecutionContext;
    use crate::error::ShellError;
    use crate::system::{CommandOutput, ProcessInfo, System};
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    /// One call to [`System::execute_command`] as seen by the mock.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Invocation {
        pub name: String,
        pub args: Vec<String>,
        pub input: Option<Vec<u8>>,
    }

    #[derive(Debug, Default)]
    struct State {
        invocations: Vec<Invocation>,
        files: HashMap<PathBuf, Vec<u8>>,
        dirs: HashSet<PathBuf>,
        cwd: PathBuf,
        changed: Vec<PathBuf>,
        signals: Vec<(i32, i32)>,
        processes: Vec<ProcessInfo>,
        env: HashMap<String, String>,
        failing_kill: bool,
    }

    /// Scripted [`System`] with a handful of fake programs.
    ///
    /// Clones share state, so a test can keep one handle and give another to
    /// the interpreter. Programs:
    /// - `true` / `false`: exit 0 / 1.
    /// - `emit ARGS..`: prints its arguments.
    /// - `upper`: uppercases its input.
    /// - `count`: prints the number of input lines.
    /// - `status N`: exits with N.
    /// - `explode`: fails to start (hard error).
    ///
    /// Anything else is not found. Redirect targets live in an in-memory
    /// file table relative to the context directory.
    #[derive(Debug, Clone, Default)]
    pub struct MockSystem {
        state: Rc<RefCell<State>>,
    }

    impl MockSystem {
        pub fn new() -> Self {
            let mock = Self::default();
            mock.state.borrow_mut().cwd = PathBuf::from("/work");
            mock.with_dir("/work")
        }

        pub fn with_dir(self, dir: &str) -> Self {
            self.state.borrow_mut().dirs.insert(PathBuf::from(dir));
            self
        }

        pub fn with_file(self, path: &str, contents: &str) -> Self {
            self.state
                .borrow_mut()
                .files
                .insert(PathBuf::from(path), contents.as_bytes().to_vec());
            self
        }

        pub fn with_env(self, key: &str, value: &str) -> Self {
            self.state
                .borrow_mut()
                .env
                .insert(key.to_string(), value.to_string());
            self
        }

        pub fn with_processes(self, processes: Vec<ProcessInfo>) -> Self {
            self.state.borrow_mut().processes = processes;
            self
        }

        pub fn failing_kill(self) -> Self {
            self.state.borrow_mut().failing_kill = true;
            self
        }

        pub fn invocations(&self) -> Vec<Invocation> {
            self.state.borrow().invocations.clone()
        }

        pub fn executed(&self) -> Vec<String> {
            self.state
                .borrow()
                .invocations
                .iter()
                .map(|i| i.name.clone())
                .collect()
        }

        pub fn file(&self, path: &str) -> Option<String> {
            self.state
                .borrow()
                .files
                .get(Path::new(path))
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        }

        pub fn changed_directories(&self) -> Vec<PathBuf> {
            self.state.borrow().changed.clone()
        }

        pub fn signals(&self) -> Vec<(i32, i32)> {
            self.state.borrow().signals.clone()
        }

        fn run_program(command: &Command, input: &[u8]) -> Result<CommandOutput, ShellError> {
            let (stdout, exit_code) = match command.name.as_str() {
                "true" => (Vec::new(), 0),
                "false" => (Vec::new(), 1),
                "emit" => (format!("{}\n", command.args.join(" ")).into_bytes(), 0),
                "upper" => (input.to_ascii_uppercase(), 0),
                "count" => {
                    let lines = input.iter().filter(|&&b| b == b'\n').count();
                    (format!("{lines}\n").into_bytes(), 0)
                }
                "status" => {
                    let code = command
                        .args
                        .first()
                        .and_then(|a| a.parse().ok())
                        .unwrap_or(1);
                    (Vec::new(), code)
                }
                "explode" => {
                    return Err(ShellError::execution(
                        "explode",
                        io::Error::from(io::ErrorKind::PermissionDenied),
                    ));
                }
                other => return Err(ShellError::CommandNotFound(other.to_string())),
            };
            Ok(CommandOutput { stdout, exit_code })
        }
    }

    impl System for MockSystem {
        fn execute_command(
            &mut self,
            command: &Command,
            input: Option<&[u8]>,
            context: &ExecutionContext,
        ) -> Result<CommandOutput, ShellError> {
            let mut state = self.state.borrow_mut();
            state.invocations.push(Invocation {
                name: command.name.clone(),
                args: command.args.clone(),
                input: input.map(<[u8]>::to_vec),
            });

            let stdin = match (input, &command.input_redirect) {
                (Some(bytes), _) => bytes.to_vec(),
                (None, Some(path)) => {
                    let path = context.current_directory.join(path);
                    state.files.get(&path).cloned().ok_or_else(|| {
                        ShellError::execution(
                            format!("{}", path.display()),
                            io::Error::from(io::ErrorKind::NotFound),
                        )
                    })?
                }
                (None, None) => Vec::new(),
            };

            let mut output = Self::run_program(command, &stdin)?;
            if let Some(redirect) = &command.output_redirect {
                let path = context.current_directory.join(&redirect.path);
                let file = state.files.entry(path).or_default();
                if !redirect.append {
                    file.clear();
                }
                file.append(&mut output.stdout);
            }
            Ok(output)
        }

        fn change_directory(&mut self, path: &Path) -> Result<(), ShellError> {
            let mut state = self.state.borrow_mut();
            if !state.dirs.contains(path) {
                return Err(ShellError::system(
                    format!("cd: {}", path.display()),
                    io::Error::from(io::ErrorKind::NotFound),
                ));
            }
            state.cwd = path.to_path_buf();
            state.changed.push(path.to_path_buf());
            Ok(())
        }

        fn current_directory(&self) -> Result<PathBuf, ShellError> {
            Ok(self.state.borrow().cwd.clone())
        }

        fn environment(&self) -> HashMap<String, String> {
            self.state.borrow().env.clone()
        }

        fn kill_process(&mut self, pid: i32, signal: i32) -> Result<(), ShellError> {
            let mut state = self.state.borrow_mut();
            if state.failing_kill {
                return Err(ShellError::system(
                    format!("kill: ({pid})"),
                    io::Error::from(io::ErrorKind::PermissionDenied),
                ));
            }
            state.signals.push((pid, signal));
            Ok(())
        }

        fn process_list(&self) -> Result<Vec<ProcessInfo>, ShellError> {
            Ok(self.state.borrow().processes.clone())
        }
    }
}

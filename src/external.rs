use crate::command::{Command, ExitCode};
use crate::context::ExecutionContext;
use crate::error::ShellError;
use crate::system::{CommandOutput, ProcessInfo, System};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::thread;

/// Exit code for a program that was found but could not be started.
const EXIT_CANNOT_EXECUTE: ExitCode = 126;

/// [`System`] backed by the real operating system.
#[derive(Debug, Default)]
pub struct OsSystem;

impl OsSystem {
    pub fn new() -> Self {
        OsSystem
    }
}

impl System for OsSystem {
    fn execute_command(
        &mut self,
        command: &Command,
        input: Option<&[u8]>,
        context: &ExecutionContext,
    ) -> Result<CommandOutput, ShellError> {
        let search_paths = context.get_var("PATH").unwrap_or_default();
        let program = find_command_path(
            OsStr::new(&search_paths),
            &context.current_directory,
            Path::new(&command.name),
        )
        .ok_or_else(|| ShellError::CommandNotFound(command.name.clone()))?;

        let stdin = match (input, &command.input_redirect) {
            (Some(_), _) => Stdio::piped(),
            (None, Some(path)) => {
                let path = context.current_directory.join(path);
                let file = File::open(&path).map_err(|e| redirect_error(&path, e))?;
                Stdio::from(file)
            }
            (None, None) => Stdio::inherit(),
        };

        let stdout = match &command.output_redirect {
            Some(redirect) => {
                let path = context.current_directory.join(&redirect.path);
                let mut options = OpenOptions::new();
                options.write(true).create(true);
                if redirect.append {
                    options.append(true);
                } else {
                    options.truncate(true);
                }
                let file = options.open(&path).map_err(|e| redirect_error(&path, e))?;
                Stdio::from(file)
            }
            None => Stdio::piped(),
        };

        log::debug!("spawning {} {:?}", program.display(), command.args);
        let mut child = std::process::Command::new(&program)
            .args(&command.args)
            .stdin(stdin)
            .stdout(stdout)
            .envs(context.environment.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&context.current_directory)
            .spawn()
            .map_err(|e| spawn_error(&command.name, e))?;

        // Feed stdin from a helper thread so a child that writes a lot before
        // reading cannot deadlock against us.
        let feeder = match (input, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => {
                let bytes = bytes.to_vec();
                Some(thread::spawn(move || pipe.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|e| ShellError::execution(command.name.as_str(), e))?;

        if let Some(Ok(Err(e))) = feeder.map(|handle| handle.join()) {
            // The child may legitimately exit without reading all of its input.
            if e.kind() != io::ErrorKind::BrokenPipe {
                return Err(ShellError::execution(command.name.as_str(), e));
            }
        }

        let exit_code = output
            .status
            .code()
            .unwrap_or_else(|| terminated_by_signal(output.status));
        Ok(CommandOutput {
            stdout: output.stdout,
            exit_code,
        })
    }

    fn change_directory(&mut self, path: &Path) -> Result<(), ShellError> {
        std::env::set_current_dir(path)
            .map_err(|e| ShellError::system(format!("cd: {}", path.display()), e))
    }

    fn current_directory(&self) -> Result<PathBuf, ShellError> {
        std::env::current_dir().map_err(|e| ShellError::system("getcwd", e))
    }

    fn environment(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }

    #[cfg(unix)]
    fn kill_process(&mut self, pid: i32, signal: i32) -> Result<(), ShellError> {
        // SAFETY: kill(2) takes plain integers and touches no memory of ours.
        let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
        if rc == 0 {
            Ok(())
        } else {
            Err(ShellError::system(
                format!("kill: ({pid})"),
                io::Error::last_os_error(),
            ))
        }
    }

    #[cfg(not(unix))]
    fn kill_process(&mut self, pid: i32, _signal: i32) -> Result<(), ShellError> {
        Err(ShellError::system(
            format!("kill: ({pid})"),
            io::Error::from(io::ErrorKind::Unsupported),
        ))
    }

    fn process_list(&self) -> Result<Vec<ProcessInfo>, ShellError> {
        let entries = fs::read_dir("/proc").map_err(|e| ShellError::system("ps: /proc", e))?;

        let mut processes = Vec::new();
        for entry in entries.flatten() {
            let Ok(pid) = entry.file_name().to_string_lossy().parse::<i32>() else {
                continue;
            };
            // Processes can exit while we walk the directory.
            let Ok(raw) = fs::read(entry.path().join("cmdline")) else {
                continue;
            };
            let command_line = String::from_utf8_lossy(&raw)
                .replace('\0', " ")
                .trim()
                .to_string();
            // Kernel threads have an empty command line.
            if !command_line.is_empty() {
                processes.push(ProcessInfo { pid, command_line });
            }
        }
        processes.sort_by_key(|p| p.pid);
        Ok(processes)
    }
}

fn redirect_error(path: &Path, source: io::Error) -> ShellError {
    ShellError::execution(path.display().to_string(), source)
}

fn spawn_error(name: &str, source: io::Error) -> ShellError {
    match source.kind() {
        io::ErrorKind::NotFound => ShellError::CommandNotFound(name.to_string()),
        _ => ShellError::Execution {
            command: name.to_string(),
            code: EXIT_CANNOT_EXECUTE,
            source,
        },
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is a file.
/// - Relative with multiple components (e.g., `bin/sh` or `./foo`): resolved
///   against `cwd`, returned if it is a file.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path(search_paths: &OsStr, cwd: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return find_by_path(path);
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        // Empty path -> not found
        (None, None) => None,
        // Single component -> search in PATH, unless written as `./foo`
        (Some(std::path::Component::Normal(x)), None) => find_in_path(search_paths, x),
        // Multiple components -> relative to the working directory
        _ => find_by_path(&cwd.join(path)),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .find_map(|dir| find_by_path(&dir.join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

use std::fmt;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Exit code reported when a command name cannot be resolved.
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// Exit code for generic failures (bad arguments, failed OS calls, parse errors).
pub const EXIT_FAILURE: ExitCode = 1;

/// Where a command's standard output goes instead of the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    /// Target file, exactly as written on the command line.
    pub path: String,
    /// `>>` when true, `>` otherwise.
    pub append: bool,
}

/// A single command of a pipeline, e.g. `grep -i foo < in.txt >> out.txt`.
///
/// Produced by the parser for every `|`-delimited clause and consumed once by
/// the interpreter. Redirection paths are not validated until execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    pub input_redirect: Option<String>,
    pub output_redirect: Option<OutputRedirect>,
    pub background: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            input_redirect: None,
            output_redirect: None,
            background: false,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// True when either standard stream is rerouted to a file.
    pub fn has_redirection(&self) -> bool {
        self.input_redirect.is_some() || self.output_redirect.is_some()
    }

    pub fn redirects_output(&self) -> bool {
        self.output_redirect.is_some()
    }
}

/// Renders the command back into text the parser accepts.
///
/// Words that would be split or reinterpreted are quoted, so
/// `parse_command(&cmd.to_string())` yields an equal command as long as no
/// word looks like a variable reference.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_word(&self.name))?;
        for arg in &self.args {
            write!(f, " {}", quote_word(arg))?;
        }
        if let Some(input) = &self.input_redirect {
            write!(f, " < {}", quote_word(input))?;
        }
        if let Some(output) = &self.output_redirect {
            let op = if output.append { ">>" } else { ">" };
            write!(f, " {} {}", op, quote_word(&output.path))?;
        }
        if self.background {
            write!(f, " &")?;
        }
        Ok(())
    }
}

fn quote_word(word: &str) -> String {
    let needs_quotes = word.is_empty()
        || matches!(word, ">" | ">>" | "<" | "&")
        || word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '|' | '&'));
    if !needs_quotes {
        return word.to_string();
    }
    if !word.contains('"') {
        return format!("\"{}\"", word);
    }
    if !word.contains('\'') {
        return format!("'{}'", word);
    }
    // Both quote kinds: single-quote the runs between `'` and double-quote
    // each `'`. The lexer joins adjacent quoted regions into one word.
    let mut quoted = String::new();
    for (i, part) in word.split('\'').enumerate() {
        if i > 0 {
            quoted.push_str("\"'\"");
        }
        if !part.is_empty() {
            quoted.push('\'');
            quoted.push_str(part);
            quoted.push('\'');
        }
    }
    quoted
}

/// Logical operator joining two pipelines on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`: run the next pipeline only after success.
    And,
    /// `||`: run the next pipeline only after failure.
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One or more commands connected by `|`.
///
/// A stage is `None` when its clause was empty (`a | | b`); running such a
/// pipeline fails and stops the rest of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Option<Command>>,
    /// `None` for the first pipeline of a line, otherwise the operator before it.
    pub operator: Option<LogicalOp>,
}

impl Pipeline {
    pub fn new(commands: Vec<Option<Command>>) -> Self {
        Self {
            commands,
            operator: None,
        }
    }

    pub fn single(command: Command) -> Self {
        Self::new(vec![Some(command)])
    }

    pub fn is_single_command(&self) -> bool {
        self.commands.len() == 1
    }

    /// Short-circuit rule evaluated against the exit code current at the time
    /// this pipeline is reached.
    pub fn should_run(&self, last_exit_code: ExitCode) -> bool {
        match self.operator {
            None => true,
            Some(LogicalOp::And) => last_exit_code == 0,
            Some(LogicalOp::Or) => last_exit_code != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_circuit_rules() {
        let mut p = Pipeline::single(Command::new("true"));
        assert!(p.should_run(0));
        assert!(p.should_run(1));

        p.operator = Some(LogicalOp::And);
        assert!(p.should_run(0));
        assert!(!p.should_run(127));

        p.operator = Some(LogicalOp::Or);
        assert!(!p.should_run(0));
        assert!(p.should_run(2));
    }

    #[test]
    fn test_display_quotes_words_with_spaces() {
        let mut cmd = Command::new("grep").with_args(["a b", "plain"]);
        cmd.output_redirect = Some(OutputRedirect {
            path: "out file.txt".to_string(),
            append: true,
        });
        assert_eq!(cmd.to_string(), "grep \"a b\" plain >> \"out file.txt\"");
    }

    #[test]
    fn test_display_prefers_single_quotes_around_double_quotes() {
        let cmd = Command::new("echo").with_args(["say \"hi\""]);
        assert_eq!(cmd.to_string(), "echo 'say \"hi\"'");
    }

    #[test]
    fn test_display_splits_words_with_both_quote_kinds() {
        let mut cmd = Command::new("sort");
        cmd.output_redirect = Some(OutputRedirect {
            path: "a'b\"c".to_string(),
            append: true,
        });
        assert_eq!(cmd.to_string(), r#"sort >> 'a'"'"'b"c'"#);

        let cmd = Command::new("echo").with_args(["'x\""]);
        assert_eq!(cmd.to_string(), r#"echo "'"'x"'"#);
    }

    #[test]
    fn test_has_redirection() {
        let mut cmd = Command::new("cat");
        assert!(!cmd.has_redirection());
        cmd.input_redirect = Some("in.txt".to_string());
        assert!(cmd.has_redirection());
        assert!(!cmd.redirects_output());
    }
}

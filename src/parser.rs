//! Turns a line of input into pipelines ready for execution.
//!
//! Parsing happens in layers: the line is split on `&&` / `||`, every segment
//! is split on `|`, and every clause is tokenized, expanded and classified
//! into a [`Command`]. All splitting respects quotes.

use crate::command::{Command, LogicalOp, OutputRedirect, Pipeline};
use crate::error::ParseError;
use crate::lexer::{self, QuoteState, Token};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::env as stdenv;
use std::sync::LazyLock;

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("variable pattern is valid")
});

/// Replaces `$NAME` and `${NAME}` references inside `word`.
///
/// Names resolve against `env` first, then the real process environment;
/// unknown names become the empty string. A `$` not followed by a name is
/// kept as is.
pub fn expand_variables(word: &str, env: &HashMap<String, String>) -> String {
    VARIABLE
        .replace_all(word, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            env.get(name)
                .cloned()
                .or_else(|| stdenv::var(name).ok())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Splits a line on unquoted `&&` and `||`.
///
/// Every segment comes back trimmed and paired with the operator that
/// preceded it; the first segment has none. A blank line yields no segments.
pub fn split_logical(line: &str) -> Result<Vec<(Option<LogicalOp>, String)>, ParseError> {
    let chars: Vec<char> = line.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut pending: Option<LogicalOp> = None;
    let mut quotes = QuoteState::default();

    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let unquoted = quotes.advance(ch);

        if unquoted && i + 1 < chars.len() {
            let op = match (ch, chars[i + 1]) {
                ('&', '&') => Some(LogicalOp::And),
                ('|', '|') => Some(LogicalOp::Or),
                _ => None,
            };
            if let Some(op) = op {
                let segment = current.trim();
                if segment.is_empty() {
                    return Err(ParseError::MissingCommandBeforeOperator(op.as_str()));
                }
                parts.push((pending, segment.to_string()));
                current.clear();
                pending = Some(op);
                i += 2;
                continue;
            }
        }

        current.push(ch);
        i += 1;
    }

    let segment = current.trim();
    match pending {
        Some(op) if segment.is_empty() => {
            return Err(ParseError::MissingCommandAfterOperator(op.as_str()));
        }
        None if segment.is_empty() => {}
        _ => parts.push((pending, segment.to_string())),
    }

    Ok(parts)
}

/// Splits a segment on unquoted `|` and trims each clause.
pub fn split_pipeline(segment: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quotes = QuoteState::default();
    let mut start = 0;

    for (idx, ch) in segment.char_indices() {
        if quotes.advance(ch) && ch == '|' {
            pieces.push(segment[start..idx].trim());
            start = idx + 1;
        }
    }
    pieces.push(segment[start..].trim());
    pieces
}

/// Parses a `|`-free clause into a [`Command`].
///
/// Returns `Ok(None)` for a blank clause. Every token is expanded first and
/// then classified, so `$R` holding `>` redirects unless it was quoted.
/// `>`, `>>` and `<` take the next token as their path (the last one of each kind wins), a standalone `&`
/// marks the command as background, everything else is positional.
pub fn parse_command(
    clause: &str,
    env: &HashMap<String, String>,
) -> Result<Option<Command>, ParseError> {
    let tokens = lexer::tokenize(clause)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut words = Vec::new();
    let mut input_redirect = None;
    let mut output_redirect = None;
    let mut background = false;

    let mut tokens = tokens.into_iter();
    while let Some(token) = tokens.next() {
        // Operators are recognised after expansion, unless the word was quoted.
        let word = expand_variables(&token.text, env);
        let op = if token.quoted { None } else { lexer::operator(&word) };
        match op {
            Some(op @ (">" | ">>")) => {
                output_redirect = Some(OutputRedirect {
                    path: redirect_target(&mut tokens, op, env)?,
                    append: op == ">>",
                });
            }
            Some(op @ "<") => {
                input_redirect = Some(redirect_target(&mut tokens, op, env)?);
            }
            Some(_) => background = true,
            None => words.push(word),
        }
    }

    let mut words = words.into_iter();
    let name = match words.next() {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ParseError::MissingCommandName),
    };

    Ok(Some(Command {
        name,
        args: words.collect(),
        input_redirect,
        output_redirect,
        background,
    }))
}

fn redirect_target(
    tokens: &mut impl Iterator<Item = Token>,
    op: &'static str,
    env: &HashMap<String, String>,
) -> Result<String, ParseError> {
    tokens
        .next()
        .map(|target| expand_variables(&target.text, env))
        .ok_or(ParseError::MissingRedirectTarget(op))
}

/// Parses one `&&`/`||`-free segment into a [`Pipeline`] with no operator.
pub fn parse_pipeline(segment: &str, env: &HashMap<String, String>) -> Result<Pipeline, ParseError> {
    let commands = split_pipeline(segment)
        .into_iter()
        .map(|clause| parse_command(clause, env))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Pipeline::new(commands))
}

/// Parses a full input line.
///
/// The first pipeline carries no operator; every later one carries the
/// operator written before it. A blank line gives an empty vector.
pub fn parse_line(line: &str, env: &HashMap<String, String>) -> Result<Vec<Pipeline>, ParseError> {
    let mut pipelines = Vec::new();
    for (operator, segment) in split_logical(line.trim())? {
        let mut pipeline = parse_pipeline(&segment, env)?;
        pipeline.operator = operator;
        pipelines.push(pipeline);
    }
    log::debug!("parsed {:?} into {} pipeline(s)", line, pipelines.len());
    Ok(pipelines)
}

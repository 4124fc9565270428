//! Lexical analysis (tokenization) of a single command clause.

use crate::error::ParseError;

/// A word produced by the tokenizer, with quote delimiters already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Some part of the word was quoted. Quoted words are never operators,
    /// so `echo ">"` prints a bracket instead of redirecting.
    pub quoted: bool,
}

/// Returns the canonical spelling when `text` is one of the clause operators.
pub(crate) fn operator(text: &str) -> Option<&'static str> {
    match text {
        ">" => Some(">"),
        ">>" => Some(">>"),
        "<" => Some("<"),
        "&" => Some("&"),
        _ => None,
    }
}

/// Tracks which quote character, if any, is open while scanning a line.
///
/// Shared by the tokenizer and by the operator and pipe splitters so that all
/// of them agree on what counts as quoted text.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct QuoteState {
    open: Option<char>,
}

impl QuoteState {
    /// Feeds one character. Returns true when `ch` is outside any quoted
    /// region and is not itself a quote delimiter.
    pub(crate) fn advance(&mut self, ch: char) -> bool {
        match self.open {
            Some(q) => {
                if ch == q {
                    self.open = None;
                }
                false
            }
            None if ch == '"' || ch == '\'' => {
                self.open = Some(ch);
                false
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    quoted: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            quoted: false,
        }
    }

    /// Runs the state machine over the whole input.
    ///
    /// Whitespace outside quotes ends a word; a quote switches to the matching
    /// quoted state until the same character shows up again. Text on both
    /// sides of a quoted region joins into one word.
    fn make_tokens(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_quoted(ch, '\''),
                LexingState::ReadingDoubleQuote => self.handle_quoted(ch, '"'),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote => Err(ParseError::UnterminatedQuote('\'')),
            LexingState::ReadingDoubleQuote => Err(ParseError::UnterminatedQuote('"')),
            LexingState::ReadingWord => {
                self.finish_token(&mut out);
                Ok(out)
            }
            LexingState::Start => Ok(out),
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char) {
        match ch {
            c if c.is_whitespace() => {}
            '\'' => self.open_quote(LexingState::ReadingSingleQuote),
            '"' => self.open_quote(LexingState::ReadingDoubleQuote),
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            c if c.is_whitespace() => {
                self.finish_token(out);
                self.state = LexingState::Start;
            }
            '\'' => self.open_quote(LexingState::ReadingSingleQuote),
            '"' => self.open_quote(LexingState::ReadingDoubleQuote),
            c => self.buffer.push(c),
        }
    }

    fn handle_quoted(&mut self, ch: char, delimiter: char) {
        if ch == delimiter {
            // Stay inside the word: `a"b"c` is a single token.
            self.state = LexingState::ReadingWord;
        } else {
            self.buffer.push(ch);
        }
    }

    fn open_quote(&mut self, state: LexingState) {
        self.quoted = true;
        self.state = state;
    }

    fn finish_token(&mut self, out: &mut Vec<Token>) {
        out.push(Token {
            text: std::mem::take(&mut self.buffer),
            quoted: std::mem::replace(&mut self.quoted, false),
        });
    }
}

/// Splits one clause into words.
///
/// Returns an empty vector for blank input and
/// [`ParseError::UnterminatedQuote`] when a quote is never closed.
pub fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    LexingFSM::new(line).make_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        tokenize(line)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_quoted_argument_keeps_spaces() {
        assert_eq!(texts(r#"echo "a b" c"#), vec!["echo", "a b", "c"]);
    }

    #[test]
    fn test_blank_input_has_no_tokens() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_other_quote_is_literal_inside_quotes() {
        assert_eq!(texts(r#"echo "it's" 'say "hi"'"#), vec!["echo", "it's", "say \"hi\""]);
    }

    #[test]
    fn test_adjacent_quoted_and_plain_text_join() {
        assert_eq!(texts(r#"pre"mid dle"post x"#), vec!["premid dlepost", "x"]);
    }

    #[test]
    fn test_empty_quotes_give_empty_token() {
        let tokens = tokenize(r#"printf '' x"#).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].text, "");
        assert!(tokens[1].quoted);
    }

    #[test]
    fn test_tabs_and_repeated_spaces_split() {
        assert_eq!(texts("ls\t-l    /tmp  "), vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn test_unterminated_quote_is_an_error() {
        assert_eq!(
            tokenize(r#"echo "oops"#),
            Err(ParseError::UnterminatedQuote('"'))
        );
        assert_eq!(
            tokenize("echo 'oops"),
            Err(ParseError::UnterminatedQuote('\''))
        );
    }

    #[test]
    fn test_quoted_operator_is_not_an_operator() {
        let tokens = tokenize(r#"echo ">" > out"#).unwrap();
        assert!(tokens[1].quoted);
        assert_eq!(operator(&tokens[1].text), Some(">"));
        assert!(!tokens[2].quoted);
        assert_eq!(operator(&tokens[2].text), Some(">"));
        assert_eq!(operator("out"), None);
    }

    #[test]
    fn test_quote_state_tracks_regions() {
        let mut state = QuoteState::default();
        let visible: String = r#"a"|"b'|'|"#
            .chars()
            .filter(|&c| state.advance(c))
            .collect();
        assert_eq!(visible, "ab|");
    }
}

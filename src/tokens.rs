//! Line tokenizer for decTest scripts.
//!
//! One raw line becomes an ordered list of unquoted tokens. Quoting uses
//! `'` or `"` with a doubled quote as the escape for an embedded quote
//! character; an unquoted token runs until whitespace or `:`; a token
//! starting with `--` comments out the rest of the line.

const COMMENT: &str = "--";

struct Cursor<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    fn bump(&mut self) {
        // Tokens only ever split at ASCII bytes, so byte-wise advancing
        // keeps slice boundaries valid for any UTF-8 input.
        self.i += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Span of the next raw token, or None at end of line.
    fn next_span(&mut self) -> Option<(usize, usize)> {
        self.skip_whitespace();
        if self.eof() {
            return None;
        }
        let start = self.i;
        match self.peek() {
            Some(q @ (b'\'' | b'"')) => {
                self.bump();
                while let Some(c) = self.peek() {
                    self.bump();
                    if c == q {
                        if self.peek() == Some(q) {
                            // doubled quote: stays inside the token
                            self.bump();
                        } else {
                            break;
                        }
                    }
                }
                // an unterminated quote simply closes at end of line
            }
            _ => {
                self.bump();
                while let Some(c) = self.peek() {
                    if c.is_ascii_whitespace() || c == b':' {
                        break;
                    }
                    self.bump();
                }
            }
        }
        Some((start, self.i))
    }
}

/// Strip the surrounding quotes and collapse doubled quote characters.
fn unquote(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let quote = match bytes.first() {
        Some(q @ (b'\'' | b'"')) => *q,
        _ => return raw.to_string(),
    };
    let inner = if bytes.len() >= 2 && bytes[bytes.len() - 1] == quote {
        &raw[1..raw.len() - 1]
    } else {
        &raw[1..]
    };
    let mut out = String::with_capacity(inner.len());
    let mut prev_quote = false;
    for c in inner.chars() {
        if prev_quote {
            prev_quote = false;
            if c as u32 == quote as u32 {
                continue; // second half of a doubled quote
            }
        }
        if c as u32 == quote as u32 {
            prev_quote = true;
        }
        out.push(c);
    }
    out
}

/// Split one script line into tokens. Blank and comment-only lines yield an
/// empty list.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut cursor = Cursor::new(line);
    let mut tokens = Vec::new();
    while let Some((start, end)) = cursor.next_span() {
        let raw = &line[start..end];
        if raw.starts_with(COMMENT) {
            break;
        }
        tokens.push(unquote(raw));
    }
    tokens
}

/// A directive line is exactly `name : value`.
pub fn is_directive(tokens: &[String]) -> bool {
    tokens.len() == 3 && tokens[1] == ":"
}

/// A test line carries the literal arrow token somewhere after the operator.
pub fn is_test(tokens: &[String]) -> bool {
    tokens.iter().any(|t| t == "->")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line)
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(toks("addx001 add 1 1 -> 2"), ["addx001", "add", "1", "1", "->", "2"]);
    }

    #[test]
    fn blank_and_comment_lines_are_empty() {
        assert_eq!(toks(""), Vec::<String>::new());
        assert_eq!(toks("   \t  "), Vec::<String>::new());
        assert_eq!(toks("-- a comment"), Vec::<String>::new());
    }

    #[test]
    fn comment_truncates_line() {
        assert_eq!(toks("abc -- ignore this -> 1"), ["abc"]);
    }

    #[test]
    fn colon_breaks_unquoted_tokens() {
        assert_eq!(toks("precision: 9"), ["precision", ":", "9"]);
        assert_eq!(toks("precision : 9"), ["precision", ":", "9"]);
    }

    #[test]
    fn doubled_quote_is_escape() {
        assert_eq!(toks("'it''s'"), ["it's"]);
        assert_eq!(toks(r#""say ""hi""""#), [r#"say "hi""#]);
    }

    #[test]
    fn quoted_token_may_hold_whitespace_and_colon() {
        assert_eq!(toks("'a b : c' x"), ["a b : c", "x"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(toks("'no close"), ["no close"]);
    }

    #[test]
    fn directive_and_test_shapes() {
        let d = toks("rounding : half_even");
        assert!(is_directive(&d));
        assert!(!is_test(&d));
        let t = toks("addx001 add 1 1 -> 2");
        assert!(is_test(&t));
        assert!(!is_directive(&t));
    }

    proptest! {
        // Any literal without whitespace, quotes, or colons survives as a
        // single token, as long as it does not look like a comment opener.
        #[test]
        fn single_token_round_trip(s in "[A-Za-z0-9#.+_]{1,40}") {
            prop_assume!(!s.starts_with("--"));
            prop_assert_eq!(tokenize(&s), vec![s]);
        }
    }
}

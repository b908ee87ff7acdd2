use std::borrow::Cow;

/// The kind of a [Token] produced by [tokenize].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare identifier, like a country tag or a field name.
    Ident,
    /// A quoted string, with the quotes stripped and escapes resolved.
    String,
    /// A numeric literal. The save format has no integer/float distinction.
    Number,
    LBrace,
    RBrace,
    Equals,
    /// The terminator token, always exactly one at the end of the stream.
    EndOfInput,
}

/// A single token cut out of the save text.
/// Tokens are created once by [tokenize] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The token text. Borrowed from the source except for strings
    /// containing escapes, which need a rebuilt buffer.
    pub text: Cow<'a, str>,
    /// Byte offset of the token start in the source text.
    pub pos: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, text: &'a str, pos: usize) -> Self {
        Token {
            kind,
            text: Cow::Borrowed(text),
            pos,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '-'
}

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

/// The scanner state behind [tokenize].
/// Walks the raw bytes left to right, restarting the rule table after
/// every produced token. There is no error path: anything the rules
/// do not recognize is skipped one byte at a time.
struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Scanner<'a> {
    /// Skip whitespace and `#` comments. Comments run to the end of the
    /// line, exclusive, so the newline itself is consumed as whitespace
    /// on the next pass.
    fn skip_whitespace(&mut self) {
        while self.i < self.bytes.len() {
            let c = self.bytes[self.i];
            if c == b'#' {
                while self.i < self.bytes.len() && self.bytes[self.i] != b'\n' {
                    self.i += 1;
                }
                continue;
            }
            if !(c as char).is_whitespace() {
                return;
            }
            self.i += 1;
        }
    }

    /// Read a quoted string. A `\` copies the following character
    /// literally, so `\"` yields `"` and `\n` yields the letter `n`;
    /// no escape codes are interpreted. An unterminated string runs to
    /// the end of input.
    fn read_string(&mut self) -> Token<'a> {
        let start = self.i;
        self.i += 1;
        let content_start = self.i;
        let mut escaped = false;
        while self.i < self.bytes.len() {
            let c = self.bytes[self.i];
            if c == b'\\' && self.i + 1 < self.bytes.len() {
                escaped = true;
                // the escaped character may be multi-byte
                let next = self.src[self.i + 1..].chars().next().unwrap();
                self.i += 1 + next.len_utf8();
                continue;
            }
            if c == b'"' {
                break;
            }
            self.i += 1;
        }
        let raw = &self.src[content_start..self.i];
        if self.i < self.bytes.len() {
            // consume the closing quote
            self.i += 1;
        }
        let text = if escaped {
            let mut out = String::with_capacity(raw.len());
            let mut chars = raw.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else {
                    out.push(c);
                }
            }
            Cow::Owned(out)
        } else {
            Cow::Borrowed(raw)
        };
        Token {
            kind: TokenKind::String,
            text,
            pos: start,
        }
    }

    /// Read a number: optional `-`, digits, optionally one `.` and more
    /// digits. Scanning stops at the first byte that does not fit, so a
    /// dotted date like `1936.1.1` only yields `1936.1` here and the
    /// rest is re-scanned from the top. That split is how the save
    /// format has always been read by this tool, so it stays.
    fn read_number(&mut self) -> Token<'a> {
        let start = self.i;
        let mut j = self.i;
        if self.bytes[j] == b'-' {
            j += 1;
        }
        while j < self.bytes.len() && self.bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j < self.bytes.len() && self.bytes[j] == b'.' {
            j += 1;
            while j < self.bytes.len() && self.bytes[j].is_ascii_digit() {
                j += 1;
            }
        }
        let text = &self.src[self.i..j];
        self.i = j;
        Token::new(TokenKind::Number, text, start)
    }

    /// Read an identifier: letters, digits, `_`, `.` and `-` after a
    /// letter or `_` start.
    fn read_ident(&mut self) -> Token<'a> {
        let start = self.i;
        let mut j = self.i;
        while j < self.bytes.len() {
            let c = self.src[j..].chars().next().unwrap();
            if is_ident_continue(c) {
                j += c.len_utf8();
            } else {
                break;
            }
        }
        let text = &self.src[self.i..j];
        self.i = j;
        Token::new(TokenKind::Ident, text, start)
    }
}

/// Cut the given text into a token stream terminated by a single
/// [TokenKind::EndOfInput] token. This never fails: unrecognized bytes
/// are skipped silently.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut scanner = Scanner {
        src: text,
        bytes: text.as_bytes(),
        i: 0,
    };
    let mut out = Vec::new();
    loop {
        scanner.skip_whitespace();
        if scanner.i >= scanner.bytes.len() {
            out.push(Token::new(TokenKind::EndOfInput, "", scanner.i));
            return out;
        }
        let c = scanner.bytes[scanner.i];
        match c {
            b'{' => {
                out.push(Token::new(TokenKind::LBrace, "{", scanner.i));
                scanner.i += 1;
            }
            b'}' => {
                out.push(Token::new(TokenKind::RBrace, "}", scanner.i));
                scanner.i += 1;
            }
            b'=' => {
                out.push(Token::new(TokenKind::Equals, "=", scanner.i));
                scanner.i += 1;
            }
            b'"' => {
                let token = scanner.read_string();
                out.push(token);
            }
            _ => {
                if is_number_start(c as char) {
                    let token = scanner.read_number();
                    out.push(token);
                } else {
                    let ch = text[scanner.i..].chars().next().unwrap();
                    if is_ident_start(ch) {
                        let token = scanner.read_ident();
                        out.push(token);
                    } else {
                        // junk byte, skip it
                        scanner.i += ch.len_utf8();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_assignment() {
        let tokens = tokenize("stability=0.55");
        assert_eq!(
            kinds("stability=0.55"),
            vec![
                TokenKind::Ident,
                TokenKind::Equals,
                TokenKind::Number,
                TokenKind::EndOfInput
            ]
        );
        assert_eq!(tokens[0].text, "stability");
        assert_eq!(tokens[2].text, "0.55");
    }

    #[test]
    fn test_string_escape() {
        let tokens = tokenize("\"a\\\"b\"");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "a\"b");
    }

    #[test]
    fn test_escape_is_literal() {
        // \n is the letter n, not a newline
        let tokens = tokenize("\"a\\nb\"");
        assert_eq!(tokens[0].text, "anb");
    }

    #[test]
    fn test_plain_string_borrows() {
        let tokens = tokenize("\"hello world\"");
        assert_eq!(tokens[0].text, "hello world");
        assert!(matches!(tokens[0].text, Cow::Borrowed(_)));
    }

    #[test]
    fn test_comment() {
        let tokens = tokenize("a=1 # trailing comment\nb=2");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_ref()).collect();
        assert_eq!(texts, vec!["a", "=", "1", "b", "=", "2", ""]);
    }

    #[test]
    fn test_negative_number() {
        let tokens = tokenize("-12.5");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "-12.5");
    }

    #[test]
    fn test_dotted_date_splits() {
        // known format quirk: the number scanner stops at the second dot
        let tokens = tokenize("1936.1.1");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "1936.1");
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].text, "1");
        assert_eq!(tokens[2].kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_ident_with_dots() {
        // a leading letter makes the whole date-like token one ident
        let tokens = tokenize("v1936.1.1");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text, "v1936.1.1");
    }

    #[test]
    fn test_junk_skipped() {
        let tokens = tokenize("a ; = @ 5");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_ref()).collect();
        assert_eq!(texts, vec!["a", "=", "5", ""]);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(tokens[1].kind, TokenKind::EndOfInput);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("ab {");
        assert_eq!(tokens[0].pos, 0);
        assert_eq!(tokens[1].pos, 3);
    }
}

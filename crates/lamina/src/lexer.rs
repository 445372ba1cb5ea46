//! Source text → token stream (spec §4.1).
//!
//! A hand-rolled cursor over the source bytes/chars, one private scanning
//! function per token category (number, string, identifier, operator,
//! comment), matching the decomposition a lexer for a small language is
//! usually given: keep the traversal state in one small `Cursor` and let
//! each category own its own recognizer.

use crate::error::{LexError, Location};
use crate::token::{Token, TokenKind, keyword};

/// A cursor over source text, tracking 1-based line/column as it advances.
struct Cursor<'a> {
    source: &'a str,
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, position: 0, line: 1, column: 1 }
    }

    fn first(&self) -> char {
        self.char_at(0)
    }

    fn second(&self) -> char {
        self.char_at(self.first().len_utf8())
    }

    fn char_at(&self, byte_offset: usize) -> char {
        self.source[self.position..].get(byte_offset..).and_then(|s| s.chars().next()).unwrap_or('\0')
    }

    fn is_eof(&self) -> bool {
        self.position >= self.source.len()
    }

    fn bump(&mut self) -> char {
        let c = self.first();
        if c == '\0' {
            return c;
        }
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

}

/// Scans `source` into a token stream terminated by an `Eof` sentinel.
///
/// Never fails outright: an unterminated string yields a collected
/// [`LexError`] and recovers at the next whitespace (spec §4.1); any byte
/// that doesn't start a recognized token becomes an `Unknown` token so the
/// parser (not the lexer) is the one that ultimately rejects the program.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    loop {
        skip_whitespace_and_comments(&mut cursor);
        if cursor.is_eof() {
            tokens.push(Token::new(TokenKind::Eof, "", cursor.line, cursor.column));
            break;
        }

        let start_line = cursor.line;
        let start_col = cursor.column;
        let c = cursor.first();

        let token = if c.is_ascii_digit() {
            lex_number(&mut cursor, start_line, start_col)
        } else if c == '_' || c.is_ascii_alphabetic() {
            lex_identifier_or_keyword(&mut cursor, start_line, start_col)
        } else if c == '"' {
            match lex_string(&mut cursor, start_line, start_col) {
                Ok(tok) => tok,
                Err(err) => {
                    errors.push(err);
                    recover_to_whitespace(&mut cursor);
                    continue;
                }
            }
        } else {
            lex_operator(&mut cursor, start_line, start_col)
        };

        tokens.push(token);
    }

    (tokens, errors)
}

fn skip_whitespace_and_comments(cursor: &mut Cursor<'_>) {
    loop {
        match cursor.first() {
            ' ' | '\t' | '\r' | '\n' => {
                cursor.bump();
            }
            '/' if cursor.second() == '/' => {
                while !cursor.is_eof() && cursor.first() != '\n' {
                    cursor.bump();
                }
            }
            _ => break,
        }
    }
}

fn recover_to_whitespace(cursor: &mut Cursor<'_>) {
    while !cursor.is_eof() && !cursor.first().is_whitespace() {
        cursor.bump();
    }
}

fn lex_number(cursor: &mut Cursor<'_>, line: u32, column: u32) -> Token {
    let start = cursor.position;
    while cursor.first().is_ascii_digit() {
        cursor.bump();
    }
    if cursor.first() == '.' && cursor.second().is_ascii_digit() {
        cursor.bump();
        while cursor.first().is_ascii_digit() {
            cursor.bump();
        }
    }
    let text = &cursor.source[start..cursor.position];
    Token::new(TokenKind::Number, text, line, column)
}

fn lex_identifier_or_keyword(cursor: &mut Cursor<'_>, line: u32, column: u32) -> Token {
    let start = cursor.position;
    while cursor.first() == '_' || cursor.first().is_ascii_alphanumeric() {
        cursor.bump();
    }
    let text = &cursor.source[start..cursor.position];
    let kind = keyword(text).unwrap_or(TokenKind::Identifier);
    Token::new(kind, text, line, column)
}

/// Scans a double-quoted string literal.
///
/// No general escape processing beyond `\\`, `\"`, `\n`, `\t` (spec §4.1):
/// the stored token text is the *decoded* contents, not the raw source
/// slice, since every consumer (the parser's literal-to-value conversion)
/// wants the decoded form and nothing downstream needs the raw quotes back.
fn lex_string(cursor: &mut Cursor<'_>, line: u32, column: u32) -> Result<Token, LexError> {
    cursor.bump(); // opening quote
    let mut value = String::new();
    loop {
        match cursor.first() {
            '\0' => {
                return Err(LexError {
                    message: "unterminated string literal".to_owned(),
                    at: Location { line, column },
                });
            }
            '"' => {
                cursor.bump();
                break;
            }
            '\\' => {
                cursor.bump();
                let escaped = cursor.bump();
                value.push(match escaped {
                    '\\' => '\\',
                    '"' => '"',
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
            '\n' => {
                return Err(LexError {
                    message: "unterminated string literal".to_owned(),
                    at: Location { line, column },
                });
            }
            c => {
                value.push(c);
                cursor.bump();
            }
        }
    }
    Ok(Token::new(TokenKind::String, value, line, column))
}

/// Scans punctuation and operators. Multi-character operators (`==`, `!=`,
/// `<=`, `>=`) are checked before their single-character prefixes (spec
/// §4.1).
fn lex_operator(cursor: &mut Cursor<'_>, line: u32, column: u32) -> Token {
    let c = cursor.bump();
    let kind = match c {
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        ';' => TokenKind::Semicolon,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '^' => TokenKind::Caret,
        '=' if cursor.first() == '=' => {
            cursor.bump();
            TokenKind::EqualEqual
        }
        '=' => TokenKind::Assign,
        '!' if cursor.first() == '=' => {
            cursor.bump();
            TokenKind::NotEqual
        }
        '!' => TokenKind::Bang,
        '<' if cursor.first() == '=' => {
            cursor.bump();
            TokenKind::LessEqual
        }
        '<' => TokenKind::Less,
        '>' if cursor.first() == '=' => {
            cursor.bump();
            TokenKind::GreaterEqual
        }
        '>' => TokenKind::Greater,
        _ => TokenKind::Unknown,
    };
    let text: String = std::iter::once(c).collect();
    Token::new(kind, text, line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn multi_char_operators_take_priority() {
        assert_eq!(kinds("== != <= >= = < >"), vec![
            TokenKind::EqualEqual,
            TokenKind::NotEqual,
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::Assign,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn keywords_vs_identifiers() {
        assert_eq!(kinds("var xvar"), vec![TokenKind::Var, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn number_literals_with_and_without_dot() {
        let tokens = tokenize("42 3.14").0;
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].text, "3.14");
    }

    #[test]
    fn line_comment_extends_to_end_of_line() {
        assert_eq!(kinds("1 // two\n3"), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn string_escape_sequences_decode() {
        let tokens = tokenize(r#""a\nb\t\"c\"""#).0;
        assert_eq!(tokens[0].text, "a\nb\t\"c\"");
    }

    #[test]
    fn unterminated_string_recovers_at_next_whitespace() {
        let (tokens, errors) = tokenize("\"abc def");
        assert_eq!(errors.len(), 1);
        // recovery should still find the eof token
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn unknown_byte_becomes_unknown_token() {
        assert_eq!(kinds("@"), vec![TokenKind::Unknown, TokenKind::Eof]);
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = tokenize("var\nx").0;
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[1].column, 1);
    }
}

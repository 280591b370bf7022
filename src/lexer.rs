// ABOUTME: Source text -> token stream
// A small hand-written scanner, longest-match-first within each rule:
// multi-character operators are tried before their single-character
// prefixes, reserved words are tried before falling back to a bare identifier

use crate::error::TinyError;
use crate::token::{Token, TokenKind};

const MULTI_CHAR_OPS: &[&str] = &["<=", ">=", ":=", "!=", "=>", "<*", "*>"];
const SINGLE_CHAR_OPS: &[char] = &[
    ';', ',', '(', ')', '[', ']', '{', '}', '+', '-', '*', '/', '%', '^', '|', '&', '~', '<', '>',
    '=',
];
const KEYWORDS: &[&str] = &[
    "func", "return", "array", "while", "do", "for", "if", "then", "else", "end", "not", "shl",
    "shr", "div", "andalso", "orelse",
];
/// Tokens after which a newline is suppressed rather than emitted.
const NEWLINE_SUPPRESSORS: &[&str] = &["func", "=>", "{", "(", "do", "then", "else", "\n"];

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    index: usize,
    tokens: Vec<Token>,
    src: &'a str,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, TinyError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        col: 1,
        index: 0,
        tokens: Vec::new(),
        src: source,
    };
    lexer.run()?;
    lexer.strip_newline_before_end();
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn emit(&mut self, lexeme: impl Into<String>, kind: TokenKind) {
        let lexeme = lexeme.into();
        if kind == TokenKind::Reserved && lexeme == "\n" {
            let suppress = self
                .tokens
                .last()
                .map(|t| NEWLINE_SUPPRESSORS.contains(&t.lexeme.as_str()))
                .unwrap_or(false);
            if suppress {
                return;
            }
        }
        self.tokens.push(Token::new(lexeme, kind, self.index));
        self.index += 1;
    }

    fn strip_newline_before_end(&mut self) {
        let mut i = 1;
        while i < self.tokens.len() {
            if self.tokens[i].lexeme == "end" && self.tokens[i - 1].lexeme == "\n" {
                self.tokens.remove(i - 1);
            } else {
                i += 1;
            }
        }
    }

    fn run(&mut self) -> Result<(), TinyError> {
        while let Some(c) = self.peek() {
            let (line, col) = (self.line, self.col);
            if c == '\n' {
                self.advance();
                self.emit("\n", TokenKind::Reserved);
                continue;
            }
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }
            if c.is_ascii_digit() {
                self.lex_number(line, col)?;
                continue;
            }
            if c == '"' {
                self.lex_string(line, col)?;
                continue;
            }
            if c.is_ascii_alphabetic() || c == '_' {
                self.lex_word();
                continue;
            }
            if self.lex_multi_char_op() {
                continue;
            }
            if SINGLE_CHAR_OPS.contains(&c) {
                self.advance();
                self.emit(c.to_string(), TokenKind::Reserved);
                continue;
            }
            return Err(TinyError::LexError {
                line,
                col,
                message: format!("Illegal character @ line {} col {}", line, col),
            });
        }
        Ok(())
    }

    fn lex_multi_char_op(&mut self) -> bool {
        for op in MULTI_CHAR_OPS {
            let matches = op
                .chars()
                .enumerate()
                .all(|(i, ch)| self.peek_at(i) == Some(ch));
            if matches {
                for _ in 0..op.chars().count() {
                    self.advance();
                }
                let kind = match *op {
                    "<*" => TokenKind::BeginComment,
                    "*>" => TokenKind::EndComment,
                    _ => TokenKind::Reserved,
                };
                self.emit(*op, kind);
                return true;
            }
        }
        false
    }

    fn lex_number(&mut self, line: usize, col: usize) -> Result<(), TinyError> {
        let start = self.pos;
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }
        let mut is_double = false;
        if matches!(self.peek(), Some('.') | Some('e')) {
            is_double = true;
            let is_exp = self.peek() == Some('e');
            self.advance();
            if is_exp && self.peek() == Some('-') {
                self.advance();
            }
            if !self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                return Err(TinyError::LexError {
                    line,
                    col,
                    message: format!("malformed float literal @ line {} col {}", line, col),
                });
            }
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }
        let lexeme: String = self.chars[start..self.pos].iter().collect();
        self.emit(
            lexeme,
            if is_double {
                TokenKind::Double
            } else {
                TokenKind::Int
            },
        );
        Ok(())
    }

    fn lex_string(&mut self, line: usize, col: usize) -> Result<(), TinyError> {
        self.advance(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(TinyError::LexError {
                        line,
                        col,
                        message: "unterminated string literal".to_string(),
                    })
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    if is_string_char(c) {
                        out.push(c);
                        self.advance();
                    } else {
                        return Err(TinyError::LexError {
                            line,
                            col,
                            message: format!("illegal character in string literal: {:?}", c),
                        });
                    }
                }
            }
        }
        self.emit(out, TokenKind::Str);
        Ok(())
    }

    fn lex_word(&mut self) {
        let start = self.pos;
        while self
            .peek()
            .map(|c| c.is_ascii_alphanumeric() || c == '_')
            .unwrap_or(false)
        {
            self.advance();
        }
        let lexeme: String = self.chars[start..self.pos].iter().collect();
        if lexeme == "True" || lexeme == "False" {
            self.emit(lexeme, TokenKind::Bool);
        } else if KEYWORDS.contains(&lexeme.as_str()) {
            self.emit(lexeme, TokenKind::Reserved);
        } else {
            self.emit(lexeme, TokenKind::Identifier);
        }
    }
}

/// String bodies allow ASCII alnum/underscore or the CJK range U+4E00-U+9FA5, nothing else.
fn is_string_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || {
        let u = c as u32;
        (0x4E00..=0x9FA5).contains(&u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(src: &str) -> Vec<String> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn tokenizes_assignment() {
        assert_eq!(lexemes("x := 3"), vec!["x", ":=", "3"]);
    }

    #[test]
    fn tokenizes_float() {
        let toks = tokenize("3.14").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Double);
    }

    #[test]
    fn minus_sign_only_allowed_after_exponent() {
        let toks = tokenize("3.14e-2").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Double);
        assert!(tokenize("3.-5").is_err());
    }

    #[test]
    fn newline_suppressed_after_func_arrow() {
        let toks = tokenize("func f() =>\nreturn 1\nend").unwrap();
        // no newline token right after '=>'
        let idx = toks.iter().position(|t| t.lexeme == "=>").unwrap();
        assert_ne!(toks[idx + 1].lexeme, "\n");
    }

    #[test]
    fn newline_before_end_is_stripped() {
        let toks = tokenize("x := 1\nend").unwrap();
        assert_eq!(
            toks.iter().map(|t| t.lexeme.clone()).collect::<Vec<_>>(),
            vec!["x", ":=", "1", "end"]
        );
    }

    #[test]
    fn illegal_character_reports_position() {
        let err = tokenize("x := @").unwrap_err();
        match err {
            TinyError::LexError { line, col, .. } => {
                assert_eq!(line, 1);
                assert_eq!(col, 6);
            }
            other => panic!("expected LexError, got {other:?}"),
        }
    }

    #[test]
    fn bool_literals() {
        let toks = tokenize("True False").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Bool);
        assert_eq!(toks[1].kind, TokenKind::Bool);
    }
}

//! A tokenizer for the expression surface.
//!
//! A [`Tokenizer`] lifts a string into a lazily-advanced sequence of
//! [`Token`]s. Unlike an [`Iterator`], the caller inspects the current token
//! with [`Tokenizer::peek`] and only consumes it with
//! [`Tokenizer::advance`] — this lets the reader look one token ahead
//! without needing a separate peekable wrapper.

use crate::error::{Error, Result};

const SYMBOL_PUNCT: &str = "<=>*/#?!+-";

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || SYMBOL_PUNCT.contains(ch)
}

/// A lexical item of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    OpenParen,
    CloseParen,
    Quote,
    Dot,
    Integer(i64),
    Symbol(String),
}

/// Streams [`Token`]s out of a request string.
pub struct Tokenizer<'a> {
    rest: std::str::Chars<'a>,
    current: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    /// Constructs a tokenizer over `input`, priming the first token.
    pub fn new(input: &'a str) -> Result<Tokenizer<'a>> {
        let mut tok = Tokenizer {
            rest: input.chars(),
            current: None,
        };
        tok.advance()?;
        Ok(tok)
    }

    /// Returns the current token, or `None` at end of input.
    pub fn peek(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Reports whether the stream is exhausted.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Consumes the current token and lexes the next one.
    pub fn advance(&mut self) -> Result<()> {
        self.skip_whitespace();
        self.current = match self.peek_char() {
            None => None,
            Some('(') => self.take_one(Token::OpenParen),
            Some(')') => self.take_one(Token::CloseParen),
            Some('\'') => self.take_one(Token::Quote),
            Some('.') => self.take_one(Token::Dot),
            Some(ch) if ch == '+' || ch == '-' => Some(self.lex_signed(ch)),
            Some(ch) if ch.is_ascii_digit() => Some(self.lex_integer()),
            Some(ch) if is_symbol_char(ch) => Some(self.lex_symbol()),
            Some(ch) => {
                return Err(Error::syntax(format!("illegal character '{ch}'")));
            }
        };
        Ok(())
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.clone().next()
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek_char() {
                Some(ch) if ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r' => {
                    self.rest.next();
                }
                _ => break,
            }
        }
    }

    fn take_one(&mut self, tok: Token) -> Option<Token> {
        self.rest.next();
        Some(tok)
    }

    /// Lexes a digit run starting at the current position into an `i64`.
    fn lex_integer(&mut self) -> Token {
        let mut value: i64 = 0;
        while let Some(ch) = self.peek_char() {
            if let Some(d) = ch.to_digit(10) {
                value = value * 10 + d as i64;
                self.rest.next();
            } else {
                break;
            }
        }
        Token::Integer(value)
    }

    /// Lexes a token starting with `+` or `-`: a signed integer if a digit
    /// follows, otherwise a symbol starting with the sign character.
    fn lex_signed(&mut self, sign: char) -> Token {
        self.rest.next();
        match self.peek_char() {
            Some(ch) if ch.is_ascii_digit() => {
                let Token::Integer(magnitude) = self.lex_integer() else {
                    unreachable!("lex_integer always returns Token::Integer")
                };
                Token::Integer(if sign == '-' { -magnitude } else { magnitude })
            }
            _ => {
                let mut symbol = String::new();
                symbol.push(sign);
                symbol.push_str(&self.lex_symbol_tail());
                Token::Symbol(symbol)
            }
        }
    }

    /// Lexes a maximal run over the symbol alphabet.
    fn lex_symbol(&mut self) -> Token {
        Token::Symbol(self.lex_symbol_tail())
    }

    fn lex_symbol_tail(&mut self) -> String {
        let mut symbol = String::new();
        while let Some(ch) = self.peek_char() {
            if is_symbol_char(ch) {
                symbol.push(ch);
                self.rest.next();
            } else {
                break;
            }
        }
        symbol
    }
}

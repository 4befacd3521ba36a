//! Reads a token stream into an AST of arena-allocated [`Value`]s.
//!
//! The grammar is a single datum:
//! ```text
//! datum     := atom | list | quoted
//! atom      := Integer | Symbol
//! quoted    := Quote datum                 ; sugar for (quote datum)
//! list      := '(' list_body ')'
//! list_body := ε
//!            | datum list_body             ; proper continuation
//!            | datum '.' datum             ; improper tail
//! ```
//! `read` requires the token stream to be exhausted after the one datum.

use crate::error::{Error, Result};
use crate::token::{Token, Tokenizer};
use crate::value::{Arena, Value, ValueRef};

/// Reads exactly one datum from `tokenizer`, then requires end of input.
pub fn read(tokenizer: &mut Tokenizer, arena: &mut Arena) -> Result<Option<ValueRef>> {
    let datum = read_datum(tokenizer, arena)?;
    if !tokenizer.is_end() {
        return Err(Error::syntax("unexpected tokens after the first datum"));
    }
    Ok(datum)
}

fn read_datum(tokenizer: &mut Tokenizer, arena: &mut Arena) -> Result<Option<ValueRef>> {
    match tokenizer.peek() {
        None => Err(Error::syntax("unexpected end of input")),
        Some(Token::Integer(n)) => {
            let n = *n;
            tokenizer.advance()?;
            Ok(Some(arena.alloc(Value::Number(n))))
        }
        Some(Token::Symbol(s)) => {
            let s = s.clone();
            tokenizer.advance()?;
            Ok(Some(arena.alloc_symbol(&s)))
        }
        Some(Token::Quote) => {
            tokenizer.advance()?;
            let datum = read_datum(tokenizer, arena)?;
            let quote = arena.alloc_symbol("quote");
            let inner = arena.alloc(Value::Pair {
                car: datum,
                cdr: None,
            });
            Ok(Some(arena.alloc(Value::Pair {
                car: Some(quote),
                cdr: Some(inner),
            })))
        }
        Some(Token::OpenParen) => {
            tokenizer.advance()?;
            read_list_body(tokenizer, arena)
        }
        Some(Token::CloseParen) => Err(Error::syntax("unbalanced ')'")),
        Some(Token::Dot) => Err(Error::syntax("unexpected '.'")),
    }
}

/// Reads the contents of a list, having already consumed its `(`.
fn read_list_body(tokenizer: &mut Tokenizer, arena: &mut Arena) -> Result<Option<ValueRef>> {
    match tokenizer.peek() {
        None => Err(Error::syntax("unexpected end of input in list")),
        Some(Token::CloseParen) => {
            tokenizer.advance()?;
            Ok(None)
        }
        Some(Token::Dot) => Err(Error::syntax("unexpected '.' at start of list")),
        Some(_) => {
            let head = read_datum(tokenizer, arena)?;
            match tokenizer.peek() {
                Some(Token::Dot) => {
                    tokenizer.advance()?;
                    let tail = read_datum(tokenizer, arena)?;
                    match tokenizer.peek() {
                        Some(Token::CloseParen) => tokenizer.advance()?,
                        _ => return Err(Error::syntax("expected ')' after improper tail")),
                    }
                    Ok(Some(arena.alloc(Value::Pair {
                        car: head,
                        cdr: tail,
                    })))
                }
                _ => {
                    let rest = read_list_body(tokenizer, arena)?;
                    Ok(Some(arena.alloc(Value::Pair {
                        car: head,
                        cdr: rest,
                    })))
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn read_str(input: &str) -> Result<(Option<ValueRef>, Arena)> {
        let mut arena = Arena::new();
        let mut tokenizer = Tokenizer::new(input)?;
        let v = read(&mut tokenizer, &mut arena)?;
        Ok((v, arena))
    }

    #[test]
    fn atoms() {
        let (v, arena) = read_str("42").unwrap();
        assert_eq!(arena.print(v), "42");

        let (v, arena) = read_str("foo").unwrap();
        assert_eq!(arena.print(v), "foo");
    }

    #[test]
    fn empty_list() {
        let (v, arena) = read_str("()").unwrap();
        assert_eq!(v, None);
        assert_eq!(arena.print(v), "()");
    }

    #[test]
    fn proper_list() {
        let (v, arena) = read_str("(a b c)").unwrap();
        assert_eq!(arena.print(v), "(a b c)");
    }

    #[test]
    fn improper_list() {
        let (v, arena) = read_str("(a b . c)").unwrap();
        assert_eq!(arena.print(v), "(a b . c)");
    }

    #[test]
    fn quote_sugar() {
        let (v, arena) = read_str("'(1 2)").unwrap();
        assert_eq!(arena.print(v), "(quote (1 2))");
    }

    #[test]
    fn nested() {
        let (v, arena) = read_str("(+ 1 2 (* 3 4))").unwrap();
        assert_eq!(arena.print(v), "(+ 1 2 (* 3 4))");
    }

    #[test]
    fn dot_as_first_element_fails() {
        assert!(read_str("(. a)").is_err());
    }

    #[test]
    fn unbalanced_parens_fail() {
        assert!(read_str("(a b").is_err());
        assert!(read_str("a)").is_err());
    }

    #[test]
    fn trailing_tokens_fail() {
        assert!(read_str("1 2").is_err());
    }

    #[test]
    fn dot_with_extra_datum_fails() {
        assert!(read_str("(a . b c)").is_err());
    }
}

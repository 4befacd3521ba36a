//! The three error kinds an interpreter run may fail with.
//!
//! A [`SyntaxError`] comes from the tokenizer or reader, or from a special
//! form called with the wrong number of arguments. A [`RuntimeError`] comes
//! from type mismatches, bad arities on regular primitives, empty
//! application, or an out-of-range list index. A [`NameError`] comes from a
//! reference to a symbol that isn't bound.
//!
//! [`SyntaxError`]: Error::Syntax
//! [`RuntimeError`]: Error::Runtime
//! [`NameError`]: Error::Name

use thiserror::Error;

/// A type alias for results produced while reading or evaluating a request.
pub type Result<T> = std::result::Result<T, Error>;

/// The error kinds surfaced to callers of [`crate::Interpreter::run`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("unbound name: {0}")]
    Name(String),
}

impl Error {
    pub fn syntax<S: Into<String>>(msg: S) -> Error {
        Error::Syntax(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Error {
        Error::Runtime(msg.into())
    }

    pub fn name<S: Into<String>>(msg: S) -> Error {
        Error::Name(msg.into())
    }
}

//! Typed message arguments and a cursor for consuming them in order.

use serde::Serialize;

/// A single positional message argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    /// 32-bit signed integer (`i`).
    Int(i32),
    /// Boolean carried entirely in the type tag (`T` or `F`).
    Bool(bool),
    /// UTF-8 string (`s`).
    Str(String),
}

impl Argument {
    /// Returns the wire type tag for this argument.
    #[must_use]
    pub const fn type_tag(&self) -> u8 {
        match self {
            Self::Int(_) => b'i',
            Self::Bool(true) => b'T',
            Self::Bool(false) => b'F',
            Self::Str(_) => b's',
        }
    }
}

impl From<i32> for Argument {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Argument {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Reads arguments front to back.
///
/// Typed pops only advance when the next argument has the requested type, so
/// a mismatch leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct ArgCursor<'a> {
    arguments: &'a [Argument],
}

impl<'a> ArgCursor<'a> {
    /// Creates a cursor positioned at the first argument.
    #[must_use]
    pub const fn new(arguments: &'a [Argument]) -> Self {
        Self { arguments }
    }

    /// Number of arguments not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.arguments.len()
    }

    /// Returns the next argument without consuming it.
    #[must_use]
    pub const fn peek(&self) -> Option<&'a Argument> {
        self.arguments.first()
    }

    /// Consumes the next argument whatever its type.
    pub fn pop_any(&mut self) -> Option<&'a Argument> {
        let (first, rest) = self.arguments.split_first()?;
        self.arguments = rest;
        Some(first)
    }

    /// Consumes the next argument when it is an integer.
    pub fn pop_int(&mut self) -> Option<i32> {
        match self.peek() {
            Some(&Argument::Int(int)) => {
                self.pop_any();
                Some(int)
            }
            _ => None,
        }
    }

    /// Consumes the next argument when it is a boolean.
    pub fn pop_bool(&mut self) -> Option<bool> {
        match self.peek() {
            Some(&Argument::Bool(flag)) => {
                self.pop_any();
                Some(flag)
            }
            _ => None,
        }
    }

    /// Consumes the next argument when it is a string.
    pub fn pop_str(&mut self) -> Option<&'a str> {
        match self.peek() {
            Some(Argument::Str(value)) => {
                self.pop_any();
                Some(value.as_str())
            }
            _ => None,
        }
    }
}

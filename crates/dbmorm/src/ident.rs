//! Identifier checks for names that must be spliced into SQL text.
//!
//! Values always travel as `?` parameters, but some names cannot: a sequence
//! name in `<seq>.CURRVAL` is one. [`Ident`] validates such a name before it
//! is formatted into a statement.
//!
//! - Unquoted parts match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow anything except NUL; `"` is escaped as `""`
//!
//! # Example
//! ```ignore
//! use dbmorm::Ident;
//!
//! let seq = Ident::parse("SYSADM.ORDER_SEQ")?;
//! assert_eq!(seq.to_sql(), "SYSADM.ORDER_SEQ");
//! # Ok::<(), dbmorm::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use std::iter::Peekable;
use std::str::Chars;

/// One dot-separated segment of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Unquoted(String),
    Quoted(String),
}

/// A possibly qualified SQL identifier such as `owner.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse dotted and quoted forms: `seq`, `owner.seq`, `"Mixed Case".seq`.
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(OrmError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut chars = s.chars().peekable();
        let mut parts = vec![parse_part(&mut chars)?];
        while let Some(c) = chars.next() {
            if c != '.' {
                return Err(OrmError::validation(format!(
                    "Expected '.' between identifier parts, got '{c}'"
                )));
            }
            if chars.peek().is_none() {
                return Err(OrmError::validation("Trailing '.' in identifier"));
            }
            parts.push(parse_part(&mut chars)?);
        }
        Ok(Self { parts })
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
        out
    }
}

fn parse_part(chars: &mut Peekable<Chars<'_>>) -> OrmResult<IdentPart> {
    if chars.peek() == Some(&'"') {
        chars.next();
        let mut name = String::new();
        loop {
            match chars.next() {
                Some('"') if chars.peek() == Some(&'"') => {
                    chars.next();
                    name.push('"');
                }
                Some('"') => break,
                Some(c) => name.push(c),
                None => return Err(OrmError::validation("Unclosed quoted identifier")),
            }
        }
        if name.is_empty() {
            return Err(OrmError::validation("Empty quoted identifier"));
        }
        return Ok(IdentPart::Quoted(name));
    }

    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' {
            break;
        }
        let valid = if name.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !valid {
            return Err(OrmError::validation(format!(
                "Invalid character in identifier: '{c}'"
            )));
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(OrmError::validation("Empty identifier segment"));
    }
    Ok(IdentPart::Unquoted(name))
}

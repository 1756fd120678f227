//! # Type References
//!
//! Parsing of field and argument type expressions: `Name`, `Name!`,
//! `[Name]`, `[Name!]!` and deeper nestings.

use crate::types::is_valid_name;
use std::fmt;

/// A parsed type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A named type, e.g. `Post`.
    Named(String),
    /// A list of the inner type, e.g. `[Post]`.
    List(Box<TypeRef>),
    /// A non-null wrapper, e.g. `Post!`.
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Parse a type expression.
    ///
    /// Returns a human-readable reason on failure.
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("empty type reference".to_string());
        }

        if let Some(inner) = trimmed.strip_suffix('!') {
            let inner = Self::parse(inner)?;
            if matches!(inner, Self::NonNull(_)) {
                return Err(format!("'{}' is wrapped in non-null twice", input));
            }
            return Ok(Self::NonNull(Box::new(inner)));
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let inner = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("unbalanced brackets in '{}'", input))?;
            return Ok(Self::List(Box::new(Self::parse(inner)?)));
        }

        if is_valid_name(trimmed) {
            Ok(Self::Named(trimmed.to_string()))
        } else {
            Err(format!("'{}' is not a valid type name", trimmed))
        }
    }

    /// The innermost named type.
    #[must_use]
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    /// Whether this is a list type (ignoring an outer non-null).
    #[must_use]
    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            Self::Named(_) => false,
        }
    }

    /// This type with an outer non-null removed.
    #[must_use]
    pub fn nullable(&self) -> &Self {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{}", name),
            Self::List(inner) => write!(f, "[{}]", inner),
            Self::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

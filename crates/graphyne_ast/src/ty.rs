//! Type references as they appear in documents and schemas.

use std::fmt;

/// A reference to a type, with the standard wrapping forms.
///
/// `Named` is nullable by default; wrapping in `NonNull` removes the
/// null case, wrapping in `List` nests. The set is closed: every type
/// reference is exactly one of these three shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A named type, e.g. `User` or `Int`.
    Named(String),
    /// A list wrapper, e.g. `[User]`.
    List(Box<TypeRef>),
    /// A non-null wrapper, e.g. `User!`.
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Creates a named type reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps a type reference in a list.
    #[must_use]
    pub fn list(inner: Self) -> Self {
        Self::List(Box::new(inner))
    }

    /// Wraps a type reference in a non-null marker.
    #[must_use]
    pub fn non_null(inner: Self) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Returns true if the outermost wrapper is non-null.
    #[must_use]
    pub const fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Returns true if the type is a list after stripping non-null.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self.unwrap_non_null(), Self::List(_))
    }

    /// Strips one non-null wrapper, if present.
    #[must_use]
    pub fn unwrap_non_null(&self) -> &Self {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

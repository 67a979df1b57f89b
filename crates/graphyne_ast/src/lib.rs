//! Executable document AST for graphyne.
//!
//! This crate provides:
//! - `span`: Source location tracking
//! - `ty`: Type references (`Named`, `List`, `NonNull`)
//! - `ast`: Owned executable document nodes and builders

pub mod ast;
pub mod span;
pub mod ty;

pub use ast::*;
pub use span::Span;
pub use ty::TypeRef;

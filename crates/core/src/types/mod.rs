//! Core types for Maison Lumine.
//!
//! Newtype wrappers that make entity references and money type-safe across
//! the workspace.

pub mod id;
pub mod price;

pub use id::*;
pub use price::*;

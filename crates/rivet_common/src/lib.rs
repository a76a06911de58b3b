//! Shared foundational types used across the rivet construction layer.
//!
//! This crate provides interned identifiers, content hashing, packed two-state
//! bit values for constants, and call-site locations used to point errors back
//! at the generator code that caused them.

#![warn(missing_docs)]

pub mod bits;
pub mod hash;
pub mod ident;
pub mod loc;

pub use bits::{BitsValue, ParseBitsError};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use loc::SourceLoc;

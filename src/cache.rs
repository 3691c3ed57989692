//! Credential entity model, deterministic cache-key scheme, and cache records.

pub mod entity;
pub mod key;
pub mod record;

pub use entity::*;
pub use key::*;
pub use record::*;

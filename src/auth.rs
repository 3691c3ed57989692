//! Auth-domain value types: scope sets, ID-token claims, client-info blobs, secrets.

pub mod claims;
pub mod client_info;
pub mod scope;
pub mod secret;

pub use claims::*;
pub use client_info::*;
pub use scope::*;
pub use secret::*;

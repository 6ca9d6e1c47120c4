//! Auth-domain identifiers, scope sets, client records, codes, and token models.

pub mod client;
pub mod code;
pub mod id;
pub mod pkce;
pub mod scope;
pub mod secret;
pub mod token;

pub use client::*;
pub use code::*;
pub use id::*;
pub use pkce::*;
pub use scope::*;
pub use secret::*;
pub use token::*;

//! Utility functions shared across layers.
//!
//! - [`token_codec`] - Bearer-token generation, hashing and parsing
//! - [`password`] - Argon2id password hashing
//! - [`request_info`] - Client IP, host and user agent extraction from HTTP headers

pub mod password;
pub mod request_info;
pub mod token_codec;

pub use token_codec::{IssuedSecret, TokenCodec};

//! # Authentication Library
//!
//! Password hashing and JWT token management. The chat socket's credential
//! verifier is [`decode_jwt`]: one call per connection at admission time.

pub mod pwd;
pub mod token;

// Re-export commonly used types
pub use pwd::{hash_password, verify_password};
pub use token::{Claims, decode_jwt, encode_jwt};

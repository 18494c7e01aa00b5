//! # carelink-token
//!
//! Bearer token handling for the Carelink API.
//!
//! This crate provides functionality for:
//! - Holding the shared signing secret
//! - Issuing tokens that bind an identity, a role and an approval flag
//! - Verifying tokens (signature and expiry) and extracting their claims
//!
//! Tokens are HS256 JSON Web Tokens signed with a single shared secret. There
//! is no key rotation and no revocation: a token is valid until its `exp`.

pub mod claims;
pub mod error;
pub mod secret;
pub mod token;

pub use claims::{Claims, DOCTOR_ROLE};
pub use error::TokenError;
pub use secret::SigningSecret;
pub use token::{TokenIssuer, TokenVerifier};

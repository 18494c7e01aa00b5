//! # carelink-server
//!
//! Request-pipeline security layer of the Carelink API.
//!
//! Protected routes run `Decrypt → Authenticate → Authorize → Handler →
//! Encrypt`:
//!
//! - the decryption gate replaces an encrypted `payload` (body or query) with
//!   its plaintext JSON,
//! - the token verifier checks `Authorization: Bearer <token>` and attaches
//!   the caller's claims, optionally requiring a role,
//! - the approval gate admits only approved doctors,
//! - the encryption hook seals every JSON response.
//!
//! Business handlers are mounted by the embedding application with the
//! helpers in [`middleware`].

pub mod commands;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, StartupError};
pub use extract::{Authenticated, PlainQuery};
pub use routes::create_router;
pub use state::AppState;

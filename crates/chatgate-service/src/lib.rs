//! # Chatgate Service
//!
//! HTTP front end of the gateway: derives the client address, asks the
//! whitelist, forwards allowed messages to the text generation API and maps
//! failures to problem-detail responses.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client_ip;
pub mod error;
pub mod generation;
pub mod routes;
pub mod server;

pub use error::{ApiError, GenerationError};
pub use generation::GenerationClient;
pub use routes::{router, AppState, CHAT_PATH};
pub use server::ApiServer;

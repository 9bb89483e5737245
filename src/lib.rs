//! Unofficial client and command-line front end for the Straico chat API.
//!
//! [`StraicoClient`] sends chat requests (one model, several models, or the service's
//! smart selector) and fetches the model catalog. When the service rejects an unknown
//! model identifier, the returned error carries the closest catalog matches.

mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod matching;
pub mod progress;
pub mod types;

pub use client::StraicoClient;
pub use config::{ClientConfig, build_client_from_config};
pub use error::{Result, StraicoError};
pub use types::*;

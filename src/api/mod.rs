//! Wire-level shaping for the Straico REST endpoints.

pub(crate) mod error;
pub(crate) mod request;
pub(crate) mod response;

//! Transport to the recommendation service
//!
//! The service speaks a plain-text `key:value` line protocol over raw TCP,
//! one connection per call, with no length prefix or version field.

pub mod client;
pub mod codec;
pub mod error;
pub mod framing;

pub use client::{CallOptions, Endpoint, RecommendationTransport, TransportClient};
pub use codec::Message;
pub use error::TransportError;
pub use framing::Framing;

#[cfg(test)]
pub use client::MockRecommendationTransport;

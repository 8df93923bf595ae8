//! Nestgate: resilient AI chat gateway for the Nestline marketplace.
//!
//! Sits in front of a pool of interchangeable chat-completion endpoints
//! behind one upstream provider and delivers an answer despite individual
//! backends being rate-limited, overloaded, or down: failure-aware model
//! selection with sticky affinity, credential rotation, response caching,
//! and a keyword-matched offline fallback when the credential pool is
//! exhausted.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod clock;
pub mod credentials;
pub mod fallback;
pub mod gateway;
pub mod models;
pub mod providers;
pub mod router;
pub mod server;

pub use gateway::{ChatGateway, GatewayStatus};
pub use models::{ChatMessage, SendOptions, SendResult};

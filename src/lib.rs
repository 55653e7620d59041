//! flarerelay - JSON relay for hosted inference APIs
//!
//! Accepts small JSON generation requests, forwards them to Cloudflare Workers
//! AI or OpenRouter and relays the answer, optionally decoding the model's
//! text output as JSON.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod telemetry;
pub mod upstream;

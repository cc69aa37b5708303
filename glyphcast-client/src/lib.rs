//! Glyphcast client library exports.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod feed;
pub mod fingerprint;
pub mod persistence;
pub mod ranking;
pub mod search;
pub mod validation;
pub mod votes;

//! Sentinela collects news from public-security portals, keeps the items
//! that match crime/security keywords, and stores them deduplicated with
//! read/sent tracking for a chat-bot distribution layer.

pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod sites;

//! Netwarden - Request Filtering Engine
//!
//! This crate decides whether network requests are allowed, consulting a
//! fixed-window rate limiter, a static source-address blocklist and a set of
//! user-managed rules. The engine is exposed over an HTTP/JSON transport.

pub mod config;
pub mod error;
pub mod filter;
pub mod http;

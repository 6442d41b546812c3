//! Upstream version sources: HTTP access, parsing and per-kind adapters

pub mod adapter;
pub mod adapters;
pub mod cache;
pub mod error;
pub mod http;
pub mod normalizer;
pub mod parsers;
pub mod retry;

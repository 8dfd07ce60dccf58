/// Pocketledger - personal finance backend core
///
/// Business operations run through an interceptor pipeline that applies
/// claim-based authorization, read-through caching with pattern
/// invalidation, timing and redacted logging.

pub mod account;
pub mod auth;
pub mod cache;
pub mod config;
pub mod context;
pub mod crypto;
pub mod db;
pub mod error;
pub mod finance;
pub mod metrics;
pub mod pipeline;
pub mod server;

//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Access log: method, path, status, caller id, latency
//! 2. Rate limiter: reject early, save resources
//! 3. Auth: bearer token → `CallerContext` (protected routes only)

pub mod access_log;
pub mod auth;
pub mod rate;

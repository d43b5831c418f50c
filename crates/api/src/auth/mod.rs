//! Authentication primitives.
//!
//! Users and sessions are owned by the platform's identity service; this
//! server only verifies the HS256 access tokens it issues.

pub mod jwt;

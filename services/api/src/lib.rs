//! Qawafi API service
//!
//! Exposed as a library so integration tests can drive the
//! repositories against a real database.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod upload;
pub mod validation;

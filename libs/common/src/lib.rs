//! Common library for the Qawafi backend
//!
//! This crate provides shared infrastructure used by the Qawafi services:
//! PostgreSQL connection pooling, database configuration, and database
//! error handling.

pub mod database;
pub mod error;

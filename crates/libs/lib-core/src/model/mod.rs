//! # Data Model
//!
//! Database-backed models and repositories.

pub mod store;

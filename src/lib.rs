//! Product review service: a SQLite store behind a process-local
//! read-through cache, exposed over HTTP.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod state;

//! HTTP request handlers for the REST API.

pub mod send;
pub mod system;

//! Shared domain types for Warbler.
//!
//! `models` holds the values handed between the storage layer and the HTTP
//! layer; `forms` holds submitted form input together with its validation
//! rules.

pub mod forms;
pub mod models;

//! Core types and trait definitions for the Sprout assessment tracker.
//!
//! No HTTP, no database: domain structs, validation helpers, and the
//! [`store::AssessmentStore`] trait the backends implement.

#![allow(async_fn_in_trait)]

pub mod account;
pub mod catalog;
pub mod child;
pub mod error;
pub mod progress;
pub mod store;

pub use error::{Error, Result};

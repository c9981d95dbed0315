//! Typed client for the remote document backend.
//!
//! The backend is an Appwrite-style backend-as-a-service: collections of JSON
//! documents addressed by ID, queried with equality and inclusive-range
//! predicates, plus a serverless function runner used for account
//! provisioning. This crate owns the wire formats and exposes the
//! [`DocumentStore`] and [`Functions`] traits that the flow layer is generic
//! over, with HTTP implementations for production and in-memory
//! implementations for tests.

pub mod client;
pub mod document;
pub mod error;
pub mod functions;
pub mod http;
pub mod memory;
pub mod models;
pub mod query;

pub use client::DocumentStore;
pub use document::{Document, DocumentList, Stored, unique_id};
pub use error::StoreError;
pub use functions::{CreateUserRequest, Functions, HttpFunctions, MemoryFunctions};
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use query::Query;

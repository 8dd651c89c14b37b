//! fanout binding controller library.
//!
//! The crate ships a `binding-controller` binary; the library surface keeps
//! the reconciliation pieces reusable and testable against any [`store::Store`].

pub mod batch;
pub mod config;
pub mod controller;
pub mod error;
pub mod materializer;
pub mod orphan;
pub mod overrides;
pub mod seed;
pub mod store;

pub use error::{ControllerError, ControllerResult, ErrorAggregate};

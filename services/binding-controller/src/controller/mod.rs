//! Binding controller.
//!
//! The reconciler turns one binding into works; the worker feeds it from
//! an event queue and a periodic resync.

mod reconciler;
mod worker;

pub use reconciler::{BindingReconciler, ReconcileStats, SyncOutcome};
pub use worker::{BindingController, BindingEvent, ControllerConfig};

//! Reference model for model-based testing.
//!
//! The model is a deliberately naive implementation of the document store:
//! plain lists scanned front to back, newest entries first. It serves as the
//! oracle against which `DocumentStore` is verified.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Behavior not structure: Captures WHAT, not HOW
//! - Deterministic: Same inputs produce same outputs

pub mod operation;
mod store;
mod world;

pub use operation::{ModelKey, Operation, OperationError, OperationResult, SmallText, TokenChoice};
pub use store::ModelStore;
pub use world::{ModelWorld, ObservableState};

//! Deterministic simulation harness for Penlock store testing.
//!
//! `SimEnv` gives the store a virtual clock and a seeded RNG so lock expiry
//! and token minting are reproducible.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and real implementation,
//! and their results and observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    ModelKey, ModelStore, ModelWorld, ObservableState, Operation, OperationError,
    OperationResult, SmallText, TokenChoice,
};
pub use sim_env::SimEnv;

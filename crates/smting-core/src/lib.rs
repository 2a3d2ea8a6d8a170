//! Domain core: compatibility scoring, discovery ranking and the kane ledger
//! operations (first-message gate, post rewards, purchases).
//!
//! Everything here is synchronous. Persistence is reached through the traits
//! in [`store`]; callers on an async runtime should run the gate, poster and
//! wallet on a blocking thread.

pub mod clock;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gate;
pub mod geo;
pub mod inbox;
pub mod matching;
pub mod profiles;
pub mod reports;
pub mod reward;
pub mod store;
pub mod validate;
pub mod wallet;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{CoreError, StoreError, ValidationError};

//! Core types: identifiers, runtime values, RNG, configuration.
//!
//! These are shared by the schema layer, the evaluators, and the store.

pub mod id;
pub mod value;
pub mod rng;
pub mod config;

pub use id::Id;
pub use value::{is_integral, Scalar, ValueType};
pub use rng::BattleRng;
pub use config::{StoreConfig, DEFAULT_CHANNEL_NAME, DEFAULT_STORAGE_KEY};

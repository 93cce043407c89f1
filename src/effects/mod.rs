//! Effect resolution for behaviors.
//!
//! - `EffectResolver`: gates behaviors and effects on their conditions and
//!   folds effect regulators over `baseValue`
//! - `ResolvedEffect`: an effect that applies, with its final value
//!
//! ## Design Philosophy
//!
//! Resolution computes values only. What `damage` or `apply_status` does to
//! an entity belongs to the battle runtime that consumes these results.

mod resolver;

pub use resolver::{EffectResolver, ResolvedEffect};

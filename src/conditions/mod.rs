//! Condition evaluation against live game state.
//!
//! ## Key Types
//!
//! - [`GameView`]: read-only lookups into the battle graph
//! - [`EvalContext`]: role bindings, runtime variables, and RNG
//! - [`ConditionEvaluator`]: applies a condition's operator to its resolved subject
//!
//! ## Operators
//!
//! | op | subject |
//! |---|---|
//! | `lt` `gt` `lte` `gte` `eq` `neq` | the resolved value |
//! | `lt_percent` `gt_percent` | `current / max`, with `max` read from the `max` counterpart (`hp` -> `maxHp`) |
//! | `HAS` `NOT_HAS` | whether the status, tag or attribute is present |

mod view;
mod evaluator;

pub use view::{max_counterpart, EvalContext, GameView, Role};
pub use evaluator::{ConditionEvaluator, Subject};

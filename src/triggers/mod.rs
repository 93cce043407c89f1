//! Trigger expression trees.
//!
//! A trigger gates behavior execution with a recursive boolean expression
//! whose leaves are attribute-compare conditions.
//!
//! ## Key Components
//!
//! - [`TriggerNode`]: `CONDITION`, `NOT`, `TRUE`, `FALSE`, `AND`, `OR`
//! - [`Trigger`]: a named tree owned by a skill, status or character
//! - [`TriggerEvaluator`]: structural recursion, `left` before `right`
//!
//! ## Design Philosophy
//!
//! Nodes own their children, so trees are acyclic by construction and
//! evaluation always terminates. An unknown node `type` is a structural
//! error at parse time and never evaluates to `false`.
//!
//! ## Example Usage
//!
//! ```
//! use battle_lab::conditions::EvalContext;
//! use battle_lab::schema::{CompareOp, Condition};
//! use battle_lab::store::BattleState;
//! use battle_lab::triggers::{TriggerEvaluator, TriggerNode};
//!
//! // "HP above 50 but not above 200"
//! let above = |n: i64| {
//!     TriggerNode::condition(
//!         Condition::new("c", "HP check", "skill-1", "char-001")
//!             .on_attribute("hp")
//!             .compare(CompareOp::Gt, n),
//!     )
//! };
//! let tree = above(50).and(above(200).negate());
//!
//! let state = BattleState::default(); // char-001 starts with hp 100
//! let mut ctx = EvalContext::new(&state);
//! assert_eq!(TriggerEvaluator::evaluate(&tree, &mut ctx), Ok(true));
//! ```

mod node;
mod evaluator;

pub use node::{Trigger, TriggerNode};
pub use evaluator::TriggerEvaluator;

//! Trigger tree evaluation.

use crate::conditions::{ConditionEvaluator, EvalContext};
use crate::error::ResolutionError;

use super::node::{Trigger, TriggerNode};

/// Evaluator for trigger trees.
pub struct TriggerEvaluator;

impl TriggerEvaluator {
    /// Evaluate a node.
    ///
    /// `AND` and `OR` evaluate `left` first and skip `right` when `left`
    /// already decides the result. A resolution error in an evaluated leaf
    /// aborts the whole evaluation.
    ///
    /// Recursion stops at [`TriggerNode::MAX_DEPTH`], the same bound
    /// validation enforces, so a tree built in code cannot exhaust the stack.
    pub fn evaluate(node: &TriggerNode, ctx: &mut EvalContext<'_>) -> Result<bool, ResolutionError> {
        Self::evaluate_at(node, ctx, 1)
    }

    fn evaluate_at(node: &TriggerNode, ctx: &mut EvalContext<'_>, level: usize) -> Result<bool, ResolutionError> {
        if level > TriggerNode::MAX_DEPTH {
            return Err(ResolutionError::TreeTooDeep(TriggerNode::MAX_DEPTH));
        }
        let next = level + 1;
        match node {
            TriggerNode::True => Ok(true),
            TriggerNode::False => Ok(false),
            TriggerNode::Condition { condition } => ConditionEvaluator::evaluate(condition, ctx),
            TriggerNode::Not { child } => Ok(!Self::evaluate_at(child, ctx, next)?),
            TriggerNode::And { left, right } => {
                Ok(Self::evaluate_at(left, ctx, next)? && Self::evaluate_at(right, ctx, next)?)
            }
            TriggerNode::Or { left, right } => {
                Ok(Self::evaluate_at(left, ctx, next)? || Self::evaluate_at(right, ctx, next)?)
            }
        }
    }

    /// Evaluate a trigger's root.
    pub fn fires(trigger: &Trigger, ctx: &mut EvalContext<'_>) -> Result<bool, ResolutionError> {
        Self::evaluate(&trigger.root, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Id;
    use crate::schema::{CompareOp, Condition};
    use crate::store::BattleState;

    fn hp_above(n: i64) -> TriggerNode {
        TriggerNode::condition(
            Condition::new("c", "HP", "skill-1", "char-001")
                .on_attribute("hp")
                .compare(CompareOp::Gt, n),
        )
    }

    fn unresolvable() -> TriggerNode {
        TriggerNode::condition(
            Condition::new("c", "Ghost", "skill-1", "ghost")
                .on_attribute("hp")
                .compare(CompareOp::Gt, 0),
        )
    }

    #[test]
    fn test_constants() {
        let state = BattleState::default();
        let mut ctx = EvalContext::new(&state);
        assert_eq!(TriggerEvaluator::evaluate(&TriggerNode::True, &mut ctx), Ok(true));
        assert_eq!(TriggerEvaluator::evaluate(&TriggerNode::False, &mut ctx), Ok(false));
        assert_eq!(TriggerEvaluator::evaluate(&TriggerNode::False.negate(), &mut ctx), Ok(true));
    }

    #[test]
    fn test_condition_leaves() {
        // Default state: char-001 has hp 100.
        let state = BattleState::default();
        let mut ctx = EvalContext::new(&state);

        let tree = hp_above(50).and(hp_above(150).negate());
        assert_eq!(TriggerEvaluator::evaluate(&tree, &mut ctx), Ok(true));

        let tree = hp_above(150).or(hp_above(200));
        assert_eq!(TriggerEvaluator::evaluate(&tree, &mut ctx), Ok(false));
    }

    #[test]
    fn test_short_circuit_skips_right() {
        let state = BattleState::default();
        let mut ctx = EvalContext::new(&state);

        let tree = TriggerNode::False.and(unresolvable());
        assert_eq!(TriggerEvaluator::evaluate(&tree, &mut ctx), Ok(false));

        let tree = TriggerNode::True.or(unresolvable());
        assert_eq!(TriggerEvaluator::evaluate(&tree, &mut ctx), Ok(true));
    }

    #[test]
    fn test_errors_propagate() {
        let state = BattleState::default();
        let mut ctx = EvalContext::new(&state);

        let tree = TriggerNode::True.and(unresolvable().negate());
        assert_eq!(
            TriggerEvaluator::evaluate(&tree, &mut ctx),
            Err(ResolutionError::UnknownEntity(Id::from("ghost")))
        );
    }

    #[test]
    fn test_depth_bound() {
        let state = BattleState::default();
        let mut ctx = EvalContext::new(&state);

        // 63 NOTs over TRUE
        let deepest = (1..TriggerNode::MAX_DEPTH).fold(TriggerNode::True, |node, _| node.negate());
        assert_eq!(TriggerEvaluator::evaluate(&deepest, &mut ctx), Ok(false));

        let too_deep = deepest.negate();
        assert_eq!(
            TriggerEvaluator::evaluate(&too_deep, &mut ctx),
            Err(ResolutionError::TreeTooDeep(TriggerNode::MAX_DEPTH))
        );
    }

    #[test]
    fn test_fires() {
        let state = BattleState::default();
        let mut ctx = EvalContext::new(&state);
        let trigger = Trigger::new("trig-1", "skill-1", "Healthy", hp_above(0));
        assert_eq!(TriggerEvaluator::fires(&trigger, &mut ctx), Ok(true));
    }
}

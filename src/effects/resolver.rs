//! Behavior resolution.
//!
//! The `EffectResolver` decides whether a behavior's conditions hold and
//! computes each effect's final value. Applying the value to an entity is
//! left to the caller's battle runtime.

use tracing::debug;

use crate::conditions::{ConditionEvaluator, EvalContext};
use crate::core::Scalar;
use crate::error::ResolutionError;
use crate::regulators::RegulatorCalculator;
use crate::schema::{Behavior, BehaviorEffect};

/// An effect that passed its gate, with its regulated value.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEffect<'b> {
    pub effect: &'b BehaviorEffect,
    pub value: f64,
}

/// Resolves behaviors against an evaluation context.
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectResolver {
    calculator: RegulatorCalculator,
}

impl EffectResolver {
    /// Create a resolver using the default calculator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with a specific calculator.
    #[must_use]
    pub fn with_calculator(calculator: RegulatorCalculator) -> Self {
        Self { calculator }
    }

    #[must_use]
    pub fn calculator(&self) -> &RegulatorCalculator {
        &self.calculator
    }

    /// Whether the behavior's own conditions all hold.
    pub fn behavior_ready(&self, behavior: &Behavior, ctx: &mut EvalContext<'_>) -> Result<bool, ResolutionError> {
        ConditionEvaluator::evaluate_all(&behavior.conditions, ctx)
    }

    /// Resolve one effect.
    ///
    /// Returns `None` when the effect's gate conditions fail or its `chance`
    /// roll misses. A missing `baseValue` counts as `0`, so regulators alone
    /// can produce the value.
    pub fn resolve(&self, effect: &BehaviorEffect, ctx: &mut EvalContext<'_>) -> Result<Option<f64>, ResolutionError> {
        if !ConditionEvaluator::evaluate_all(effect.gate(), ctx)? {
            return Ok(None);
        }

        if let Some(p) = effect.chance {
            if !(0.0..=1.0).contains(&p) {
                return Err(ResolutionError::InvalidProbability(p));
            }
            let rng = ctx.rng_mut().ok_or(ResolutionError::NoRandomSource)?;
            if !rng.gen_bool(p) {
                return Ok(None);
            }
        }

        let base = match &effect.base_value {
            None => 0.0,
            Some(raw) => Scalar::from_json(raw)
                .and_then(|s| s.as_f64())
                .ok_or_else(|| ResolutionError::NotNumeric(raw.to_string()))?,
        };

        self.calculator.fold(effect.scaling(), base, ctx).map(Some)
    }

    /// Resolve every effect of a behavior, in order.
    ///
    /// Returns nothing when the behavior's conditions fail. Effects whose own
    /// gate fails are left out.
    pub fn resolve_behavior<'b>(
        &self,
        behavior: &'b Behavior,
        ctx: &mut EvalContext<'_>,
    ) -> Result<Vec<ResolvedEffect<'b>>, ResolutionError> {
        if !self.behavior_ready(behavior, ctx)? {
            debug!(behavior = %behavior.uuid, trigger = %behavior.trigger, "behavior conditions not met");
            return Ok(Vec::new());
        }

        let mut resolved = Vec::with_capacity(behavior.effects.len());
        for effect in &behavior.effects {
            match self.resolve(effect, ctx)? {
                Some(value) => resolved.push(ResolvedEffect { effect, value }),
                None => debug!(behavior = %behavior.uuid, effect = %effect.kind, "effect skipped"),
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BattleRng;
    use crate::schema::{CompareOp, EffectCondition, EffectRegulator, EntityReference, EntityType, Source};
    use crate::store::BattleState;

    fn state() -> BattleState {
        let mut state = BattleState::default();
        state.entities.push_back(
            EntityReference::new("skill-1", EntityType::Skill).with_owner("char-001"),
        );
        state
    }

    #[test]
    fn test_base_plus_regulators() {
        let state = state();
        let mut ctx = EvalContext::new(&state).with_self("skill-1");

        let slash = BehaviorEffect::new("damage")
            .with_base(10)
            .with_regulator(EffectRegulator::stat(Source::Owner, "atk", 2.0));
        assert_eq!(EffectResolver::new().resolve(&slash, &mut ctx), Ok(Some(40.0)));
    }

    #[test]
    fn test_gate_and_chance() {
        let state = state();
        let mut ctx = EvalContext::new(&state).with_self("skill-1");
        let resolver = EffectResolver::new();

        let gated = BehaviorEffect::new("heal")
            .with_base(5)
            .when(EffectCondition::tag(Source::Owner, "enemy", CompareOp::Has));
        assert_eq!(resolver.resolve(&gated, &mut ctx), Ok(None));

        let lucky = BehaviorEffect::new("apply_status").with_status("burn").with_chance(0.5);
        assert_eq!(resolver.resolve(&lucky, &mut ctx), Err(ResolutionError::NoRandomSource));

        let mut ctx = EvalContext::new(&state)
            .with_self("skill-1")
            .with_rng(BattleRng::new(1));
        let certain = BehaviorEffect::new("apply_status").with_status("burn").with_chance(1.0);
        assert_eq!(resolver.resolve(&certain, &mut ctx), Ok(Some(0.0)));
    }

    #[test]
    fn test_non_numeric_base() {
        let state = state();
        let mut ctx = EvalContext::new(&state);
        let effect = BehaviorEffect::new("damage").with_base("lots");
        assert!(matches!(
            EffectResolver::new().resolve(&effect, &mut ctx),
            Err(ResolutionError::NotNumeric(_))
        ));
    }

    #[test]
    fn test_resolve_behavior() {
        let state = state();
        let mut ctx = EvalContext::new(&state).with_self("skill-1");
        let resolver = EffectResolver::new();

        let behavior = Behavior::new("beh-1", "skill-1", "on_hit")
            .when(EffectCondition::tag(Source::Owner, "player", CompareOp::Has))
            .with_effect(BehaviorEffect::new("damage").with_base(12))
            .with_effect(
                BehaviorEffect::new("heal")
                    .with_base(3)
                    .when(EffectCondition::stat(Source::Owner, "hp", CompareOp::Lt, 50)),
            );

        let resolved = resolver.resolve_behavior(&behavior, &mut ctx).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].effect.kind, "damage");
        assert!((resolved[0].value - 12.0).abs() < f64::EPSILON);

        let blocked = behavior.when(EffectCondition::tag(Source::Owner, "boss", CompareOp::Has));
        assert!(resolver.resolve_behavior(&blocked, &mut ctx).unwrap().is_empty());
    }
}

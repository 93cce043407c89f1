//! End-to-end battle scenarios.
//!
//! Each test builds a small graph, then evaluates conditions, regulators
//! and behaviors against it.

use battle_lab::conditions::{ConditionEvaluator, EvalContext};
use battle_lab::core::BattleRng;
use battle_lab::effects::EffectResolver;
use battle_lab::error::ResolutionError;
use battle_lab::regulators::{Combination, RegulatorCalculator, SourceReading};
use battle_lab::schema::{
    AttributeComponent, Behavior, BehaviorEffect, CompareOp, Condition, EffectCondition,
    EffectRegulator, EntityReference, EntityType, Regulator, RegulatorMode, RegulatorOp,
    RegulatorType, Schema, Source,
};
use battle_lab::store::BattleState;
use serde_json::json;

fn hero(hp: i64, max_hp: i64) -> BattleState {
    let mut state = BattleState::default();
    state.attributes[0] = AttributeComponent::int("hp", "char-001", "HP", hp);
    state
        .attributes
        .push_back(AttributeComponent::int("maxHp", "char-001", "Max HP", max_hp));
    state
        .entities
        .push_back(EntityReference::new("skill-1", EntityType::Skill).with_owner("char-001"));
    state
}

fn low_hp() -> Condition {
    Condition::parse(&json!({
        "id": "cond-low-hp",
        "name": "Low HP",
        "ownerUuid": "skill-1",
        "targetUuid": "char-001",
        "attributeId": "hp",
        "op": "lt_percent",
        "value": 0.3
    }))
    .unwrap()
}

fn second_wind() -> Regulator {
    Regulator::parse(&json!({
        "id": "reg-second-wind",
        "name": "Second wind",
        "ownerUuid": "skill-1",
        "type": "THRESHOLD_BONUS",
        "sourceUuid": "char-001",
        "sourceAttributeId": "hp",
        "mode": "percent",
        "op": "gte",
        "threshold": 0.5,
        "bonusValue": 10
    }))
    .unwrap()
}

/// hp 50 of 200 is below 30%; hp 100 of 200 is not.
#[test]
fn test_low_hp_condition() {
    let state = hero(50, 200);
    let mut ctx = EvalContext::new(&state);
    assert_eq!(ConditionEvaluator::evaluate(&low_hp(), &mut ctx), Ok(true));

    let state = hero(100, 200);
    let mut ctx = EvalContext::new(&state);
    assert_eq!(ConditionEvaluator::evaluate(&low_hp(), &mut ctx), Ok(false));
}

/// A zero maximum is an error, not a ratio.
#[test]
fn test_low_hp_with_zero_max() {
    let state = hero(50, 0);
    let mut ctx = EvalContext::new(&state);
    assert_eq!(
        ConditionEvaluator::evaluate(&low_hp(), &mut ctx),
        Err(ResolutionError::ZeroMaximum { max: "maxHp".to_string() })
    );
}

/// The threshold bonus pays out at 75% HP and not at 25%.
#[test]
fn test_threshold_bonus() {
    let calculator = RegulatorCalculator::new();
    let regulator = second_wind();
    let scaling = regulator.scaling();

    let healthy = SourceReading::plain("hp", 150.0).with_max(200.0);
    assert_eq!(calculator.adjustment(&scaling, &healthy), Ok(10.0));

    let hurt = SourceReading::plain("hp", 50.0).with_max(200.0);
    assert_eq!(calculator.adjustment(&scaling, &hurt), Ok(0.0));
}

/// The same regulator resolved from live state.
#[test]
fn test_threshold_bonus_from_state() {
    let calculator = RegulatorCalculator::new();
    let regulator = second_wind();

    let state = hero(150, 200);
    let ctx = EvalContext::new(&state);
    assert_eq!(calculator.apply_regulator(&regulator, 5.0, &ctx), Ok(15.0));

    let state = hero(50, 200);
    let ctx = EvalContext::new(&state);
    assert_eq!(calculator.apply_regulator(&regulator, 5.0, &ctx), Ok(5.0));
}

/// Inverse percent scales with missing HP.
#[test]
fn test_inverse_percent_scaling() {
    let state = hero(50, 200);
    let ctx = EvalContext::new(&state);
    let rage = Regulator::new("reg-rage", "Rage", "skill-1")
        .from_source("char-001", "hp")
        .with_mode(RegulatorMode::InversePercent)
        .with_op(RegulatorOp::Mul)
        .with_factor(2.0);

    // 1 - 50/200 = 0.75, times 2 = 1.5
    let scale = RegulatorCalculator::new();
    assert_eq!(scale.apply_regulator(&rage, 10.0, &ctx), Ok(15.0));

    let growth = RegulatorCalculator::new().with_combination(Combination::Growth);
    assert_eq!(growth.apply_regulator(&rage, 10.0, &ctx), Ok(25.0));
}

/// Variable scaling reads runtime variables rather than attributes.
#[test]
fn test_variable_scaling() {
    let state = hero(100, 200);
    let mut ctx = EvalContext::new(&state).with_self("char-001");
    let combo = Regulator::new("reg-combo", "Combo", "skill-1")
        .from_source("char-001", "combo")
        .with_kind(RegulatorType::VariableScaling)
        .with_factor(4.0);

    let calculator = RegulatorCalculator::new();
    assert!(matches!(
        calculator.apply_regulator(&combo, 1.0, &ctx),
        Err(ResolutionError::UnresolvedVariable { .. })
    ));

    ctx.set_variable("char-001", "combo", 3);
    assert_eq!(calculator.apply_regulator(&combo, 1.0, &ctx), Ok(13.0));
}

/// A skill behavior: gated on the owner's tag, with a low-HP bonus effect.
#[test]
fn test_behavior_resolution() {
    let behavior = Behavior::parse(&json!({
        "uuid": "beh-1",
        "type": "behavior",
        "ownerUuid": "skill-1",
        "trigger": "on_attack",
        "conditions": [
            { "type": "TAG_CHECK", "source": "OWNER", "tagId": "player", "op": "HAS" }
        ],
        "effects": [
            {
                "type": "damage",
                "baseValue": 10,
                "regulators": [
                    { "type": "LINEAR_SCALING", "stat": "atk", "source": "OWNER", "factor": 2 }
                ]
            },
            {
                "type": "heal",
                "baseValue": 20,
                "conditions": [
                    { "type": "STAT_COMPARE", "source": "OWNER", "stat": "hp", "op": "lt_percent", "value": 0.3 }
                ]
            }
        ]
    }))
    .unwrap();
    let resolver = EffectResolver::new();

    let state = hero(100, 200);
    let mut ctx = EvalContext::new(&state).with_self("skill-1");
    let resolved = resolver.resolve_behavior(&behavior, &mut ctx).unwrap();
    let values: Vec<_> = resolved.iter().map(|r| (r.effect.kind.as_str(), r.value)).collect();
    assert_eq!(values, vec![("damage", 40.0)]);

    let state = hero(40, 200);
    let mut ctx = EvalContext::new(&state).with_self("skill-1");
    let resolved = resolver.resolve_behavior(&behavior, &mut ctx).unwrap();
    let values: Vec<_> = resolved.iter().map(|r| (r.effect.kind.as_str(), r.value)).collect();
    assert_eq!(values, vec![("damage", 40.0), ("heal", 20.0)]);
}

/// Chance rolls are reproducible with the same seed.
#[test]
fn test_seeded_chance() {
    let state = hero(100, 200);
    let coin = EffectCondition::chance(0.5);

    let flips = |seed: u64| {
        let mut ctx = EvalContext::new(&state).with_rng(BattleRng::new(seed));
        (0..16)
            .map(|_| ConditionEvaluator::evaluate_effect(&coin, &mut ctx).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(flips(7), flips(7));

    let mut ctx = EvalContext::new(&state);
    assert_eq!(
        ConditionEvaluator::evaluate_effect(&coin, &mut ctx),
        Err(ResolutionError::NoRandomSource)
    );
}

/// Conditions can compare against a runtime variable instead of a literal.
#[test]
fn test_compare_against_variable() {
    let state = hero(100, 200);
    let mut ctx = EvalContext::new(&state).with_self("skill-1");
    ctx.set_variable("char-001", "threshold", 120);

    let below = EffectCondition::stat(Source::Owner, "hp", CompareOp::Lt, 0).against_variable("threshold");
    assert_eq!(ConditionEvaluator::evaluate_effect(&below, &mut ctx), Ok(true));
}

/// An effect regulator reading a stats bundle through `OWNER_STATS`.
#[test]
fn test_effect_regulator_on_bundle() {
    let state = hero(100, 200);
    let ctx = EvalContext::new(&state).with_self("skill-1");
    let from_bundle = EffectRegulator::stat(Source::OwnerStats, "atk", 1.0);

    let calculator = RegulatorCalculator::new();
    assert_eq!(calculator.fold(&[from_bundle], 5.0, &ctx), Ok(20.0));

    let missing = EffectRegulator::stat(Source::OwnerStats, "luck", 1.0);
    assert!(matches!(
        calculator.fold(&[missing], 5.0, &ctx),
        Err(ResolutionError::UnresolvedStat { .. })
    ));
}

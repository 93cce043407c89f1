//! Regulator arithmetic.

use crate::conditions::{max_counterpart, EvalContext, Role};
use crate::core::{Id, Scalar};
use crate::error::ResolutionError;
use crate::schema::{EffectRegulator, Regulator, RegulatorMode, RegulatorOp, RegulatorType, Scaling};

/// A resolved source value and, when the mode needs it, its maximum.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceReading {
    pub name: String,
    pub value: f64,
    pub max_name: String,
    pub max: Option<f64>,
}

impl SourceReading {
    /// A reading with no maximum, for `value` mode.
    pub fn plain(name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        Self {
            max_name: max_counterpart(&name),
            name,
            value,
            max: None,
        }
    }

    #[must_use]
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

/// How `mul` combines an adjustment with the base value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Combination {
    /// `base * adjustment`
    #[default]
    Scale,
    /// `base * (1 + adjustment)`, for percentage bonuses.
    Growth,
}

/// Computes regulator adjustments and folds them into base values.
///
/// ## Example
///
/// ```
/// use battle_lab::regulators::{RegulatorCalculator, SourceReading};
/// use battle_lab::schema::{Regulator, RegulatorMode, RegulatorOp};
///
/// // +10 while HP is at least half.
/// let bonus = Regulator::new("reg-1", "Steady", "skill-1")
///     .threshold_bonus(0.5, 10.0)
///     .with_mode(RegulatorMode::Percent)
///     .with_op(RegulatorOp::Gte);
///
/// let calc = RegulatorCalculator::new();
/// let reading = SourceReading::plain("hp", 150.0).with_max(200.0);
/// assert_eq!(calc.adjustment(&bonus.scaling(), &reading), Ok(10.0));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RegulatorCalculator {
    combination: Combination,
}

impl RegulatorCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_combination(mut self, combination: Combination) -> Self {
        self.combination = combination;
        self
    }

    #[must_use]
    pub fn combination(&self) -> Combination {
        self.combination
    }

    /// Normalise the reading according to `mode`.
    pub fn scaled(&self, mode: RegulatorMode, reading: &SourceReading) -> Result<f64, ResolutionError> {
        if !mode.needs_max() {
            return Ok(reading.value);
        }
        let max = reading.max.ok_or_else(|| ResolutionError::MissingMaximum {
            stat: reading.name.clone(),
            max: reading.max_name.clone(),
        })?;
        if max == 0.0 {
            return Err(ResolutionError::ZeroMaximum {
                max: reading.max_name.clone(),
            });
        }
        let ratio = reading.value / max;
        Ok(match mode {
            RegulatorMode::InversePercent => 1.0 - ratio,
            _ => ratio,
        })
    }

    /// The adjustment alone, before combining with a base value.
    pub fn adjustment(&self, scaling: &Scaling, reading: &SourceReading) -> Result<f64, ResolutionError> {
        let scaled = self.scaled(scaling.mode, reading)?;
        match scaling.kind {
            RegulatorType::LinearScaling | RegulatorType::VariableScaling => Ok(scaled * scaling.factor),
            RegulatorType::ThresholdBonus => {
                let threshold = scaling
                    .threshold
                    .ok_or(ResolutionError::MissingParameter("threshold"))?;
                let bonus = scaling
                    .bonus_value
                    .ok_or(ResolutionError::MissingParameter("bonusValue"))?;
                Ok(if scaling.op.passes(scaled, threshold) { bonus } else { 0.0 })
            }
        }
    }

    /// Combine an adjustment with `base`. Comparison ops combine by addition.
    #[must_use]
    pub fn combine(&self, op: RegulatorOp, base: f64, adjustment: f64) -> f64 {
        match (op, self.combination) {
            (RegulatorOp::Mul, Combination::Scale) => base * adjustment,
            (RegulatorOp::Mul, Combination::Growth) => base * (1.0 + adjustment),
            _ => base + adjustment,
        }
    }

    /// Adjust `base` with one reading.
    pub fn apply(&self, scaling: &Scaling, reading: &SourceReading, base: f64) -> Result<f64, ResolutionError> {
        let adjustment = self.adjustment(scaling, reading)?;
        Ok(self.combine(scaling.op, base, adjustment))
    }

    /// Read a stored regulator's source from live state.
    ///
    /// An unset `sourceUuid` reads from the `SELF` role.
    pub fn read_regulator(&self, regulator: &Regulator, ctx: &EvalContext<'_>) -> Result<SourceReading, ResolutionError> {
        let entity = match &regulator.source_uuid {
            Some(uuid) if ctx.view().contains(uuid) => uuid.clone(),
            Some(uuid) => return Err(ResolutionError::UnknownEntity(uuid.clone())),
            None => ctx.entity_for(Role::SelfEntity)?,
        };
        let key = regulator
            .source_attribute_id
            .as_deref()
            .ok_or(ResolutionError::MissingSubject("sourceAttributeId is not set"))?;
        let by_variable = regulator.kind == RegulatorType::VariableScaling;

        let read = |k: &str| -> Option<Scalar> {
            if by_variable {
                ctx.variable(&entity, k).cloned()
            } else {
                ctx.entity_stat(&entity, k)
            }
        };
        let value = read(key).ok_or_else(|| unresolved(by_variable, &entity, key))?;

        let mut reading = SourceReading::plain(key, number(&value)?);
        if let Some(max_key) = &regulator.max_source_attribute_id {
            reading.max_name = max_key.clone();
        }
        if regulator.mode.needs_max() {
            reading.max = read(&reading.max_name).map(|m| number(&m)).transpose()?;
        }
        Ok(reading)
    }

    /// Read an effect regulator's source through its role.
    pub fn read_effect_regulator(
        &self,
        regulator: &EffectRegulator,
        ctx: &EvalContext<'_>,
    ) -> Result<SourceReading, ResolutionError> {
        let by_variable = regulator.kind == RegulatorType::VariableScaling;
        let key = if by_variable {
            regulator.variable.as_deref()
        } else {
            regulator.stat.as_deref()
        }
        .ok_or(ResolutionError::MissingSubject("regulator has no stat or variable"))?;

        let entity = ctx.entity_for(Role::of(regulator.source))?;
        let read = |k: &str| -> Result<Option<Scalar>, ResolutionError> {
            if by_variable {
                Ok(ctx.variable(&entity, k).cloned())
            } else {
                ctx.source_stat(regulator.source, k).map(|(_, v)| v)
            }
        };
        let value = read(key)?.ok_or_else(|| unresolved(by_variable, &entity, key))?;

        let mut reading = SourceReading::plain(key, number(&value)?);
        if regulator.mode.needs_max() {
            reading.max = read(&reading.max_name)?.map(|m| number(&m)).transpose()?;
        }
        Ok(reading)
    }

    /// Adjust `base` with a stored regulator.
    pub fn apply_regulator(&self, regulator: &Regulator, base: f64, ctx: &EvalContext<'_>) -> Result<f64, ResolutionError> {
        let reading = self.read_regulator(regulator, ctx)?;
        self.apply(&regulator.scaling(), &reading, base)
    }

    /// Adjust `base` with an effect regulator.
    pub fn apply_effect_regulator(
        &self,
        regulator: &EffectRegulator,
        base: f64,
        ctx: &EvalContext<'_>,
    ) -> Result<f64, ResolutionError> {
        let reading = self.read_effect_regulator(regulator, ctx)?;
        self.apply(&regulator.scaling(), &reading, base)
    }

    /// Apply regulators in order, each to the previous result.
    pub fn fold(&self, regulators: &[EffectRegulator], base: f64, ctx: &EvalContext<'_>) -> Result<f64, ResolutionError> {
        regulators
            .iter()
            .try_fold(base, |value, regulator| self.apply_effect_regulator(regulator, value, ctx))
    }
}

fn number(value: &Scalar) -> Result<f64, ResolutionError> {
    value
        .as_f64()
        .ok_or_else(|| ResolutionError::NotNumeric(value.to_string()))
}

fn unresolved(by_variable: bool, entity: &Id, key: &str) -> ResolutionError {
    if by_variable {
        ResolutionError::UnresolvedVariable {
            entity: entity.clone(),
            variable: key.to_string(),
        }
    } else {
        ResolutionError::UnresolvedStat {
            holder: entity.clone(),
            stat: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeComponent, EntityReference, EntityType, Source, StatsBundle};
    use crate::store::BattleState;

    fn reading(value: f64, max: f64) -> SourceReading {
        SourceReading::plain("hp", value).with_max(max)
    }

    fn bonus() -> Scaling {
        Regulator::new("r", "Bonus", "s")
            .threshold_bonus(0.5, 10.0)
            .with_mode(RegulatorMode::Percent)
            .with_op(RegulatorOp::Gte)
            .scaling()
    }

    #[test]
    fn test_modes() {
        let calc = RegulatorCalculator::new();
        let r = reading(50.0, 200.0);
        assert_eq!(calc.scaled(RegulatorMode::Value, &r), Ok(50.0));
        assert_eq!(calc.scaled(RegulatorMode::Percent, &r), Ok(0.25));
        assert_eq!(calc.scaled(RegulatorMode::InversePercent, &r), Ok(0.75));
    }

    #[test]
    fn test_percent_without_max_is_an_error() {
        let calc = RegulatorCalculator::new();
        assert_eq!(
            calc.scaled(RegulatorMode::Percent, &SourceReading::plain("hp", 5.0)),
            Err(ResolutionError::MissingMaximum {
                stat: "hp".to_string(),
                max: "maxHp".to_string()
            })
        );
        assert_eq!(
            calc.scaled(RegulatorMode::InversePercent, &reading(5.0, 0.0)),
            Err(ResolutionError::ZeroMaximum { max: "maxHp".to_string() })
        );
    }

    #[test]
    fn test_threshold_bonus() {
        let calc = RegulatorCalculator::new();
        assert_eq!(calc.adjustment(&bonus(), &reading(150.0, 200.0)), Ok(10.0));
        assert_eq!(calc.adjustment(&bonus(), &reading(50.0, 200.0)), Ok(0.0));
        assert_eq!(calc.adjustment(&bonus(), &reading(100.0, 200.0)), Ok(10.0));

        let strict = Scaling { op: RegulatorOp::Add, ..bonus() };
        assert_eq!(calc.adjustment(&strict, &reading(100.0, 200.0)), Ok(0.0));

        let unset = Scaling { threshold: None, ..bonus() };
        assert_eq!(
            calc.adjustment(&unset, &reading(100.0, 200.0)),
            Err(ResolutionError::MissingParameter("threshold"))
        );
    }

    #[test]
    fn test_linear_and_combination() {
        let calc = RegulatorCalculator::new();
        let linear = Scaling { factor: 0.5, ..Scaling::default() };
        assert_eq!(calc.apply(&linear, &SourceReading::plain("atk", 30.0), 10.0), Ok(25.0));

        let mul = Scaling { op: RegulatorOp::Mul, factor: 0.5, ..Scaling::default() };
        let r = SourceReading::plain("rage", 1.0);
        assert_eq!(calc.apply(&mul, &r, 50.0), Ok(25.0));
        let growth = calc.with_combination(Combination::Growth);
        assert_eq!(growth.apply(&mul, &r, 50.0), Ok(75.0));
    }

    #[test]
    fn test_stored_regulator_reads_live_state() {
        let mut state = BattleState::default();
        state
            .attributes
            .push_back(AttributeComponent::int("maxHp", "char-001", "Max HP", 200));
        let ctx = EvalContext::new(&state);

        // Missing hp: 1 - 100/200 = 0.5, doubled.
        let missing = Regulator::new("r", "Vengeance", "skill-1")
            .from_source("char-001", "hp")
            .with_mode(RegulatorMode::InversePercent)
            .with_factor(2.0);
        let calc = RegulatorCalculator::new();
        assert_eq!(calc.apply_regulator(&missing, 10.0, &ctx), Ok(11.0));

        let explicit = missing.clone().with_max("atk");
        assert_eq!(calc.read_regulator(&explicit, &ctx).unwrap().max, Some(15.0));

        let ghost = missing.from_source("ghost", "hp");
        assert_eq!(
            calc.apply_regulator(&ghost, 10.0, &ctx),
            Err(ResolutionError::UnknownEntity(Id::from("ghost")))
        );
    }

    #[test]
    fn test_variable_scaling() {
        let state = BattleState::default();
        let mut ctx = EvalContext::new(&state).with_self("char-001");
        ctx.set_variable("char-001", "kills", 3);

        let reg = Regulator::new("r", "Bloodlust", "skill-1")
            .with_kind(RegulatorType::VariableScaling)
            .from_source("char-001", "kills")
            .with_factor(5.0);
        let calc = RegulatorCalculator::new();
        assert_eq!(calc.apply_regulator(&reg, 20.0, &ctx), Ok(35.0));

        let effect = EffectRegulator::variable(Source::SelfEntity, "streak", 1.0);
        assert!(matches!(
            calc.apply_effect_regulator(&effect, 0.0, &ctx),
            Err(ResolutionError::UnresolvedVariable { .. })
        ));
    }

    #[test]
    fn test_fold_effect_regulators() {
        let mut state = BattleState::default();
        state
            .entities
            .push_back(EntityReference::new("skill-1", EntityType::Skill).with_owner("char-001"));
        state
            .stats_bundles
            .push_back(StatsBundle::new("bundle-skill", "skill-1").with_stat("level", 4));
        let ctx = EvalContext::new(&state).with_self("skill-1");

        let regulators = [
            // Owner ATK (15) through the owner's bundle, which lists atk.
            EffectRegulator::stat(Source::OwnerStats, "atk", 1.0),
            EffectRegulator::stat(Source::SelfStats, "level", 0.5).with_op(RegulatorOp::Mul),
        ];
        let calc = RegulatorCalculator::new().with_combination(Combination::Growth);
        // (5 + 15) * (1 + 2)
        assert_eq!(calc.fold(&regulators, 5.0, &ctx), Ok(60.0));
    }
}

//! Condition evaluation.
//!
//! A condition resolves a [`Subject`] from live state, then applies its
//! operator against the comparison target. Anything that cannot be resolved
//! is a [`ResolutionError`]; nothing silently evaluates to `false`.

use crate::core::Scalar;
use crate::error::ResolutionError;
use crate::schema::{CompareOp, Condition, ConditionType, EffectCondition};

use super::view::{max_counterpart, EvalContext, Role};

/// The resolved left-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Subject {
    /// A plain value.
    Value(Scalar),
    /// `current / max`, for percent operators.
    Ratio(f64),
    /// Whether a status, tag or attribute is present.
    Presence(bool),
}

/// Evaluator for both condition forms.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate an attribute-compare condition against its `targetUuid`.
    pub fn evaluate(condition: &Condition, ctx: &mut EvalContext<'_>) -> Result<bool, ResolutionError> {
        let target = condition.target_uuid.clone();
        if !ctx.view().contains(&target) {
            return Err(ResolutionError::UnknownEntity(target));
        }
        let operand = condition.value.as_ref().and_then(Scalar::from_json);

        let subject = match condition.attribute_id.as_deref() {
            Some(key) => measure(
                condition.op,
                key,
                |k| Ok(ctx.entity_stat(&target, k)),
                || ResolutionError::UnresolvedStat {
                    holder: target.clone(),
                    stat: key.to_string(),
                },
            )?,
            None if condition.op.is_presence() => {
                let name = operand
                    .as_ref()
                    .and_then(Scalar::as_text)
                    .ok_or(ResolutionError::MissingSubject("HAS needs attributeId or a tag/status id"))?;
                let view = ctx.view();
                return Ok(
                    (view.has_status(&target, name) || view.has_tag(&target, name)) == (condition.op == CompareOp::Has),
                );
            }
            None => return Err(ResolutionError::MissingSubject("attributeId is not set")),
        };

        Self::compare(condition.op, &subject, operand.as_ref())
    }

    /// Evaluate a typed condition through its source role.
    pub fn evaluate_effect(condition: &EffectCondition, ctx: &mut EvalContext<'_>) -> Result<bool, ResolutionError> {
        if condition.kind == ConditionType::Chance {
            return roll(condition, ctx);
        }

        let entity = ctx.entity_for(Role::of(condition.source))?;
        let op = condition.op;

        let subject = match condition.kind {
            ConditionType::StatCompare => {
                let stat = condition
                    .stat
                    .as_deref()
                    .ok_or(ResolutionError::MissingSubject("STAT_COMPARE without stat"))?;
                measure(
                    op,
                    stat,
                    |k| ctx.source_stat(condition.source, k).map(|(_, v)| v),
                    || ResolutionError::UnresolvedStat {
                        holder: entity.clone(),
                        stat: stat.to_string(),
                    },
                )?
            }
            ConditionType::VariableCompare => {
                let variable = condition
                    .variable
                    .as_deref()
                    .ok_or(ResolutionError::MissingSubject("VARIABLE_COMPARE without variable"))?;
                measure(
                    op,
                    variable,
                    |k| Ok(ctx.variable(&entity, k).cloned()),
                    || ResolutionError::UnresolvedVariable {
                        entity: entity.clone(),
                        variable: variable.to_string(),
                    },
                )?
            }
            ConditionType::StatusCheck => {
                let status = condition
                    .status_id
                    .as_deref()
                    .ok_or(ResolutionError::MissingSubject("STATUS_CHECK without statusId"))?;
                Subject::Presence(ctx.view().has_status(&entity, status))
            }
            ConditionType::TagCheck => {
                let tag = condition
                    .tag_id
                    .as_deref()
                    .ok_or(ResolutionError::MissingSubject("TAG_CHECK without tagId"))?;
                Subject::Presence(ctx.view().has_tag(&entity, tag))
            }
            ConditionType::Chance => return roll(condition, ctx),
        };

        let operand = match &condition.ref_variable {
            Some(name) => Some(ctx.variable(&entity, name).cloned().ok_or_else(|| {
                ResolutionError::UnresolvedVariable {
                    entity: entity.clone(),
                    variable: name.clone(),
                }
            })?),
            None => condition.value.as_ref().and_then(Scalar::from_json),
        };

        Self::compare(op, &subject, operand.as_ref())
    }

    /// Flat AND over a condition list, stopping at the first `false`.
    ///
    /// An empty list is satisfied.
    pub fn evaluate_all(conditions: &[EffectCondition], ctx: &mut EvalContext<'_>) -> Result<bool, ResolutionError> {
        for condition in conditions {
            if !Self::evaluate_effect(condition, ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Apply `op` to a resolved subject.
    pub fn compare(op: CompareOp, subject: &Subject, operand: Option<&Scalar>) -> Result<bool, ResolutionError> {
        let incomparable = |subject: &'static str| ResolutionError::Incomparable {
            op: op.name(),
            subject,
            target: operand.map_or("nothing", Scalar::kind),
        };

        match subject {
            Subject::Presence(present) => match op {
                CompareOp::Has => Ok(*present),
                CompareOp::NotHas => Ok(!*present),
                CompareOp::Eq | CompareOp::Neq => {
                    let wanted = match operand {
                        None => true,
                        Some(v) => v.as_bool().ok_or_else(|| incomparable("presence"))?,
                    };
                    Ok((*present == wanted) == (op == CompareOp::Eq))
                }
                _ => Err(incomparable("presence")),
            },

            Subject::Ratio(ratio) => {
                let operand = operand.ok_or(ResolutionError::MissingOperand(op.name()))?;
                let fraction = operand
                    .as_f64()
                    .ok_or_else(|| ResolutionError::NotNumeric(operand.to_string()))?;
                match op {
                    CompareOp::LtPercent => Ok(*ratio < fraction),
                    CompareOp::GtPercent => Ok(*ratio > fraction),
                    _ => Err(incomparable("ratio")),
                }
            }

            Subject::Value(value) => {
                if op.is_presence() {
                    return Ok(op == CompareOp::Has);
                }
                let operand = operand.ok_or(ResolutionError::MissingOperand(op.name()))?;
                match op {
                    CompareOp::Eq => Ok(value.loosely_equals(operand)),
                    CompareOp::Neq => Ok(!value.loosely_equals(operand)),
                    CompareOp::Lt | CompareOp::Gt | CompareOp::Lte | CompareOp::Gte => {
                        let ord = value.ordering(operand).ok_or_else(|| incomparable(value.kind()))?;
                        Ok(match op {
                            CompareOp::Lt => ord.is_lt(),
                            CompareOp::Gt => ord.is_gt(),
                            CompareOp::Lte => ord.is_le(),
                            _ => ord.is_ge(),
                        })
                    }
                    _ => Err(incomparable(value.kind())),
                }
            }
        }
    }
}

/// Resolve `key` into a subject suited to `op`.
///
/// Presence ops only ask whether `key` resolves. Percent ops also read the
/// `max` counterpart, which must exist and be non-zero.
fn measure(
    op: CompareOp,
    key: &str,
    read: impl Fn(&str) -> Result<Option<Scalar>, ResolutionError>,
    missing: impl FnOnce() -> ResolutionError,
) -> Result<Subject, ResolutionError> {
    let current = read(key)?;
    if op.is_presence() {
        return Ok(Subject::Presence(current.is_some()));
    }
    let current = current.ok_or_else(missing)?;
    if !op.is_percent() {
        return Ok(Subject::Value(current));
    }

    let max_key = max_counterpart(key);
    let max = read(&max_key)?.ok_or_else(|| ResolutionError::MissingMaximum {
        stat: key.to_string(),
        max: max_key.clone(),
    })?;
    ratio(&current, &max, &max_key).map(Subject::Ratio)
}

/// `current / max`, rejecting non-numeric values and a zero maximum.
fn ratio(current: &Scalar, max: &Scalar, max_key: &str) -> Result<f64, ResolutionError> {
    let current = current
        .as_f64()
        .ok_or_else(|| ResolutionError::NotNumeric(current.to_string()))?;
    let max = max
        .as_f64()
        .ok_or_else(|| ResolutionError::NotNumeric(max.to_string()))?;
    if max == 0.0 {
        return Err(ResolutionError::ZeroMaximum { max: max_key.to_string() });
    }
    Ok(current / max)
}

fn roll(condition: &EffectCondition, ctx: &mut EvalContext<'_>) -> Result<bool, ResolutionError> {
    let p = condition
        .value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .ok_or(ResolutionError::MissingOperand("CHANCE"))?;
    if !(0.0..=1.0).contains(&p) {
        return Err(ResolutionError::InvalidProbability(p));
    }
    let rng = ctx.rng_mut().ok_or(ResolutionError::NoRandomSource)?;
    Ok(rng.gen_bool(p))
}

//! Regulator calculation.
//!
//! A regulator turns a source value into an adjustment and folds it into a
//! base value (damage, heal, bonus):
//!
//! 1. `mode` normalises the source: `value` as-is, `percent` as `v / vmax`,
//!    `inverse_percent` as `1 - v / vmax`.
//! 2. `type` shapes it: linear and variable scaling multiply by `factor`;
//!    threshold bonus yields `bonusValue` or `0`.
//! 3. `op` combines it with the base: `add` sums, `mul` multiplies per the
//!    calculator's [`Combination`].
//!
//! A missing or zero maximum in a percent mode is a resolution error.

mod calculator;

pub use calculator::{Combination, RegulatorCalculator, SourceReading};

//! Bounds and cross-checks over mined figures.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::models::{GoldEquivalent, Metal, MinedFigures, QuantityType};
use crate::units::Unit;

/// Largest plausible in-ground figure, in Moz.
pub const MAX_MOZ: f64 = 5_000.0;

/// Largest plausible annual production figure, in koz.
pub const MAX_KOZ: f64 = 100_000.0;

static METAL_MENTIONS: LazyLock<[(Metal, Regex); 2]> = LazyLock::new(|| {
    [
        (Metal::Gold, Regex::new(r"(?i)\bgold\b").unwrap()),
        (Metal::Silver, Regex::new(r"(?i)\bsilver\b").unwrap()),
    ]
});

/// Reason a mined result was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{metal} {quantity} value {value} outside 0..={max} {unit}")]
    OutOfBounds {
        metal: &'static str,
        quantity: &'static str,
        value: f64,
        max: f64,
        unit: &'static str,
    },

    #[error("description mentions {0} but no {0} figures were mined")]
    MissingMetal(&'static str),
}

/// Upper bound for figures in `unit`.
pub fn bound_for(unit: Unit) -> f64 {
    match unit {
        Unit::Koz => MAX_KOZ,
        _ => MAX_MOZ,
    }
}

fn check_value(
    metal: &'static str,
    quantity: QuantityType,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    let unit = quantity.unit();
    let max = bound_for(unit);
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfBounds {
            metal,
            quantity: quantity.as_str(),
            value,
            max,
            unit: unit.as_str(),
        })
    }
}

/// Metals named in a company description.
pub fn mentioned_metals(description: &str) -> Vec<Metal> {
    METAL_MENTIONS
        .iter()
        .filter(|(_, re)| re.is_match(description))
        .map(|(metal, _)| *metal)
        .collect()
}

/// Accept or reject a mined result.
///
/// Every figure and gold-equivalent total must be empty or within the bound for
/// its unit, and every metal the description mentions must have at least one
/// figure. Validation has no side effects, so an accepted result stays accepted.
pub fn validate(
    figures: &MinedFigures,
    gold_equivalent: &GoldEquivalent,
    description: &str,
) -> Result<(), ValidationError> {
    for (metal, quantity, value) in figures.iter() {
        check_value(metal.as_str(), quantity, value)?;
    }
    for quantity in QuantityType::ALL {
        check_value("gold_equivalent", quantity, gold_equivalent.get(quantity))?;
    }

    for metal in mentioned_metals(description) {
        if !figures.has_metal(metal) {
            return Err(ValidationError::MissingMetal(metal.as_str()));
        }
    }

    Ok(())
}

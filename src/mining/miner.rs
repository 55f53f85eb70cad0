//! Figure mining over extracted report text.

use std::collections::HashSet;

use tracing::debug;

use super::patterns::{grade_patterns, parse_number, COMPILED_TABLE};
use crate::models::{GoldEquivalent, Metal, MinedFigures, QuantityType};
use crate::units::{self, Unit, DEFAULT_GRADE};

/// Ounces of gold per ounce of silver used for gold-equivalent totals.
pub const SILVER_TO_GOLD_RATIO: f64 = 1.0 / 80.0;

/// A single pattern hit, before accumulation.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureMatch {
    pub metal: Metal,
    pub quantity: QuantityType,
    /// Index of the pattern row that matched.
    pub row: usize,
    /// Figure as written in the text.
    pub raw_value: f64,
    pub raw_unit: Unit,
    /// Grade used for mass conversion, if the unit was a mass unit.
    pub grade: Option<f64>,
    /// Figure in the row's target unit.
    pub value: f64,
    /// Byte span of the figure in the text.
    pub span: (usize, usize),
}

/// Parse the stated grade for `metal` in g/t, falling back to [`DEFAULT_GRADE`].
pub fn parse_grade(text: &str, metal: Metal) -> f64 {
    grade_patterns(metal)
        .filter_map(|re| re.captures(text))
        .filter_map(|caps| parse_number(caps.name("value")?.as_str()))
        .find(|grade| *grade > 0.0)
        .unwrap_or(DEFAULT_GRADE)
}

/// Run every pattern row over `text` and return all of its hits.
///
/// Two rows for the same (metal, quantity) pair that land on the same figure
/// produce a single match.
pub fn find_matches(text: &str) -> Vec<FigureMatch> {
    let grades = [parse_grade(text, Metal::Gold), parse_grade(text, Metal::Silver)];
    let mut seen: HashSet<(Metal, QuantityType, usize, usize)> = HashSet::new();
    let mut matches = Vec::new();

    for (index, compiled) in COMPILED_TABLE.iter().enumerate() {
        let row = compiled.row;
        let grade = match row.metal {
            Metal::Gold => grades[0],
            Metal::Silver => grades[1],
        };

        for caps in compiled.regex.captures_iter(text) {
            let (Some(value_match), Some(unit_match)) = (caps.name("value"), caps.name("unit"))
            else {
                continue;
            };
            let (Some(raw_value), Some(raw_unit)) = (
                parse_number(value_match.as_str()),
                Unit::parse_token(unit_match.as_str()),
            ) else {
                continue;
            };

            let span = (value_match.start(), value_match.end());
            if !seen.insert((row.metal, row.quantity, span.0, span.1)) {
                continue;
            }
            let Some(value) = units::convert(raw_value, raw_unit, row.unit, grade) else {
                continue;
            };

            debug!(
                metal = row.metal.as_str(),
                quantity = row.quantity.as_str(),
                row = index,
                raw_value,
                unit = raw_unit.as_str(),
                value,
                "Pattern matched"
            );

            matches.push(FigureMatch {
                metal: row.metal,
                quantity: row.quantity,
                row: index,
                raw_value,
                raw_unit,
                grade: raw_unit.is_mass().then_some(grade),
                value,
                span,
            });
        }
    }

    matches
}

/// Sum matches into per-metal, per-quantity figures.
pub fn accumulate(matches: &[FigureMatch]) -> MinedFigures {
    let mut figures = MinedFigures::new();
    for m in matches {
        figures.add(m.metal, m.quantity, m.value);
    }
    figures
}

/// Mine gold and silver figures from lowercased report text.
pub fn mine(text: &str) -> MinedFigures {
    accumulate(&find_matches(text))
}

/// Combine gold and silver into gold-equivalent totals per quantity type.
///
/// A missing metal counts as zero unless both are missing, in which case the
/// total stays empty.
pub fn gold_equivalent(figures: &MinedFigures) -> GoldEquivalent {
    let mut totals = GoldEquivalent::default();
    for quantity in QuantityType::ALL {
        let gold = figures.get(Metal::Gold, quantity);
        let silver = figures.get(Metal::Silver, quantity);
        let total = match (gold, silver) {
            (None, None) => None,
            (gold, silver) => {
                Some(gold.unwrap_or(0.0) + silver.unwrap_or(0.0) * SILVER_TO_GOLD_RATIO)
            }
        };
        totals.set(quantity, total);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mine_measured_indicated() {
        let figures = mine("measured and indicated gold 1.2 moz. indicated silver 10 moz.");
        assert_eq!(figures.get(Metal::Gold, QuantityType::MeasuredIndicated), Some(1.2));
        assert_eq!(figures.get(Metal::Silver, QuantityType::MeasuredIndicated), Some(10.0));
        assert_eq!(figures.get(Metal::Gold, QuantityType::Reserve), None);

        let eq = gold_equivalent(&figures);
        assert!(close(eq.measured_indicated.unwrap(), 1.2 + 10.0 / 80.0));
        assert_eq!(eq.reserve, None);
    }

    #[test]
    fn test_mine_converts_ounces() {
        let figures = mine("gold reserves of 1,500,000 ounces. gold production of 0.35 moz");
        assert!(close(figures.get(Metal::Gold, QuantityType::Reserve).unwrap(), 1.5));
        assert!(close(figures.get(Metal::Gold, QuantityType::Production).unwrap(), 350.0));
    }

    #[test]
    fn test_mass_units_use_grade() {
        let text = "gold reserves 2 mt at a grade of 3.0 g/t gold";
        let matches = find_matches(text);
        let reserve = matches
            .iter()
            .find(|m| m.quantity == QuantityType::Reserve)
            .unwrap();
        assert_eq!(reserve.grade, Some(3.0));
        let expected_moz = 2_000_000.0 * 3.0 / units::TONNE_GRADE_DIVISOR / 1_000_000.0;
        assert!(close(reserve.value, expected_moz));
    }

    #[test]
    fn test_default_grade() {
        assert_eq!(parse_grade("no grades here", Metal::Gold), DEFAULT_GRADE);
        assert_eq!(parse_grade("silver grade of 120 g/t", Metal::Silver), 120.0);
    }

    #[test]
    fn test_same_figure_counted_once() {
        // Both the "gold reserves ..." and "reserves ... gold ..." rows land on 2.0.
        let text = "mineral reserves: gold reserves 2.0 moz";
        let hits: Vec<_> = COMPILED_TABLE
            .iter()
            .filter(|c| c.row.quantity == QuantityType::Reserve && c.regex.is_match(text))
            .collect();
        assert!(hits.len() >= 2);
        assert_eq!(mine(text).get(Metal::Gold, QuantityType::Reserve), Some(2.0));
    }

    #[test]
    fn test_separate_rows_sum() {
        let figures = mine("gold reserves 1.0 moz; 0.5 moz of gold reserves");
        assert_eq!(figures.get(Metal::Gold, QuantityType::Reserve), Some(1.5));
    }

    #[test]
    fn test_per_project_sections_sum() {
        let text = "north project: gold reserves 1.0 moz. \
                    south project: gold reserves 0.5 moz. \
                    silver production 300 koz at north; silver production 200 koz at south.";
        let figures = mine(text);
        assert!(close(figures.get(Metal::Gold, QuantityType::Reserve).unwrap(), 1.5));
        assert!(close(figures.get(Metal::Silver, QuantityType::Production).unwrap(), 500.0));

        let rows: HashSet<usize> = find_matches(text)
            .iter()
            .filter(|m| m.quantity == QuantityType::Reserve)
            .map(|m| m.row)
            .collect();
        // Both hits come from the same row
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_gold_equivalent_nulls() {
        let mut figures = MinedFigures::new();
        figures.set(Metal::Silver, QuantityType::Resource, Some(80.0));
        let eq = gold_equivalent(&figures);
        assert!(close(eq.resource.unwrap(), 1.0));
        assert_eq!(eq.production, None);
    }

    #[test]
    fn test_nothing_mined() {
        assert!(mine("quarterly dividend declared").is_empty());
    }
}

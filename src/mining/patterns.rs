//! Declarative figure pattern table.
//!
//! Each row names the (metal, quantity type) it feeds, a pattern over lowercased
//! report text and the unit its figures are normalized into. Patterns are written
//! with placeholders expanded when the table is compiled:
//!
//! - `{NUM}` captures the figure as `value` (thousands separators allowed)
//! - `{UNIT}` captures the unit token as `unit`
//! - `{GAP}` skips a short run of non-digit text between keywords

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Metal, QuantityType};
use crate::units::Unit;

const NUM: &str = r"(?P<value>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";
const UNIT: &str = r"(?P<unit>million\s+ounces|thousand\s+ounces|million\s+oz|thousand\s+oz|million\s+tonnes|thousand\s+tonnes|moz|koz|ounces|oz|tonnes|mt|kt|t)\b";
const GAP: &str = r"[^\d]{0,40}?";

/// One row of the pattern table.
#[derive(Debug, Clone, Copy)]
pub struct PatternRow {
    pub metal: Metal,
    pub quantity: QuantityType,
    pub pattern: &'static str,
    pub unit: Unit,
}

const fn row(metal: Metal, quantity: QuantityType, pattern: &'static str, unit: Unit) -> PatternRow {
    PatternRow {
        metal,
        quantity,
        pattern,
        unit,
    }
}

use crate::models::Metal::{Gold, Silver};
use crate::models::QuantityType::{MeasuredIndicated, Production, Reserve, Resource};

/// The ordered pattern table.
pub const PATTERN_TABLE: &[PatternRow] = &[
    // Reserves
    row(Gold, Reserve, r"\bgold\s+(?:mineral\s+)?reserves?\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Gold, Reserve, r"\b(?:proven|probable|mineral)?\s*reserves?\b{GAP}\bgold\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Gold, Reserve, r"{NUM}\s*{UNIT}\s+(?:of\s+)?gold\s+(?:mineral\s+)?reserves?\b", Unit::Moz),
    row(Silver, Reserve, r"\bsilver\s+(?:mineral\s+)?reserves?\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Silver, Reserve, r"\b(?:proven|probable|mineral)?\s*reserves?\b{GAP}\bsilver\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Silver, Reserve, r"{NUM}\s*{UNIT}\s+(?:of\s+)?silver\s+(?:mineral\s+)?reserves?\b", Unit::Moz),
    // Measured and indicated
    row(Gold, MeasuredIndicated, r"(?:measured\s*(?:and|&|\+)\s*)?indicated\b{GAP}\bgold\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Gold, MeasuredIndicated, r"\bgold\b{GAP}\bmeasured\s*(?:and|&|\+)\s*indicated\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Silver, MeasuredIndicated, r"(?:measured\s*(?:and|&|\+)\s*)?indicated\b{GAP}\bsilver\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Silver, MeasuredIndicated, r"\bsilver\b{GAP}\bmeasured\s*(?:and|&|\+)\s*indicated\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    // Resources
    row(Gold, Resource, r"\bgold\s+(?:mineral\s+)?resources?\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Gold, Resource, r"\b(?:total|inferred|mineral)\s+resources?\b{GAP}\bgold\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Silver, Resource, r"\bsilver\s+(?:mineral\s+)?resources?\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    row(Silver, Resource, r"\b(?:total|inferred|mineral)\s+resources?\b{GAP}\bsilver\b{GAP}{NUM}\s*{UNIT}", Unit::Moz),
    // Production
    row(Gold, Production, r"\bgold\s+production\b{GAP}{NUM}\s*{UNIT}", Unit::Koz),
    row(Gold, Production, r"\bproduced\b{GAP}{NUM}\s*{UNIT}\s+(?:of\s+)?gold\b", Unit::Koz),
    row(Silver, Production, r"\bsilver\s+production\b{GAP}{NUM}\s*{UNIT}", Unit::Koz),
    row(Silver, Production, r"\bproduced\b{GAP}{NUM}\s*{UNIT}\s+(?:of\s+)?silver\b", Unit::Koz),
];

/// A pattern row with its expanded, compiled regex.
#[derive(Debug)]
pub struct CompiledRow {
    pub row: PatternRow,
    pub regex: Regex,
}

/// Expand placeholders in a row pattern.
pub fn expand(pattern: &str) -> String {
    pattern
        .replace("{NUM}", NUM)
        .replace("{UNIT}", UNIT)
        .replace("{GAP}", GAP)
}

/// The compiled pattern table, in table order.
pub static COMPILED_TABLE: LazyLock<Vec<CompiledRow>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|row| CompiledRow {
            row: *row,
            regex: Regex::new(&expand(row.pattern)).unwrap(),
        })
        .collect()
});

static GRADE_GOLD: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"\bgold\b[^\d]{0,20}?(?:grade\b[^\d]{0,20}?)?{NUM}\s*g/t",
        r"{NUM}\s*g/t\s*(?:au|gold)\b",
    ])
});

static GRADE_SILVER: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"\bsilver\b[^\d]{0,20}?(?:grade\b[^\d]{0,20}?)?{NUM}\s*g/t",
        r"{NUM}\s*g/t\s*(?:ag|silver)\b",
    ])
});

static GRADE_ANY: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_all(&[r"{NUM}\s*(?:g/t|grams?\s+per\s+tonne)"]));

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&expand(p)).unwrap())
        .collect()
}

/// Grade patterns for a metal, most specific first, ending with any stated grade.
pub fn grade_patterns(metal: Metal) -> impl Iterator<Item = &'static Regex> {
    let specific: &'static [Regex] = match metal {
        Metal::Gold => &GRADE_GOLD,
        Metal::Silver => &GRADE_SILVER,
    };
    specific.iter().chain(GRADE_ANY.iter())
}

/// Parse a captured figure, dropping thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

//! Unit conversion between ounce-based and mass-based quantities.
//!
//! Ounce scales (oz, koz, Moz) convert by fixed ratios. Mass quantities of ore
//! (t, kt, Mt) only relate to contained metal through an assay grade in g/t.

use serde::{Deserialize, Serialize};

/// Troy ounces per thousand ounces.
pub const OUNCES_PER_KOZ: f64 = 1_000.0;

/// Thousand ounces per million ounces.
pub const KOZ_PER_MOZ: f64 = 1_000.0;

/// Divisor applied to `tonnes * grade` to obtain ounces.
pub const TONNE_GRADE_DIVISOR: f64 = 32.1507;

/// Grade assumed when a document does not state one (g/t).
pub const DEFAULT_GRADE: f64 = 1.0;

/// Unit of a mined quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Ounces,
    Koz,
    Moz,
    Tonnes,
    Kilotonnes,
    Megatonnes,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ounces => "oz",
            Self::Koz => "koz",
            Self::Moz => "moz",
            Self::Tonnes => "t",
            Self::Kilotonnes => "kt",
            Self::Megatonnes => "mt",
        }
    }

    /// Parse a unit token as it appears in lowercased report text.
    pub fn parse_token(token: &str) -> Option<Self> {
        let token: String = token
            .trim()
            .trim_end_matches('.')
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        match token.as_str() {
            "oz" | "ozs" | "ounce" | "ounces" | "troy ounces" => Some(Self::Ounces),
            "koz" | "k oz" | "thousand ounces" | "thousand oz" | "000 oz" | "000oz" => {
                Some(Self::Koz)
            }
            "moz" | "m oz" | "million ounces" | "million oz" | "mm oz" => Some(Self::Moz),
            "t" | "tonnes" | "tonne" | "tons" => Some(Self::Tonnes),
            "kt" | "thousand tonnes" => Some(Self::Kilotonnes),
            "mt" | "million tonnes" => Some(Self::Megatonnes),
            _ => None,
        }
    }

    /// Whether the unit measures ore mass (requiring a grade to convert).
    pub fn is_mass(&self) -> bool {
        matches!(self, Self::Tonnes | Self::Kilotonnes | Self::Megatonnes)
    }

    /// Multiplier taking a value in this unit to its base (ounces or tonnes).
    fn base_factor(&self) -> f64 {
        match self {
            Self::Ounces | Self::Tonnes => 1.0,
            Self::Koz => OUNCES_PER_KOZ,
            Self::Moz => OUNCES_PER_KOZ * KOZ_PER_MOZ,
            Self::Kilotonnes => 1_000.0,
            Self::Megatonnes => 1_000_000.0,
        }
    }
}

/// Convert million ounces to thousand ounces.
pub fn to_koz(moz: f64) -> f64 {
    moz * KOZ_PER_MOZ
}

/// Convert thousand ounces to million ounces.
pub fn to_moz(koz: f64) -> f64 {
    koz / KOZ_PER_MOZ
}

/// Convert tonnes of ore at `grade` g/t to ounces.
pub fn to_ounces(tonnes: f64, grade: f64) -> f64 {
    tonnes * grade / TONNE_GRADE_DIVISOR
}

/// Convert ounces back to tonnes of ore at `grade` g/t.
pub fn to_tonnes(ounces: f64, grade: f64) -> f64 {
    if grade == 0.0 {
        return 0.0;
    }
    ounces * TONNE_GRADE_DIVISOR / grade
}

/// Convert `value` in `from` into `target`, which must be an ounce scale.
///
/// Mass units go through [`to_ounces`] with the supplied grade. Returns `None`
/// when `target` is a mass unit.
pub fn convert(value: f64, from: Unit, target: Unit, grade: f64) -> Option<f64> {
    if target.is_mass() {
        return None;
    }
    if from == target {
        return Some(value);
    }
    let ounces = if from.is_mass() {
        to_ounces(value * from.base_factor(), grade)
    } else {
        value * from.base_factor()
    };
    Some(ounces / target.base_factor())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_moz_koz_round_trip() {
        for x in [0.0, 0.001, 1.0, 2.5, 1234.5678, 1e9] {
            assert!(close(to_koz(to_moz(x)), x), "round trip failed for {}", x);
        }
        assert_eq!(to_koz(1.0), 1000.0);
    }

    #[test]
    fn test_tonnes_ounces_round_trip() {
        for grade in [0.5, 1.0, 3.2, 250.0] {
            for x in [0.0, 1.0, 32.1507, 1e6] {
                assert!(close(to_ounces(to_tonnes(x, grade), grade), x));
            }
        }
    }

    #[test]
    fn test_convert_scales() {
        assert!(close(convert(2.5, Unit::Moz, Unit::Koz, 1.0).unwrap(), 2500.0));
        assert!(close(convert(800.0, Unit::Koz, Unit::Moz, 1.0).unwrap(), 0.8));
        assert!(close(
            convert(1_500_000.0, Unit::Ounces, Unit::Moz, 1.0).unwrap(),
            1.5
        ));
        assert!(convert(1.0, Unit::Moz, Unit::Tonnes, 1.0).is_none());
    }

    #[test]
    fn test_convert_mass_uses_grade() {
        // 1 Mt at 2 g/t
        let ounces = convert(1.0, Unit::Megatonnes, Unit::Ounces, 2.0).unwrap();
        assert!(close(ounces, 1_000_000.0 * 2.0 / TONNE_GRADE_DIVISOR));
        let doubled = convert(1.0, Unit::Megatonnes, Unit::Ounces, 4.0).unwrap();
        assert!(close(doubled, ounces * 2.0));
    }

    #[test]
    fn test_parse_token() {
        assert_eq!(Unit::parse_token("Moz".to_lowercase().as_str()), Some(Unit::Moz));
        assert_eq!(Unit::parse_token("million  ounces"), Some(Unit::Moz));
        assert_eq!(Unit::parse_token("koz"), Some(Unit::Koz));
        assert_eq!(Unit::parse_token("tonnes"), Some(Unit::Tonnes));
        assert_eq!(Unit::parse_token("mt"), Some(Unit::Megatonnes));
        assert_eq!(Unit::parse_token("furlongs"), None);
    }
}

//! Mined figures and the per-company gold-equivalent aggregate.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::units::Unit;

/// Metals tracked by the miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metal {
    Gold,
    Silver,
}

impl Metal {
    pub const ALL: [Metal; 2] = [Self::Gold, Self::Silver];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Gold => 0,
            Self::Silver => 1,
        }
    }
}

/// Confidence tier of a mined quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityType {
    Reserve,
    MeasuredIndicated,
    Resource,
    Production,
}

impl QuantityType {
    pub const ALL: [QuantityType; 4] = [
        Self::Reserve,
        Self::MeasuredIndicated,
        Self::Resource,
        Self::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reserve => "reserve",
            Self::MeasuredIndicated => "measured_indicated",
            Self::Resource => "resource",
            Self::Production => "production",
        }
    }

    /// Unit figures of this type are normalized into.
    ///
    /// In-ground quantities are kept in Moz, annual production in koz.
    pub fn unit(&self) -> Unit {
        match self {
            Self::Production => Unit::Koz,
            _ => Unit::Moz,
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Reserve => 0,
            Self::MeasuredIndicated => 1,
            Self::Resource => 2,
            Self::Production => 3,
        }
    }
}

/// Per-metal, per-quantity-type figures; `None` where nothing was mined.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MinedFigures {
    values: [[Option<f64>; 4]; 2],
}

impl MinedFigures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metal: Metal, quantity: QuantityType) -> Option<f64> {
        self.values[metal.index()][quantity.index()]
    }

    pub fn set(&mut self, metal: Metal, quantity: QuantityType, value: Option<f64>) {
        self.values[metal.index()][quantity.index()] = value;
    }

    /// Add `value` to the figure, treating a missing figure as zero.
    pub fn add(&mut self, metal: Metal, quantity: QuantityType, value: f64) {
        let slot = &mut self.values[metal.index()][quantity.index()];
        *slot = Some(slot.unwrap_or(0.0) + value);
    }

    /// Whether any of the metal's quantity types has a figure.
    pub fn has_metal(&self, metal: Metal) -> bool {
        self.values[metal.index()].iter().any(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        Metal::ALL.iter().all(|m| !self.has_metal(*m))
    }

    /// Overlay `newer` on these figures: values present in `newer` win,
    /// missing ones keep what is already here.
    pub fn merged_with(&self, newer: &MinedFigures) -> MinedFigures {
        let mut merged = *self;
        for (metal, quantity, value) in newer.iter() {
            if value.is_some() {
                merged.set(metal, quantity, value);
            }
        }
        merged
    }

    /// Iterate over all (metal, quantity type, value) cells.
    pub fn iter(&self) -> impl Iterator<Item = (Metal, QuantityType, Option<f64>)> + '_ {
        Metal::ALL.into_iter().flat_map(move |metal| {
            QuantityType::ALL
                .into_iter()
                .map(move |quantity| (metal, quantity, self.get(metal, quantity)))
        })
    }
}

/// Serializes as `{"gold": {"reserve": .., ..}, "silver": {..}}`.
impl Serialize for MinedFigures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Metal::ALL.len()))?;
        for metal in Metal::ALL {
            let row: std::collections::BTreeMap<&str, Option<f64>> = QuantityType::ALL
                .iter()
                .map(|q| (q.as_str(), self.get(metal, *q)))
                .collect();
            map.serialize_entry(metal.as_str(), &row)?;
        }
        map.end()
    }
}

/// Gold-equivalent totals, one per quantity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoldEquivalent {
    pub reserve: Option<f64>,
    pub measured_indicated: Option<f64>,
    pub resource: Option<f64>,
    pub production: Option<f64>,
}

impl GoldEquivalent {
    pub fn get(&self, quantity: QuantityType) -> Option<f64> {
        match quantity {
            QuantityType::Reserve => self.reserve,
            QuantityType::MeasuredIndicated => self.measured_indicated,
            QuantityType::Resource => self.resource,
            QuantityType::Production => self.production,
        }
    }

    pub fn set(&mut self, quantity: QuantityType, value: Option<f64>) {
        match quantity {
            QuantityType::Reserve => self.reserve = value,
            QuantityType::MeasuredIndicated => self.measured_indicated = value,
            QuantityType::Resource => self.resource = value,
            QuantityType::Production => self.production = value,
        }
    }
}

/// Persisted per-company aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceAggregate {
    pub company_id: i32,
    pub figures: MinedFigures,
    pub gold_equivalent: GoldEquivalent,
    pub last_updated: DateTime<Utc>,
}

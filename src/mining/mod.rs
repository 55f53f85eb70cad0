//! Figure mining: the pattern table, accumulation into per-metal figures and
//! validation of the mined result.

pub mod miner;
pub mod patterns;
pub mod validator;

pub use miner::{
    accumulate, find_matches, gold_equivalent, mine, parse_grade, FigureMatch,
    SILVER_TO_GOLD_RATIO,
};
pub use patterns::{PatternRow, PATTERN_TABLE};
pub use validator::{validate, ValidationError};

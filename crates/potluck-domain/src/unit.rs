//! Measurement units for recipe ingredient amounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unit an ingredient amount is submitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "L")]
    Liter,
    #[serde(rename = "pcs")]
    Piece,
}

/// Canonical unit used for nutrient math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NormalizedUnit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "ml")]
    Milliliter,
    /// A piece count whose ingredient has no known piece weight.
    #[serde(rename = "pcs")]
    Piece,
}

/// An amount converted to its canonical unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub amount: f64,
    pub unit: NormalizedUnit,
    /// Mass used for per-100g nutrient scaling. Milliliters count 1:1;
    /// unweighable pieces contribute zero.
    pub grams: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit: {0}")]
pub struct UnknownUnit(pub String);

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Milliliter => "ml",
            Self::Liter => "L",
            Self::Piece => "pcs",
        }
    }

    /// Convert `amount` of this unit to its canonical form.
    ///
    /// `weight_per_piece` is the ingredient's grams-per-piece and only matters
    /// for [`Unit::Piece`].
    pub fn normalize(self, amount: f64, weight_per_piece: Option<f64>) -> Normalized {
        match self {
            Self::Gram => grams(amount),
            Self::Kilogram => grams(amount * 1000.0),
            Self::Milliliter => milliliters(amount),
            Self::Liter => milliliters(amount * 1000.0),
            Self::Piece => match weight_per_piece.filter(|w| *w > 0.0) {
                Some(weight) => grams(amount * weight),
                None => Normalized {
                    amount,
                    unit: NormalizedUnit::Piece,
                    grams: 0.0,
                },
            },
        }
    }
}

fn grams(amount: f64) -> Normalized {
    Normalized {
        amount,
        unit: NormalizedUnit::Gram,
        grams: amount,
    }
}

fn milliliters(amount: f64) -> Normalized {
    Normalized {
        amount,
        unit: NormalizedUnit::Milliliter,
        grams: amount,
    }
}

impl FromStr for Unit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "g" => Ok(Self::Gram),
            "kg" => Ok(Self::Kilogram),
            "ml" => Ok(Self::Milliliter),
            "L" | "l" => Ok(Self::Liter),
            "pcs" => Ok(Self::Piece),
            other => Err(UnknownUnit(other.to_owned())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NormalizedUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gram => "g",
            Self::Milliliter => "ml",
            Self::Piece => "pcs",
        }
    }
}

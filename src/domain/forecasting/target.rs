use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A variable the pipeline can forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Price,
    Quantity,
}

impl Target {
    /// Source column holding the raw values
    pub fn column(&self) -> &'static str {
        match self {
            Target::Price => "preco",
            Target::Quantity => "quantidade_vendida",
        }
    }

    /// Per-period aggregation label (quantity is summed, price averaged)
    pub fn aggregation(&self) -> &'static str {
        match self {
            Target::Price => "mean",
            Target::Quantity => "sum",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Price => write!(f, "price"),
            Target::Quantity => write!(f, "quantity"),
        }
    }
}

/// Which targets a deployment forecasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSelection {
    Price,
    PriceAndQuantity,
}

impl TargetSelection {
    /// Targets in output order. Price is always first.
    pub fn targets(&self) -> Vec<Target> {
        match self {
            TargetSelection::Price => vec![Target::Price],
            TargetSelection::PriceAndQuantity => vec![Target::Price, Target::Quantity],
        }
    }

    pub fn includes_quantity(&self) -> bool {
        matches!(self, TargetSelection::PriceAndQuantity)
    }
}

impl FromStr for TargetSelection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "price" => Ok(TargetSelection::Price),
            "price_and_quantity" | "both" => Ok(TargetSelection::PriceAndQuantity),
            _ => Err(anyhow!(
                "Invalid targets: {}. Must be 'price' or 'price_and_quantity'",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_order() {
        assert_eq!(TargetSelection::Price.targets(), vec![Target::Price]);
        assert_eq!(
            TargetSelection::PriceAndQuantity.targets(),
            vec![Target::Price, Target::Quantity]
        );
    }

    #[test]
    fn test_selection_from_str() {
        assert_eq!(
            "both".parse::<TargetSelection>().unwrap(),
            TargetSelection::PriceAndQuantity
        );
        assert!("volume".parse::<TargetSelection>().is_err());
    }
}

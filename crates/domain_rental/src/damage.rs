//! Damage marks recorded on the pickup inspection diagram

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::DamageMarkId;

use crate::error::RentalError;

/// Longest description accepted for a single mark
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A point on the vehicle diagram, in percent of width and height
///
/// Every construction path, deserialization included, runs the range and
/// length checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredMark")]
pub struct DamageMark {
    id: DamageMarkId,
    x: Decimal,
    y: Decimal,
    description: String,
}

#[derive(Deserialize)]
struct StoredMark {
    id: DamageMarkId,
    x: Decimal,
    y: Decimal,
    description: String,
}

impl TryFrom<StoredMark> for DamageMark {
    type Error = RentalError;

    fn try_from(mark: StoredMark) -> Result<Self, Self::Error> {
        DamageMark::restore(mark.id, mark.x, mark.y, mark.description)
    }
}

impl DamageMark {
    /// Creates a mark
    ///
    /// # Errors
    ///
    /// Returns `RentalError::Validation` if either coordinate is outside
    /// `[0, 100]` or the description is longer than 500 characters
    pub fn new(x: Decimal, y: Decimal, description: impl Into<String>) -> Result<Self, RentalError> {
        Self::restore(DamageMarkId::new_v7(), x, y, description)
    }

    /// Rebuilds a stored mark under its existing id, with the same checks
    pub fn restore(
        id: DamageMarkId,
        x: Decimal,
        y: Decimal,
        description: impl Into<String>,
    ) -> Result<Self, RentalError> {
        let description = description.into();
        for (axis, value) in [("x", x), ("y", y)] {
            if value < dec!(0) || value > dec!(100) {
                return Err(RentalError::validation(format!(
                    "damage mark {} must be between 0 and 100, got {}",
                    axis, value
                )));
            }
        }
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(RentalError::validation(format!(
                "damage description exceeds {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }
        Ok(Self { id, x, y, description })
    }

    pub fn id(&self) -> DamageMarkId {
        self.id
    }

    pub fn x(&self) -> Decimal {
        self.x
    }

    pub fn y(&self) -> Decimal {
        self.y
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_valid() {
        assert!(DamageMark::new(dec!(0), dec!(100), "rear bumper").is_ok());
    }

    #[test]
    fn test_out_of_range() {
        assert!(DamageMark::new(dec!(100.5), dec!(10), "scratch").is_err());
        assert!(DamageMark::new(dec!(10), dec!(-1), "scratch").is_err());
    }

    #[test]
    fn test_deserializing_checks_the_range() {
        let mark = DamageMark::new(dec!(20), dec!(30), "dent").unwrap();
        let json = serde_json::to_value(&mark).unwrap();
        let back: DamageMark = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, mark);

        let mut outside = json;
        outside["x"] = serde_json::json!("140");
        assert!(serde_json::from_value::<DamageMark>(outside).is_err());
    }

    #[test]
    fn test_description_length() {
        assert!(DamageMark::new(dec!(5), dec!(5), "é".repeat(500)).is_ok());
        assert!(DamageMark::new(dec!(5), dec!(5), "a".repeat(501)).is_err());
    }
}

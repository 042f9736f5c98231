//! Stock availability tiers.
//!
//! Every screen and report derives the tier from the stock quantity through
//! [`Disponibilidad::from_cantidad`]; nothing else defines thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest quantity still considered low availability.
pub const BAJA_MAX: i32 = 5;
/// Highest quantity still considered medium availability.
pub const MEDIA_MAX: i32 = 15;

/// Availability tier derived from a stock quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Disponibilidad {
    SinStock,
    Baja,
    Media,
    Alta,
}

impl Disponibilidad {
    /// All tiers, lowest first.
    pub const ALL: [Disponibilidad; 4] = [Self::SinStock, Self::Baja, Self::Media, Self::Alta];

    /// Classify a stock quantity.
    pub fn from_cantidad(cantidad: i32) -> Self {
        match cantidad {
            c if c <= 0 => Self::SinStock,
            c if c <= BAJA_MAX => Self::Baja,
            c if c <= MEDIA_MAX => Self::Media,
            _ => Self::Alta,
        }
    }

    /// Short label used in tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SinStock => "Sin stock",
            Self::Baja => "Baja",
            Self::Media => "Media",
            Self::Alta => "Alta",
        }
    }

    /// Long label used in the dashboard summary.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SinStock => "Sin stock",
            Self::Baja => "Baja disponibilidad",
            Self::Media => "Disponibilidad media",
            Self::Alta => "Alta disponibilidad",
        }
    }
}

impl fmt::Display for Disponibilidad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(Disponibilidad::from_cantidad(5), Disponibilidad::Baja);
        assert_eq!(Disponibilidad::from_cantidad(6), Disponibilidad::Media);
        assert_eq!(Disponibilidad::from_cantidad(15), Disponibilidad::Media);
        assert_eq!(Disponibilidad::from_cantidad(16), Disponibilidad::Alta);
    }

    #[test]
    fn test_empty_and_negative_stock() {
        assert_eq!(Disponibilidad::from_cantidad(0), Disponibilidad::SinStock);
        assert_eq!(Disponibilidad::from_cantidad(-3), Disponibilidad::SinStock);
        assert_eq!(Disponibilidad::from_cantidad(1), Disponibilidad::Baja);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Disponibilidad::Baja.label(), "Baja");
        assert_eq!(Disponibilidad::Media.label(), "Media");
        assert_eq!(Disponibilidad::Alta.label(), "Alta");
        assert_eq!(Disponibilidad::Media.to_string(), "Disponibilidad media");
    }
}

use std::f64::consts::PI;
use std::fmt;

use serde::Serialize;

/// Unit a quantity is declared in, as the engine reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "MPa")]
    Megapascal,
    #[serde(rename = "GPa")]
    Gigapascal,
    #[serde(rename = "kg/m^3")]
    KilogramPerCubicMeter,
    #[serde(rename = "deg")]
    Degree,
    #[serde(rename = "1")]
    Dimensionless,
}

impl Unit {
    /// Factor converting a value in this unit to SI.
    #[must_use]
    pub fn si_factor(self) -> f64 {
        match self {
            Self::Meter | Self::KilogramPerCubicMeter | Self::Dimensionless => 1.0,
            Self::Centimeter => 0.01,
            Self::Bar => 1e5,
            Self::Megapascal => 1e6,
            Self::Gigapascal => 1e9,
            Self::Degree => PI / 180.0,
        }
    }

    /// Engine symbol, `None` for dimensionless values.
    #[must_use]
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Meter => Some("m"),
            Self::Centimeter => Some("cm"),
            Self::Bar => Some("bar"),
            Self::Megapascal => Some("MPa"),
            Self::Gigapascal => Some("GPa"),
            Self::KilogramPerCubicMeter => Some("kg/m^3"),
            Self::Degree => Some("deg"),
            Self::Dimensionless => None,
        }
    }
}

/// A named, immutable scalar with a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    name: String,
    value: f64,
    unit: Unit,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Quantity {
    /// Creates a quantity with a value expressed in `unit`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64, unit: Unit) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
            description: None,
        }
    }

    /// Attaches a human-readable description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the name other stages reference this quantity by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value in the declared unit.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns the declared unit.
    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the value converted to SI.
    #[must_use]
    pub fn si_value(&self) -> f64 {
        self.value * self.unit.si_factor()
    }

    /// Engine expression for the value, e.g. `100[m]`.
    #[must_use]
    pub fn expression(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit.symbol() {
            Some(symbol) => write!(f, "{}[{symbol}]", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn expression_carries_unit_suffix() {
        assert_eq!(Quantity::new("W_model", 100.0, Unit::Meter).expression(), "100[m]");
        assert_eq!(Quantity::new("v_rock", 0.25, Unit::Dimensionless).expression(), "0.25");
    }

    #[test]
    fn si_conversion() {
        assert_relative_eq!(Quantity::new("int_pressure", 50.0, Unit::Bar).si_value(), 5.0e6);
        assert_relative_eq!(Quantity::new("l_thickness", 20.0, Unit::Centimeter).si_value(), 0.2);
        assert_relative_eq!(Quantity::new("phi_rock", 180.0, Unit::Degree).si_value(), PI);
    }
}

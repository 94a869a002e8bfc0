//! Serde adapters storing `uom` quantities as plain numbers in engineering
//! units, so a configuration file reads `"storage_height": 55.0` in metres and
//! `"young_modulus": 60.0` in gigapascals.

macro_rules! engineering_unit {
    ($(#[$meta:meta])* $module:ident, $quantity:ty, $unit:ty) => {
        $(#[$meta])*
        pub mod $module {
            use serde::{Deserialize, Deserializer, Serializer};

            /// # Errors
            ///
            /// Propagates serializer failures.
            pub fn serialize<S: Serializer>(value: &$quantity, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_f64(value.get::<$unit>())
            }

            /// # Errors
            ///
            /// Fails when the input is not a number.
            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$quantity, D::Error> {
                f64::deserialize(deserializer).map(<$quantity>::new::<$unit>)
            }
        }
    };
}

engineering_unit!(
    /// Length in metres.
    meter,
    uom::si::f64::Length,
    uom::si::length::meter
);
engineering_unit!(
    /// Length in centimetres.
    centimeter,
    uom::si::f64::Length,
    uom::si::length::centimeter
);
engineering_unit!(
    /// Pressure in bar.
    bar,
    uom::si::f64::Pressure,
    uom::si::pressure::bar
);
engineering_unit!(
    /// Pressure in megapascals.
    megapascal,
    uom::si::f64::Pressure,
    uom::si::pressure::megapascal
);
engineering_unit!(
    /// Pressure in gigapascals.
    gigapascal,
    uom::si::f64::Pressure,
    uom::si::pressure::gigapascal
);
engineering_unit!(
    /// Density in kilograms per cubic metre.
    kilogram_per_cubic_meter,
    uom::si::f64::MassDensity,
    uom::si::mass_density::kilogram_per_cubic_meter
);
engineering_unit!(
    /// Angle in degrees.
    degree,
    uom::si::f64::Angle,
    uom::si::angle::degree
);

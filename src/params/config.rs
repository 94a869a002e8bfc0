use std::path::Path;

use serde::{Deserialize, Serialize};
use uom::si::angle::degree;
use uom::si::f64::{Angle, Length, MassDensity, Pressure};
use uom::si::length::{centimeter, meter};
use uom::si::mass_density::kilogram_per_cubic_meter;
use uom::si::pressure::{bar, gigapascal, megapascal};

use super::units;
use crate::criterion::Criterion;
use crate::error::{ConfigError, ParameterError};

/// Complete input parameter set of a cavern model.
///
/// Every section falls back to the reference case when omitted from a
/// configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CavernConfig {
    pub geometry: GeometryConfig,
    pub rock: RockConfig,
    pub hoek_brown: HoekBrownConfig,
    pub mohr_coulomb: MohrCoulombConfig,
    pub lining: LiningConfig,
    pub mesh: MeshConfig,
}

/// Model extent, cavern shape and gas pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    #[serde(with = "units::meter")]
    pub model_width: Length,
    #[serde(with = "units::meter")]
    pub model_height: Length,
    #[serde(with = "units::meter")]
    pub storage_diameter: Length,
    #[serde(with = "units::meter")]
    pub storage_height: Length,
    /// Elevation of the cavern roof; the ground surface is at zero.
    #[serde(with = "units::meter")]
    pub storage_depth: Length,
    /// Vertical extent of the roof and floor arcs.
    #[serde(with = "units::meter")]
    pub arc_length: Length,
    #[serde(with = "units::bar")]
    pub internal_pressure: Pressure,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            model_width: Length::new::<meter>(100.0),
            model_height: Length::new::<meter>(250.0),
            storage_diameter: Length::new::<meter>(35.0),
            storage_height: Length::new::<meter>(55.0),
            storage_depth: Length::new::<meter>(-100.0),
            arc_length: Length::new::<meter>(15.0),
            internal_pressure: Pressure::new::<bar>(50.0),
        }
    }
}

/// Intact rock properties shared by both criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RockConfig {
    #[serde(with = "units::kilogram_per_cubic_meter")]
    pub density: MassDensity,
    /// Uniaxial compressive strength.
    #[serde(with = "units::megapascal")]
    pub compressive_strength: Pressure,
    #[serde(with = "units::gigapascal")]
    pub youngs_modulus: Pressure,
    pub poissons_ratio: f64,
}

impl Default for RockConfig {
    fn default() -> Self {
        Self {
            density: MassDensity::new::<kilogram_per_cubic_meter>(2500.0),
            compressive_strength: Pressure::new::<megapascal>(200.0),
            youngs_modulus: Pressure::new::<gigapascal>(60.0),
            poissons_ratio: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HoekBrownConfig {
    /// Geological strength index.
    pub gsi: f64,
    /// Disturbance factor.
    pub disturbance: f64,
    /// Intact rock constant.
    pub m_i: f64,
}

impl Default for HoekBrownConfig {
    fn default() -> Self {
        Self {
            gsi: 75.0,
            disturbance: 0.1,
            m_i: 32.0,
        }
    }
}

impl HoekBrownConfig {
    /// Reduced intact rock constant, `m_i * exp((GSI - 100) / (28 * 14 * D))`.
    #[must_use]
    pub fn m_hoek(&self) -> f64 {
        self.m_i * ((self.gsi - 100.0) / (28.0 * 14.0 * self.disturbance)).exp()
    }

    /// Rock-mass constant, `exp((GSI - 100) / (9 - 3 * D))`.
    #[must_use]
    pub fn s_hoek(&self) -> f64 {
        ((self.gsi - 100.0) / (9.0 - 3.0 * self.disturbance)).exp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MohrCoulombConfig {
    #[serde(with = "units::megapascal")]
    pub cohesion: Pressure,
    #[serde(with = "units::degree")]
    pub friction_angle: Angle,
}

impl Default for MohrCoulombConfig {
    fn default() -> Self {
        Self {
            cohesion: Pressure::new::<megapascal>(1.0),
            friction_angle: Angle::new::<degree>(35.0),
        }
    }
}

/// Concrete lining on the cavern wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiningConfig {
    #[serde(with = "units::gigapascal")]
    pub youngs_modulus: Pressure,
    #[serde(with = "units::kilogram_per_cubic_meter")]
    pub density: MassDensity,
    pub poissons_ratio: f64,
    #[serde(with = "units::centimeter")]
    pub thickness: Length,
}

impl Default for LiningConfig {
    fn default() -> Self {
        Self {
            youngs_modulus: Pressure::new::<gigapascal>(25.0),
            density: MassDensity::new::<kilogram_per_cubic_meter>(2300.0),
            poissons_ratio: 0.2,
            thickness: Length::new::<centimeter>(20.0),
        }
    }
}

/// Element distribution and size constraints, passed through to the mesher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeshConfig {
    /// Elements along each cavern boundary edge.
    pub number_of_elements: u32,
    pub max_element_size: f64,
    pub max_element_growth_rate: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            number_of_elements: 25,
            max_element_size: 20.0,
            max_element_growth_rate: 1.1,
        }
    }
}

impl CavernConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON or unknown fields.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks every precondition the model construction relies on.
    ///
    /// Only the section of the chosen criterion is inspected.
    ///
    /// # Errors
    ///
    /// Returns the first violated precondition, named after the table entry
    /// it feeds.
    pub fn validate(&self, criterion: Criterion) -> Result<(), ParameterError> {
        let g = &self.geometry;
        let width = g.model_width.get::<meter>();
        let height = g.model_height.get::<meter>();
        let diameter = g.storage_diameter.get::<meter>();
        let storage_height = g.storage_height.get::<meter>();
        let depth = g.storage_depth.get::<meter>();
        let arc = g.arc_length.get::<meter>();

        positive("W_model", width)?;
        positive("H_model", height)?;
        positive("storage_diameter", diameter)?;
        positive("storage_height", storage_height)?;
        finite("storage_depth", depth)?;
        require("storage_depth", depth < 0.0, || {
            format!("cavern roof must lie below the surface, got {depth}")
        })?;
        finite("arc_length", arc)?;
        require("arc_length", (0.0..storage_height / 2.0).contains(&arc), || {
            format!("must lie in [0, storage_height/2) = [0, {}), got {arc}", storage_height / 2.0)
        })?;
        require("storage_height", depth - storage_height > -height, || {
            format!(
                "cavern floor at {} must lie above the model base at {}",
                depth - storage_height,
                -height
            )
        })?;
        require("storage_radius", diameter / 2.0 < width, || {
            format!("radius {} must be smaller than the model width {width}", diameter / 2.0)
        })?;
        non_negative("int_pressure", g.internal_pressure.get::<bar>())?;

        let rock = &self.rock;
        positive("rho_rock", rock.density.get::<kilogram_per_cubic_meter>())?;
        positive("E_rock", rock.youngs_modulus.get::<gigapascal>())?;
        poisson("v_rock", rock.poissons_ratio)?;

        match criterion {
            Criterion::HoekBrown => {
                let hb = &self.hoek_brown;
                positive("sigma_ci", rock.compressive_strength.get::<megapascal>())?;
                finite("GSI", hb.gsi)?;
                require("GSI", hb.gsi > 0.0 && hb.gsi <= 100.0, || {
                    format!("must lie in (0, 100], got {}", hb.gsi)
                })?;
                finite("D_hoek", hb.disturbance)?;
                require("D_hoek", hb.disturbance > 0.0 && hb.disturbance <= 1.0, || {
                    format!("must lie in (0, 1], got {}", hb.disturbance)
                })?;
                positive("m_i", hb.m_i)?;
            }
            Criterion::MohrCoulomb => {
                let mc = &self.mohr_coulomb;
                positive("c_rock", mc.cohesion.get::<megapascal>())?;
                let phi = mc.friction_angle.get::<degree>();
                finite("phi_rock", phi)?;
                require("phi_rock", phi > 0.0 && phi < 90.0, || {
                    format!("must lie in (0, 90) degrees, got {phi}")
                })?;
            }
        }

        let lining = &self.lining;
        positive("rho_lining", lining.density.get::<kilogram_per_cubic_meter>())?;
        positive("E_lining", lining.youngs_modulus.get::<gigapascal>())?;
        poisson("v_lining", lining.poissons_ratio)?;
        positive("l_thickness", lining.thickness.get::<centimeter>())?;

        let mesh = &self.mesh;
        require("num_elem", mesh.number_of_elements >= 1, || {
            "at least one element is needed".to_owned()
        })?;
        positive("max_elem", mesh.max_element_size)?;
        finite("max_growth", mesh.max_element_growth_rate)?;
        require("max_growth", mesh.max_element_growth_rate >= 1.0, || {
            format!("must be at least 1, got {}", mesh.max_element_growth_rate)
        })?;
        Ok(())
    }
}

fn require(
    parameter: &'static str,
    holds: bool,
    reason: impl FnOnce() -> String,
) -> Result<(), ParameterError> {
    if holds {
        Ok(())
    } else {
        Err(ParameterError::Precondition {
            parameter,
            reason: reason(),
        })
    }
}

fn finite(parameter: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NonFinite { parameter })
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), ParameterError> {
    finite(parameter, value)?;
    require(parameter, value > 0.0, || format!("must be positive, got {value}"))
}

fn non_negative(parameter: &'static str, value: f64) -> Result<(), ParameterError> {
    finite(parameter, value)?;
    require(parameter, value >= 0.0, || format!("must not be negative, got {value}"))
}

fn poisson(parameter: &'static str, value: f64) -> Result<(), ParameterError> {
    finite(parameter, value)?;
    if (0.0..0.5).contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            parameter,
            value,
            min: 0.0,
            max: 0.5,
        })
    }
}

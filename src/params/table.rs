use std::collections::HashMap;

use serde::Serialize;
use uom::si::angle::degree;
use uom::si::length::{centimeter, meter};
use uom::si::mass_density::kilogram_per_cubic_meter;
use uom::si::pressure::{bar, gigapascal, megapascal};

use super::config::CavernConfig;
use super::quantity::{Quantity, Unit};
use crate::criterion::Criterion;
use crate::error::ParameterError;

/// A labelled group of quantities, submitted to the engine as one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterGroup {
    tag: String,
    label: String,
    quantities: Vec<Quantity>,
}

impl ParameterGroup {
    #[must_use]
    pub fn new(tag: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            label: label.into(),
            quantities: Vec::new(),
        }
    }

    /// Appends a quantity to the group.
    pub fn push(&mut self, quantity: Quantity) {
        self.quantities.push(quantity);
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }
}

/// All named quantities of a model, in declaration order.
///
/// Names are unique across groups; later stages refer to quantities only by
/// name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    groups: Vec<ParameterGroup>,
    index: HashMap<String, (usize, usize)>,
}

impl ParameterTable {
    /// Builds a table from explicit groups.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Duplicate`] if a name is declared twice.
    pub fn from_groups(groups: Vec<ParameterGroup>) -> Result<Self, ParameterError> {
        let mut index = HashMap::new();
        for (g, group) in groups.iter().enumerate() {
            for (q, quantity) in group.quantities.iter().enumerate() {
                if index.insert(quantity.name().to_owned(), (g, q)).is_some() {
                    return Err(ParameterError::Duplicate(quantity.name().to_owned()));
                }
            }
        }
        Ok(Self { groups, index })
    }

    /// Derives the four parameter groups of a model from its configuration.
    ///
    /// The rock group depends on the failure criterion. Preconditions are
    /// checked first, so no table exists for an invalid configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated precondition.
    pub fn from_config(config: &CavernConfig, criterion: Criterion) -> Result<Self, ParameterError> {
        config.validate(criterion)?;
        Self::from_groups(vec![
            geometry_group(config),
            rock_group(config, criterion),
            lining_group(config),
            mesh_group(config),
        ])
    }

    /// Looks a quantity up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.index
            .get(name)
            .map(|&(g, q)| &self.groups[g].quantities[q])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// SI value of a named quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Undefined`] for an unknown name.
    pub fn si_value(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(Quantity::si_value)
            .ok_or_else(|| ParameterError::Undefined(name.to_owned()))
    }

    /// Checks that every name exists in the table.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Undefined`] for the first unknown name.
    pub fn require<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<(), ParameterError> {
        names.into_iter().try_for_each(|name| {
            if self.contains(name) {
                Ok(())
            } else {
                Err(ParameterError::Undefined(name.to_owned()))
            }
        })
    }

    #[must_use]
    pub fn groups(&self) -> &[ParameterGroup] {
        &self.groups
    }

    /// Total number of quantities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn geometry_group(config: &CavernConfig) -> ParameterGroup {
    let g = &config.geometry;
    let diameter = g.storage_diameter.get::<meter>();
    let mut group = ParameterGroup::new("par1", "Model_geometry_parameters");
    group.push(Quantity::new("W_model", g.model_width.get::<meter>(), Unit::Meter));
    group.push(Quantity::new("H_model", g.model_height.get::<meter>(), Unit::Meter));
    group.push(Quantity::new("storage_diameter", diameter, Unit::Meter));
    group.push(Quantity::new("storage_radius", diameter / 2.0, Unit::Meter));
    group.push(Quantity::new("storage_height", g.storage_height.get::<meter>(), Unit::Meter));
    group.push(Quantity::new("storage_depth", g.storage_depth.get::<meter>(), Unit::Meter));
    group.push(Quantity::new("arc_length", g.arc_length.get::<meter>(), Unit::Meter));
    group.push(
        Quantity::new("int_pressure", g.internal_pressure.get::<bar>(), Unit::Bar)
            .described("Storage internal pressure due to pressurization"),
    );
    group
}

fn rock_group(config: &CavernConfig, criterion: Criterion) -> ParameterGroup {
    let rock = &config.rock;
    let mut group = ParameterGroup::new("par2", criterion.parameter_group_label());
    group.push(
        Quantity::new(
            "rho_rock",
            rock.density.get::<kilogram_per_cubic_meter>(),
            Unit::KilogramPerCubicMeter,
        )
        .described("Density of rock"),
    );
    if criterion == Criterion::HoekBrown {
        group.push(
            Quantity::new(
                "sigma_ci",
                rock.compressive_strength.get::<megapascal>(),
                Unit::Megapascal,
            )
            .described("Uniaxial compressive strength UCS"),
        );
    }
    group.push(
        Quantity::new("E_rock", rock.youngs_modulus.get::<gigapascal>(), Unit::Gigapascal)
            .described("Young's Modulus of rock"),
    );
    group.push(
        Quantity::new("v_rock", rock.poissons_ratio, Unit::Dimensionless)
            .described("Poisson's ratio of rock"),
    );
    match criterion {
        Criterion::HoekBrown => {
            let hb = &config.hoek_brown;
            group.push(
                Quantity::new("GSI", hb.gsi, Unit::Dimensionless)
                    .described("Geological Strength Index"),
            );
            group.push(
                Quantity::new("D_hoek", hb.disturbance, Unit::Dimensionless)
                    .described("Disturbance factor"),
            );
            group.push(
                Quantity::new("m_i", hb.m_i, Unit::Dimensionless).described("Intact rock constant"),
            );
            group.push(
                Quantity::new("m_hoek", hb.m_hoek(), Unit::Dimensionless)
                    .described("Reduced value of intact rock constant"),
            );
            group.push(Quantity::new("s_hoek", hb.s_hoek(), Unit::Dimensionless));
        }
        Criterion::MohrCoulomb => {
            let mc = &config.mohr_coulomb;
            group.push(
                Quantity::new("c_rock", mc.cohesion.get::<megapascal>(), Unit::Megapascal)
                    .described("cohesion of rock"),
            );
            group.push(
                Quantity::new("phi_rock", mc.friction_angle.get::<degree>(), Unit::Degree)
                    .described("friction angle of rock"),
            );
        }
    }
    group
}

fn lining_group(config: &CavernConfig) -> ParameterGroup {
    let lining = &config.lining;
    let mut group = ParameterGroup::new("par3", "Lining mechanical parameters");
    group.push(
        Quantity::new(
            "rho_lining",
            lining.density.get::<kilogram_per_cubic_meter>(),
            Unit::KilogramPerCubicMeter,
        )
        .described("Density of lining"),
    );
    group.push(
        Quantity::new("E_lining", lining.youngs_modulus.get::<gigapascal>(), Unit::Gigapascal)
            .described("Young's Modulus lining"),
    );
    group.push(
        Quantity::new("v_lining", lining.poissons_ratio, Unit::Dimensionless)
            .described("Poisson's ratio lining"),
    );
    group.push(Quantity::new(
        "l_thickness",
        lining.thickness.get::<centimeter>(),
        Unit::Centimeter,
    ));
    group
}

fn mesh_group(config: &CavernConfig) -> ParameterGroup {
    let mesh = &config.mesh;
    let mut group = ParameterGroup::new("par4", "Mesh_parameters");
    group.push(
        Quantity::new(
            "num_elem",
            f64::from(mesh.number_of_elements),
            Unit::Dimensionless,
        )
        .described("Number of elements along each storage boundary edge"),
    );
    group.push(
        Quantity::new("max_elem", mesh.max_element_size, Unit::Dimensionless)
            .described("Maximum element size in the rock mass"),
    );
    group.push(
        Quantity::new("max_growth", mesh.max_element_growth_rate, Unit::Dimensionless)
            .described("Maximum element growth rate in the rock mass"),
    );
    group
}

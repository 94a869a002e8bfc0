use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rock-mass failure criterion a model is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Criterion {
    HoekBrown,
    MohrCoulomb,
}

impl Criterion {
    /// Label of the criterion-specific rock parameter group.
    #[must_use]
    pub fn parameter_group_label(self) -> &'static str {
        match self {
            Self::HoekBrown => "Rock mass Hoek-Brown_criterion_parameters",
            Self::MohrCoulomb => "Rock mass Mohr-Coulomb_criterion_parameters",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HoekBrown => f.write_str("hoek-brown"),
            Self::MohrCoulomb => f.write_str("mohr-coulomb"),
        }
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "hoek-brown" => Ok(Self::HoekBrown),
            "mohr-coulomb" => Ok(Self::MohrCoulomb),
            other => Err(format!(
                "unknown failure criterion '{other}', expected hoek-brown or mohr-coulomb"
            )),
        }
    }
}

use serde::Serialize;

use crate::criterion::Criterion;
use crate::params::Expr;
use crate::selection::Target;

/// One named material property bound to a parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: &'static str,
    pub value: Expr,
}

/// A property group of a material, such as `Enu` or `HoekBrown`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyGroup {
    pub tag: &'static str,
    /// `None` for the default group every material carries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
    pub properties: Vec<Property>,
}

impl PropertyGroup {
    fn new(tag: &'static str, label: Option<&'static str>, properties: &[(&'static str, &str)]) -> Self {
        Self {
            tag,
            label,
            properties: properties
                .iter()
                .map(|&(name, param)| Property {
                    name,
                    value: Expr::param(param),
                })
                .collect(),
        }
    }

    fn elasticity(modulus: &str, ratio: &str) -> Self {
        Self::new(
            "Enu",
            Some("Young's_modulus_and_Poisson's_ratio"),
            &[("E", modulus), ("nu", ratio)],
        )
    }

    fn density(param: &str) -> Self {
        Self::new("def", None, &[("density", param)])
    }
}

/// A material and the selection it is assigned to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub tag: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<&'static str>,
    pub target: Target,
    pub groups: Vec<PropertyGroup>,
}

impl Material {
    /// The property group tagged `tag`, if present.
    #[must_use]
    pub fn group(&self, tag: &str) -> Option<&PropertyGroup> {
        self.groups.iter().find(|g| g.tag == tag)
    }

    /// Every parameter the material's properties read.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| &g.properties)
            .flat_map(|p| p.value.params())
    }
}

/// Rock mass material `mat1`, with the property groups of `criterion`.
#[must_use]
pub fn rock_mass(criterion: Criterion) -> Material {
    let mut groups = vec![
        PropertyGroup::elasticity("E_rock", "v_rock"),
        PropertyGroup::density("rho_rock"),
    ];
    match criterion {
        Criterion::HoekBrown => {
            groups.push(PropertyGroup::new(
                "HoekBrown",
                Some("Hoek_Brown"),
                &[("sHB", "s_hoek"), ("mHB", "m_hoek")],
            ));
            groups.push(PropertyGroup::new(
                "YieldStressParameters",
                Some("Yield_stress_parameters"),
                &[("sigmauc", "sigma_ci")],
            ));
        }
        Criterion::MohrCoulomb => groups.push(PropertyGroup::new(
            "MohrCoulomb",
            Some("Mohr_Coulomb_criterion"),
            &[("cohesion", "c_rock"), ("internalphi", "phi_rock")],
        )),
    }
    Material {
        tag: "mat1",
        label: "Rock mass",
        family: None,
        target: Target::AllDomains,
        groups,
    }
}

/// Lining material `mat2` on the given boundary selection.
#[must_use]
pub fn lining(target: Target) -> Material {
    Material {
        tag: "mat2",
        label: "Lining",
        family: Some("concrete"),
        target,
        groups: vec![
            PropertyGroup::elasticity("E_lining", "v_lining"),
            PropertyGroup::density("rho_lining"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hoek_brown_rock_groups() {
        let rock = rock_mass(Criterion::HoekBrown);
        let tags: Vec<_> = rock.groups.iter().map(|g| g.tag).collect();
        assert_eq!(tags, ["Enu", "def", "HoekBrown", "YieldStressParameters"]);
        let params: Vec<_> = rock.parameters().collect();
        assert!(params.contains(&"sigma_ci"));
        assert!(!params.contains(&"c_rock"));
    }

    #[test]
    fn mohr_coulomb_rock_groups() {
        let rock = rock_mass(Criterion::MohrCoulomb);
        let group = rock.group("MohrCoulomb").unwrap_or_else(|| panic!("missing group"));
        assert_eq!(group.properties[1].name, "internalphi");
        assert_eq!(group.properties[1].value.to_string(), "phi_rock");
        assert!(rock.group("HoekBrown").is_none());
    }

    #[test]
    fn lining_is_concrete() {
        let mat = lining(Target::Global);
        assert_eq!(mat.family, Some("concrete"));
        let json = serde_json::to_value(&mat).unwrap_or_default();
        assert!(json["groups"][1].get("label").is_none());
        assert_eq!(json["groups"][0]["label"], "Young's_modulus_and_Poisson's_ratio");
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

/* ----- PROJECTS (shared by projects/ and calculator/) ----- */

/// Lifecycle status of a construction project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectStatus {
    Draft,
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

/// A construction project with its stored embodied-carbon total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Region code used to select region-specific emission factors (e.g. `AU`).
    pub region: Option<String>,
    /// Total embodied carbon for the project, in kg CO2e, if calculated.
    pub total_kg_co2e: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/* ----- EMISSION FACTORS (shared by factors/ and calculator/) ----- */

/// Which estimation category a factor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FactorCategory {
    Material,
    Transport,
    Energy,
}

impl FactorCategory {
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s {
            "material" => Some(Self::Material),
            "transport" => Some(Self::Transport),
            "energy" => Some(Self::Energy),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::Transport => "transport",
            Self::Energy => "energy",
        }
    }
}

/// One row of the emission-factor reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionFactor {
    pub id: String,
    pub name: String,
    pub category: FactorCategory,
    /// The unit the factor is expressed against (e.g. `kg`, `t.km`, `kWh`).
    pub unit: String,
    pub kg_co2e_per_unit: f64,
    pub region: Option<String>,
    /// Dataset or standard the factor was sourced from (e.g. `EPiC`, `NGA`).
    pub source: Option<String>,
}

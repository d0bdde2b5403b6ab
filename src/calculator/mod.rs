//! Client-side embodied-carbon estimation.
//!
//! Pure arithmetic: each input line contributes `quantity × factor`, summed per
//! category (materials, transport, energy) and overall. No I/O; fetch factors
//! through [`crate::factors`] and feed them in.

use serde::Serialize;

use crate::core::{CcError, EmissionFactor};

/// One line of an estimate: a quantity priced against an emission factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineInput {
    pub name: String,
    /// Quantity in the factor's unit (kg of material, t.km of transport, kWh of energy).
    pub quantity: f64,
    pub factor_kg_co2e: f64,
}

impl LineInput {
    pub fn new(name: impl Into<String>, quantity: f64, factor_kg_co2e: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            factor_kg_co2e,
        }
    }

    /// Build a line from a dataset factor.
    pub fn from_factor(quantity: f64, factor: &EmissionFactor) -> Self {
        Self {
            name: factor.name.clone(),
            quantity,
            factor_kg_co2e: factor.kg_co2e_per_unit,
        }
    }
}

/// All inputs for one project estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectInputs {
    pub materials: Vec<LineInput>,
    pub transport: Vec<LineInput>,
    pub energy: Vec<LineInput>,
}

/// The computed contribution of a single input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineEmission {
    pub name: String,
    pub kg_co2e: f64,
}

/// Per-category subtotals, per-line breakdown, and the project total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsSummary {
    pub materials_kg_co2e: f64,
    pub transport_kg_co2e: f64,
    pub energy_kg_co2e: f64,
    pub total_kg_co2e: f64,
    pub breakdown: Vec<LineEmission>,
}

/// Estimate the embodied carbon of `inputs`.
///
/// Rejects negative or non-finite quantities and factors with [`CcError::Data`];
/// empty input sets produce a zero summary.
pub fn estimate(inputs: &ProjectInputs) -> Result<EmissionsSummary, CcError> {
    let mut breakdown =
        Vec::with_capacity(inputs.materials.len() + inputs.transport.len() + inputs.energy.len());

    let materials = sum_category(&inputs.materials, &mut breakdown)?;
    let transport = sum_category(&inputs.transport, &mut breakdown)?;
    let energy = sum_category(&inputs.energy, &mut breakdown)?;

    Ok(EmissionsSummary {
        materials_kg_co2e: materials,
        transport_kg_co2e: transport,
        energy_kg_co2e: energy,
        total_kg_co2e: materials + transport + energy,
        breakdown,
    })
}

fn sum_category(lines: &[LineInput], breakdown: &mut Vec<LineEmission>) -> Result<f64, CcError> {
    let mut subtotal = 0.0;
    for line in lines {
        if !line.quantity.is_finite() || line.quantity < 0.0 {
            return Err(CcError::Data(format!(
                "invalid quantity {} for '{}'",
                line.quantity, line.name
            )));
        }
        if !line.factor_kg_co2e.is_finite() || line.factor_kg_co2e < 0.0 {
            return Err(CcError::Data(format!(
                "invalid emission factor {} for '{}'",
                line.factor_kg_co2e, line.name
            )));
        }
        let kg_co2e = line.quantity * line.factor_kg_co2e;
        subtotal += kg_co2e;
        breakdown.push(LineEmission {
            name: line.name.clone(),
            kg_co2e,
        });
    }
    Ok(subtotal)
}

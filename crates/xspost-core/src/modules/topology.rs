//! Per-topology column bindings for the counts table.
//!
//! The binding table is exhaustive over [`ModelTopology`]; a new fitting
//! mode needs an explicit entry here, it is never inferred from column
//! count. A one-component fit has no separate component column in the
//! dump, so the single-thermal topology aliases its curve to the
//! total-model column.

use crate::domain::{ModelKind, ModelTopology, ParseResult, PostError};
use crate::modules::dump::NumericTable;

/// Fixed leading columns: energy, energy half-width, data, data error,
/// total model.
pub const FIXED_COLUMNS: usize = 5;

const ENERGY: usize = 0;
const ENERGY_HALF_WIDTH: usize = 1;
const DATA: usize = 2;
const DATA_ERROR: usize = 3;
const MODEL_TOTAL: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ComponentBinding {
    pub(crate) label: &'static str,
    pub(crate) kind: ModelKind,
    pub(crate) column: usize,
}

const fn thermal(label: &'static str, column: usize) -> ComponentBinding {
    ComponentBinding {
        label,
        kind: ModelKind::Thermal,
        column,
    }
}

const fn broken(column: usize) -> ComponentBinding {
    ComponentBinding {
        label: "bknpower",
        kind: ModelKind::BrokenPowerLaw,
        column,
    }
}

const ONE_THERMAL: &[ComponentBinding] = &[thermal("apec", MODEL_TOTAL)];
const TWO_THERMAL: &[ComponentBinding] = &[thermal("apec1", 5), thermal("apec2", 6)];
const THREE_THERMAL: &[ComponentBinding] =
    &[thermal("apec1", 5), thermal("apec2", 6), thermal("apec3", 7)];
const FOUR_THERMAL: &[ComponentBinding] = &[
    thermal("apec1", 5),
    thermal("apec2", 6),
    thermal("apec3", 7),
    thermal("apec4", 8),
];
const THERMAL_BROKEN: &[ComponentBinding] = &[thermal("apec", 5), broken(6)];
const TWO_THERMAL_BROKEN: &[ComponentBinding] =
    &[thermal("apec1", 5), broken(6), thermal("apec2", 7)];
const THREE_THERMAL_BROKEN: &[ComponentBinding] = &[
    thermal("apec1", 5),
    broken(6),
    thermal("apec2", 7),
    thermal("apec3", 8),
];

pub(crate) fn component_bindings(topology: ModelTopology) -> &'static [ComponentBinding] {
    match topology {
        ModelTopology::OneThermal => ONE_THERMAL,
        ModelTopology::TwoThermal => TWO_THERMAL,
        ModelTopology::ThreeThermal => THREE_THERMAL,
        ModelTopology::FourThermal => FOUR_THERMAL,
        ModelTopology::ThermalBroken => THERMAL_BROKEN,
        ModelTopology::TwoThermalBroken => TWO_THERMAL_BROKEN,
        ModelTopology::ThreeThermalBroken => THREE_THERMAL_BROKEN,
    }
}

pub(crate) fn has_kind(topology: ModelTopology, kind: ModelKind) -> bool {
    component_bindings(topology)
        .iter()
        .any(|binding| binding.kind == kind)
}

/// Declared counts-table width for a topology.
pub fn expected_column_count(topology: ModelTopology) -> usize {
    let extra = component_bindings(topology)
        .iter()
        .filter(|binding| binding.column >= FIXED_COLUMNS)
        .count();
    FIXED_COLUMNS + extra
}

/// Resolves a fitting-mode name, reporting the offender when unsupported.
pub fn resolve_topology(name: &str) -> ParseResult<ModelTopology> {
    ModelTopology::from_name(name).ok_or_else(|| PostError::unsupported_topology(name))
}

/// One component's count-rate curve sliced from the counts table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCurve {
    pub label: String,
    pub kind: ModelKind,
    pub rate: Vec<f64>,
}

/// The counts table with its columns bound to names. All columns share one
/// length (the number of energy bins).
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralCurveTable {
    pub energy: Vec<f64>,
    pub energy_half_width: Vec<f64>,
    pub data: Vec<f64>,
    pub data_error: Vec<f64>,
    pub model_total: Vec<f64>,
    pub components: Vec<ComponentCurve>,
}

/// Binds the counts table's columns per the topology's entry in the static
/// table. A non-empty table whose width disagrees with the declared schema
/// is a malformed dump.
pub fn split_components(
    counts: &NumericTable,
    topology: ModelTopology,
) -> ParseResult<SpectralCurveTable> {
    let expected = expected_column_count(topology);
    if counts.row_count() > 0 && counts.column_count() != expected {
        return Err(PostError::malformed_dump(format!(
            "counts table has {} column(s) but topology '{}' declares {}",
            counts.column_count(),
            topology,
            expected
        )));
    }

    let take = |index: usize| counts.column(index).unwrap_or_default();
    let components = component_bindings(topology)
        .iter()
        .map(|binding| ComponentCurve {
            label: binding.label.to_string(),
            kind: binding.kind,
            rate: take(binding.column),
        })
        .collect();

    Ok(SpectralCurveTable {
        energy: take(ENERGY),
        energy_half_width: take(ENERGY_HALF_WIDTH),
        data: take(DATA),
        data_error: take(DATA_ERROR),
        model_total: take(MODEL_TOTAL),
        components,
    })
}

//! Walks the ordered component list, pairing each count-rate curve with its
//! fitted parameters from the header catalog.
//!
//! Every model kind declares its slot plan up front: which keys it reads at
//! which offset from the component's first slot, with which unit conversion,
//! and how many slots it consumes in total. The walker only moves the
//! cursor; it never hand-increments between reads. The key actually queried
//! is `<prefix><slot>` with its error under `E<prefix><slot>`.

use crate::common::constants::{EMISSION_MEASURE_FACTOR, KEV_PER_MEGAKELVIN};
use crate::domain::{
    AsymmetricError, FitMetadata, GainCalibration, MatchedComponent, Measurement, ModelKind,
    PostError, PostResult,
};
use crate::modules::catalog::HeaderCatalog;
use crate::modules::topology::SpectralCurveTable;
use crate::store::StoreValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitScale {
    Identity,
    /// keV → MK via the fixed temperature scale.
    KevToMegakelvin,
    /// Fit normalization → emission measure via the fixed factor.
    NormToEmissionMeasure,
}

impl UnitScale {
    fn apply(self, raw: f64) -> f64 {
        match self {
            Self::Identity => raw,
            Self::KevToMegakelvin => raw / KEV_PER_MEGAKELVIN,
            Self::NormToEmissionMeasure => raw / EMISSION_MEASURE_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotRead {
    offset: usize,
    key_prefix: &'static str,
    scale: UnitScale,
}

#[derive(Debug, Clone, Copy)]
struct SlotPlan {
    /// Total parameter slots the kind occupies in the flat catalog.
    slots_consumed: usize,
    reads: &'static [SlotRead],
}

const fn read(offset: usize, key_prefix: &'static str, scale: UnitScale) -> SlotRead {
    SlotRead {
        offset,
        key_prefix,
        scale,
    }
}

/// Thermal: temperature at the component's first slot, normalization four
/// past it (the redshift/abundance slots in between are never read).
const THERMAL_PLAN: SlotPlan = SlotPlan {
    slots_consumed: 5,
    reads: &[
        read(0, "kT", UnitScale::KevToMegakelvin),
        read(4, "norm", UnitScale::NormToEmissionMeasure),
    ],
};

/// Broken power law: the fixed low-energy index at the first slot is
/// skipped, then break energy, high-energy index, and normalization follow.
const BROKEN_PLAN: SlotPlan = SlotPlan {
    slots_consumed: 4,
    reads: &[
        read(1, "BreakE", UnitScale::Identity),
        read(2, "PhoIndx2", UnitScale::Identity),
        read(3, "norm", UnitScale::Identity),
    ],
};

/// The scaling constant occupies one slot and reads nothing.
const CONSTANT_PLAN: SlotPlan = SlotPlan {
    slots_consumed: 1,
    reads: &[],
};

const fn slot_plan(kind: ModelKind) -> SlotPlan {
    match kind {
        ModelKind::Thermal => THERMAL_PLAN,
        ModelKind::BrokenPowerLaw => BROKEN_PLAN,
        ModelKind::ScalingConstant => CONSTANT_PLAN,
    }
}

/// Matches every component curve to its parameters. The slot cursor starts
/// at 1, or past the leading scaling constant when the fit combined both
/// detectors. Deterministic: for a fixed topology and detector flag the
/// queried key sequence depends only on component order.
pub fn match_components(
    curves: &SpectralCurveTable,
    catalog: &HeaderCatalog,
    combined_detectors: bool,
) -> PostResult<Vec<MatchedComponent>> {
    let mut cursor = 1usize;
    if combined_detectors {
        cursor += slot_plan(ModelKind::ScalingConstant).slots_consumed;
    }

    let mut matched = Vec::with_capacity(curves.components.len());
    for component in &curves.components {
        let context = format!("component '{}'", component.label);
        let plan = slot_plan(component.kind);
        let mut readings = Vec::with_capacity(plan.reads.len());
        for slot_read in plan.reads {
            readings.push(read_measurement(
                catalog,
                slot_read,
                cursor + slot_read.offset,
                &context,
            )?);
        }

        let record = match component.kind {
            ModelKind::Thermal => MatchedComponent::Thermal {
                label: component.label.clone(),
                curve: component.rate.clone(),
                temperature_mk: readings[0],
                emission_measure: readings[1],
            },
            ModelKind::BrokenPowerLaw => MatchedComponent::BrokenPowerLaw {
                label: component.label.clone(),
                curve: component.rate.clone(),
                break_energy_kev: readings[0],
                photon_index: readings[1],
                norm_at_1kev: readings[2],
            },
            ModelKind::ScalingConstant => {
                return Err(PostError::internal(
                    "MATCH.CONSTANT_CURVE",
                    format!("{} binds a count curve to a scaling constant", context),
                ));
            }
        };
        matched.push(record);
        cursor += plan.slots_consumed;
    }

    Ok(matched)
}

fn read_measurement(
    catalog: &HeaderCatalog,
    slot_read: &SlotRead,
    slot: usize,
    context: &str,
) -> PostResult<Measurement> {
    let value_key = format!("{}{}", slot_read.key_prefix, slot);
    let error_key = format!("E{}", value_key);

    let raw = match catalog.entry(&value_key) {
        None => return Err(PostError::missing_parameter_slot(&value_key, context)),
        Some(entry) => match entry.value {
            StoreValue::Scalar(value) => value,
            StoreValue::Pair(_) => {
                return Err(PostError::parameter_shape(&value_key, "a scalar value"));
            }
        },
    };
    let bounds = match catalog.entry(&error_key) {
        None => return Err(PostError::missing_parameter_slot(&error_key, context)),
        Some(entry) => match entry.value {
            StoreValue::Pair(pair) => pair,
            StoreValue::Scalar(_) => {
                return Err(PostError::parameter_shape(&error_key, "a bound pair"));
            }
        },
    };

    let scaled_bounds = [
        slot_read.scale.apply(bounds[0]),
        slot_read.scale.apply(bounds[1]),
    ];
    Ok(Measurement {
        value: slot_read.scale.apply(raw),
        error: AsymmetricError::from_bound_pair(scaled_bounds),
    })
}

/// Fit-wide quantities, read by their fixed key names. All optional:
/// discovery is silent about absent keys, and the scaling factor only
/// exists for combined-detector fits.
pub fn read_metadata(catalog: &HeaderCatalog) -> FitMetadata {
    let scaling_factor = catalog.scalar("factor").map(|value| Measurement {
        value,
        error: catalog
            .bound_pair("Efactor")
            .map(AsymmetricError::from_bound_pair)
            .unwrap_or_default(),
    });
    FitMetadata {
        exposure: catalog.scalar("EXPOSURE"),
        statistic: catalog.scalar("STATISTIC"),
        scaling_factor,
    }
}

/// Gain slope from a gain companion catalog. The error pair is the
/// sign-selected pair of differences between the slope and its stored
/// low/high bounds, keeping the upstream tooling's orientation.
pub fn read_gain(catalog: &HeaderCatalog) -> PostResult<GainCalibration> {
    let context = "gain calibration";
    let slope = catalog
        .scalar("gainSlope")
        .ok_or_else(|| PostError::missing_parameter_slot("gainSlope", context))?;
    let low = catalog
        .scalar("gainSlopeElow")
        .ok_or_else(|| PostError::missing_parameter_slot("gainSlopeElow", context))?;
    let high = catalog
        .scalar("gainSlopeEhi")
        .ok_or_else(|| PostError::missing_parameter_slot("gainSlopeEhi", context))?;

    Ok(GainCalibration {
        slope,
        error: AsymmetricError::from_bound_pair([slope - low, slope - high]),
    })
}

#[cfg(test)]
mod tests {
    use super::{match_components, read_gain, read_metadata};
    use crate::common::constants::{EMISSION_MEASURE_FACTOR, KEV_PER_MEGAKELVIN};
    use crate::domain::{MatchedComponent, ModelKind, ModelTopology};
    use crate::modules::catalog::HeaderCatalog;
    use crate::modules::resolver::resolve_terms;
    use crate::modules::topology::{ComponentCurve, SpectralCurveTable};
    use crate::store::{JsonHeaderStore, StoreValue};

    fn catalog_from(entries: &[(&str, StoreValue)]) -> HeaderCatalog {
        let store = JsonHeaderStore::from_entries(
            entries
                .iter()
                .map(|(key, value)| ((*key).to_string(), *value)),
        );
        let fragments = resolve_terms(&[
            "normalisation",
            "temperature",
            "break",
            "photonindex",
            "EXPOSURE",
            "STATISTIC",
            "factor",
        ]);
        HeaderCatalog::discover(&store, &fragments).catalog
    }

    fn curve_table(components: Vec<ComponentCurve>) -> SpectralCurveTable {
        SpectralCurveTable {
            energy: vec![2.0, 2.1],
            energy_half_width: vec![0.02, 0.02],
            data: vec![10.0, 11.0],
            data_error: vec![1.0, 1.1],
            model_total: vec![9.5, 10.5],
            components,
        }
    }

    fn thermal_curve(label: &str) -> ComponentCurve {
        ComponentCurve {
            label: label.to_string(),
            kind: ModelKind::Thermal,
            rate: vec![9.5, 10.5],
        }
    }

    fn broken_curve() -> ComponentCurve {
        ComponentCurve {
            label: "bknpower".to_string(),
            kind: ModelKind::BrokenPowerLaw,
            rate: vec![0.5, 0.4],
        }
    }

    #[test]
    fn single_detector_thermal_resolves_first_slot_keys() {
        let catalog = catalog_from(&[
            ("kT1", StoreValue::Scalar(2.0)),
            ("EkT1", StoreValue::Pair([-0.1, 0.15])),
            ("norm5", StoreValue::Scalar(1e-3)),
            ("Enorm5", StoreValue::Pair([-1e-4, 2e-4])),
        ]);
        let curves = curve_table(vec![thermal_curve("apec")]);

        let matched =
            match_components(&curves, &catalog, false).expect("matching should succeed");
        assert_eq!(matched.len(), 1);
        let MatchedComponent::Thermal {
            temperature_mk,
            emission_measure,
            ..
        } = &matched[0]
        else {
            panic!("expected a thermal component");
        };

        assert_eq!(temperature_mk.value, 2.0 / KEV_PER_MEGAKELVIN);
        assert_eq!(temperature_mk.error.minus, -0.1 / KEV_PER_MEGAKELVIN);
        assert_eq!(temperature_mk.error.plus, 0.15 / KEV_PER_MEGAKELVIN);
        assert_eq!(emission_measure.value, 1e-3 / EMISSION_MEASURE_FACTOR);
        assert_eq!(emission_measure.error.minus, -1e-4 / EMISSION_MEASURE_FACTOR);
        assert_eq!(emission_measure.error.plus, 2e-4 / EMISSION_MEASURE_FACTOR);
    }

    #[test]
    fn combined_detectors_shift_every_slot_by_one() {
        let catalog = catalog_from(&[
            ("kT2", StoreValue::Scalar(2.0)),
            ("EkT2", StoreValue::Pair([-0.1, 0.15])),
            ("norm6", StoreValue::Scalar(1e-3)),
            ("Enorm6", StoreValue::Pair([-1e-4, 2e-4])),
        ]);
        let curves = curve_table(vec![thermal_curve("apec")]);

        let matched = match_components(&curves, &catalog, true).expect("matching should succeed");
        let MatchedComponent::Thermal { temperature_mk, .. } = &matched[0] else {
            panic!("expected a thermal component");
        };
        assert_eq!(temperature_mk.value, 2.0 / KEV_PER_MEGAKELVIN);

        let unshifted = match_components(&curves, &catalog, false)
            .expect_err("single-detector walk should miss kT1");
        assert_eq!(unshifted.placeholder(), "MATCH.PARAMETER_SLOT");
        assert!(unshifted.message().contains("'kT1'"));
    }

    #[test]
    fn broken_power_law_follows_the_thermal_component() {
        let catalog = catalog_from(&[
            ("kT1", StoreValue::Scalar(0.9)),
            ("EkT1", StoreValue::Pair([0.0, 0.0])),
            ("norm5", StoreValue::Scalar(2e-3)),
            ("Enorm5", StoreValue::Pair([0.0, 0.0])),
            ("BreakE7", StoreValue::Scalar(6.2)),
            ("EBreakE7", StoreValue::Pair([-0.3, 0.2])),
            ("PhoIndx28", StoreValue::Scalar(2.4)),
            ("EPhoIndx28", StoreValue::Pair([0.12, -0.08])),
            ("norm9", StoreValue::Scalar(0.07)),
            ("Enorm9", StoreValue::Pair([-0.01, 0.02])),
        ]);
        let curves = curve_table(vec![thermal_curve("apec"), broken_curve()]);

        let matched =
            match_components(&curves, &catalog, false).expect("matching should succeed");
        assert_eq!(matched.len(), 2);
        let MatchedComponent::BrokenPowerLaw {
            break_energy_kev,
            photon_index,
            norm_at_1kev,
            ..
        } = &matched[1]
        else {
            panic!("expected a broken power law");
        };

        assert_eq!(break_energy_kev.value, 6.2);
        assert_eq!(break_energy_kev.error.minus, -0.3);
        assert_eq!(break_energy_kev.error.plus, 0.2);
        assert_eq!(photon_index.value, 2.4);
        assert_eq!(photon_index.error.minus, -0.08);
        assert_eq!(photon_index.error.plus, 0.12);
        assert_eq!(norm_at_1kev.value, 0.07);
    }

    #[test]
    fn frozen_parameters_report_zero_offsets() {
        let catalog = catalog_from(&[
            ("kT1", StoreValue::Scalar(2.0)),
            ("EkT1", StoreValue::Pair([0.0, 0.0])),
            ("norm5", StoreValue::Scalar(1e-3)),
            ("Enorm5", StoreValue::Pair([0.0, 0.0])),
        ]);
        let curves = curve_table(vec![thermal_curve("apec")]);

        let matched =
            match_components(&curves, &catalog, false).expect("matching should succeed");
        let MatchedComponent::Thermal {
            temperature_mk,
            emission_measure,
            ..
        } = &matched[0]
        else {
            panic!("expected a thermal component");
        };
        assert!(temperature_mk.error.is_frozen());
        assert!(emission_measure.error.is_frozen());
    }

    #[test]
    fn matching_is_deterministic_for_identical_inputs() {
        let entries = [
            ("kT1", StoreValue::Scalar(2.0)),
            ("EkT1", StoreValue::Pair([-0.1, 0.15])),
            ("norm5", StoreValue::Scalar(1e-3)),
            ("Enorm5", StoreValue::Pair([-1e-4, 2e-4])),
        ];
        let curves = curve_table(vec![thermal_curve("apec")]);

        let first = match_components(&curves, &catalog_from(&entries), false)
            .expect("first run should succeed");
        let second = match_components(&curves, &catalog_from(&entries), false)
            .expect("second run should succeed");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_slot_is_fatal_for_the_component() {
        let catalog = catalog_from(&[
            ("kT1", StoreValue::Scalar(2.0)),
            ("EkT1", StoreValue::Pair([-0.1, 0.15])),
        ]);
        let curves = curve_table(vec![thermal_curve("apec")]);

        let error = match_components(&curves, &catalog, false)
            .expect_err("missing norm5 should be fatal");
        assert_eq!(error.placeholder(), "MATCH.PARAMETER_SLOT");
        assert!(error.message().contains("'norm5'"));
        assert!(error.message().contains("component 'apec'"));
    }

    #[test]
    fn wrong_payload_shape_is_fatal() {
        let catalog = catalog_from(&[
            ("kT1", StoreValue::Pair([1.9, 2.1])),
            ("EkT1", StoreValue::Pair([-0.1, 0.15])),
        ]);
        let curves = curve_table(vec![thermal_curve("apec")]);

        let error =
            match_components(&curves, &catalog, false).expect_err("pair-valued kT should fail");
        assert_eq!(error.placeholder(), "MATCH.PARAMETER_SHAPE");
    }

    #[test]
    fn every_matched_error_satisfies_the_sign_invariant() {
        let catalog = catalog_from(&[
            ("kT1", StoreValue::Scalar(0.9)),
            ("EkT1", StoreValue::Pair([0.05, -0.04])),
            ("norm5", StoreValue::Scalar(2e-3)),
            ("Enorm5", StoreValue::Pair([0.0, 0.0])),
            ("BreakE7", StoreValue::Scalar(6.2)),
            ("EBreakE7", StoreValue::Pair([-0.3, 0.2])),
            ("PhoIndx28", StoreValue::Scalar(2.4)),
            ("EPhoIndx28", StoreValue::Pair([0.12, -0.08])),
            ("norm9", StoreValue::Scalar(0.07)),
            ("Enorm9", StoreValue::Pair([-0.01, 0.02])),
        ]);
        let curves = curve_table(vec![thermal_curve("apec"), broken_curve()]);

        let matched =
            match_components(&curves, &catalog, false).expect("matching should succeed");
        let errors: Vec<_> = matched
            .iter()
            .flat_map(|component| match component {
                MatchedComponent::Thermal {
                    temperature_mk,
                    emission_measure,
                    ..
                } => vec![temperature_mk.error, emission_measure.error],
                MatchedComponent::BrokenPowerLaw {
                    break_energy_kev,
                    photon_index,
                    norm_at_1kev,
                    ..
                } => vec![
                    break_energy_kev.error,
                    photon_index.error,
                    norm_at_1kev.error,
                ],
            })
            .collect();

        for error in errors {
            assert!(error.minus <= 0.0);
            assert!(error.plus >= 0.0);
        }
    }

    #[test]
    fn metadata_reads_fixed_keys_and_tolerates_absence() {
        let catalog = catalog_from(&[
            ("EXPOSURE", StoreValue::Scalar(211.4)),
            ("STATISTIC", StoreValue::Scalar(431.2)),
            ("factor", StoreValue::Scalar(1.04)),
            ("Efactor", StoreValue::Pair([-0.03, 0.02])),
        ]);

        let metadata = read_metadata(&catalog);
        assert_eq!(metadata.exposure, Some(211.4));
        assert_eq!(metadata.statistic, Some(431.2));
        let factor = metadata.scaling_factor.expect("factor should be present");
        assert_eq!(factor.value, 1.04);
        assert_eq!(factor.error.minus, -0.03);
        assert_eq!(factor.error.plus, 0.02);

        let sparse = read_metadata(&catalog_from(&[]));
        assert_eq!(sparse.exposure, None);
        assert_eq!(sparse.scaling_factor, None);
    }

    #[test]
    fn gain_error_selects_signs_from_the_bound_differences() {
        let store = JsonHeaderStore::from_entries([
            ("gainSlope".to_string(), StoreValue::Scalar(0.98)),
            ("gainSlopeElow".to_string(), StoreValue::Scalar(0.95)),
            ("gainSlopeEhi".to_string(), StoreValue::Scalar(1.01)),
        ]);
        let fragments = resolve_terms(&["gainSlope", "gainSlopeElow", "gainSlopeEhi"]);
        let catalog = HeaderCatalog::discover(&store, &fragments).catalog;

        let gain = read_gain(&catalog).expect("gain should resolve");
        assert_eq!(gain.slope, 0.98);
        assert!((gain.error.plus - 0.03).abs() < 1e-12);
        assert!((gain.error.minus + 0.03).abs() < 1e-12);

        let missing = read_gain(&HeaderCatalog::default()).expect_err("empty catalog should fail");
        assert_eq!(missing.placeholder(), "MATCH.PARAMETER_SLOT");
    }
}

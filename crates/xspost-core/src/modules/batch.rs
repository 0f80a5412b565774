//! Batch processing over fit artifacts, the check-report views, and the
//! run-comparison mode.
//!
//! Each artifact is processed all-or-nothing: a failure is recorded with
//! its reason and the batch continues with the remaining artifacts.

use crate::common::constants::{GAIN_STORE_SUFFIX, STORE_EXTENSION};
use crate::domain::{
    FitArtifact, FitSummary, FocalPlane, GainCalibration, MatchedComponent, Measurement,
    PostError, PostResult,
};
use crate::modules::catalog::{HeaderCatalog, KeywordDiagnostic};
use crate::modules::options::EngineOptions;
use crate::modules::resolver::resolve_terms;
use crate::modules::{dump, matcher, topology};
use crate::store::JsonHeaderStore;
use globset::Glob;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Query terms of the post-run check report, mirroring what the batch
/// tooling verifies after every fitting run.
pub const PARAMS_QUERY_TERMS: [&str; 7] = [
    "STATISTIC",
    "factor",
    "gainSlope",
    "normalisation",
    "temperature",
    "break",
    "photonindex",
];

const GAIN_QUERY_TERMS: [&str; 3] = ["gainSlope", "gainSlopeElow", "gainSlopeEhi"];

/// One artifact's full engine output plus the discovery diagnostics the
/// caller may want to surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRun {
    pub summary: FitSummary,
    pub keyword_diagnostics: Vec<KeywordDiagnostic>,
}

#[derive(Debug)]
pub struct ArtifactOutcome {
    pub artifact: String,
    pub result: PostResult<ArtifactRun>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl BatchReport {
    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .count()
    }

    pub fn passed(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Runs the engine over every artifact; failures never stop the batch.
pub fn process_batch(artifacts: &[FitArtifact], options: &EngineOptions) -> BatchReport {
    let outcomes = artifacts
        .iter()
        .map(|artifact| ArtifactOutcome {
            artifact: artifact.id(),
            result: process_artifact(artifact, options),
        })
        .collect();
    BatchReport { outcomes }
}

/// Runs the full engine on one artifact: store + dump load, dump parsing,
/// component splitting, catalog discovery, and parameter matching.
pub fn process_artifact(
    artifact: &FitArtifact,
    options: &EngineOptions,
) -> PostResult<ArtifactRun> {
    let store = JsonHeaderStore::from_path(&artifact.store_path())?;
    let dump_text = read_dump(&artifact.dump_path())?;
    let tables = dump::parse_dump(&dump_text)?;
    let curves = topology::split_components(&tables.counts, options.topology)?;

    let fragments = resolve_terms(&options.query_terms());
    let discovery = HeaderCatalog::discover(&store, &fragments);

    let focal_plane = options.focal_plane.or_else(|| artifact.focal_plane());
    let combined = focal_plane.is_some_and(FocalPlane::is_combined);
    let components = matcher::match_components(&curves, &discovery.catalog, combined)?;
    let metadata = matcher::read_metadata(&discovery.catalog);

    let gain = if options.read_gain && artifact.varies_gain() {
        Some(read_gain_calibration(artifact)?)
    } else {
        None
    };

    Ok(ArtifactRun {
        summary: FitSummary {
            artifact: artifact.id(),
            focal_plane,
            topology: options.topology,
            metadata,
            components,
            gain,
        },
        keyword_diagnostics: discovery.diagnostics,
    })
}

fn read_gain_calibration(artifact: &FitArtifact) -> PostResult<GainCalibration> {
    let store = JsonHeaderStore::from_path(&artifact.gain_store_path())?;
    let fragments = resolve_terms(&GAIN_QUERY_TERMS);
    let discovery = HeaderCatalog::discover(&store, &fragments);
    matcher::read_gain(&discovery.catalog)
}

fn read_dump(path: &Path) -> PostResult<String> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            PostError::artifact_not_found(format!("text dump '{}' is missing", path.display()))
        } else {
            PostError::io_system(
                "IO.DUMP_READ",
                format!("failed to read text dump '{}': {}", path.display(), source),
            )
        }
    })
}

/// Finds fit artifacts in a run directory: every header store whose base
/// name matches the glob, gain companion stores excluded. Sorted by name
/// so batch order is stable.
pub fn discover_artifacts(run_dir: &Path, pattern: &str) -> PostResult<Vec<FitArtifact>> {
    let matcher = Glob::new(pattern)
        .map_err(|source| {
            PostError::input_validation(
                "INPUT.ARTIFACT_GLOB",
                format!("invalid artifact glob '{}': {}", pattern, source),
            )
        })?
        .compile_matcher();

    let entries = fs::read_dir(run_dir).map_err(|source| {
        PostError::io_system(
            "IO.RUN_DIR",
            format!(
                "failed to read run directory '{}': {}",
                run_dir.display(),
                source
            ),
        )
    })?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            PostError::io_system(
                "IO.RUN_DIR",
                format!(
                    "failed to list run directory '{}': {}",
                    run_dir.display(),
                    source
                ),
            )
        })?;
        let path = entry.path();
        let is_store = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(STORE_EXTENSION));
        if !is_store {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if stem.ends_with(GAIN_STORE_SUFFIX) {
            continue;
        }
        if matcher.is_match(Path::new(stem)) {
            artifacts.push(FitArtifact::new(&path));
        }
    }

    artifacts.sort_by_key(FitArtifact::id);
    Ok(artifacts)
}

/// Catalog values of one artifact filtered down to the check-report view.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    pub artifact: String,
    pub rows: Vec<(String, f64)>,
    pub diagnostics: Vec<KeywordDiagnostic>,
}

/// Reads the check-report parameters straight from the artifact's store;
/// the text dump is not touched.
pub fn read_parameter_table(artifact: &FitArtifact, terms: &[&str]) -> PostResult<ParameterTable> {
    let store = JsonHeaderStore::from_path(&artifact.store_path())?;
    let fragments = resolve_terms(terms);
    let discovery = HeaderCatalog::discover(&store, &fragments);
    let rows = discovery
        .catalog
        .reportable_parameters()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Ok(ParameterTable {
        artifact: artifact.id(),
        rows,
        diagnostics: discovery.diagnostics,
    })
}

/// One parameter's values from both runs; a side missing the key stays
/// `None` and renders as a dash.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterComparison {
    pub key: String,
    pub reference: Option<f64>,
    pub current: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    pub artifact: String,
    pub rows: Vec<ParameterComparison>,
}

/// Loads the same parameter set from the current artifact and from its
/// namesake in a reference run directory. Reference keys lead the row
/// order; keys only the current run has follow.
pub fn compare_runs(
    artifact: &FitArtifact,
    reference_root: &Path,
    terms: &[&str],
) -> PostResult<ComparisonReport> {
    let current = read_parameter_table(artifact, terms)?;
    let reference_artifact = FitArtifact::new(reference_root.join(artifact.id()));
    let reference = read_parameter_table(&reference_artifact, terms)?;

    let mut rows: Vec<ParameterComparison> = reference
        .rows
        .iter()
        .map(|(key, value)| ParameterComparison {
            key: key.clone(),
            reference: Some(*value),
            current: current
                .rows
                .iter()
                .find(|(current_key, _)| current_key == key)
                .map(|(_, current_value)| *current_value),
        })
        .collect();
    for (key, value) in &current.rows {
        if !rows.iter().any(|row| &row.key == key) {
            rows.push(ParameterComparison {
                key: key.clone(),
                reference: None,
                current: Some(*value),
            });
        }
    }

    Ok(ComparisonReport {
        artifact: artifact.id(),
        rows,
    })
}

const COLUMN_GAP: &str = "          ";

/// Renders a check-report table the way the batch tooling prints it.
pub fn render_parameter_table(table: &ParameterTable) -> String {
    let mut lines = vec![
        format!("{} result:", table.artifact),
        format!("{:<10}{}{:<20}", "Param", COLUMN_GAP, "Value"),
    ];
    for (key, value) in &table.rows {
        lines.push(format!("{:<10}:{}{:<20}", key, COLUMN_GAP, value));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Renders a side-by-side comparison against a reference run.
pub fn render_comparison(report: &ComparisonReport) -> String {
    let mut lines = vec![
        format!("{} result:", report.artifact),
        format!(
            "{:<10}{}{:<20}{}{:<20}",
            "Param", COLUMN_GAP, "Benchmark", COLUMN_GAP, "New"
        ),
    ];
    for row in &report.rows {
        lines.push(format!(
            "{:<10}:{}{:<20}{}{:<20}",
            row.key,
            COLUMN_GAP,
            optional_value(row.reference),
            COLUMN_GAP,
            optional_value(row.current)
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn optional_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

/// Renders one matched summary: metadata line, one line per component,
/// gain when present.
pub fn render_fit_summary(summary: &FitSummary) -> String {
    let detector = summary
        .focal_plane
        .map_or_else(|| "unknown detector".to_string(), |fpm| format!("FPM {}", fpm));
    let mut lines = vec![format!(
        "{}: topology {}, {}",
        summary.artifact, summary.topology, detector
    )];

    let mut meta_parts = Vec::new();
    if let Some(statistic) = summary.metadata.statistic {
        meta_parts.push(format!("statistic {:.2}", statistic));
    }
    if let Some(exposure) = summary.metadata.exposure {
        meta_parts.push(format!("exposure {:.2} s", exposure));
    }
    if let Some(factor) = summary.metadata.scaling_factor {
        meta_parts.push(format!("factor {}", measurement_text(&factor, 2)));
    }
    if !meta_parts.is_empty() {
        lines.push(format!("  {}", meta_parts.join(", ")));
    }

    for component in &summary.components {
        lines.push(format!("  {}", component_text(component)));
    }
    if let Some(gain) = summary.gain {
        lines.push(format!(
            "  gain slope {}",
            measurement_text(
                &Measurement {
                    value: gain.slope,
                    error: gain.error,
                },
                2
            )
        ));
    }
    lines.join("\n")
}

fn component_text(component: &MatchedComponent) -> String {
    match component {
        MatchedComponent::Thermal {
            label,
            temperature_mk,
            emission_measure,
            ..
        } => format!(
            "{}: T = {} MK, EM = {} cm^-3",
            label,
            measurement_text(temperature_mk, 2),
            exponent_text(emission_measure)
        ),
        MatchedComponent::BrokenPowerLaw {
            label,
            break_energy_kev,
            photon_index,
            norm_at_1kev,
            ..
        } => format!(
            "{}: break = {} keV, gamma = {}, norm@1keV = {}",
            label,
            measurement_text(break_energy_kev, 2),
            measurement_text(photon_index, 2),
            measurement_text(norm_at_1kev, 3)
        ),
    }
}

fn measurement_text(measurement: &Measurement, precision: usize) -> String {
    if measurement.error.is_frozen() {
        return format!("{:.*} (frozen)", precision, measurement.value);
    }
    format!(
        "{:.*} (+{:.*}/-{:.*})",
        precision,
        measurement.value,
        precision,
        measurement.error.plus,
        precision,
        measurement.error.minus.abs()
    )
}

fn exponent_text(measurement: &Measurement) -> String {
    if measurement.error.is_frozen() {
        return format!("{:.3e} (frozen)", measurement.value);
    }
    format!(
        "{:.3e} (+{:.3e}/-{:.3e})",
        measurement.value,
        measurement.error.plus,
        measurement.error.minus.abs()
    )
}

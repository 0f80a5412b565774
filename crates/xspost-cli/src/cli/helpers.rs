use super::CliError;
use std::path::{Path, PathBuf};
use xspost_core::domain::{FitArtifact, FocalPlane};
use xspost_core::modules::batch::discover_artifacts;
use xspost_core::modules::catalog::KeywordDiagnostic;

pub(super) fn collect_artifacts(
    bases: &[PathBuf],
    run_dir: Option<&Path>,
    pattern: &str,
) -> Result<Vec<FitArtifact>, CliError> {
    let mut artifacts: Vec<FitArtifact> = bases.iter().map(FitArtifact::new).collect();
    if let Some(run_dir) = run_dir {
        artifacts.extend(discover_artifacts(run_dir, pattern).map_err(CliError::Engine)?);
    }
    if artifacts.is_empty() {
        return Err(CliError::Usage(
            "no artifacts to process; pass base paths or --run-dir".to_string(),
        ));
    }
    Ok(artifacts)
}

pub(super) fn parse_focal_plane(value: &str) -> Result<FocalPlane, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "a" => Ok(FocalPlane::A),
        "b" => Ok(FocalPlane::B),
        "ab" | "a&b" | "both" => Ok(FocalPlane::Both),
        other => Err(CliError::Usage(format!(
            "unknown focal plane '{}'; expected a, b, or ab",
            other
        ))),
    }
}

/// Zero-match fragments warn; multi-key matches are routine (one fragment
/// finds every indexed slot of a kind) and stay at debug.
pub(super) fn log_keyword_diagnostics(artifact: &str, diagnostics: &[KeywordDiagnostic]) {
    for diagnostic in diagnostics {
        if diagnostic.matched_nothing() {
            tracing::warn!(
                "artifact '{}': query fragment '{}' matched no store keys",
                artifact,
                diagnostic.fragment
            );
        } else {
            tracing::debug!(
                "artifact '{}': query fragment '{}' matched {} keys",
                artifact,
                diagnostic.fragment,
                diagnostic.matched_keys.len()
            );
        }
    }
}

use super::CliError;
use super::helpers::{collect_artifacts, log_keyword_diagnostics, parse_focal_plane};
use std::path::PathBuf;
use xspost_core::modules::batch::{self, PARAMS_QUERY_TERMS};
use xspost_core::modules::options::EngineOptions;
use xspost_core::modules::topology::resolve_topology;

#[derive(clap::Args)]
pub(super) struct ParamsArgs {
    /// Artifact base paths (store/dump pair without extension)
    #[arg(value_name = "ARTIFACT")]
    artifacts: Vec<PathBuf>,

    /// Discover artifacts under this run directory
    #[arg(long)]
    run_dir: Option<PathBuf>,

    /// Glob matched against artifact base names during discovery
    #[arg(long, default_value = "mod_*")]
    glob: String,

    /// Reference run directory; reports benchmark and new values side by side
    #[arg(long)]
    reference: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SummarizeArgs {
    /// Artifact base paths (store/dump pair without extension)
    #[arg(value_name = "ARTIFACT")]
    artifacts: Vec<PathBuf>,

    /// Discover artifacts under this run directory
    #[arg(long)]
    run_dir: Option<PathBuf>,

    /// Glob matched against artifact base names during discovery
    #[arg(long, default_value = "mod_*")]
    glob: String,

    /// Fitting mode of the artifacts (e.g. 1apec, 1apec1bknpower)
    #[arg(long)]
    topology: String,

    /// Override the detector inference from file names (a, b, or ab)
    #[arg(long)]
    focal_plane: Option<String>,

    /// Skip reading gain companion stores
    #[arg(long)]
    no_gain: bool,

    /// Print each summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

pub(super) fn run_params_command(args: ParamsArgs) -> Result<i32, CliError> {
    let artifacts = collect_artifacts(&args.artifacts, args.run_dir.as_deref(), &args.glob)?;

    let mut failures = 0usize;
    println!();
    for artifact in &artifacts {
        let rendered = if let Some(reference) = &args.reference {
            batch::compare_runs(artifact, reference, &PARAMS_QUERY_TERMS)
                .map(|report| batch::render_comparison(&report))
        } else {
            batch::read_parameter_table(artifact, &PARAMS_QUERY_TERMS).map(|table| {
                log_keyword_diagnostics(&table.artifact, &table.diagnostics);
                batch::render_parameter_table(&table)
            })
        };

        match rendered {
            Ok(text) => println!("{}", text),
            Err(error) => {
                failures += 1;
                tracing::warn!("skipping artifact '{}': {}", artifact.id(), error);
                eprintln!("{}: {}", artifact.id(), error.diagnostic_line());
            }
        }
    }

    Ok(if failures == 0 { 0 } else { 1 })
}

pub(super) fn run_summarize_command(args: SummarizeArgs) -> Result<i32, CliError> {
    let topology = resolve_topology(&args.topology).map_err(CliError::Engine)?;
    let mut options = EngineOptions::new(topology);
    if let Some(focal_plane) = &args.focal_plane {
        options = options.with_focal_plane(parse_focal_plane(focal_plane)?);
    }
    if args.no_gain {
        options = options.without_gain();
    }

    let artifacts = collect_artifacts(&args.artifacts, args.run_dir.as_deref(), &args.glob)?;
    let report = batch::process_batch(&artifacts, &options);

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(run) => {
                log_keyword_diagnostics(&outcome.artifact, &run.keyword_diagnostics);
                if args.json {
                    let rendered = serde_json::to_string_pretty(&run.summary)
                        .map_err(|source| CliError::Internal(anyhow::Error::new(source)))?;
                    println!("{}", rendered);
                } else {
                    println!("{}", batch::render_fit_summary(&run.summary));
                }
            }
            Err(error) => {
                tracing::warn!("artifact '{}' failed: {}", outcome.artifact, error);
                eprintln!("{}: {}", outcome.artifact, error.diagnostic_line());
            }
        }
    }

    Ok(if report.passed() { 0 } else { 1 })
}

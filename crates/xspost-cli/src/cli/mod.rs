mod commands;
mod helpers;

use clap::Parser;
use xspost_core::domain::PostError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let post_error = error.as_post_error();
            eprintln!("{}", post_error.diagnostic_line());
            if let Some(summary_line) = post_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            post_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("xspost".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "xspost", about = "Post-process spectral-fit output artifacts")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the resolved fit parameters for each artifact
    Params(commands::ParamsArgs),
    /// Match component curves to fitted parameters and summarize each fit
    Summarize(commands::SummarizeArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Params(args) => commands::run_params_command(args),
        CliCommand::Summarize(args) => commands::run_summarize_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Engine(PostError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_post_error(&self) -> PostError {
        match self {
            Self::Usage(message) => PostError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Engine(error) => error.clone(),
            Self::Internal(error) => PostError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

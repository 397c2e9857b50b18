//! Radijator Command-Line Interface
//!
//! Loads settings profiles and channel memories into handheld transceivers:
//! - Apply a multi-model settings profile to a radio
//! - Replace a radio's memory bank from JSON memory lists
//! - Print a radio's current settings
//! - Convert memory lists to CHIRP CSV and assign random DCS codes
//!
//! Ports of the form `sim:<file>` address a virtual radio stored in `<file>`.

mod backend;
mod config;
mod dcs_assign;
mod export;
mod input;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use rad_model::{ConfigError, ModelRegistry};
use rad_session::{FailureKind, SessionError, SessionPlan, SessionReport};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;

const DEFAULT_LOG_FILTER: &str = "radijator=info,rad_model=info,rad_session=info,rad_sim=info";

#[derive(Parser)]
#[command(name = "radijator")]
#[command(author, version, about = "Manage handheld radio settings and memories", long_about = None)]
struct Cli {
    /// Log every setting and memory as it is applied
    #[arg(long, global = true)]
    verbose: bool,

    /// Configuration file (default: $XDG_CONFIG_HOME/radijator/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct RadioArgs {
    /// Serial port of the radio (e.g. COM3, /dev/ttyUSB0 or sim:radio.json)
    #[arg(short, long)]
    port: Option<String>,

    /// Model of the radio
    #[arg(short = 'R', long = "radio-model")]
    radio_model: Option<String>,

    /// Settings profile JSON file
    #[arg(short = 'P', long)]
    profile: Option<PathBuf>,

    /// Memory list JSON file (repeat to concatenate several)
    #[arg(short = 'M', long)]
    memory: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a settings profile
    LoadProfile(RadioArgs),

    /// Print the radio's settings
    PrintSettings(RadioArgs),

    /// Replace the radio's memories
    LoadMemory(RadioArgs),

    /// Apply a settings profile and replace the radio's memories
    LoadProfileAndMemory(RadioArgs),

    /// List supported radio models
    ListModels,

    /// Convert a memory list to CHIRP CSV
    ExportCsv {
        /// Memory list JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// CSV file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Assign random DCS codes and polarities to a memory list
    AssignDcs {
        /// Memory list JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Commands that talk to a radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RadioCommand {
    LoadProfile,
    PrintSettings,
    LoadMemory,
    LoadProfileAndMemory,
}

impl RadioCommand {
    fn name(self) -> &'static str {
        match self {
            Self::LoadProfile => "load-profile",
            Self::PrintSettings => "print-settings",
            Self::LoadMemory => "load-memory",
            Self::LoadProfileAndMemory => "load-profile-and-memory",
        }
    }

    fn needs_profile(self) -> bool {
        matches!(self, Self::LoadProfile | Self::LoadProfileAndMemory)
    }

    fn needs_memory(self) -> bool {
        matches!(self, Self::LoadMemory | Self::LoadProfileAndMemory)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .log_filter
                    .as_deref()
                    .unwrap_or(DEFAULT_LOG_FILTER)
                    .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let verbose = cli.verbose;
    let (command, args) = match cli.command {
        Commands::LoadProfile(args) => (RadioCommand::LoadProfile, args),
        Commands::PrintSettings(args) => (RadioCommand::PrintSettings, args),
        Commands::LoadMemory(args) => (RadioCommand::LoadMemory, args),
        Commands::LoadProfileAndMemory(args) => (RadioCommand::LoadProfileAndMemory, args),
        Commands::ListModels => return list_models(&config.registry()?),
        Commands::ExportCsv { input, output } => return export::export_csv(&input, &output),
        Commands::AssignDcs { input, output } => {
            return dcs_assign::assign_dcs(&input, &output)
        }
    };

    if command.needs_profile() && args.profile.is_none() {
        usage_error(format!("--profile is required for {}", command.name()));
    }
    if command.needs_memory() && args.memory.is_empty() {
        usage_error(format!("--memory is required for {}", command.name()));
    }
    let Some(model_id) = args.radio_model.or_else(|| config.default_model.clone()) else {
        usage_error("--radio-model is required (or set default_model in the config file)");
    };
    let port = args.port.unwrap_or_else(|| config.default_port.clone());

    let registry = config.registry()?;
    let model = registry.resolve(&model_id).map_err(SessionError::from)?;

    let profile = match (&args.profile, command.needs_profile()) {
        (Some(path), true) => Some(input::load_profile(path, model)?),
        _ => None,
    };
    let memories = if command.needs_memory() {
        Some(input::load_memories(&args.memory, model, verbose)?)
    } else {
        None
    };

    let plan = match command {
        RadioCommand::PrintSettings => SessionPlan::inspect(),
        _ => SessionPlan::reconfigure(profile, memories),
    }
    .verbose(verbose);

    info!("{} on {} ({})", command.name(), port, model.display_name());
    let report = backend::execute(&registry, &model_id, &port, plan)?;

    if command == RadioCommand::PrintSettings {
        print_settings(&report).context("Failed to write settings")?;
    } else {
        summarize(&report);
    }
    Ok(())
}

fn usage_error(message: impl std::fmt::Display) -> ! {
    Cli::command()
        .error(ErrorKind::MissingRequiredArgument, message)
        .exit()
}

/// One `name: value` line per setting, in tree order
fn print_settings(report: &SessionReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for setting in report.settings.leaves() {
        writeln!(out, "{}: {}", setting.name, setting.value)?;
    }
    out.flush()
}

fn summarize(report: &SessionReport) {
    if !report.applied.is_empty() {
        info!("Applied {} settings", report.applied.len());
    }
    if report.programmed > 0 {
        info!("Programmed {} memories", report.programmed);
    }
    info!("Radio on {} updated", report.port);
}

fn list_models(registry: &ModelRegistry) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for model in registry.iter() {
        let levels: Vec<String> = model.power_levels().iter().map(|p| p.to_string()).collect();
        writeln!(
            out,
            "{:<8} {:<16} memories {:<7} reset {:>4.1}s  {} baud  power {}",
            model.id(),
            model.display_name(),
            model.memory_range().to_string(),
            model.reset_delay().as_secs_f64(),
            model.link().baud_rate,
            levels.join(", ")
        )?;
    }
    Ok(())
}

/// Find the failure kind anywhere in the error chain
fn failure_kind(err: &anyhow::Error) -> Option<FailureKind> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<SessionError>() {
            Some(e.kind())
        } else {
            cause
                .downcast_ref::<ConfigError>()
                .map(|e| SessionError::from(e.clone()).kind())
        }
    })
}

fn report_failure(err: &anyhow::Error) -> ExitCode {
    match failure_kind(err) {
        Some(kind) => {
            eprintln!("Error ({}): {:#}", kind.name(), err);
            ExitCode::from(exit_status(kind))
        }
        None => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// 2 for bad input, 3 for device and transport failures
fn exit_status(kind: FailureKind) -> u8 {
    if kind.is_input_error() {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn radio_flags_parse() {
        let cli = Cli::try_parse_from([
            "radijator",
            "load-profile-and-memory",
            "-p",
            "sim:/tmp/uv5r.json",
            "-R",
            "uv5r",
            "-P",
            "profile.json",
            "-M",
            "a.json",
            "-M",
            "b.json",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::LoadProfileAndMemory(args) => {
                assert_eq!(args.port.as_deref(), Some("sim:/tmp/uv5r.json"));
                assert_eq!(args.radio_model.as_deref(), Some("uv5r"));
                assert_eq!(args.profile, Some(PathBuf::from("profile.json")));
                assert_eq!(
                    args.memory,
                    vec![PathBuf::from("a.json"), PathBuf::from("b.json")]
                );
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn command_requirements() {
        assert!(RadioCommand::LoadProfile.needs_profile());
        assert!(!RadioCommand::LoadProfile.needs_memory());
        assert!(RadioCommand::LoadProfileAndMemory.needs_memory());
        assert!(!RadioCommand::PrintSettings.needs_profile());
        assert!(!RadioCommand::PrintSettings.needs_memory());
    }

    #[test]
    fn failure_kinds_map_to_exit_codes() {
        let input: anyhow::Error = SessionError::from(ConfigError::UnknownModel {
            model: "zz99".into(),
            known: vec!["uv5r".into()],
        })
        .into();
        assert_eq!(failure_kind(&input), Some(FailureKind::UnknownModel));
        assert_eq!(exit_status(FailureKind::UnknownModel), 2);

        let wrapped = anyhow::Error::new(ConfigError::InvalidRecord("missing name".into()))
            .context("Invalid memory file a.json");
        assert_eq!(failure_kind(&wrapped), Some(FailureKind::InvalidInput));

        let device: anyhow::Error = SessionError::SyncRead("timeout".into()).into();
        assert_eq!(exit_status(failure_kind(&device).unwrap()), 3);

        assert_eq!(failure_kind(&anyhow::anyhow!("disk full")), None);
    }
}

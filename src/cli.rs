//! The command line interface for the program.
use crate::analysis::Analysis;
use crate::log;
use crate::output::{create_output_directory, get_output_dir, write_results};
use crate::scene::{SceneContext, get_scene_file_path};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod scene;
use scene::SceneSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Evaluate the storage technology described by an analysis file.
    Run {
        /// Path to the analysis file.
        analysis_file: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate an analysis file.
    Validate {
        /// Path to the analysis file.
        analysis_file: PathBuf,
    },
    /// Manage the saved scene.
    Scene {
        /// The available subcommands for managing the scene.
        #[command(subcommand)]
        subcommand: SceneSubcommands,
    },
    /// Manage program settings.
    Settings {
        /// The available subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run {
                analysis_file,
                opts,
            } => handle_run_command(&analysis_file, &opts, None),
            Self::Validate { analysis_file } => handle_validate_command(&analysis_file, None),
            Self::Scene { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load the saved scene, which the analysis file may then override
fn load_scene() -> Result<SceneContext> {
    SceneContext::load(&get_scene_file_path()?).context("Failed to load saved scene.")
}

/// Handle the `run` command.
pub fn handle_run_command(
    analysis_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(analysis_path)?;
        &pathbuf
    };

    let overwrite = create_output_directory(output_path, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(settings.log_level.as_deref(), Some(output_path))
        .context("Failed to initialise logging.")?;

    let analysis = Analysis::from_path(analysis_path).context("Failed to load analysis.")?;
    info!("Loaded analysis from {}", analysis_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let mut context = load_scene()?;
    let rows = analysis.run(&mut context)?;
    let results_path = write_results(output_path, &rows)?;
    info!("Results written to {}", results_path.display());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(analysis_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(settings.log_level.as_deref(), None).context("Failed to initialise logging.")?;

    // Load the analysis and build its technology
    let analysis = Analysis::from_path(analysis_path).context("Failed to load analysis.")?;
    let mut context = load_scene()?;
    analysis.apply_scene(&mut context)?;
    let reference = analysis.reference_data()?;
    let technology = analysis
        .build(&context, &reference)
        .context("Failed to validate analysis.")?;
    info!("Analysis validation successful: {}", technology.description());

    Ok(())
}

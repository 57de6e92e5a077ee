//! Code related to CLI interface for managing the saved scene
use crate::currency::Currency;
use crate::scene::{SceneContext, UnitPreferences, get_scene_file_path};
use anyhow::{Result, ensure};
use clap::Subcommand;
use std::path::Path;

/// Subcommands for the scene
#[derive(Subcommand)]
pub enum SceneSubcommands {
    /// Set the country and/or year to analyse
    Set {
        /// The country being analysed
        #[arg(long)]
        country: Option<String>,
        /// The year being analysed
        #[arg(long)]
        year: Option<u32>,
        /// The currency in which to report costs (USD, GBP or EUR)
        #[arg(long)]
        currency: Option<Currency>,
    },
    /// Show the saved scene
    Show,
    /// Get the path to where the scene is saved
    Path,
}

impl SceneSubcommands {
    /// Execute the supplied scene subcommand
    pub fn execute(self) -> Result<()> {
        let file_path = get_scene_file_path()?;
        match self {
            Self::Set {
                country,
                year,
                currency,
            } => handle_set_command(&file_path, country.as_deref(), year, currency)?,
            Self::Show => handle_show_command(&file_path)?,
            Self::Path => println!("{}", file_path.display()),
        }

        Ok(())
    }
}

/// Handle the `set` command
fn handle_set_command(
    file_path: &Path,
    country: Option<&str>,
    year: Option<u32>,
    currency: Option<Currency>,
) -> Result<()> {
    ensure!(
        country.is_some() || year.is_some() || currency.is_some(),
        "At least one of --country, --year and --currency must be given"
    );

    let mut context = SceneContext::load(file_path)?;
    context.set_scene(country, year);
    if let Some(currency) = currency {
        context.select_units(UnitPreferences {
            currency,
            ..context.unit_preferences()
        })?;
    }
    context.save(file_path)?;
    println!("Scene saved to {}", file_path.display());

    Ok(())
}

/// Handle the `show` command
fn handle_show_command(file_path: &Path) -> Result<()> {
    let context = SceneContext::load(file_path)?;
    match context.current_scene() {
        Ok(scene) => println!("Country: {}\nYear: {}", scene.country, scene.year),
        Err(err) => println!("{err}"),
    }

    let units = context.unit_preferences();
    println!(
        "Units: currency {}, time {}, power {}, energy {}, efficiency {}",
        units.currency, units.time, units.power, units.energy, units.efficiency
    );

    Ok(())
}

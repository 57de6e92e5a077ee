//! The scene in which an analysis is carried out: a country and a year, along with the units
//! results are reported in.
//!
//! A [`SceneContext`] is passed explicitly to anything which depends on it (e.g. the cost index
//! year of data-driven technologies). It can be persisted as a TOML file so that the scene
//! survives between runs of the program.
use crate::currency::Currency;
use crate::error::StorageError;
use crate::get_lcos_config_dir;
use crate::input::read_toml;
use crate::quantity::{Dimension, Unit};
use anyhow::{Context, Result, bail, ensure};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

const SCENE_FILE_NAME: &str = "scene.toml";

/// Get the path to where the scene is saved between runs
pub fn get_scene_file_path() -> Result<PathBuf> {
    let mut path = get_lcos_config_dir()?;
    path.push(SCENE_FILE_NAME);

    Ok(path)
}

/// A country and year
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    /// The country being analysed
    pub country: String,
    /// The year being analysed
    pub year: u32,
}

/// The units in which results are reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitPreferences {
    /// Currency for costs and prices
    pub currency: Currency,
    /// Unit for durations
    pub time: Unit,
    /// Unit for powers
    pub power: Unit,
    /// Unit for energies
    pub energy: Unit,
    /// Unit for efficiencies
    pub efficiency: Unit,
}

impl Default for UnitPreferences {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            time: Unit::Hour,
            power: Unit::Megawatt,
            energy: Unit::MegawattHour,
            efficiency: Unit::Fraction,
        }
    }
}

impl UnitPreferences {
    /// Check that each unit has the dimension of the quantity it is used for
    fn validate(&self) -> Result<()> {
        for (unit, expected) in [
            (self.time, Dimension::Time),
            (self.power, Dimension::Power),
            (self.energy, Dimension::Energy),
            (self.efficiency, Dimension::Dimensionless),
        ] {
            ensure!(
                unit.dimension() == expected,
                StorageError::IncompatibleUnit {
                    unit: unit.to_string(),
                    expected,
                }
            );
        }

        Ok(())
    }
}

/// The current scene and unit preferences.
///
/// Country and year start out unset. The first value given for each is simply stored; changing
/// it afterwards is allowed but logged as a warning, as results computed for the old scene are
/// now stale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<u32>,
    units: UnitPreferences,
}

/// Store `new` in `slot`, warning if it replaces a different value
fn update_slot<T: PartialEq + Display>(slot: &mut Option<T>, new: T, name: &str) {
    match slot {
        Some(old) if *old != new => warn!("Changing scene {name} from {old} to {new}"),
        Some(_) => {}
        None => info!("Scene {name} set to {new}"),
    }
    *slot = Some(new);
}

impl SceneContext {
    /// Create a context with country and year already set
    pub fn new(country: &str, year: u32) -> Self {
        let mut context = Self::default();
        context.set_scene(Some(country), Some(year));

        context
    }

    /// Set the country and/or year. Values which are `None` are left unchanged.
    pub fn set_scene(&mut self, country: Option<&str>, year: Option<u32>) {
        if let Some(country) = country {
            update_slot(&mut self.country, country.to_string(), "country");
        }
        if let Some(year) = year {
            update_slot(&mut self.year, year, "year");
        }
    }

    /// The current scene, if both country and year have been set
    pub fn current_scene(&self) -> Result<Scene> {
        let (Some(country), Some(year)) = (&self.country, self.year) else {
            bail!(StorageError::SceneNotSet)
        };

        Ok(Scene {
            country: country.clone(),
            year,
        })
    }

    /// Choose the units results are reported in
    pub fn select_units(&mut self, units: UnitPreferences) -> Result<()> {
        units.validate()?;
        self.units = units;

        Ok(())
    }

    /// The units results are reported in
    pub fn unit_preferences(&self) -> UnitPreferences {
        self.units
    }

    /// Read a context from a TOML file, or use the default if the file doesn't exist
    pub fn load(file_path: &Path) -> Result<Self> {
        if !file_path.is_file() {
            return Ok(Self::default());
        }

        let context: Self = read_toml(file_path)?;
        context.units.validate()?;

        Ok(context)
    }

    /// Write the context to a TOML file, creating the parent directory if needed
    pub fn save(&self, file_path: &Path) -> Result<()> {
        if let Some(dir_path) = file_path.parent() {
            fs::create_dir_all(dir_path)
                .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
        }

        let contents = toml::to_string(self)?;
        fs::write(file_path, contents)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use tempfile::tempdir;

    #[test]
    fn test_scene_not_set() {
        let mut context = SceneContext::default();
        assert_error!(
            context.current_scene(),
            "Country and year must be set to perform a techno-economic analysis"
        );

        // Only one of the two
        context.set_scene(Some("UK"), None);
        assert!(context.current_scene().is_err());
    }

    #[test]
    fn test_set_scene() {
        let mut context = SceneContext::default();
        context.set_scene(Some("UK"), Some(2024));
        assert_eq!(
            context.current_scene().unwrap(),
            Scene {
                country: "UK".into(),
                year: 2024
            }
        );

        // Subsequent changes are allowed
        context.set_scene(None, Some(2000));
        assert_eq!(context.current_scene().unwrap().year, 2000);
        assert_eq!(context.current_scene().unwrap().country, "UK");
    }

    #[test]
    fn test_select_units() {
        let mut context = SceneContext::new("UK", 2024);
        let units = UnitPreferences {
            currency: Currency::GBP,
            time: Unit::Day,
            power: Unit::Kilowatt,
            energy: Unit::GigawattHour,
            efficiency: Unit::Percent,
        };
        context.select_units(units).unwrap();
        assert_eq!(context.unit_preferences(), units);
    }

    #[test]
    fn test_select_units_invalid() {
        let mut context = SceneContext::default();
        let units = UnitPreferences {
            power: Unit::MegawattHour,
            ..UnitPreferences::default()
        };
        assert_error!(
            context.select_units(units),
            "Unit MWh is not compatible with dimension power"
        );
        assert_eq!(context.unit_preferences(), UnitPreferences::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config").join("scene.toml");

        // No file yet
        assert_eq!(
            SceneContext::load(&file_path).unwrap(),
            SceneContext::default()
        );

        let mut context = SceneContext::new("France", 2024);
        context
            .select_units(UnitPreferences {
                currency: Currency::EUR,
                efficiency: Unit::Percent,
                ..UnitPreferences::default()
            })
            .unwrap();
        context.save(&file_path).unwrap();
        assert_eq!(SceneContext::load(&file_path).unwrap(), context);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scene.toml");
        fs::write(&file_path, "year = 2020\n\n[units]\ncurrency = \"GBP\"\n").unwrap();

        let context = SceneContext::load(&file_path).unwrap();
        assert!(context.current_scene().is_err());
        assert_eq!(context.unit_preferences().currency, Currency::GBP);
        assert_eq!(context.unit_preferences().time, Unit::Hour);
    }
}

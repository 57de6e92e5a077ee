//! Analysis files describe a storage technology along with the scene in which to evaluate it.
//!
//! An analysis file is a TOML file of the form:
//!
//! ```toml
//! reference_dir = "reference"  # optional; the built-in reference data is used otherwise
//!
//! [scene]
//! country = "UK"
//! year = 2024
//!
//! [units]
//! currency = "GBP"
//!
//! [technology]
//! kind = "data_driven"
//! archetype = "conventional_caes"
//! discharge_duration = "12 hour"
//! discharging_power = "100 MW"
//! ```
//!
//! The `[technology]` table takes any of the fields of [`TechnologyInputs`]. Energy prices which
//! are not given are taken from the reference data for the scene, if available.
use crate::costs::CostModel;
use crate::input::read_toml;
use crate::output::ResultRow;
use crate::quantity::{Quantity, Unit};
use crate::reference::{CONVENTIONAL_CAES_ID, ReferenceData};
use crate::scene::{SceneContext, UnitPreferences};
use crate::technology::data_driven::DataDrivenStorageTechnology;
use crate::technology::generic::GenericStorageTechnology;
use crate::technology::{StorageTechnology, TechnologyInputs};
use crate::units::UnitType;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use strum::Display;

/// The kind of storage technology to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TechnologyKind {
    /// All parameters supplied by the user
    Generic,
    /// Performance and costs taken from an archetype's reference data
    DataDriven,
}

/// The `[technology]` table of an analysis file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TechnologySection {
    /// The kind of technology
    pub kind: TechnologyKind,
    /// The archetype of a data-driven technology (defaults to the PNNL diabatic CAES)
    #[serde(default)]
    pub archetype: Option<String>,
    /// The technology's inputs
    #[serde(flatten)]
    pub inputs: TechnologyInputs,
    /// Keys matching none of the above
    #[serde(flatten)]
    unknown: toml::Table,
}

impl TechnologySection {
    /// Check that every key in the table is a known field
    fn check_known_fields(&self) -> Result<()> {
        ensure!(
            self.unknown.is_empty(),
            "Unknown field(s) in [technology] table: {}",
            self.unknown.keys().join(", ")
        );

        Ok(())
    }
}

/// The `[scene]` table of an analysis file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneSection {
    /// The country being analysed
    #[serde(default)]
    pub country: Option<String>,
    /// The year being analysed
    #[serde(default)]
    pub year: Option<u32>,
}

/// The contents of an analysis file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Analysis {
    /// Overrides for the scene
    #[serde(default)]
    pub scene: SceneSection,
    /// Units in which to report results
    #[serde(default)]
    pub units: Option<UnitPreferences>,
    /// Directory of reference data, relative to the analysis file
    #[serde(default)]
    pub reference_dir: Option<PathBuf>,
    /// The technology to evaluate
    pub technology: TechnologySection,
}

/// A technology built from an analysis file
#[derive(Debug, Clone)]
pub enum Technology {
    /// A generic technology
    Generic(GenericStorageTechnology),
    /// A data-driven technology
    DataDriven(DataDrivenStorageTechnology),
}

impl Technology {
    /// A short description of the technology for log messages
    pub fn description(&self) -> String {
        match self {
            Self::Generic(_) => "generic storage technology".to_string(),
            Self::DataDriven(technology) => format!(
                "{} technology based on {} data",
                technology.technology_type().unwrap_or("storage"),
                technology.model().unwrap_or("reference")
            ),
        }
    }

    /// The technology's results, with quantities expressed in the preferred units
    pub fn results(&self, units: &UnitPreferences) -> Result<Vec<ResultRow>> {
        match self {
            Self::Generic(technology) => collect_results(technology, units),
            Self::DataDriven(technology) => collect_results(technology, units),
        }
    }
}

/// A result row for a quantity held in `unit`, converted to `preferred`.
///
/// Undefined values give no row.
fn scalar_row(
    metric: &'static str,
    value: Option<f64>,
    unit: Unit,
    preferred: Unit,
) -> Result<Option<ResultRow>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let quantity = Quantity::new(value, unit).to(preferred)?;
    Ok(Some(ResultRow {
        metric,
        case: None,
        value: quantity.magnitude(),
        unit: preferred.to_string(),
    }))
}

/// One result row per cost case
fn cost_rows<M: CostModel, T: UnitType>(
    metric: &'static str,
    value: Option<M::Value<T>>,
    unit: &str,
) -> Vec<ResultRow> {
    let Some(value) = value else {
        warn!("The {metric} is undefined, as not all the inputs it depends on are known");
        return Vec::new();
    };

    M::cases(value)
        .into_iter()
        .map(|(case, value)| ResultRow {
            metric,
            case: Some(case),
            value: value.value(),
            unit: unit.to_string(),
        })
        .collect()
}

fn collect_results<T: StorageTechnology>(
    technology: &T,
    units: &UnitPreferences,
) -> Result<Vec<ResultRow>> {
    let params = technology.parameters();
    let currency = params.currency;

    let scalars = [
        scalar_row(
            "discharge_duration",
            params.discharge_duration.map(|t| t.0),
            Unit::Hour,
            units.time,
        )?,
        scalar_row(
            "charge_duration",
            params.charge_duration.map(|t| t.0),
            Unit::Hour,
            units.time,
        )?,
        scalar_row(
            "discharging_power",
            params.discharging_power.map(|p| p.0),
            Unit::Megawatt,
            units.power,
        )?,
        scalar_row(
            "charging_power",
            params.charging_power.map(|p| p.0),
            Unit::Megawatt,
            units.power,
        )?,
        scalar_row(
            "storage_capacity",
            technology.storage_capacity().map(|e| e.0),
            Unit::MegawattHour,
            units.energy,
        )?,
        scalar_row(
            "roundtrip_efficiency",
            params.roundtrip_efficiency.map(|e| e.0),
            Unit::Fraction,
            units.efficiency,
        )?,
        scalar_row(
            "effective_roundtrip_efficiency",
            technology.effective_roundtrip_efficiency().map(|e| e.0),
            Unit::Fraction,
            units.efficiency,
        )?,
        scalar_row(
            "input_electricity",
            technology.input_electricity().map(|e| e.0),
            Unit::MegawattHour,
            units.energy,
        )?,
        scalar_row(
            "output_electricity",
            technology.output_electricity().map(|e| e.0),
            Unit::MegawattHour,
            units.energy,
        )?,
    ];
    let mut rows: Vec<ResultRow> = scalars.into_iter().flatten().collect();

    if let Some(frequency) = technology.frequency() {
        rows.push(ResultRow {
            metric: "frequency",
            case: None,
            value: frequency,
            unit: "1/year".into(),
        });
    }
    rows.extend(cost_rows::<T::Costs, _>(
        "investment_cost",
        technology.investment_cost(),
        &currency.to_string(),
    ));
    rows.extend(cost_rows::<T::Costs, _>(
        "levelised_cost_of_storage",
        technology.levelised_cost_of_storage(),
        &Unit::PerMegawattHour(currency).to_string(),
    ));

    Ok(rows)
}

impl Analysis {
    /// Read an analysis file.
    ///
    /// A relative reference data directory is resolved against the file's directory.
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let mut analysis: Analysis = read_toml(file_path)?;
        if let Some(dir) = &analysis.reference_dir
            && dir.is_relative()
            && let Some(parent) = file_path.parent()
        {
            analysis.reference_dir = Some(parent.join(dir));
        }

        Ok(analysis)
    }

    /// Apply the scene and unit preferences given in the file to `context`
    pub fn apply_scene(&self, context: &mut SceneContext) -> Result<()> {
        context.set_scene(self.scene.country.as_deref(), self.scene.year);
        if let Some(units) = self.units {
            context.select_units(units)?;
        }

        Ok(())
    }

    /// Load the reference data used by the analysis
    pub fn reference_data(&self) -> Result<ReferenceData> {
        match &self.reference_dir {
            Some(dir) => ReferenceData::from_path(dir).with_context(|| {
                format!("Failed to load reference data from {}", dir.display())
            }),
            None => ReferenceData::builtin(),
        }
    }

    /// Build the technology described by the file.
    ///
    /// Unless the file says otherwise, costs are reported in the preferred currency of `context`
    /// and energy prices are taken from the reference data for the current scene.
    pub fn build(&self, context: &SceneContext, reference: &ReferenceData) -> Result<Technology> {
        let section = &self.technology;
        section.check_known_fields()?;
        let mut inputs = section.inputs.clone();
        inputs.currency = inputs
            .currency
            .or(Some(context.unit_preferences().currency));
        add_reference_prices(&mut inputs, context, reference);

        let technology = match section.kind {
            TechnologyKind::Generic => {
                ensure!(
                    section.archetype.is_none(),
                    "An archetype can only be given for data-driven technologies"
                );
                Technology::Generic(GenericStorageTechnology::with_inputs_and_rates(
                    &inputs,
                    reference.currency_rates,
                )?)
            }
            TechnologyKind::DataDriven => {
                let archetype_id = section.archetype.as_deref().unwrap_or(CONVENTIONAL_CAES_ID);
                Technology::DataDriven(DataDrivenStorageTechnology::with_inputs(
                    context,
                    reference,
                    archetype_id,
                    &inputs,
                )?)
            }
        };

        Ok(technology)
    }

    /// Build the technology and compute its results
    pub fn run(&self, context: &mut SceneContext) -> Result<Vec<ResultRow>> {
        self.apply_scene(context)?;
        let reference = self.reference_data()?;
        let technology = self.build(context, &reference)?;
        info!("Built {}", technology.description());

        let rows = technology.results(&context.unit_preferences())?;
        for row in &rows {
            info!("{row}");
        }

        Ok(rows)
    }
}

/// Fill in energy prices which are not given from the reference data for the current scene
fn add_reference_prices(
    inputs: &mut TechnologyInputs,
    context: &SceneContext,
    reference: &ReferenceData,
) {
    let Ok(scene) = context.current_scene() else {
        return;
    };
    let Some(prices) = reference.energy_prices(&scene.country, scene.year) else {
        return;
    };

    for (name, field, price) in [
        ("electricity", &mut inputs.electricity_price, prices.electricity),
        ("gas", &mut inputs.gas_price, prices.gas),
        ("hydrogen", &mut inputs.hydrogen_price, prices.hydrogen),
    ] {
        if field.is_none()
            && let Some(price) = price
        {
            info!(
                "Using {} {name} price of {price} for {}",
                scene.year, scene.country
            );
            *field = Some(price);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Currency;
    use crate::fixture::{assert_error, reference, uk_2023};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    fn parse(contents: &str) -> Analysis {
        toml::from_str(contents).unwrap()
    }

    #[test]
    fn test_parse_generic() {
        let analysis = parse(
            r#"
            [technology]
            kind = "generic"
            discharge_duration = "4 hour"
            discharging_power = "100 MW"
            roundtrip_efficiency = 0.8
            lifetime = 10
            cycles_per_year = 100
            "#,
        );
        assert_eq!(analysis.scene, SceneSection::default());
        assert_eq!(analysis.technology.kind, TechnologyKind::Generic);
        let inputs = &analysis.technology.inputs;
        assert_eq!(inputs.discharge_duration, Some(Quantity::new(4.0, Unit::Hour)));
        assert_eq!(inputs.roundtrip_efficiency, Some(Quantity::dimensionless(0.8)));
        assert_eq!(inputs.lifetime, Some(10));
        assert_eq!(inputs.cycles_per_year, Some(100.0));
    }

    #[rstest]
    fn test_unknown_technology_field(uk_2023: SceneContext, reference: ReferenceData) {
        let analysis = parse(
            r#"
            [technology]
            kind = "generic"
            dischage_duration = "4 hour"
            discharging_power = "100 MW"
            "#,
        );
        assert_eq!(
            analysis.technology.inputs.discharging_power,
            Some(Quantity::new(100.0, Unit::Megawatt))
        );
        assert_error!(
            analysis.build(&uk_2023, &reference),
            "Unknown field(s) in [technology] table: dischage_duration"
        );
    }

    #[test]
    fn test_from_path_resolves_reference_dir() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("analysis.toml");
        fs::write(
            &file_path,
            "reference_dir = \"reference\"\n[technology]\nkind = \"data_driven\"\n",
        )
        .unwrap();

        let analysis = Analysis::from_path(&file_path).unwrap();
        assert_eq!(analysis.reference_dir, Some(dir.path().join("reference")));
    }

    #[rstest]
    fn test_reference_prices_are_used(reference: ReferenceData) {
        let analysis = parse(
            r#"
            [scene]
            country = "UK"
            year = 2024

            [units]
            currency = "GBP"

            [technology]
            kind = "data_driven"
            discharge_duration = "12 hour"
            discharging_power = "100 MW"
            charging_power = "100 MW"
            discount_rate = "3.5 %"
            lifetime = 60
            cycles_per_year = 100
            "#,
        );
        let mut context = SceneContext::default();
        analysis.apply_scene(&mut context).unwrap();
        let Technology::DataDriven(technology) = analysis.build(&context, &reference).unwrap()
        else {
            panic!("Expected a data-driven technology")
        };

        let params = technology.parameters();
        assert_eq!(params.currency, Currency::GBP);
        assert_approx_eq!(f64, params.electricity_price.unwrap().0, 79.68);
        assert_approx_eq!(f64, params.gas_price.unwrap().0, 31.27);
    }

    #[rstest]
    fn test_given_prices_take_precedence(uk_2023: SceneContext, reference: ReferenceData) {
        let mut context = uk_2023;
        context.set_scene(None, Some(2024));
        let analysis = parse(
            r#"
            [technology]
            kind = "generic"
            electricity_price = "10 USD/MWh"
            "#,
        );
        let Technology::Generic(technology) = analysis.build(&context, &reference).unwrap()
        else {
            panic!("Expected a generic technology")
        };

        let params = technology.parameters();
        assert_eq!(params.currency, Currency::USD);
        assert_approx_eq!(f64, params.electricity_price.unwrap().0, 10.0);
        // GBP 31.27 converted to dollars
        assert_approx_eq!(
            f64,
            params.gas_price.unwrap().0,
            31.27 / 0.79,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_archetype_for_generic(uk_2023: SceneContext, reference: ReferenceData) {
        let analysis = parse(
            r#"
            [technology]
            kind = "generic"
            archetype = "conventional_caes"
            "#,
        );
        assert_error!(
            analysis.build(&uk_2023, &reference),
            "An archetype can only be given for data-driven technologies"
        );
    }

    #[test]
    fn test_run() {
        let analysis = parse(
            r#"
            [scene]
            country = "UK"
            year = 2023

            [units]
            energy = "GWh"
            efficiency = "%"

            [technology]
            kind = "data_driven"
            discharge_duration = "4 hour"
            discharging_power = "100 MW"
            charging_power = "100 MW"
            electricity_price = "50 USD/MWh"
            gas_price = "20 USD/MWh"
            discount_rate = 0.05
            lifetime = 30
            cycles_per_year = 100
            "#,
        );
        let rows = analysis.run(&mut SceneContext::default()).unwrap();

        let capacity = rows
            .iter()
            .find(|row| row.metric == "storage_capacity")
            .unwrap();
        assert_approx_eq!(f64, capacity.value, 0.4);
        assert_eq!(capacity.unit, "GWh");

        let efficiency = rows
            .iter()
            .find(|row| row.metric == "roundtrip_efficiency")
            .unwrap();
        assert_approx_eq!(f64, efficiency.value, 74.6, epsilon = 1e-9);

        let lcos = rows
            .iter()
            .filter(|row| row.metric == "levelised_cost_of_storage")
            .collect_vec();
        assert_eq!(
            lcos.iter().map(|row| row.case.unwrap()).collect_vec(),
            ["low", "base", "high"]
        );
        assert!(lcos.iter().tuple_windows().all(|(a, b)| a.value <= b.value));
        assert!(lcos.iter().all(|row| row.unit == "USD/MWh"));
    }

    #[test]
    fn test_run_without_scene() {
        let analysis = parse("[technology]\nkind = \"data_driven\"\n");
        assert!(analysis.run(&mut SceneContext::default()).is_err());
    }
}

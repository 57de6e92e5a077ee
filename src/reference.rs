//! Reference data: cost indices, exchange rates, energy prices and the performance and cost
//! tables of storage archetypes.
//!
//! Reference data is read-only once loaded. Archetypes and the cost index are shared between
//! technologies with [`Rc`].
use crate::costs::CostRange;
use crate::currency::{Currency, CurrencyRates};
use crate::error::StorageError;
use crate::id::{HasID, define_id_getter, define_id_type};
use crate::input::{read_csv, read_csv_optional, read_toml};
use crate::interpolation::{ScatteredInterpolant, Triangulation};
use crate::quantity::{Quantity, Unit};
use crate::technology::{EnergyPrices, SecondarySource};
use crate::units::{Dimensionless, Hours, MegaWatts, MoneyPerKilowatt, MoneyPerKilowattHour};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

const COST_INDEX_FILE_NAME: &str = "cost_index.csv";
const CURRENCY_RATES_FILE_NAME: &str = "currency_rates.toml";
const ARCHETYPES_FILE_NAME: &str = "archetypes.toml";
const ENERGY_PRICES_FILE_NAME: &str = "energy_prices.csv";

/// The ID of the diabatic CAES archetype based on PNNL cost data
pub const CONVENTIONAL_CAES_ID: &str = "conventional_caes";

/// Chemical Engineering Plant Cost Index (CEPCI), annual averages
const CEPCI: [(u32, f64); 25] = [
    (2000, 394.1),
    (2001, 394.3),
    (2002, 395.6),
    (2003, 402.0),
    (2004, 444.2),
    (2005, 468.2),
    (2006, 499.6),
    (2007, 525.4),
    (2008, 575.4),
    (2009, 521.9),
    (2010, 550.8),
    (2011, 585.7),
    (2012, 584.6),
    (2013, 567.3),
    (2014, 576.1),
    (2015, 556.8),
    (2016, 541.7),
    (2017, 567.5),
    (2018, 603.1),
    (2019, 607.5),
    (2020, 596.2),
    (2021, 708.0),
    (2022, 816.0),
    (2023, 797.9),
    (2024, 799.9),
];

/// PNNL costs of diabatic CAES in a salt cavern (2023 USD).
///
/// Columns: duration (h), power (MW), power island cost (low, base, high; USD/kW) and store cost
/// (low, base, high; USD/kWh).
#[rustfmt::skip]
const PNNL_CAES_COSTS: [(f64, f64, [f64; 3], [f64; 3]); 12] = [
    (1.0, 100.0, [945.25, 1050.28, 1155.3], [2.76, 11.2, 16.59]),
    (4.0, 100.0, [945.25, 1050.28, 1155.3], [2.76, 9.99, 16.59]),
    (10.0, 100.0, [944.04, 1048.93, 1153.83], [2.68, 7.64, 16.54]),
    (24.0, 100.0, [943.57, 1048.41, 1153.25], [2.6, 6.63, 16.5]),
    (100.0, 100.0, [943.32, 1048.13, 1152.94], [2.47, 5.89, 16.44]),
    (8000.0, 100.0, [943.32, 1048.13, 1152.94], [2.47, 5.89, 16.44]),
    (1.0, 1000.0, [871.03, 967.81, 1064.59], [2.55, 6.5, 16.48]),
    (4.0, 1000.0, [871.03, 967.81, 1064.59], [2.55, 6.28, 16.48]),
    (10.0, 1000.0, [869.82, 966.47, 1063.11], [2.47, 5.89, 16.44]),
    (24.0, 1000.0, [869.35, 965.94, 1062.54], [2.39, 5.64, 16.4]),
    (100.0, 1000.0, [869.09, 965.66, 1062.23], [2.26, 5.32, 16.33]),
    (8000.0, 1000.0, [869.09, 965.66, 1062.23], [2.26, 5.32, 16.33]),
];

/// PNNL round-trip efficiency of diabatic CAES (electricity out / electricity in)
const PNNL_CAES_EFFICIENCY: f64 = 0.746;

/// PNNL exergy efficiency of diabatic CAES (electricity out / (electricity in + gas exergy))
const PNNL_CAES_EXERGY_EFFICIENCY: f64 = 0.52;

/// PNNL Carnot efficiency of the gas turbine (work / heat)
const PNNL_CAES_CARNOT_EFFICIENCY: f64 = 0.49;

/// UK energy prices in 2024 (GBP/MWh): (electricity, gas)
const UK_2024_PRICES: (f64, f64) = (79.68, 31.27);

/// A series of cost index values by year
#[derive(Debug, Clone, PartialEq)]
pub struct CostIndex(BTreeMap<u32, f64>);

/// A row of the cost index CSV file
#[derive(Debug, Deserialize)]
struct CostIndexRow {
    year: u32,
    value: f64,
}

impl CostIndex {
    /// Create a cost index from `(year, value)` pairs
    pub fn new(values: impl IntoIterator<Item = (u32, f64)>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (year, value) in values {
            ensure!(
                value.is_finite() && value > 0.0,
                "Cost index for {year} must be positive (got {value})"
            );
            ensure!(
                map.insert(year, value).is_none(),
                "Cost index for {year} given more than once"
            );
        }

        Ok(Self(map))
    }

    /// Read a cost index from a CSV file with `year` and `value` columns
    pub fn from_csv(file_path: &Path) -> Result<Self> {
        let rows: Vec<CostIndexRow> = read_csv(file_path)?;
        Self::new(rows.into_iter().map(|row| (row.year, row.value)))
    }

    /// The index for `year`
    pub fn get(&self, year: u32) -> Result<f64> {
        Ok(*self
            .0
            .get(&year)
            .ok_or(StorageError::MissingIndexYear(year))?)
    }

    /// The factor converting costs from `base_year` to `year`
    pub fn ratio(&self, year: u32, base_year: u32) -> Result<f64> {
        Ok(self.get(year)? / self.get(base_year)?)
    }

    /// The years covered by the index
    pub fn years(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }
}

/// A sample of an archetype's performance and costs at a particular design
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArchetypeSample {
    /// Discharge duration (hours)
    pub duration: f64,
    /// Discharging power (MW)
    pub power: f64,
    /// Round-trip efficiency
    pub efficiency: f64,
    /// Secondary energy consumed per unit of electricity discharged
    pub consumption_ratio: f64,
    /// Optimistic power island cost (per kW)
    pub power_island_cost_low: f64,
    /// Central power island cost (per kW)
    pub power_island_cost_base: f64,
    /// Pessimistic power island cost (per kW)
    pub power_island_cost_high: f64,
    /// Optimistic store cost (per kWh)
    pub store_cost_low: f64,
    /// Central store cost (per kWh)
    pub store_cost_base: f64,
    /// Pessimistic store cost (per kWh)
    pub store_cost_high: f64,
}

define_id_type! {ArchetypeID}

/// Descriptive information about an archetype, as read from `archetypes.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArchetypeInfo {
    /// Unique identifier
    pub id: ArchetypeID,
    /// The kind of technology (e.g. `D-CAES`)
    pub technology_type: String,
    /// The source of the data (e.g. `PNNL`)
    pub model: String,
    /// Secondary energy vector consumed on discharge
    #[serde(default)]
    pub secondary_source: Option<SecondarySource>,
    /// The year in which the costs are expressed
    pub base_year: u32,
    /// The currency in which the costs are expressed
    pub currency: Currency,
    /// Name of the sample table file, relative to the reference data directory
    #[serde(default)]
    pub file: Option<String>,
}

/// Interpolants for each column of an archetype's sample table
#[derive(Debug, Clone, PartialEq)]
struct Interpolants {
    efficiency: ScatteredInterpolant,
    consumption_ratio: ScatteredInterpolant,
    power_island_cost: CostRange<ScatteredInterpolant>,
    store_cost: CostRange<ScatteredInterpolant>,
}

/// A storage archetype whose performance and costs are known at a set of designs
#[derive(Debug, Clone, PartialEq)]
pub struct Archetype {
    /// Unique identifier
    pub id: ArchetypeID,
    /// The kind of technology (e.g. `D-CAES`)
    pub technology_type: String,
    /// The source of the data (e.g. `PNNL`)
    pub model: String,
    /// Secondary energy vector consumed on discharge
    pub secondary_source: Option<SecondarySource>,
    /// The year in which the costs are expressed
    pub base_year: u32,
    /// The currency in which the costs are expressed
    pub currency: Currency,
    interpolants: Interpolants,
}
define_id_getter! {Archetype, ArchetypeID}

impl Archetype {
    /// Create an archetype from its description and sample table.
    ///
    /// All the columns are interpolated over one triangulation of the sample designs.
    pub fn new(info: ArchetypeInfo, samples: &[ArchetypeSample]) -> Result<Self> {
        let coordinates = samples
            .iter()
            .map(|sample| (sample.duration, sample.power))
            .collect_vec();
        let triangulation = Rc::new(
            Triangulation::new(&coordinates)
                .with_context(|| format!("Invalid sample table for archetype {}", info.id))?,
        );
        let interpolant = |column: fn(&ArchetypeSample) -> f64| {
            ScatteredInterpolant::from_triangulation(
                Rc::clone(&triangulation),
                samples.iter().map(column).collect(),
            )
        };

        let interpolants = Interpolants {
            efficiency: interpolant(|s| s.efficiency)?,
            consumption_ratio: interpolant(|s| s.consumption_ratio)?,
            power_island_cost: CostRange::new(
                interpolant(|s| s.power_island_cost_low)?,
                interpolant(|s| s.power_island_cost_base)?,
                interpolant(|s| s.power_island_cost_high)?,
            ),
            store_cost: CostRange::new(
                interpolant(|s| s.store_cost_low)?,
                interpolant(|s| s.store_cost_base)?,
                interpolant(|s| s.store_cost_high)?,
            ),
        };
        debug!(
            "Loaded archetype {} with {} samples",
            info.id,
            samples.len()
        );

        Ok(Self {
            id: info.id,
            technology_type: info.technology_type,
            model: info.model,
            secondary_source: info.secondary_source,
            base_year: info.base_year,
            currency: info.currency,
            interpolants,
        })
    }

    /// Round-trip efficiency at the given design
    pub fn efficiency_at(&self, duration: Hours, power: MegaWatts) -> Option<Dimensionless> {
        self.interpolants
            .efficiency
            .at(duration.0, power.0)
            .map(Dimensionless)
    }

    /// Secondary consumption ratio at the given design
    pub fn consumption_ratio_at(&self, duration: Hours, power: MegaWatts) -> Option<Dimensionless> {
        self.interpolants
            .consumption_ratio
            .at(duration.0, power.0)
            .map(Dimensionless)
    }

    /// Power island specific cost at the given design, in the archetype's base year and currency
    pub fn power_island_cost_at(
        &self,
        duration: Hours,
        power: MegaWatts,
    ) -> Option<CostRange<MoneyPerKilowatt>> {
        let costs = &self.interpolants.power_island_cost;
        let at = |interpolant: &ScatteredInterpolant| {
            interpolant.at(duration.0, power.0).map(MoneyPerKilowatt)
        };

        CostRange::from_options(at(&costs.low), at(&costs.base), at(&costs.high))
    }

    /// Store specific cost at the given design, in the archetype's base year and currency
    pub fn store_cost_at(
        &self,
        duration: Hours,
        power: MegaWatts,
    ) -> Option<CostRange<MoneyPerKilowattHour>> {
        let costs = &self.interpolants.store_cost;
        let at = |interpolant: &ScatteredInterpolant| {
            interpolant.at(duration.0, power.0).map(MoneyPerKilowattHour)
        };

        CostRange::from_options(at(&costs.low), at(&costs.base), at(&costs.high))
    }
}

/// The energy prices of a country in a year
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct EnergyPriceRow {
    country: String,
    year: u32,
    currency: Currency,
    electricity: Option<f64>,
    gas: Option<f64>,
    hydrogen: Option<f64>,
}

impl EnergyPriceRow {
    fn to_prices(&self) -> EnergyPrices {
        let price = |value: Option<f64>| {
            value.map(|value| Quantity::new(value, Unit::PerMegawattHour(self.currency)))
        };

        EnergyPrices {
            electricity: price(self.electricity),
            gas: price(self.gas),
            hydrogen: price(self.hydrogen),
        }
    }
}

/// The contents of `archetypes.toml`
#[derive(Debug, Deserialize)]
struct ArchetypesFile {
    archetypes: Vec<ArchetypeInfo>,
}

/// All the reference data used by data-driven technologies
#[derive(Debug, Clone)]
pub struct ReferenceData {
    /// Cost index used to adjust costs for inflation
    pub cost_index: Rc<CostIndex>,
    /// Exchange rates
    pub currency_rates: CurrencyRates,
    archetypes: IndexMap<ArchetypeID, Rc<Archetype>>,
    energy_prices: Vec<EnergyPriceRow>,
}

impl ReferenceData {
    /// The reference data built into the program: CEPCI for 2000 to 2024, the PNNL diabatic CAES
    /// archetype and UK energy prices for 2024
    pub fn builtin() -> Result<Self> {
        let gas_consumption_ratio = 1.0 / PNNL_CAES_CARNOT_EFFICIENCY
            * (1.0 / PNNL_CAES_EXERGY_EFFICIENCY - 1.0 / PNNL_CAES_EFFICIENCY);
        let samples = PNNL_CAES_COSTS
            .iter()
            .map(|&(duration, power, power_island, store)| ArchetypeSample {
                duration,
                power,
                efficiency: PNNL_CAES_EFFICIENCY,
                consumption_ratio: gas_consumption_ratio,
                power_island_cost_low: power_island[0],
                power_island_cost_base: power_island[1],
                power_island_cost_high: power_island[2],
                store_cost_low: store[0],
                store_cost_base: store[1],
                store_cost_high: store[2],
            })
            .collect_vec();
        let info = ArchetypeInfo {
            id: CONVENTIONAL_CAES_ID.into(),
            technology_type: "D-CAES".into(),
            model: "PNNL".into(),
            secondary_source: Some(SecondarySource::Gas),
            base_year: 2023,
            currency: Currency::USD,
            file: None,
        };
        let caes = Archetype::new(info, &samples)?;

        let (electricity, gas) = UK_2024_PRICES;
        let uk_prices = EnergyPriceRow {
            country: "UK".into(),
            year: 2024,
            currency: Currency::GBP,
            electricity: Some(electricity),
            gas: Some(gas),
            hydrogen: None,
        };

        Ok(Self {
            cost_index: Rc::new(CostIndex::new(CEPCI)?),
            currency_rates: CurrencyRates::default(),
            archetypes: IndexMap::from([(caes.id.clone(), Rc::new(caes))]),
            energy_prices: vec![uk_prices],
        })
    }

    /// Read reference data from a directory.
    ///
    /// The directory must contain `cost_index.csv` and `archetypes.toml`, along with a sample
    /// table for each archetype (`<id>.csv` unless another file name is given). The files
    /// `currency_rates.toml` and `energy_prices.csv` are optional.
    pub fn from_path(dir: &Path) -> Result<Self> {
        let cost_index = CostIndex::from_csv(&dir.join(COST_INDEX_FILE_NAME))?;

        let rates_path = dir.join(CURRENCY_RATES_FILE_NAME);
        let currency_rates = if rates_path.is_file() {
            read_toml(&rates_path)?
        } else {
            CurrencyRates::default()
        };

        let prices_path = dir.join(ENERGY_PRICES_FILE_NAME);
        let energy_prices = if prices_path.is_file() {
            read_csv_optional(&prices_path)?
        } else {
            Vec::new()
        };

        let file: ArchetypesFile = read_toml(&dir.join(ARCHETYPES_FILE_NAME))?;
        let mut archetypes = IndexMap::new();
        for info in file.archetypes {
            let file_name = info.file.clone().unwrap_or_else(|| format!("{}.csv", info.id));
            let samples: Vec<ArchetypeSample> = read_csv(&dir.join(file_name))?;
            let archetype = Archetype::new(info, &samples)?;
            let id = archetype.get_id().clone();
            ensure!(
                archetypes.insert(id.clone(), Rc::new(archetype)).is_none(),
                "Duplicate archetype ID: {id}"
            );
        }

        Ok(Self {
            cost_index: Rc::new(cost_index),
            currency_rates,
            archetypes,
            energy_prices,
        })
    }

    /// Look up an archetype by ID
    pub fn archetype(&self, id: &str) -> Result<Rc<Archetype>> {
        Ok(Rc::clone(self.archetypes.get(id).ok_or_else(|| {
            StorageError::MissingArchetype(id.to_string())
        })?))
    }

    /// The IDs of all archetypes, in the order they were loaded
    pub fn archetype_ids(&self) -> impl Iterator<Item = &ArchetypeID> {
        self.archetypes.keys()
    }

    /// Reference energy prices for a country in a year, if known
    pub fn energy_prices(&self, country: &str, year: u32) -> Option<EnergyPrices> {
        self.energy_prices
            .iter()
            .find(|row| row.country.eq_ignore_ascii_case(country) && row.year == year)
            .map(EnergyPriceRow::to_prices)
    }
}

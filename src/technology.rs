//! Electricity storage technologies and their techno-economic performance.
//!
//! A technology holds a set of validated input parameters ([`StorageParameters`]) from which a
//! chain of derived properties is computed, ending with the levelised cost of storage (LCOS).
//! Derived properties are computed on first access and cached; any change to the inputs
//! discards the whole cache.
//!
//! Values which cannot be computed because an input is missing (or because the result would be
//! meaningless, e.g. a cycle duration of zero) are `None`. This is not an error: inputs can be
//! supplied over several calls before results are requested.
use crate::costs::CostModel;
use crate::currency::{Currency, CurrencyRates};
use crate::error::StorageError;
use crate::quantity::{Quantity, Unit};
use crate::units::{
    Dimensionless, HOURS_PER_YEAR, Hours, MegaWattHours, MegaWatts, Money, MoneyPerKilowatt,
    MoneyPerKilowattHour, MoneyPerMegaWattHour, UnitType,
};
use anyhow::{Result, ensure};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use strum::{Display, EnumString};

pub mod consistency;
use consistency::{Design, DesignField, Resolution, reconcile};
pub mod data_driven;
pub mod generic;

/// A secondary energy vector consumed on discharge (e.g. gas burnt in a diabatic CAES plant)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SecondarySource {
    /// Natural gas
    Gas,
    /// Hydrogen
    Hydrogen,
    /// Electricity
    Electricity,
}

/// The input parameters of a storage technology, as supplied by a user.
///
/// All fields are optional; fields which are `None` are left unchanged when assigned.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TechnologyInputs {
    /// Nominal discharge duration (time)
    pub discharge_duration: Option<Quantity>,
    /// Nominal discharging power (power)
    pub discharging_power: Option<Quantity>,
    /// Nominal charge duration (time)
    pub charge_duration: Option<Quantity>,
    /// Nominal charging power (power)
    pub charging_power: Option<Quantity>,
    /// Nominal electricity-to-electricity efficiency
    pub roundtrip_efficiency: Option<Quantity>,
    /// Fraction of stored energy lost per unit time while idle
    pub self_discharge_rate: Option<Quantity>,
    /// Secondary energy vector consumed on discharge
    pub secondary_source: Option<SecondarySource>,
    /// Secondary energy consumed per unit of electricity discharged
    pub secondary_consumption_ratio: Option<Quantity>,
    /// Cost of the power island per unit of discharging power
    pub power_island_specific_cost: Option<Quantity>,
    /// Cost of the store per unit of storage capacity
    pub store_specific_cost: Option<Quantity>,
    /// Price of electricity
    pub electricity_price: Option<Quantity>,
    /// Price of gas
    pub gas_price: Option<Quantity>,
    /// Price of hydrogen
    pub hydrogen_price: Option<Quantity>,
    /// Discount rate (fraction per year)
    pub discount_rate: Option<Quantity>,
    /// The currency in which costs are reported
    pub currency: Option<Currency>,
    /// Lifetime in years
    pub lifetime: Option<u32>,
    /// Requested number of cycles per year
    pub cycles_per_year: Option<f64>,
    /// Fraction of idle time spent on standby
    pub standby: Option<Quantity>,
}

/// New energy prices
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnergyPrices {
    /// Price of electricity
    pub electricity: Option<Quantity>,
    /// Price of gas
    pub gas: Option<Quantity>,
    /// Price of hydrogen
    pub hydrogen: Option<Quantity>,
}

impl From<EnergyPrices> for TechnologyInputs {
    fn from(prices: EnergyPrices) -> Self {
        Self {
            electricity_price: prices.electricity,
            gas_price: prices.gas,
            hydrogen_price: prices.hydrogen,
            ..Self::default()
        }
    }
}

/// A new design for a technology
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignInputs {
    /// Nominal discharge duration
    pub discharge_duration: Option<Quantity>,
    /// Nominal discharging power
    pub discharging_power: Option<Quantity>,
    /// Nominal charge duration
    pub charge_duration: Option<Quantity>,
    /// Nominal charging power
    pub charging_power: Option<Quantity>,
    /// Nominal round-trip efficiency
    pub roundtrip_efficiency: Option<Quantity>,
    /// Self-discharge rate
    pub self_discharge_rate: Option<Quantity>,
    /// Lifetime in years
    pub lifetime: Option<u32>,
}

impl From<DesignInputs> for TechnologyInputs {
    fn from(design: DesignInputs) -> Self {
        Self {
            discharge_duration: design.discharge_duration,
            discharging_power: design.discharging_power,
            charge_duration: design.charge_duration,
            charging_power: design.charging_power,
            roundtrip_efficiency: design.roundtrip_efficiency,
            self_discharge_rate: design.self_discharge_rate,
            lifetime: design.lifetime,
            ..Self::default()
        }
    }
}

/// How a technology is operated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatingConditions {
    /// Requested number of cycles per year
    pub cycles_per_year: Option<f64>,
    /// Fraction of idle time spent on standby
    pub standby: Option<Quantity>,
}

impl From<OperatingConditions> for TechnologyInputs {
    fn from(conditions: OperatingConditions) -> Self {
        Self {
            cycles_per_year: conditions.cycles_per_year,
            standby: conditions.standby,
            ..Self::default()
        }
    }
}

/// The validated input parameters of a storage technology, in the units used by the model.
///
/// Costs and prices are expressed in [`StorageParameters::currency`].
#[derive(Debug, Clone, PartialEq)]
pub struct StorageParameters<M: CostModel> {
    /// Nominal discharge duration
    pub discharge_duration: Option<Hours>,
    /// Nominal discharging power
    pub discharging_power: Option<MegaWatts>,
    /// Nominal charge duration
    pub charge_duration: Option<Hours>,
    /// Nominal charging power
    pub charging_power: Option<MegaWatts>,
    /// Nominal round-trip efficiency
    pub roundtrip_efficiency: Option<Dimensionless>,
    /// Fraction of stored energy lost per hour
    pub self_discharge_rate: Dimensionless,
    /// Secondary energy vector consumed on discharge
    pub secondary_source: Option<SecondarySource>,
    /// Secondary energy consumed per unit of electricity discharged
    pub secondary_consumption_ratio: Dimensionless,
    /// Power island specific cost
    pub power_island_specific_cost: Option<M::Value<MoneyPerKilowatt>>,
    /// Store specific cost
    pub store_specific_cost: Option<M::Value<MoneyPerKilowattHour>>,
    /// Electricity price
    pub electricity_price: Option<MoneyPerMegaWattHour>,
    /// Gas price
    pub gas_price: Option<MoneyPerMegaWattHour>,
    /// Hydrogen price
    pub hydrogen_price: Option<MoneyPerMegaWattHour>,
    /// Discount rate
    pub discount_rate: Option<Dimensionless>,
    /// Currency of all costs and prices
    pub currency: Currency,
    /// Exchange rates used to convert costs given in other currencies
    pub rates: CurrencyRates,
    /// Lifetime in years
    pub lifetime: Option<u32>,
    /// Requested number of cycles per year
    pub cycles_per_year: Option<f64>,
    /// Fraction of idle time spent on standby
    pub standby: Dimensionless,
    /// The design field which was derived from the other four, if any
    pub derived_field: Option<DesignField>,
}

impl<M: CostModel> Default for StorageParameters<M> {
    fn default() -> Self {
        Self {
            discharge_duration: None,
            discharging_power: None,
            charge_duration: None,
            charging_power: None,
            roundtrip_efficiency: None,
            self_discharge_rate: Dimensionless(0.0),
            secondary_source: None,
            secondary_consumption_ratio: Dimensionless(0.0),
            power_island_specific_cost: None,
            store_specific_cost: None,
            electricity_price: None,
            gas_price: None,
            hydrogen_price: None,
            discount_rate: None,
            currency: Currency::default(),
            rates: CurrencyRates::default(),
            lifetime: None,
            cycles_per_year: None,
            standby: Dimensionless(1.0),
            derived_field: None,
        }
    }
}

impl<M: CostModel> StorageParameters<M> {
    /// The charge/discharge design
    pub fn design(&self) -> Design {
        Design {
            charging_power: self.charging_power,
            charge_duration: self.charge_duration,
            discharging_power: self.discharging_power,
            discharge_duration: self.discharge_duration,
            roundtrip_efficiency: self.roundtrip_efficiency,
        }
    }

    fn set_design(&mut self, design: Design) {
        self.charging_power = design.charging_power;
        self.charge_duration = design.charge_duration;
        self.discharging_power = design.discharging_power;
        self.discharge_duration = design.discharge_duration;
        self.roundtrip_efficiency = design.roundtrip_efficiency;
    }
}

/// Convert a quantity to `unit` and check that it is not negative
fn non_negative<T: UnitType>(
    field: &'static str,
    quantity: Quantity,
    unit: Unit,
    rates: &CurrencyRates,
) -> Result<T> {
    let value = quantity.to_with_rates(unit, rates)?.magnitude();
    ensure!(
        (0.0..).contains(&value),
        StorageError::validation(field, "must not be negative")
    );

    Ok(T::new(value))
}

/// Convert a quantity to `unit` and check that it lies between 0 and 1
fn fraction<T: UnitType>(
    field: &'static str,
    quantity: Quantity,
    unit: Unit,
    rates: &CurrencyRates,
) -> Result<T> {
    let value = quantity.to_with_rates(unit, rates)?.magnitude();
    ensure!(
        (0.0..=1.0).contains(&value),
        StorageError::validation(field, "must lie between 0 and 1")
    );

    Ok(T::new(value))
}

/// Express the costs and prices held in `params` in another currency
fn convert_currency<M: CostModel>(params: &mut StorageParameters<M>, currency: Currency) {
    let factor = Dimensionless(params.rates.factor(params.currency, currency));
    params.power_island_specific_cost = params
        .power_island_specific_cost
        .map(|cost| M::map(cost, |cost: MoneyPerKilowatt| cost * factor));
    params.store_specific_cost = params
        .store_specific_cost
        .map(|cost| M::map(cost, |cost: MoneyPerKilowattHour| cost * factor));
    for price in [
        &mut params.electricity_price,
        &mut params.gas_price,
        &mut params.hydrogen_price,
    ] {
        *price = price.map(|price| price * factor);
    }
    params.currency = currency;
}

/// Validate `inputs` and assign them on top of `params`.
///
/// Returns the updated parameters, leaving `params` untouched, so a failed assignment has no
/// effect. The currency is assigned first: costs and prices already held are converted to it,
/// as are those given in the same inputs. Once the design fields are assigned, they are
/// reconciled (see [`consistency::reconcile`]).
pub fn assign<M: CostModel>(
    params: &StorageParameters<M>,
    inputs: &TechnologyInputs,
) -> Result<StorageParameters<M>> {
    let mut new = params.clone();
    if let Some(currency) = inputs.currency
        && currency != new.currency
    {
        debug!("Converting costs and prices from {} to {currency}", new.currency);
        convert_currency(&mut new, currency);
    }
    let rates = new.rates;

    if let Some(q) = inputs.discharge_duration {
        new.discharge_duration = Some(non_negative("discharge_duration", q, Unit::Hour, &rates)?);
    }
    if let Some(q) = inputs.charge_duration {
        new.charge_duration = Some(non_negative("charge_duration", q, Unit::Hour, &rates)?);
    }
    if let Some(q) = inputs.discharging_power {
        new.discharging_power = Some(non_negative(
            "discharging_power",
            q,
            Unit::Megawatt,
            &rates,
        )?);
    }
    if let Some(q) = inputs.charging_power {
        new.charging_power = Some(non_negative("charging_power", q, Unit::Megawatt, &rates)?);
    }
    if let Some(q) = inputs.roundtrip_efficiency {
        new.roundtrip_efficiency = Some(non_negative(
            "roundtrip_efficiency",
            q,
            Unit::Fraction,
            &rates,
        )?);
    }

    let (design, resolution) = reconcile(new.design())?;
    new.set_design(design);
    if let Resolution::Derived(field) = resolution {
        debug!("Derived {field} from the other design values");
        new.derived_field = Some(field);
    }

    if let Some(q) = inputs.power_island_specific_cost {
        let cost: MoneyPerKilowatt = non_negative(
            "power_island_specific_cost",
            q,
            Unit::PerKilowatt(new.currency),
            &rates,
        )?;
        new.power_island_specific_cost = Some(M::uniform(cost));
    }
    if let Some(q) = inputs.store_specific_cost {
        let cost: MoneyPerKilowattHour = non_negative(
            "store_specific_cost",
            q,
            Unit::PerKilowattHour(new.currency),
            &rates,
        )?;
        new.store_specific_cost = Some(M::uniform(cost));
    }

    let price_unit = Unit::PerMegawattHour(new.currency);
    if let Some(q) = inputs.electricity_price {
        new.electricity_price = Some(non_negative("electricity_price", q, price_unit, &rates)?);
    }
    if let Some(q) = inputs.gas_price {
        new.gas_price = Some(non_negative("gas_price", q, price_unit, &rates)?);
    }
    if let Some(q) = inputs.hydrogen_price {
        new.hydrogen_price = Some(non_negative("hydrogen_price", q, price_unit, &rates)?);
    }

    if let Some(q) = inputs.secondary_consumption_ratio {
        new.secondary_consumption_ratio = non_negative(
            "secondary_consumption_ratio",
            q,
            Unit::Fraction,
            &rates,
        )?;
    }
    if let Some(q) = inputs.self_discharge_rate {
        new.self_discharge_rate = fraction("self_discharge_rate", q, Unit::PerHour, &rates)?;
    }
    if let Some(source) = inputs.secondary_source {
        new.secondary_source = Some(source);
    }
    if let Some(cycles) = inputs.cycles_per_year {
        ensure!(
            (0.0..).contains(&cycles),
            StorageError::validation("cycles_per_year", "must not be negative")
        );
        new.cycles_per_year = Some(cycles);
    }
    if let Some(lifetime) = inputs.lifetime {
        ensure!(
            lifetime >= 1,
            StorageError::validation("lifetime", "must be at least one year")
        );
        new.lifetime = Some(lifetime);
    }
    if let Some(q) = inputs.discount_rate {
        new.discount_rate = Some(fraction("discount_rate", q, Unit::Fraction, &rates)?);
    }
    if let Some(q) = inputs.standby {
        new.standby = fraction("standby", q, Unit::Fraction, &rates)?;
    }

    Ok(new)
}

/// Derived properties, each computed on first access
#[derive(Debug, Clone)]
struct DerivedCache<M: CostModel> {
    working_cycle_duration: OnceCell<Option<Hours>>,
    maximum_frequency: OnceCell<Option<f64>>,
    whole_cycle_duration: OnceCell<Option<Hours>>,
    standby_duration: OnceCell<Option<Hours>>,
    storage_capacity: OnceCell<Option<MegaWattHours>>,
    investment_cost: OnceCell<Option<M::Value<Money>>>,
    input_electricity: OnceCell<Option<MegaWattHours>>,
    output_electricity: OnceCell<Option<MegaWattHours>>,
    effective_roundtrip_efficiency: OnceCell<Option<Dimensionless>>,
    levelised_cost_of_storage: OnceCell<Option<M::Value<MoneyPerMegaWattHour>>>,
}

impl<M: CostModel> Default for DerivedCache<M> {
    fn default() -> Self {
        Self {
            working_cycle_duration: OnceCell::new(),
            maximum_frequency: OnceCell::new(),
            whole_cycle_duration: OnceCell::new(),
            standby_duration: OnceCell::new(),
            storage_capacity: OnceCell::new(),
            investment_cost: OnceCell::new(),
            input_electricity: OnceCell::new(),
            output_electricity: OnceCell::new(),
            effective_roundtrip_efficiency: OnceCell::new(),
            levelised_cost_of_storage: OnceCell::new(),
        }
    }
}

/// The state shared by all storage technologies: parameters and cached derived properties
#[derive(Debug, Clone)]
pub struct StorageCore<M: CostModel> {
    params: StorageParameters<M>,
    cache: DerivedCache<M>,
}

impl<M: CostModel> StorageCore<M> {
    /// Create a core from already validated parameters
    pub fn new(params: StorageParameters<M>) -> Self {
        Self {
            params,
            cache: DerivedCache::default(),
        }
    }

    /// Validate `inputs` and assign them on top of the default parameters
    pub fn with_inputs(inputs: &TechnologyInputs, rates: CurrencyRates) -> Result<Self> {
        let defaults = StorageParameters {
            rates,
            ..StorageParameters::default()
        };

        Ok(Self::new(assign(&defaults, inputs)?))
    }

    /// The current parameters
    pub fn params(&self) -> &StorageParameters<M> {
        &self.params
    }

    /// Validate `inputs` and assign them, discarding all derived properties.
    ///
    /// On failure, nothing is changed.
    pub fn assign(&mut self, inputs: &TechnologyInputs) -> Result<()> {
        self.params = assign(&self.params, inputs)?;
        self.invalidate();

        Ok(())
    }

    /// Replace the design.
    ///
    /// A design value which was previously derived from the others is discarded first, so it can
    /// be derived again from the new values.
    pub fn define_design(&mut self, design: DesignInputs) -> Result<()> {
        let mut params = self.params.clone();
        if let Some(field) = params.derived_field.take() {
            let mut stale = params.design();
            stale.clear(field);
            params.set_design(stale);
        }

        self.params = assign(&params, &design.into())?;
        self.invalidate();

        Ok(())
    }

    /// Replace the parameters wholesale, discarding all derived properties
    fn set_params(&mut self, params: StorageParameters<M>) {
        self.params = params;
        self.invalidate();
    }

    /// Replace the specific costs, discarding all derived properties
    pub fn set_specific_costs(
        &mut self,
        power_island: Option<M::Value<MoneyPerKilowatt>>,
        store: Option<M::Value<MoneyPerKilowattHour>>,
    ) {
        self.params.power_island_specific_cost = power_island;
        self.params.store_specific_cost = store;
        self.invalidate();
    }

    /// Discard all derived properties
    pub fn invalidate(&mut self) {
        self.cache = DerivedCache::default();
    }

    /// Time spent charging and discharging in one cycle
    pub fn working_cycle_duration(&self) -> Option<Hours> {
        *self.cache.working_cycle_duration.get_or_init(|| {
            Some(self.params.discharge_duration? + self.params.charge_duration?)
        })
    }

    /// The greatest number of whole cycles which fit in a year
    pub fn maximum_frequency(&self) -> Option<f64> {
        *self.cache.maximum_frequency.get_or_init(|| {
            let working = self.working_cycle_duration()?;
            (working.0 > 0.0).then(|| (HOURS_PER_YEAR / working.0).floor())
        })
    }

    /// Cycles per year: the number requested, limited to [`StorageCore::maximum_frequency`]
    pub fn frequency(&self) -> Option<f64> {
        Some(self.params.cycles_per_year?.min(self.maximum_frequency()?))
    }

    /// Time between the starts of consecutive cycles
    pub fn whole_cycle_duration(&self) -> Option<Hours> {
        *self.cache.whole_cycle_duration.get_or_init(|| {
            let frequency = self.frequency()?;
            (frequency > 0.0).then(|| Hours(HOURS_PER_YEAR / frequency))
        })
    }

    /// Time spent on standby (holding charge) in one cycle
    pub fn standby_duration(&self) -> Option<Hours> {
        *self.cache.standby_duration.get_or_init(|| {
            let idle = self.whole_cycle_duration()? - self.working_cycle_duration()?;
            Some(self.params.standby * idle)
        })
    }

    /// Energy delivered by a full discharge
    pub fn storage_capacity(&self) -> Option<MegaWattHours> {
        *self.cache.storage_capacity.get_or_init(|| {
            Some(self.params.discharging_power? * self.params.discharge_duration?)
        })
    }

    /// Upfront cost of the power island and store
    pub fn investment_cost(&self) -> Option<M::Value<Money>> {
        *self.cache.investment_cost.get_or_init(|| {
            let power = self.params.discharging_power?;
            let capacity = self.storage_capacity()?;
            let power_island = self.params.power_island_specific_cost?;
            let store = self.params.store_specific_cost?;

            Some(M::zip(
                power_island,
                store,
                |power_cost: MoneyPerKilowatt, store_cost: MoneyPerKilowattHour| {
                    power * power_cost + capacity * store_cost
                },
            ))
        })
    }

    /// Electricity consumed by a full charge
    pub fn input_electricity(&self) -> Option<MegaWattHours> {
        *self.cache.input_electricity.get_or_init(|| {
            Some(self.params.charging_power? * self.params.charge_duration?)
        })
    }

    /// Electricity recovered per cycle, after losses on standby
    pub fn output_electricity(&self) -> Option<MegaWattHours> {
        *self.cache.output_electricity.get_or_init(|| {
            let input = self.input_electricity()?;
            let efficiency = self.params.roundtrip_efficiency?;
            let standby = self.standby_duration()?;
            let retained = Dimensionless(1.0) - self.params.self_discharge_rate;
            let stored = input * retained.powf(standby.0);

            Some(if stored.0 > 0.0 {
                efficiency * stored
            } else {
                MegaWattHours(0.0)
            })
        })
    }

    /// Electricity recovered per unit consumed, including losses on standby
    pub fn effective_roundtrip_efficiency(&self) -> Option<Dimensionless> {
        *self.cache.effective_roundtrip_efficiency.get_or_init(|| {
            let input = self.input_electricity()?;
            if input.0 <= 0.0 {
                return None;
            }

            Some(self.output_electricity()? / input)
        })
    }

    /// Secondary energy consumed per cycle
    pub fn secondary_energy_input(&self) -> Option<MegaWattHours> {
        let ratio = self.params.secondary_consumption_ratio;
        if ratio.0 == 0.0 {
            return Some(MegaWattHours(0.0));
        }

        Some(self.output_electricity()? * ratio)
    }

    /// Price of the secondary energy vector (zero if there is none)
    pub fn secondary_price(&self) -> Option<MoneyPerMegaWattHour> {
        match self.params.secondary_source {
            None => Some(MoneyPerMegaWattHour(0.0)),
            Some(SecondarySource::Gas) => self.params.gas_price,
            Some(SecondarySource::Hydrogen) => self.params.hydrogen_price,
            Some(SecondarySource::Electricity) => self.params.electricity_price,
        }
    }

    /// Discounted lifetime cost per unit of electricity discharged.
    ///
    /// Costs and discharged energy are discounted over years `1` to `lifetime - 1` inclusive.
    pub fn levelised_cost_of_storage(&self) -> Option<M::Value<MoneyPerMegaWattHour>> {
        *self.cache.levelised_cost_of_storage.get_or_init(|| {
            let investment = self.investment_cost()?;
            let rate = self.params.discount_rate?;
            let lifetime = self.params.lifetime?;
            let input = self.input_electricity()?;
            let output = self.output_electricity()?;
            let frequency = Dimensionless(self.frequency()?);
            let electricity_price = self.params.electricity_price?;
            let secondary_input = self.secondary_energy_input()?;
            let secondary_price = self.secondary_price()?;

            let yearly_cost =
                (electricity_price * input + secondary_price * secondary_input) * frequency;
            let yearly_discharge = output * frequency;
            let discounting = discount_factor_sum(rate, lifetime);
            let cost = yearly_cost * discounting;
            let discharge = yearly_discharge * discounting;
            if discharge.0 <= 0.0 {
                return None;
            }

            Some(M::map(investment, |investment: Money| {
                (investment + cost) / discharge
            }))
        })
    }
}

/// Sum of the discount factors `(1 + rate)^-year` over years `1` to `lifetime - 1` inclusive
fn discount_factor_sum(rate: Dimensionless, lifetime: u32) -> Dimensionless {
    let years = f64::from(lifetime.saturating_sub(1));
    if rate == Dimensionless(0.0) {
        return Dimensionless(years);
    }

    let factor = (Dimensionless(1.0) + rate).powf(-years);
    (Dimensionless(1.0) - factor) / rate
}

/// Common behaviour of storage technologies.
///
/// Implementors provide access to their [`StorageCore`]; the derived properties are computed
/// there.
pub trait StorageTechnology {
    /// How the technology's costs are represented
    type Costs: CostModel;

    /// The shared state of the technology
    fn core(&self) -> &StorageCore<Self::Costs>;

    /// The shared state of the technology (mutable)
    fn core_mut(&mut self) -> &mut StorageCore<Self::Costs>;

    /// A label for the kind of technology (e.g. `D-CAES`)
    fn technology_type(&self) -> Option<&str> {
        None
    }

    /// A label for the source of the technology's data
    fn model(&self) -> Option<&str> {
        None
    }

    /// The current parameters
    fn parameters(&self) -> &StorageParameters<Self::Costs> {
        self.core().params()
    }

    /// Replace the design of the technology
    fn define_design(&mut self, design: DesignInputs) -> Result<()> {
        self.core_mut().define_design(design)
    }

    /// Change how the technology is operated
    fn define_operating_conditions(&mut self, conditions: OperatingConditions) -> Result<()> {
        self.core_mut().assign(&conditions.into())
    }

    /// Overwrite the energy prices which are given
    fn update_energy_prices(&mut self, prices: EnergyPrices) -> Result<()> {
        self.core_mut().assign(&prices.into())
    }

    /// Change the discount rate
    fn update_discount_rate(&mut self, rate: Quantity) -> Result<()> {
        let inputs = TechnologyInputs {
            discount_rate: Some(rate),
            ..TechnologyInputs::default()
        };

        self.core_mut().assign(&inputs)
    }

    /// See [`StorageCore::working_cycle_duration`]
    fn working_cycle_duration(&self) -> Option<Hours> {
        self.core().working_cycle_duration()
    }

    /// See [`StorageCore::maximum_frequency`]
    fn maximum_frequency(&self) -> Option<f64> {
        self.core().maximum_frequency()
    }

    /// See [`StorageCore::frequency`]
    fn frequency(&self) -> Option<f64> {
        self.core().frequency()
    }

    /// See [`StorageCore::whole_cycle_duration`]
    fn whole_cycle_duration(&self) -> Option<Hours> {
        self.core().whole_cycle_duration()
    }

    /// See [`StorageCore::standby_duration`]
    fn standby_duration(&self) -> Option<Hours> {
        self.core().standby_duration()
    }

    /// See [`StorageCore::storage_capacity`]
    fn storage_capacity(&self) -> Option<MegaWattHours> {
        self.core().storage_capacity()
    }

    /// See [`StorageCore::investment_cost`]
    fn investment_cost(&self) -> Option<<Self::Costs as CostModel>::Value<Money>> {
        self.core().investment_cost()
    }

    /// See [`StorageCore::input_electricity`]
    fn input_electricity(&self) -> Option<MegaWattHours> {
        self.core().input_electricity()
    }

    /// See [`StorageCore::output_electricity`]
    fn output_electricity(&self) -> Option<MegaWattHours> {
        self.core().output_electricity()
    }

    /// See [`StorageCore::effective_roundtrip_efficiency`]
    fn effective_roundtrip_efficiency(&self) -> Option<Dimensionless> {
        self.core().effective_roundtrip_efficiency()
    }

    /// See [`StorageCore::secondary_energy_input`]
    fn secondary_energy_input(&self) -> Option<MegaWattHours> {
        self.core().secondary_energy_input()
    }

    /// See [`StorageCore::levelised_cost_of_storage`]
    fn levelised_cost_of_storage(
        &self,
    ) -> Option<<Self::Costs as CostModel>::Value<MoneyPerMegaWattHour>> {
        self.core().levelised_cost_of_storage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::PointCost;
    use crate::fixture::{assert_error, technology_inputs};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn core(inputs: &TechnologyInputs) -> StorageCore<PointCost> {
        StorageCore::with_inputs(inputs, CurrencyRates::default()).unwrap()
    }

    #[rstest]
    fn test_defaults(technology_inputs: TechnologyInputs) {
        let params = core(&technology_inputs).params().clone();
        assert_eq!(params.self_discharge_rate, Dimensionless(0.0));
        assert_eq!(params.secondary_consumption_ratio, Dimensionless(0.0));
        assert_eq!(params.standby, Dimensionless(1.0));
        assert_eq!(params.currency, Currency::USD);
    }

    #[rstest]
    fn test_inputs_are_converted(technology_inputs: TechnologyInputs) {
        let inputs = TechnologyInputs {
            discharge_duration: Some(Quantity::new(4.0 * 3600.0, Unit::Second)),
            discharging_power: Some(Quantity::new(100e6, Unit::Watt)),
            self_discharge_rate: Some(Quantity::new(2.4, Unit::PercentPerDay)),
            ..technology_inputs
        };
        let params = core(&inputs).params().clone();
        assert_eq!(params.discharge_duration, Some(Hours(4.0)));
        assert_eq!(params.discharging_power, Some(MegaWatts(100.0)));
        assert_approx_eq!(Dimensionless, params.self_discharge_rate, Dimensionless(0.001));
    }

    #[rstest]
    #[case::discharge_duration("discharge_duration = \"-1 hour\"", "discharge_duration")]
    #[case::charging_power("charging_power = \"-5 MW\"", "charging_power")]
    #[case::self_discharge_rate("self_discharge_rate = \"1.5 1/hour\"", "self_discharge_rate")]
    #[case::electricity_price("electricity_price = \"-1 USD/MWh\"", "electricity_price")]
    #[case::discount_rate("discount_rate = 1.5", "discount_rate")]
    #[case::standby("standby = -0.1", "standby")]
    #[case::lifetime("lifetime = 0", "lifetime")]
    #[case::cycles_per_year("cycles_per_year = -1.0", "cycles_per_year")]
    fn test_validation(#[case] inputs: &str, #[case] expected_field: &str) {
        let inputs: TechnologyInputs = toml::from_str(inputs).unwrap();
        let err = StorageCore::<PointCost>::with_inputs(&inputs, CurrencyRates::default())
            .unwrap_err();
        match err.downcast_ref::<StorageError>() {
            Some(StorageError::Validation { field, .. }) => assert_eq!(*field, expected_field),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_incompatible_unit() {
        let inputs = TechnologyInputs {
            discharge_duration: Some("100 MW".parse().unwrap()),
            ..TechnologyInputs::default()
        };
        assert_error!(
            StorageCore::<PointCost>::with_inputs(&inputs, CurrencyRates::default()),
            "Unit MW is not compatible with dimension time"
        );
    }

    #[rstest]
    fn test_failed_assignment_leaves_state_unchanged(technology_inputs: TechnologyInputs) {
        let mut core = core(&technology_inputs);
        let before = core.params().clone();
        let lcos = core.levelised_cost_of_storage();

        let inputs = TechnologyInputs {
            electricity_price: Some("10 USD/MWh".parse().unwrap()),
            discount_rate: Some(Quantity::dimensionless(2.0)),
            ..TechnologyInputs::default()
        };
        assert!(core.assign(&inputs).is_err());
        assert_eq!(core.params(), &before);
        assert_eq!(core.levelised_cost_of_storage(), lcos);
    }

    #[rstest]
    fn test_derived_properties(technology_inputs: TechnologyInputs) {
        let core = core(&technology_inputs);

        // Charge duration derived from 100 MW * 4 h = 0.8 * 100 MW * t_c
        assert_eq!(core.params().derived_field, Some(DesignField::ChargeDuration));
        assert_approx_eq!(Hours, core.params().charge_duration.unwrap(), Hours(5.0));
        assert_approx_eq!(Hours, core.working_cycle_duration().unwrap(), Hours(9.0));
        assert_eq!(core.maximum_frequency(), Some(973.0));
        assert_eq!(core.frequency(), Some(100.0));
        assert_approx_eq!(Hours, core.whole_cycle_duration().unwrap(), Hours(87.6));
        assert_approx_eq!(Hours, core.standby_duration().unwrap(), Hours(78.6));
        assert_eq!(core.storage_capacity(), Some(MegaWattHours(400.0)));
        assert_approx_eq!(Money, core.investment_cost().unwrap(), Money(5.04e7));
        assert_approx_eq!(MegaWattHours, core.input_electricity().unwrap(), MegaWattHours(500.0));
        assert_approx_eq!(
            MegaWattHours,
            core.output_electricity().unwrap(),
            MegaWattHours(400.0)
        );
        assert_approx_eq!(
            Dimensionless,
            core.effective_roundtrip_efficiency().unwrap(),
            Dimensionless(0.8)
        );
        assert_eq!(core.secondary_energy_input(), Some(MegaWattHours(0.0)));
    }

    #[rstest]
    fn test_lcos(technology_inputs: TechnologyInputs) {
        let core = core(&technology_inputs);

        // Years 1 to 9 are discounted at 5%
        let factor: f64 = (1..10).map(|year| 1.05_f64.powi(-year)).sum();
        let cost = 5.04e7 + 500.0 * 50.0 * 100.0 * factor;
        let discharge = 400.0 * 100.0 * factor;
        assert_approx_eq!(
            MoneyPerMegaWattHour,
            core.levelised_cost_of_storage().unwrap(),
            MoneyPerMegaWattHour(cost / discharge),
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_lcos_with_secondary_source(technology_inputs: TechnologyInputs) {
        let inputs = TechnologyInputs {
            secondary_source: Some(SecondarySource::Gas),
            secondary_consumption_ratio: Some(Quantity::dimensionless(0.5)),
            gas_price: Some("20 USD/MWh".parse().unwrap()),
            ..technology_inputs
        };
        let core = core(&inputs);
        assert_approx_eq!(
            MegaWattHours,
            core.secondary_energy_input().unwrap(),
            MegaWattHours(200.0)
        );

        let factor: f64 = (1..10).map(|year| 1.05_f64.powi(-year)).sum();
        let cost = 5.04e7 + (500.0 * 50.0 + 200.0 * 20.0) * 100.0 * factor;
        let discharge = 400.0 * 100.0 * factor;
        assert_approx_eq!(
            MoneyPerMegaWattHour,
            core.levelised_cost_of_storage().unwrap(),
            MoneyPerMegaWattHour(cost / discharge),
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_missing_secondary_price(technology_inputs: TechnologyInputs) {
        let inputs = TechnologyInputs {
            secondary_source: Some(SecondarySource::Hydrogen),
            secondary_consumption_ratio: Some(Quantity::dimensionless(0.5)),
            ..technology_inputs
        };
        assert_eq!(core(&inputs).levelised_cost_of_storage(), None);
    }

    #[test]
    fn test_undefined_propagation() {
        let inputs = TechnologyInputs {
            discharge_duration: Some("4 hour".parse().unwrap()),
            discharging_power: Some("100 MW".parse().unwrap()),
            ..TechnologyInputs::default()
        };
        let core = core(&inputs);
        assert_eq!(core.storage_capacity(), Some(MegaWattHours(400.0)));
        assert_eq!(core.input_electricity(), None);
        assert_eq!(core.output_electricity(), None);
        assert_eq!(core.effective_roundtrip_efficiency(), None);
        assert_eq!(core.levelised_cost_of_storage(), None);
    }

    #[rstest]
    fn test_frequency_is_clamped(technology_inputs: TechnologyInputs) {
        let mut core = core(&technology_inputs);
        core.assign(&OperatingConditions {
            cycles_per_year: Some(5000.0),
            standby: None,
        }
        .into())
        .unwrap();
        assert_eq!(core.frequency(), Some(973.0));
    }

    #[rstest]
    fn test_zero_frequency(technology_inputs: TechnologyInputs) {
        let inputs = TechnologyInputs {
            cycles_per_year: Some(0.0),
            ..technology_inputs
        };
        let core = core(&inputs);
        assert_eq!(core.whole_cycle_duration(), None);
        assert_eq!(core.levelised_cost_of_storage(), None);
    }

    #[rstest]
    fn test_single_year_lifetime(technology_inputs: TechnologyInputs) {
        let inputs = TechnologyInputs {
            lifetime: Some(1),
            ..technology_inputs
        };
        assert_eq!(core(&inputs).levelised_cost_of_storage(), None);
    }

    #[rstest]
    fn test_lifetime_beyond_i32(technology_inputs: TechnologyInputs) {
        let inputs = TechnologyInputs {
            lifetime: Some(u32::MAX),
            ..technology_inputs
        };

        // Discount factors from year 1 onwards sum to 1 / 0.05
        let cost = 5.04e7 + 500.0 * 50.0 * 100.0 * 20.0;
        let discharge = 400.0 * 100.0 * 20.0;
        assert_approx_eq!(
            MoneyPerMegaWattHour,
            core(&inputs).levelised_cost_of_storage().unwrap(),
            MoneyPerMegaWattHour(cost / discharge),
            epsilon = 1e-9
        );
    }

    #[rstest]
    #[case(0.0, 1, 0.0)]
    #[case(0.0, 10, 9.0)]
    #[case(0.05, 2, 1.0 / 1.05)]
    #[case(0.1, 3, 1.0 / 1.1 + 1.0 / 1.21)]
    fn test_discount_factor_sum(#[case] rate: f64, #[case] lifetime: u32, #[case] expected: f64) {
        assert_approx_eq!(
            Dimensionless,
            discount_factor_sum(Dimensionless(rate), lifetime),
            Dimensionless(expected),
            epsilon = 1e-12
        );
    }

    #[rstest]
    fn test_self_discharge_on_standby(technology_inputs: TechnologyInputs) {
        let inputs = TechnologyInputs {
            self_discharge_rate: Some("1 %/hour".parse().unwrap()),
            ..technology_inputs
        };
        let core = core(&inputs);
        let expected = 0.8 * 500.0 * 0.99_f64.powf(78.6);
        assert_approx_eq!(
            MegaWattHours,
            core.output_electricity().unwrap(),
            MegaWattHours(expected),
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_cache_is_invalidated(technology_inputs: TechnologyInputs) {
        let mut core = core(&technology_inputs);
        let before = core.levelised_cost_of_storage().unwrap();

        core.assign(&EnergyPrices {
            electricity: Some("100 USD/MWh".parse().unwrap()),
            ..EnergyPrices::default()
        }
        .into())
        .unwrap();
        let after = core.levelised_cost_of_storage().unwrap();
        assert!(after > before);
    }

    #[rstest]
    fn test_define_design_rederives_field(technology_inputs: TechnologyInputs) {
        let mut core = core(&technology_inputs);
        assert_approx_eq!(Hours, core.params().charge_duration.unwrap(), Hours(5.0));

        core.define_design(DesignInputs {
            discharge_duration: Some("8 hour".parse().unwrap()),
            ..DesignInputs::default()
        })
        .unwrap();
        assert_approx_eq!(Hours, core.params().charge_duration.unwrap(), Hours(10.0));
        assert_eq!(core.storage_capacity(), Some(MegaWattHours(800.0)));
    }

    #[test]
    fn test_prices_converted_to_currency() {
        let inputs = TechnologyInputs {
            currency: Some(Currency::GBP),
            electricity_price: Some("100 USD/MWh".parse().unwrap()),
            ..TechnologyInputs::default()
        };
        let rates = CurrencyRates {
            usd: 1.0,
            gbp: 0.8,
            eur: 0.9,
        };
        let core = StorageCore::<PointCost>::with_inputs(&inputs, rates).unwrap();
        assert_approx_eq!(
            MoneyPerMegaWattHour,
            core.params().electricity_price.unwrap(),
            MoneyPerMegaWattHour(80.0)
        );
    }
}

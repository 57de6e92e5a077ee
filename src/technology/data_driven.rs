//! Storage technologies whose performance and costs are taken from reference data.
//!
//! The round-trip efficiency, secondary consumption ratio and specific costs of a data-driven
//! technology are interpolated from an [`Archetype`]'s sample table at the technology's design
//! (discharge duration and discharging power). Costs are adjusted from the archetype's base year
//! to the scene year with the cost index, and converted to the technology's currency.
use super::{
    DesignInputs, StorageCore, StorageParameters, StorageTechnology, TechnologyInputs, assign,
};
use crate::costs::{CostModel, CostRange, RangeCost};
use crate::error::StorageError;
use crate::quantity::Quantity;
use crate::reference::{Archetype, CONVENTIONAL_CAES_ID, CostIndex, ReferenceData};
use crate::scene::SceneContext;
use crate::units::{Dimensionless, MoneyPerKilowatt, MoneyPerKilowattHour};
use anyhow::{Result, ensure};
use log::debug;
use std::rc::Rc;

/// Specific costs of the power island and store, if known at the current design
type SpecificCosts = (
    Option<CostRange<MoneyPerKilowatt>>,
    Option<CostRange<MoneyPerKilowattHour>>,
);

/// A storage technology backed by an archetype's reference data
#[derive(Debug, Clone)]
pub struct DataDrivenStorageTechnology {
    archetype: Rc<Archetype>,
    cost_index: Rc<CostIndex>,
    year: u32,
    core: StorageCore<RangeCost>,
}

/// Check that none of the fields taken from reference data were supplied by the user
fn reject_data_backed_inputs(inputs: &TechnologyInputs) -> Result<()> {
    for (field, given) in [
        ("roundtrip_efficiency", inputs.roundtrip_efficiency.is_some()),
        (
            "secondary_consumption_ratio",
            inputs.secondary_consumption_ratio.is_some(),
        ),
        ("secondary_source", inputs.secondary_source.is_some()),
        (
            "power_island_specific_cost",
            inputs.power_island_specific_cost.is_some(),
        ),
        ("store_specific_cost", inputs.store_specific_cost.is_some()),
    ] {
        ensure!(
            !given,
            StorageError::validation(field, "is taken from the archetype's reference data")
        );
    }

    Ok(())
}

/// Discard the efficiency along with any design value derived from it
fn clear_derived_design(params: &mut StorageParameters<RangeCost>) {
    let mut design = params.design();
    if let Some(field) = params.derived_field.take() {
        design.clear(field);
    }
    design.roundtrip_efficiency = None;
    params.set_design(design);
}

/// Interpolate the efficiency and consumption ratio at the current design and reconcile the
/// design with the new efficiency.
///
/// The efficiency is never derived from the other design values; if the design lies outside the
/// archetype's data it is left undefined.
fn with_performance(
    archetype: &Archetype,
    mut params: StorageParameters<RangeCost>,
) -> Result<StorageParameters<RangeCost>> {
    clear_derived_design(&mut params);
    params.secondary_consumption_ratio = Dimensionless(0.0);
    let (Some(duration), Some(power)) = (params.discharge_duration, params.discharging_power)
    else {
        return Ok(params);
    };

    if let Some(ratio) = archetype.consumption_ratio_at(duration, power) {
        params.secondary_consumption_ratio = ratio;
    }
    let Some(efficiency) = archetype.efficiency_at(duration, power) else {
        debug!(
            "Design ({duration} h, {power} MW) is outside the data for archetype {}",
            archetype.id
        );
        return Ok(params);
    };

    let inputs = TechnologyInputs {
        roundtrip_efficiency: Some(Quantity::dimensionless(efficiency.0)),
        ..TechnologyInputs::default()
    };
    assign(&params, &inputs)
}

impl DataDrivenStorageTechnology {
    /// Create a technology from the archetype with the given ID.
    ///
    /// The scene must be set, as its year determines the cost index used to adjust costs. Unless
    /// `inputs` gives a currency, the preferred currency of `context` is used.
    pub fn with_inputs(
        context: &SceneContext,
        reference: &ReferenceData,
        archetype_id: &str,
        inputs: &TechnologyInputs,
    ) -> Result<Self> {
        reject_data_backed_inputs(inputs)?;
        let scene = context.current_scene()?;
        let archetype = reference.archetype(archetype_id)?;

        let inputs = TechnologyInputs {
            currency: inputs
                .currency
                .or(Some(context.unit_preferences().currency)),
            secondary_source: archetype.secondary_source,
            ..inputs.clone()
        };
        let defaults = StorageParameters {
            rates: reference.currency_rates,
            ..StorageParameters::default()
        };
        let params = with_performance(&archetype, assign(&defaults, &inputs)?)?;

        let mut technology = Self {
            archetype,
            cost_index: Rc::clone(&reference.cost_index),
            year: scene.year,
            core: StorageCore::new(params),
        };
        technology.update_costs(scene.year)?;

        Ok(technology)
    }

    /// Create a diabatic compressed air energy storage technology based on PNNL data
    pub fn conventional_caes(
        context: &SceneContext,
        reference: &ReferenceData,
        inputs: &TechnologyInputs,
    ) -> Result<Self> {
        Self::with_inputs(context, reference, CONVENTIONAL_CAES_ID, inputs)
    }

    /// The archetype providing the technology's data
    pub fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    /// The year costs are currently expressed in
    pub fn year(&self) -> u32 {
        self.year
    }

    /// Adjust costs to the year of the current scene.
    ///
    /// Costs are always recomputed from the archetype's data, so calling this repeatedly with
    /// the same scene gives identical results.
    pub fn update_scene(&mut self, context: &SceneContext) -> Result<()> {
        let scene = context.current_scene()?;
        self.update_costs(scene.year)
    }

    /// Specific costs at the design given by `params`, expressed in `year` and the currency of
    /// `params`
    fn specific_costs(
        &self,
        params: &StorageParameters<RangeCost>,
        year: u32,
    ) -> Result<SpecificCosts> {
        let archetype = &self.archetype;
        let index_ratio = self.cost_index.ratio(year, archetype.base_year)?;
        let factor = Dimensionless(
            index_ratio * params.rates.factor(archetype.currency, params.currency),
        );

        let (Some(duration), Some(power)) = (params.discharge_duration, params.discharging_power)
        else {
            return Ok((None, None));
        };
        let power_island = archetype
            .power_island_cost_at(duration, power)
            .map(|costs| RangeCost::map(costs, |cost: MoneyPerKilowatt| cost * factor));
        let store = archetype
            .store_cost_at(duration, power)
            .map(|costs| RangeCost::map(costs, |cost: MoneyPerKilowattHour| cost * factor));

        Ok((power_island, store))
    }

    /// Recompute the specific costs for `year`. On failure, nothing is changed.
    fn update_costs(&mut self, year: u32) -> Result<()> {
        let (power_island, store) = self.specific_costs(self.core.params(), year)?;
        if year != self.year {
            debug!(
                "Adjusting costs of {} from {} to {year}",
                self.archetype.id, self.year
            );
        }
        self.year = year;
        self.core.set_specific_costs(power_island, store);

        Ok(())
    }
}

impl StorageTechnology for DataDrivenStorageTechnology {
    type Costs = RangeCost;

    fn core(&self) -> &StorageCore<RangeCost> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StorageCore<RangeCost> {
        &mut self.core
    }

    fn technology_type(&self) -> Option<&str> {
        Some(&self.archetype.technology_type)
    }

    fn model(&self) -> Option<&str> {
        Some(&self.archetype.model)
    }

    /// Replace the design, then interpolate the efficiency and costs at the new design
    fn define_design(&mut self, design: DesignInputs) -> Result<()> {
        ensure!(
            design.roundtrip_efficiency.is_none(),
            StorageError::validation(
                "roundtrip_efficiency",
                "is taken from the archetype's reference data"
            )
        );

        let mut params = self.core.params().clone();
        clear_derived_design(&mut params);
        let mut params = with_performance(&self.archetype, assign(&params, &design.into())?)?;
        let (power_island, store) = self.specific_costs(&params, self.year)?;
        params.power_island_specific_cost = power_island;
        params.store_specific_cost = store;
        self.core.set_params(params);

        Ok(())
    }
}

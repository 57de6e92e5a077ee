//! A storage technology whose parameters are all supplied by the user.
use super::{StorageCore, StorageTechnology, TechnologyInputs};
use crate::costs::PointCost;
use crate::currency::CurrencyRates;
use anyhow::Result;

/// A storage technology described entirely by user inputs, with a single estimate for each cost
#[derive(Debug, Clone)]
pub struct GenericStorageTechnology {
    core: StorageCore<PointCost>,
}

impl GenericStorageTechnology {
    /// Create a technology from the given inputs, using the default exchange rates
    pub fn with_inputs(inputs: &TechnologyInputs) -> Result<Self> {
        Self::with_inputs_and_rates(inputs, CurrencyRates::default())
    }

    /// Create a technology from the given inputs, converting costs with `rates`
    pub fn with_inputs_and_rates(inputs: &TechnologyInputs, rates: CurrencyRates) -> Result<Self> {
        Ok(Self {
            core: StorageCore::with_inputs(inputs, rates)?,
        })
    }

    /// Validate and assign further inputs
    pub fn assign(&mut self, inputs: &TechnologyInputs) -> Result<()> {
        self.core.assign(inputs)
    }
}

impl StorageTechnology for GenericStorageTechnology {
    type Costs = PointCost;

    fn core(&self) -> &StorageCore<PointCost> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StorageCore<PointCost> {
        &mut self.core
    }
}

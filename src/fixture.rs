//! Fixtures for tests

use crate::quantity::Quantity;
use crate::reference::ReferenceData;
use crate::scene::SceneContext;
use crate::technology::TechnologyInputs;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Parse a quantity string, e.g. `"4 hour"`
fn quantity(s: &str) -> Option<Quantity> {
    Some(s.parse().unwrap())
}

/// A fully specified 100 MW/400 MWh technology with an efficiency of 80%.
///
/// The charge duration is not given and is derived as 5 hours.
#[fixture]
pub fn technology_inputs() -> TechnologyInputs {
    TechnologyInputs {
        discharge_duration: quantity("4 hour"),
        discharging_power: quantity("100 MW"),
        charging_power: quantity("100 MW"),
        roundtrip_efficiency: quantity("0.8"),
        power_island_specific_cost: quantity("500 USD/kW"),
        store_specific_cost: quantity("1 USD/kWh"),
        electricity_price: quantity("50 USD/MWh"),
        discount_rate: quantity("0.05"),
        lifetime: Some(10),
        cycles_per_year: Some(100.0),
        ..TechnologyInputs::default()
    }
}

/// Inputs for a 100 MW/400 MWh diabatic CAES plant, leaving data-backed fields unset
#[fixture]
pub fn caes_inputs() -> TechnologyInputs {
    TechnologyInputs {
        discharge_duration: quantity("4 hour"),
        discharging_power: quantity("100 MW"),
        charging_power: quantity("100 MW"),
        electricity_price: quantity("50 USD/MWh"),
        gas_price: quantity("20 USD/MWh"),
        discount_rate: quantity("5 %"),
        lifetime: Some(30),
        cycles_per_year: Some(100.0),
        ..TechnologyInputs::default()
    }
}

#[fixture]
pub fn reference() -> ReferenceData {
    ReferenceData::builtin().unwrap()
}

/// The UK in the base year of the PNNL cost data
#[fixture]
pub fn uk_2023() -> SceneContext {
    SceneContext::new("UK", 2023)
}

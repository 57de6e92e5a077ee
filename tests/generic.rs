//! Integration tests for generic storage technologies.
use float_cmp::assert_approx_eq;
use lcos::quantity::{Quantity, Unit};
use lcos::technology::consistency::DesignField;
use lcos::technology::generic::GenericStorageTechnology;
use lcos::technology::{StorageTechnology, TechnologyInputs};
use lcos::units::MegaWattHours;
use rstest::rstest;

/// A consistent design: 100 MW for 3 h out of 50 MW for 8 h at 75% efficiency
const DESIGN: [f64; 5] = [50.0, 8.0, 100.0, 3.0, 0.75];

/// Inputs with every design value except `missing`
fn design_inputs(missing: Option<DesignField>) -> TechnologyInputs {
    let value = |field, index: usize, unit| {
        (missing != Some(field)).then(|| Quantity::new(DESIGN[index], unit))
    };

    TechnologyInputs {
        charging_power: value(DesignField::ChargingPower, 0, Unit::Megawatt),
        charge_duration: value(DesignField::ChargeDuration, 1, Unit::Hour),
        discharging_power: value(DesignField::DischargingPower, 2, Unit::Megawatt),
        discharge_duration: value(DesignField::DischargeDuration, 3, Unit::Hour),
        roundtrip_efficiency: value(DesignField::RoundtripEfficiency, 4, Unit::Fraction),
        ..TechnologyInputs::default()
    }
}

#[rstest]
#[case(DesignField::ChargingPower)]
#[case(DesignField::ChargeDuration)]
#[case(DesignField::DischargingPower)]
#[case(DesignField::DischargeDuration)]
#[case(DesignField::RoundtripEfficiency)]
fn test_missing_design_value_is_derived(#[case] missing: DesignField) {
    let technology = GenericStorageTechnology::with_inputs(&design_inputs(Some(missing))).unwrap();
    let params = technology.parameters();
    assert_eq!(params.derived_field, Some(missing));

    let derived = [
        params.charging_power.unwrap().0,
        params.charge_duration.unwrap().0,
        params.discharging_power.unwrap().0,
        params.discharge_duration.unwrap().0,
        params.roundtrip_efficiency.unwrap().0,
    ];
    for (actual, expected) in derived.into_iter().zip(DESIGN) {
        assert_approx_eq!(f64, actual, expected, epsilon = 1e-12);
    }

    // Supplying all five values, including the derived one, is consistent
    let inputs = TechnologyInputs {
        charging_power: Some(Quantity::new(derived[0], Unit::Megawatt)),
        charge_duration: Some(Quantity::new(derived[1], Unit::Hour)),
        discharging_power: Some(Quantity::new(derived[2], Unit::Megawatt)),
        discharge_duration: Some(Quantity::new(derived[3], Unit::Hour)),
        roundtrip_efficiency: Some(Quantity::dimensionless(derived[4])),
        ..TechnologyInputs::default()
    };
    let technology = GenericStorageTechnology::with_inputs(&inputs).unwrap();
    assert_eq!(technology.parameters().derived_field, None);
}

#[test]
fn test_inconsistent_design() {
    let inputs = TechnologyInputs {
        roundtrip_efficiency: Some(Quantity::dimensionless(0.9)),
        ..design_inputs(None)
    };
    assert!(GenericStorageTechnology::with_inputs(&inputs).is_err());
}

#[test]
fn test_discharge_only() {
    let inputs = TechnologyInputs {
        discharging_power: Some("100 MW".parse().unwrap()),
        discharge_duration: Some("4 hour".parse().unwrap()),
        electricity_price: Some("50 USD/MWh".parse().unwrap()),
        power_island_specific_cost: Some("500 USD/kW".parse().unwrap()),
        store_specific_cost: Some("20 USD/kWh".parse().unwrap()),
        discount_rate: Some("5 %".parse().unwrap()),
        lifetime: Some(20),
        cycles_per_year: Some(200.0),
        ..TechnologyInputs::default()
    };
    let technology = GenericStorageTechnology::with_inputs(&inputs).unwrap();

    assert_eq!(technology.storage_capacity(), Some(MegaWattHours(400.0)));
    assert!(technology.investment_cost().is_some());
    assert_eq!(technology.input_electricity(), None);
    assert_eq!(technology.output_electricity(), None);
    assert_eq!(technology.levelised_cost_of_storage(), None);
}

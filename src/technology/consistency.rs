//! Consistency between the charge and discharge design of a storage technology.
//!
//! Charging power `P_c`, charge duration `t_c`, discharging power `P_d`, discharge duration
//! `t_d` and round-trip efficiency `η` are bound by `P_d·t_d = η·P_c·t_c`. If all five are known
//! they must satisfy this law; if exactly one is unknown it is solved for.
use crate::error::StorageError;
use crate::units::{Dimensionless, Hours, MegaWatts};
use anyhow::{Result, ensure};
use strum::Display;

/// Relative tolerance when checking the round-trip law
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// The five design values linked by the round-trip law
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Design {
    /// Nominal charging power
    pub charging_power: Option<MegaWatts>,
    /// Nominal charge duration
    pub charge_duration: Option<Hours>,
    /// Nominal discharging power
    pub discharging_power: Option<MegaWatts>,
    /// Nominal discharge duration
    pub discharge_duration: Option<Hours>,
    /// Nominal round-trip efficiency
    pub roundtrip_efficiency: Option<Dimensionless>,
}

/// One of the fields of a [`Design`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
#[allow(missing_docs)]
pub enum DesignField {
    ChargingPower,
    ChargeDuration,
    DischargingPower,
    DischargeDuration,
    RoundtripEfficiency,
}

/// The outcome of reconciling a [`Design`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// All five values were given and they satisfy the round-trip law
    Consistent,
    /// The given field was missing and has been derived
    Derived(DesignField),
    /// Two or more values are missing so nothing was done
    Underdetermined,
}

impl Design {
    /// The fields which have no value
    pub fn missing(&self) -> Vec<DesignField> {
        [
            (DesignField::ChargingPower, self.charging_power.is_none()),
            (DesignField::ChargeDuration, self.charge_duration.is_none()),
            (DesignField::DischargingPower, self.discharging_power.is_none()),
            (DesignField::DischargeDuration, self.discharge_duration.is_none()),
            (
                DesignField::RoundtripEfficiency,
                self.roundtrip_efficiency.is_none(),
            ),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }

    /// Remove the value of one field
    pub fn clear(&mut self, field: DesignField) {
        match field {
            DesignField::ChargingPower => self.charging_power = None,
            DesignField::ChargeDuration => self.charge_duration = None,
            DesignField::DischargingPower => self.discharging_power = None,
            DesignField::DischargeDuration => self.discharge_duration = None,
            DesignField::RoundtripEfficiency => self.roundtrip_efficiency = None,
        }
    }
}

/// Check a design against the round-trip law or fill in its single missing value.
///
/// Returns the (possibly completed) design along with what was done. Fails with
/// [`StorageError::InconsistentDesign`] if all five values are given but contradict each other,
/// or if the missing value cannot be determined (e.g. it would require dividing by zero).
pub fn reconcile(design: Design) -> Result<(Design, Resolution)> {
    let missing = design.missing();
    let mut resolved = design;
    let p_c = design.charging_power.map_or(0.0, |x| x.0);
    let t_c = design.charge_duration.map_or(0.0, |x| x.0);
    let p_d = design.discharging_power.map_or(0.0, |x| x.0);
    let t_d = design.discharge_duration.map_or(0.0, |x| x.0);
    let eta = design.roundtrip_efficiency.map_or(0.0, |x| x.0);

    let resolution = match missing[..] {
        [] => {
            let output = p_d * t_d;
            let input = p_c * t_c;
            ensure!(
                is_close(output, eta * input),
                StorageError::InconsistentDesign(format!(
                    "discharged energy {output} MWh differs from {eta} x charged energy {input} MWh"
                ))
            );
            Resolution::Consistent
        }
        [field] => {
            let value = match field {
                DesignField::ChargingPower => p_d * t_d / (eta * t_c),
                DesignField::ChargeDuration => p_d * t_d / (eta * p_c),
                DesignField::DischargingPower => eta * p_c * t_c / t_d,
                DesignField::DischargeDuration => eta * p_c * t_c / p_d,
                DesignField::RoundtripEfficiency => p_d * t_d / (p_c * t_c),
            };
            ensure!(
                value.is_finite(),
                StorageError::InconsistentDesign(format!(
                    "{field} cannot be derived from the other design values"
                ))
            );

            match field {
                DesignField::ChargingPower => resolved.charging_power = Some(MegaWatts(value)),
                DesignField::ChargeDuration => resolved.charge_duration = Some(Hours(value)),
                DesignField::DischargingPower => {
                    resolved.discharging_power = Some(MegaWatts(value));
                }
                DesignField::DischargeDuration => {
                    resolved.discharge_duration = Some(Hours(value));
                }
                DesignField::RoundtripEfficiency => {
                    resolved.roundtrip_efficiency = Some(Dimensionless(value));
                }
            }
            Resolution::Derived(field)
        }
        _ => Resolution::Underdetermined,
    };

    Ok((resolved, resolution))
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
}

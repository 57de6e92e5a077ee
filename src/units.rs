//! This module defines the unit types used inside the storage models and their conversions.
//!
//! Quantities supplied by users are converted into these types at the boundary of the model
//! (see [`crate::quantity`]). Durations are held in hours, powers in MW and energies in MWh, as
//! these are the units the cost data are quoted in.
use float_cmp::{ApproxEq, F64Margin};
use std::fmt::Debug;

/// Number of hours in a (non-leap) year
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Number of kW in a MW (and kWh in a MWh)
const KILO_PER_MEGA: f64 = 1e3;

/// Common behaviour for all unit types
pub trait UnitType: Copy + Debug + PartialEq + PartialOrd {
    /// Create a new instance of the unit type from a f64 value
    fn new(value: f64) -> Self;

    /// Returns the value of the unit type as a f64
    fn value(&self) -> f64;
}

/// Represents a dimensionless quantity.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    derive_more::Add,
    derive_more::Sub,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    /// Raise to an integer power
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless(self.0.powi(rhs))
    }

    /// Raise to a floating-point power
    pub fn powf(self, rhs: f64) -> Self {
        Dimensionless(self.0.powf(rhs))
    }
}

impl UnitType for Dimensionless {
    fn new(value: f64) -> Self {
        Self(value)
    }

    fn value(&self) -> f64 {
        self.0
    }
}

impl ApproxEq for Dimensionless {
    type Margin = F64Margin;

    fn approx_eq<T: Into<Self::Margin>>(self, other: Self, margin: T) -> bool {
        self.0.approx_eq(other.0, margin)
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl UnitType for $name {
            fn new(value: f64) -> Self {
                Self(value)
            }

            fn value(&self) -> f64 {
                self.0
            }
        }

        impl $name {
            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<T: Into<Self::Margin>>(self, other: Self, margin: T) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                $name(iter.map(|x| x.0).sum())
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

/// Multiplication rules which switch between kilo- and mega- prefixes
macro_rules! impl_mul_kilo {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * KILO_PER_MEGA * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * KILO_PER_MEGA * lhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Hours);
unit_struct!(MegaWatts);
unit_struct!(MegaWattHours);
unit_struct!(Money);

// Derived quantities
unit_struct!(MoneyPerKilowatt);
unit_struct!(MoneyPerKilowattHour);
unit_struct!(MoneyPerMegaWattHour);

// Division rules
impl_div!(MegaWattHours, Hours, MegaWatts);
impl_div!(MegaWattHours, MegaWatts, Hours);
impl_div!(Money, MegaWattHours, MoneyPerMegaWattHour);

// Multiplication rules
impl_mul!(MegaWatts, Hours, MegaWattHours);
impl_mul!(MoneyPerMegaWattHour, MegaWattHours, Money);
impl_mul_kilo!(MegaWatts, MoneyPerKilowatt, Money);
impl_mul_kilo!(MegaWattHours, MoneyPerKilowattHour, Money);

/// Convert a loss rate quoted over one period into a rate over another period.
///
/// Implements `r_out = -ratio * ln(1 - r_in)`, where `ratio` is the length of the output period
/// divided by the length of the input period. For example, a self-discharge rate of 5% per day
/// is converted to a rate per hour with `convert_rate(Dimensionless(0.05), 1.0 / 24.0)`.
pub fn convert_rate(rate: Dimensionless, output_input_ratio: f64) -> Dimensionless {
    Dimensionless(-output_input_ratio * (1.0 - rate.0).ln())
}

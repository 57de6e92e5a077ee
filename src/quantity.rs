//! Quantities tagged with a unit of measure.
//!
//! This is the boundary through which values enter the storage models: a [`Quantity`] can be
//! given in any unit of the right dimension (e.g. a duration in seconds, hours or days) and is
//! converted to the unit the model works in. Supplying a quantity of the wrong dimension yields
//! [`StorageError::IncompatibleUnit`].
use crate::currency::{Currency, CurrencyRates};
use crate::error::StorageError;
use crate::units::UnitType;
use anyhow::{Context, Result, bail, ensure};
use serde::de::{Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum::Display;

/// The physical dimension of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    /// A duration
    Time,
    /// A rate of energy transfer
    Power,
    /// An amount of energy
    Energy,
    /// A pure number (fractions, efficiencies, ratios)
    Dimensionless,
    /// A fraction per unit time
    Rate,
    /// Money per unit of power capacity
    PowerSpecificCost,
    /// Money per unit of energy capacity
    EnergySpecificCost,
    /// Money per unit of energy consumed or produced
    EnergyPrice,
}

/// A unit of measure.
///
/// Each dimension has a canonical unit, which matches the types in [`crate::units`]: hours, MW,
/// MWh, fractions, fractions per hour, currency per kW, currency per kWh and currency per MWh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Year,
    Watt,
    Kilowatt,
    Megawatt,
    Gigawatt,
    KilowattHour,
    MegawattHour,
    GigawattHour,
    Fraction,
    Percent,
    PerHour,
    PercentPerHour,
    PerDay,
    PercentPerDay,
    PerKilowatt(Currency),
    PerKilowattHour(Currency),
    PerMegawattHour(Currency),
}

impl Unit {
    /// The dimension of this unit
    pub fn dimension(self) -> Dimension {
        match self {
            Self::Second | Self::Minute | Self::Hour | Self::Day | Self::Year => Dimension::Time,
            Self::Watt | Self::Kilowatt | Self::Megawatt | Self::Gigawatt => Dimension::Power,
            Self::KilowattHour | Self::MegawattHour | Self::GigawattHour => Dimension::Energy,
            Self::Fraction | Self::Percent => Dimension::Dimensionless,
            Self::PerHour | Self::PercentPerHour | Self::PerDay | Self::PercentPerDay => {
                Dimension::Rate
            }
            Self::PerKilowatt(_) => Dimension::PowerSpecificCost,
            Self::PerKilowattHour(_) => Dimension::EnergySpecificCost,
            Self::PerMegawattHour(_) => Dimension::EnergyPrice,
        }
    }

    /// The currency of a monetary unit
    pub fn currency(self) -> Option<Currency> {
        match self {
            Self::PerKilowatt(currency)
            | Self::PerKilowattHour(currency)
            | Self::PerMegawattHour(currency) => Some(currency),
            _ => None,
        }
    }

    /// The factor converting a magnitude in this unit to the canonical unit of its dimension
    fn scale(self) -> f64 {
        match self {
            Self::Second => 1.0 / 3600.0,
            Self::Minute => 1.0 / 60.0,
            Self::Hour => 1.0,
            Self::Day => 24.0,
            Self::Year => 8760.0,
            Self::Watt => 1e-6,
            Self::Kilowatt | Self::KilowattHour => 1e-3,
            Self::Megawatt | Self::MegawattHour => 1.0,
            Self::Gigawatt | Self::GigawattHour => 1e3,
            Self::Fraction | Self::PerHour => 1.0,
            Self::Percent | Self::PercentPerHour => 1e-2,
            Self::PerDay => 1.0 / 24.0,
            Self::PercentPerDay => 1e-2 / 24.0,
            Self::PerKilowatt(_) | Self::PerKilowattHour(_) | Self::PerMegawattHour(_) => 1.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            Self::Second => "s",
            Self::Minute => "min",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Year => "year",
            Self::Watt => "W",
            Self::Kilowatt => "kW",
            Self::Megawatt => "MW",
            Self::Gigawatt => "GW",
            Self::KilowattHour => "kWh",
            Self::MegawattHour => "MWh",
            Self::GigawattHour => "GWh",
            Self::Fraction => "-",
            Self::Percent => "%",
            Self::PerHour => "1/hour",
            Self::PercentPerHour => "%/hour",
            Self::PerDay => "1/day",
            Self::PercentPerDay => "%/day",
            Self::PerKilowatt(currency) => return write!(f, "{currency}/kW"),
            Self::PerKilowattHour(currency) => return write!(f, "{currency}/kWh"),
            Self::PerMegawattHour(currency) => return write!(f, "{currency}/MWh"),
        };
        write!(f, "{symbol}")
    }
}

impl FromStr for Unit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        // Monetary units, e.g. "USD/kW"
        if let Some((numerator, denominator)) = s.split_once('/')
            && let Ok(currency) = Currency::from_str(numerator.trim())
        {
            return match denominator.trim() {
                "kW" => Ok(Self::PerKilowatt(currency)),
                "kWh" => Ok(Self::PerKilowattHour(currency)),
                "MWh" => Ok(Self::PerMegawattHour(currency)),
                _ => bail!("Unknown unit: {s}"),
            };
        }

        let unit = match s {
            "s" | "second" | "seconds" => Self::Second,
            "min" | "minute" | "minutes" => Self::Minute,
            "h" | "hour" | "hours" => Self::Hour,
            "day" | "days" => Self::Day,
            "year" | "years" => Self::Year,
            "W" => Self::Watt,
            "kW" => Self::Kilowatt,
            "MW" => Self::Megawatt,
            "GW" => Self::Gigawatt,
            "kWh" => Self::KilowattHour,
            "MWh" => Self::MegawattHour,
            "GWh" => Self::GigawattHour,
            "" | "-" | "fraction" => Self::Fraction,
            "%" | "percent" => Self::Percent,
            "1/h" | "1/hour" => Self::PerHour,
            "%/h" | "%/hour" => Self::PercentPerHour,
            "1/day" => Self::PerDay,
            "%/day" => Self::PercentPerDay,
            _ => bail!("Unknown unit: {s}"),
        };

        Ok(unit)
    }
}

impl Serialize for Unit {
    fn serialize<S>(&self, serialiser: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialiser.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D>(deserialiser: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserialiser)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A numeric value tagged with its unit of measure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    /// Create a new [`Quantity`]
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// A pure number
    pub fn dimensionless(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::Fraction)
    }

    /// The bare magnitude, in this quantity's unit
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// The unit this quantity is expressed in
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Convert to another unit of the same dimension.
    ///
    /// Monetary quantities can only be converted within the same currency; use
    /// [`Quantity::to_with_rates`] to change currency.
    pub fn to(&self, unit: Unit) -> Result<Quantity> {
        self.check_dimension(unit)?;
        ensure!(
            self.unit.currency() == unit.currency(),
            self.incompatible(unit)
        );

        Ok(self.rescale(unit, 1.0))
    }

    /// Convert to another unit of the same dimension, changing currency if needed
    pub fn to_with_rates(&self, unit: Unit, rates: &CurrencyRates) -> Result<Quantity> {
        self.check_dimension(unit)?;
        let factor = match (self.unit.currency(), unit.currency()) {
            (Some(from), Some(to)) => rates.factor(from, to),
            _ => 1.0,
        };

        Ok(self.rescale(unit, factor))
    }

    /// Convert to `unit` and wrap the magnitude in the corresponding model unit type
    pub fn to_unit<T: UnitType>(&self, unit: Unit) -> Result<T> {
        Ok(T::new(self.to(unit)?.magnitude))
    }

    fn check_dimension(&self, unit: Unit) -> Result<()> {
        ensure!(
            self.unit.dimension() == unit.dimension(),
            self.incompatible(unit)
        );

        Ok(())
    }

    fn incompatible(&self, unit: Unit) -> StorageError {
        StorageError::IncompatibleUnit {
            unit: self.unit.to_string(),
            expected: unit.dimension(),
        }
    }

    fn rescale(&self, unit: Unit, factor: f64) -> Quantity {
        let magnitude = self.magnitude * self.unit.scale() / unit.scale() * factor;
        Quantity::new(magnitude, unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

impl FromStr for Quantity {
    type Err = anyhow::Error;

    /// Parse strings like `"4 hour"`, `"100 MW"`, `"500 USD/kW"` or `"0.035"`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (value, unit) = match s.split_once(char::is_whitespace) {
            Some((value, unit)) => (value, unit.parse()?),
            None => match s.strip_suffix('%') {
                Some(value) => (value, Unit::Percent),
                None => (s, Unit::Fraction),
            },
        };
        let magnitude = value
            .parse()
            .with_context(|| format!("Invalid quantity: {s}"))?;

        Ok(Quantity::new(magnitude, unit))
    }
}

/// Quantities in input files are either a bare number or a string with a unit
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum QuantityRaw {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserialiser: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match QuantityRaw::deserialize(deserialiser)? {
            QuantityRaw::Number(value) => Ok(Quantity::dimensionless(value)),
            QuantityRaw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Hours, MegaWatts};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Quantity::new(4.0 * 3600.0, Unit::Second), Unit::Hour, 4.0)]
    #[case(Quantity::new(2.0, Unit::Day), Unit::Hour, 48.0)]
    #[case(Quantity::new(100e6, Unit::Watt), Unit::Megawatt, 100.0)]
    #[case(Quantity::new(1.5, Unit::Gigawatt), Unit::Kilowatt, 1.5e6)]
    #[case(Quantity::new(3.5, Unit::Percent), Unit::Fraction, 0.035)]
    #[case(Quantity::new(0.5, Unit::PercentPerHour), Unit::PerHour, 0.005)]
    #[case(Quantity::new(2.4, Unit::PerDay), Unit::PerHour, 0.1)]
    #[case(Quantity::new(1.0, Unit::Year), Unit::Hour, 8760.0)]
    fn test_to(#[case] quantity: Quantity, #[case] unit: Unit, #[case] expected: f64) {
        let converted = quantity.to(unit).unwrap();
        assert_eq!(converted.unit(), unit);
        assert_approx_eq!(f64, converted.magnitude(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_to_incompatible_dimension() {
        let err = Quantity::new(1.0, Unit::Hour)
            .to(Unit::Megawatt)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StorageError>(),
            Some(&StorageError::IncompatibleUnit {
                unit: "hour".into(),
                expected: Dimension::Power
            })
        );
    }

    #[test]
    fn test_to_other_currency_needs_rates() {
        let price = Quantity::new(80.0, Unit::PerMegawattHour(Currency::GBP));
        assert!(price.to(Unit::PerMegawattHour(Currency::USD)).is_err());

        let rates = CurrencyRates {
            usd: 1.0,
            gbp: 0.8,
            eur: 0.9,
        };
        let converted = price
            .to_with_rates(Unit::PerMegawattHour(Currency::USD), &rates)
            .unwrap();
        assert_approx_eq!(f64, converted.magnitude(), 100.0);
    }

    #[test]
    fn test_to_unit() {
        let hours: Hours = Quantity::new(90.0, Unit::Minute).to_unit(Unit::Hour).unwrap();
        assert_eq!(hours, Hours(1.5));
        let power: MegaWatts = Quantity::new(250.0, Unit::Kilowatt)
            .to_unit(Unit::Megawatt)
            .unwrap();
        assert_eq!(power, MegaWatts(0.25));
    }

    #[rstest]
    #[case("4 hour", Quantity::new(4.0, Unit::Hour))]
    #[case(" 100 MW ", Quantity::new(100.0, Unit::Megawatt))]
    #[case("500 USD/kW", Quantity::new(500.0, Unit::PerKilowatt(Currency::USD)))]
    #[case("79.68 GBP/MWh", Quantity::new(79.68, Unit::PerMegawattHour(Currency::GBP)))]
    #[case("0.5 %/hour", Quantity::new(0.5, Unit::PercentPerHour))]
    #[case("3.5%", Quantity::new(3.5, Unit::Percent))]
    #[case("0.035", Quantity::new(0.035, Unit::Fraction))]
    fn test_quantity_from_str(#[case] s: &str, #[case] expected: Quantity) {
        assert_eq!(s.parse::<Quantity>().unwrap(), expected);
    }

    #[rstest]
    #[case("four hours")]
    #[case("4 fortnights")]
    #[case("10 JPY/kW")]
    #[case("10 USD/GW")]
    fn test_quantity_from_str_invalid(#[case] s: &str) {
        assert!(s.parse::<Quantity>().is_err());
    }

    #[test]
    fn test_unit_display_round_trip() {
        for unit in [
            Unit::Second,
            Unit::Hour,
            Unit::Megawatt,
            Unit::MegawattHour,
            Unit::Percent,
            Unit::PercentPerDay,
            Unit::PerKilowattHour(Currency::EUR),
        ] {
            assert_eq!(unit.to_string().parse::<Unit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_deserialise_quantity() {
        #[derive(serde::Deserialize)]
        struct Record {
            duration: Quantity,
            rate: Quantity,
        }

        let record: Record = toml::from_str("duration = \"12 hour\"\nrate = 0.035").unwrap();
        assert_eq!(record.duration, Quantity::new(12.0, Unit::Hour));
        assert_eq!(record.rate, Quantity::dimensionless(0.035));
    }
}

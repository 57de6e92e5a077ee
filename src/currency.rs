//! Currencies and the exchange rates used to convert between them.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A currency in which costs and prices can be expressed
#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Deserialize,
    Serialize,
)]
pub enum Currency {
    /// US dollar
    #[default]
    USD,
    /// Pound sterling
    GBP,
    /// Euro
    EUR,
}

/// Exchange rates, expressed as units of each currency per US dollar
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct CurrencyRates {
    /// Dollars per dollar (normally 1)
    pub usd: f64,
    /// Pounds per dollar
    pub gbp: f64,
    /// Euros per dollar
    pub eur: f64,
}

impl Default for CurrencyRates {
    fn default() -> Self {
        Self {
            usd: 1.0,
            gbp: 0.79,
            eur: 0.92,
        }
    }
}

impl CurrencyRates {
    /// Units of `currency` per US dollar
    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::USD => self.usd,
            Currency::GBP => self.gbp,
            Currency::EUR => self.eur,
        }
    }

    /// The factor by which an amount in `from` must be multiplied to express it in `to`
    pub fn factor(&self, from: Currency, to: Currency) -> f64 {
        if from == to {
            return 1.0;
        }

        self.rate(to) / self.rate(from)
    }
}

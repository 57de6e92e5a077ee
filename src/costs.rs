//! How costs are represented by the different kinds of storage technology.
//!
//! User-specified technologies carry a single value for each cost ([`PointCost`]), whereas
//! technologies derived from reference data carry a low, base and high estimate
//! ([`RangeCost`]). Code which computes derived costs is written once against [`CostModel`].
use std::fmt::Debug;

/// Types which can be held in a cost value
pub trait CostScalar: Copy + Debug + PartialEq {}

impl<T: Copy + Debug + PartialEq> CostScalar for T {}

/// The shape of the cost values held by a technology
pub trait CostModel: Debug + Clone + Default + PartialEq {
    /// A cost value holding one or more estimates of type `T`
    type Value<T: CostScalar>: CostScalar;

    /// Apply `f` to every estimate
    fn map<T: CostScalar, U: CostScalar>(
        value: Self::Value<T>,
        f: impl Fn(T) -> U,
    ) -> Self::Value<U>;

    /// Combine two cost values estimate-by-estimate
    fn zip<T: CostScalar, U: CostScalar, V: CostScalar>(
        lhs: Self::Value<T>,
        rhs: Self::Value<U>,
        f: impl Fn(T, U) -> V,
    ) -> Self::Value<V>;

    /// A cost value with the same estimate in every case
    fn uniform<T: CostScalar>(value: T) -> Self::Value<T>;

    /// The estimates with a label for each, in order
    fn cases<T: CostScalar>(value: Self::Value<T>) -> Vec<(&'static str, T)>;
}

/// A single cost estimate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCost;

impl CostModel for PointCost {
    type Value<T: CostScalar> = T;

    fn map<T: CostScalar, U: CostScalar>(value: T, f: impl Fn(T) -> U) -> U {
        f(value)
    }

    fn zip<T: CostScalar, U: CostScalar, V: CostScalar>(
        lhs: T,
        rhs: U,
        f: impl Fn(T, U) -> V,
    ) -> V {
        f(lhs, rhs)
    }

    fn uniform<T: CostScalar>(value: T) -> T {
        value
    }

    fn cases<T: CostScalar>(value: T) -> Vec<(&'static str, T)> {
        vec![("base", value)]
    }
}

/// Low, base and high cost estimates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeCost;

/// A cost given as a range of estimates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRange<T> {
    /// Optimistic estimate
    pub low: T,
    /// Central estimate
    pub base: T,
    /// Pessimistic estimate
    pub high: T,
}

impl<T> CostRange<T> {
    /// Create a new [`CostRange`]
    pub fn new(low: T, base: T, high: T) -> Self {
        Self { low, base, high }
    }

    /// A range with all three estimates present, or `None` if any is missing
    pub fn from_options(low: Option<T>, base: Option<T>, high: Option<T>) -> Option<Self> {
        Some(Self::new(low?, base?, high?))
    }
}

impl CostModel for RangeCost {
    type Value<T: CostScalar> = CostRange<T>;

    fn map<T: CostScalar, U: CostScalar>(value: CostRange<T>, f: impl Fn(T) -> U) -> CostRange<U> {
        CostRange::new(f(value.low), f(value.base), f(value.high))
    }

    fn zip<T: CostScalar, U: CostScalar, V: CostScalar>(
        lhs: CostRange<T>,
        rhs: CostRange<U>,
        f: impl Fn(T, U) -> V,
    ) -> CostRange<V> {
        CostRange::new(
            f(lhs.low, rhs.low),
            f(lhs.base, rhs.base),
            f(lhs.high, rhs.high),
        )
    }

    fn uniform<T: CostScalar>(value: T) -> CostRange<T> {
        CostRange::new(value, value, value)
    }

    fn cases<T: CostScalar>(value: CostRange<T>) -> Vec<(&'static str, T)> {
        vec![("low", value.low), ("base", value.base), ("high", value.high)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{MegaWatts, Money, MoneyPerKilowatt};

    #[test]
    fn test_point_cost() {
        let cost = PointCost::map(MoneyPerKilowatt(500.0), |c| MegaWatts(100.0) * c);
        assert_eq!(cost, Money(5e7));
        assert_eq!(PointCost::cases(cost), vec![("base", Money(5e7))]);
    }

    #[test]
    fn test_range_cost() {
        let sic = CostRange::new(
            MoneyPerKilowatt(900.0),
            MoneyPerKilowatt(1000.0),
            MoneyPerKilowatt(1100.0),
        );
        let extra = CostRange::new(Money(1.0), Money(2.0), Money(3.0));
        let total = RangeCost::zip(sic, extra, |c, m| MegaWatts(1.0) * c + m);
        assert_eq!(
            total,
            CostRange::new(Money(900_001.0), Money(1_000_002.0), Money(1_100_003.0))
        );
        assert_eq!(
            RangeCost::cases(total)
                .into_iter()
                .map(|(label, _)| label)
                .collect::<Vec<_>>(),
            ["low", "base", "high"]
        );
    }

    #[test]
    fn test_from_options() {
        assert_eq!(
            CostRange::from_options(Some(1.0), Some(2.0), Some(3.0)),
            Some(CostRange::new(1.0, 2.0, 3.0))
        );
        assert_eq!(CostRange::from_options(Some(1.0), None, Some(3.0)), None);
    }
}

//! Per-gateway airtime accounting.
//!
//! A gateway listens on six logical channels, one per spreading factor
//! (SF 7 through SF 12). Every device connected at SF `s` consumes a
//! fraction `airtime(s) / period` of the SF-`s` channel. The channel is
//! saturated once the accumulated fraction reaches 1.0, which is the
//! duty-cycle limit.

use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use super::topology::{MAX_SF, MIN_SF, SF_COUNT};

/// Component value above which a gateway counts as used.
pub const USED_THRESHOLD: f64 = 1e-7;

/// Component value at which a channel is saturated.
pub const FULL_THRESHOLD: f64 = 1.0;

/// Fractional channel occupancy of a gateway, one component per SF.
///
/// # Ordering
///
/// `UtilizationFactor` is only partially ordered: `a < b` holds when every
/// component of `a` is strictly below the matching component of `b`, and
/// `a > b` when every component is strictly above. Mixed vectors are
/// incomparable.
///
/// # Examples
///
/// ```
/// use u_gateplan::model::UtilizationFactor;
///
/// let mut uf = UtilizationFactor::with_sf(9, 0.4);
/// uf += UtilizationFactor::with_sf(9, 0.5);
/// assert!(!uf.is_full());
/// uf += UtilizationFactor::with_sf(9, 0.1);
/// assert!(uf.is_full());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UtilizationFactor {
    values: [f64; SF_COUNT],
}

/// Maps an SF to its component index.
///
/// # Panics
/// Panics if `sf` is outside 7..=12.
fn sf_index(sf: u8) -> usize {
    assert!(
        (MIN_SF..=MAX_SF).contains(&sf),
        "spreading factor {sf} outside {MIN_SF}..={MAX_SF}"
    );
    (sf - MIN_SF) as usize
}

impl UtilizationFactor {
    /// All components zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A factor with only the `sf` component set.
    ///
    /// # Panics
    /// Panics if `sf` is outside 7..=12.
    pub fn with_sf(sf: u8, value: f64) -> Self {
        let mut uf = Self::zero();
        uf.values[sf_index(sf)] = value;
        uf
    }

    /// Builds a factor from its six components (SF 7 first).
    pub fn from_values(values: [f64; SF_COUNT]) -> Self {
        Self { values }
    }

    /// Component for `sf`.
    pub fn value(&self, sf: u8) -> f64 {
        self.values[sf_index(sf)]
    }

    /// Overwrites the component for `sf`.
    pub fn set(&mut self, sf: u8, value: f64) {
        self.values[sf_index(sf)] = value;
    }

    /// All six components, SF 7 first.
    pub fn values(&self) -> &[f64; SF_COUNT] {
        &self.values
    }

    /// True if any channel reached the duty-cycle limit.
    pub fn is_full(&self) -> bool {
        self.values.iter().any(|&v| v >= FULL_THRESHOLD)
    }

    /// True if any channel carries traffic.
    pub fn is_used(&self) -> bool {
        self.values.iter().any(|&v| v > USED_THRESHOLD)
    }

    /// Largest component.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

impl Add for UtilizationFactor {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl AddAssign for UtilizationFactor {
    fn add_assign(&mut self, other: Self) {
        for (a, b) in self.values.iter_mut().zip(other.values) {
            *a += b;
        }
    }
}

impl Sub for UtilizationFactor {
    type Output = Self;

    fn sub(mut self, other: Self) -> Self {
        self -= other;
        self
    }
}

impl SubAssign for UtilizationFactor {
    fn sub_assign(&mut self, other: Self) {
        for (a, b) in self.values.iter_mut().zip(other.values) {
            *a -= b;
        }
    }
}

impl PartialOrd for UtilizationFactor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        let pairs = || self.values.iter().zip(other.values.iter());
        if pairs().all(|(a, b)| a < b) {
            Some(Ordering::Less)
        } else if pairs().all(|(a, b)| a > b) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn close(a: &UtilizationFactor, b: &UtilizationFactor) -> bool {
        a.values()
            .iter()
            .zip(b.values())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn test_zero_is_unused_and_not_full() {
        let uf = UtilizationFactor::zero();
        assert!(!uf.is_used());
        assert!(!uf.is_full());
        assert_eq!(uf.max(), 0.0);
    }

    #[test]
    fn test_with_sf_sets_single_component() {
        let uf = UtilizationFactor::with_sf(10, 0.25);
        assert_eq!(uf.value(10), 0.25);
        for sf in [7, 8, 9, 11, 12] {
            assert_eq!(uf.value(sf), 0.0);
        }
        assert!((uf.max() - 0.25).abs() < EPS);
    }

    #[test]
    fn test_full_at_exactly_one() {
        let uf = UtilizationFactor::with_sf(12, 1.0);
        assert!(uf.is_full());
        let uf = UtilizationFactor::with_sf(12, 0.999_999);
        assert!(!uf.is_full());
    }

    #[test]
    fn test_used_threshold() {
        assert!(!UtilizationFactor::with_sf(7, 1e-8).is_used());
        assert!(UtilizationFactor::with_sf(7, 1e-6).is_used());
    }

    #[test]
    fn test_partial_order() {
        let low = UtilizationFactor::from_values([0.1; SF_COUNT]);
        let high = UtilizationFactor::from_values([0.2; SF_COUNT]);
        let mixed = UtilizationFactor::from_values([0.3, 0.1, 0.1, 0.1, 0.1, 0.1]);
        assert!(low < high);
        assert!(high > low);
        assert!(low <= low);
        assert_eq!(low.partial_cmp(&mixed), None);
        assert!(!(low < mixed) && !(low > mixed));
    }

    #[test]
    fn test_set_overwrites() {
        let mut uf = UtilizationFactor::with_sf(8, 0.5);
        uf.set(8, 0.1);
        assert_eq!(uf.value(8), 0.1);
    }

    #[test]
    #[should_panic(expected = "outside 7..=12")]
    fn test_invalid_sf_panics() {
        UtilizationFactor::with_sf(13, 0.1);
    }

    fn arb_uf() -> impl Strategy<Value = UtilizationFactor> {
        prop::array::uniform6(0.0f64..2.0).prop_map(UtilizationFactor::from_values)
    }

    proptest! {
        #[test]
        fn prop_add_then_sub_restores(a in arb_uf(), b in arb_uf()) {
            prop_assert!(close(&((a + b) - b), &a));
        }

        #[test]
        fn prop_zero_is_identity(a in arb_uf()) {
            prop_assert_eq!(a + UtilizationFactor::zero(), a);
        }

        #[test]
        fn prop_full_iff_some_component_reaches_one(a in arb_uf()) {
            let expected = a.values().iter().any(|&v| v >= 1.0);
            prop_assert_eq!(a.is_full(), expected);
        }

        #[test]
        fn prop_max_bounds_every_component(a in arb_uf()) {
            let m = a.max();
            prop_assert!(a.values().iter().all(|&v| v <= m));
        }
    }
}

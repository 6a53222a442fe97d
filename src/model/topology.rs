//! Reachability and reporting-period model of a deployment.
//!
//! The topology is the read-only input every solver works against: for each
//! end-device, the smallest spreading factor at which each gateway hears it,
//! and the device's reporting period. Generating or loading topologies is
//! left to callers; this type only validates and answers queries.

use rand::Rng;

use super::allocation::Link;
use super::uf::UtilizationFactor;
use crate::error::{PlanError, Result};

/// Smallest spreading factor.
pub const MIN_SF: u8 = 7;

/// Largest spreading factor.
pub const MAX_SF: u8 = 12;

/// Number of spreading factors (and of utilization channels).
pub const SF_COUNT: usize = (MAX_SF - MIN_SF + 1) as usize;

/// Marker for a gateway that cannot hear a device at any SF.
pub const SF_UNREACHABLE: u8 = u8::MAX;

/// Time-on-air units for one uplink at `sf`: `2^(sf - 7)`.
///
/// Doubles as the per-uplink energy cost.
pub fn airtime(sf: u8) -> u32 {
    debug_assert!((MIN_SF..=MAX_SF).contains(&sf));
    1 << (sf - MIN_SF)
}

/// Largest SF a device may use given its reporting period.
///
/// Longer periods tolerate longer airtime. Returns 0 when the period is too
/// short for any SF.
pub fn max_sf_for_period(period: u32) -> u8 {
    match period {
        p if p >= 3200 => 12,
        p if p >= 1600 => 11,
        p if p >= 800 => 10,
        p if p >= 400 => 9,
        p if p >= 200 => 8,
        p if p >= 100 => 7,
        _ => 0,
    }
}

/// Immutable deployment instance.
///
/// # Examples
///
/// ```
/// use u_gateplan::model::Topology;
///
/// // Two devices, two gateways.
/// let topo = Topology::new(vec![vec![7, 9], vec![8, 7]], vec![3200, 3200]).unwrap();
/// assert_eq!(topo.candidate_gateways(0), &[0, 1]);
/// assert_eq!(topo.max_sf(1), 12);
/// assert_eq!(topo.reachable_devices(1, 7), vec![1]);
/// ```
///
/// With the `serde` feature the topology serializes as its input matrix and
/// periods; deserializing goes through [`Topology::new`], so invalid
/// instances are rejected there too.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "TopologyData", into = "TopologyData")
)]
pub struct Topology {
    gateway_count: usize,
    /// Row-major `device × gateway` minimum SF.
    min_sf: Vec<u8>,
    periods: Vec<u32>,
    max_sf: Vec<u8>,
    candidates: Vec<Vec<usize>>,
}

impl Topology {
    /// Builds a topology from a `device × gateway` minimum-SF matrix and the
    /// per-device reporting periods.
    ///
    /// Entries above 12 mean "unreachable".
    ///
    /// # Errors
    /// - [`PlanError::DimensionMismatch`] if rows and periods disagree or
    ///   rows have different lengths.
    /// - [`PlanError::InvalidSpreadingFactor`] for entries below 7.
    /// - [`PlanError::NoReachableGateway`] if a device has no candidate
    ///   gateway.
    pub fn new(min_sf: Vec<Vec<u8>>, periods: Vec<u32>) -> Result<Self> {
        if min_sf.len() != periods.len() {
            return Err(PlanError::DimensionMismatch {
                what: "periods",
                expected: min_sf.len(),
                found: periods.len(),
            });
        }
        let gateway_count = min_sf.first().map_or(0, Vec::len);

        let mut flat = Vec::with_capacity(min_sf.len() * gateway_count);
        for (device, row) in min_sf.iter().enumerate() {
            if row.len() != gateway_count {
                return Err(PlanError::DimensionMismatch {
                    what: "reachability row",
                    expected: gateway_count,
                    found: row.len(),
                });
            }
            for (gateway, &value) in row.iter().enumerate() {
                if value < MIN_SF {
                    return Err(PlanError::InvalidSpreadingFactor {
                        device,
                        gateway,
                        value,
                    });
                }
                flat.push(if value > MAX_SF { SF_UNREACHABLE } else { value });
            }
        }

        let max_sf: Vec<u8> = periods.iter().map(|&p| max_sf_for_period(p)).collect();
        let mut candidates = Vec::with_capacity(periods.len());
        for device in 0..periods.len() {
            let row = &flat[device * gateway_count..(device + 1) * gateway_count];
            let list: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|&(_, &sf)| sf <= max_sf[device])
                .map(|(g, _)| g)
                .collect();
            if list.is_empty() {
                return Err(PlanError::NoReachableGateway { device });
            }
            candidates.push(list);
        }

        Ok(Self {
            gateway_count,
            min_sf: flat,
            periods,
            max_sf,
            candidates,
        })
    }

    /// Number of end-devices.
    pub fn device_count(&self) -> usize {
        self.periods.len()
    }

    /// Number of gateways.
    pub fn gateway_count(&self) -> usize {
        self.gateway_count
    }

    /// Smallest SF at which `gateway` hears `device`, or [`SF_UNREACHABLE`].
    pub fn min_sf(&self, device: usize, gateway: usize) -> u8 {
        self.min_sf[device * self.gateway_count + gateway]
    }

    /// Largest SF allowed by the device's reporting period.
    pub fn max_sf(&self, device: usize) -> u8 {
        self.max_sf[device]
    }

    /// Reporting period of `device`.
    pub fn period(&self, device: usize) -> u32 {
        self.periods[device]
    }

    /// Gateways the device can use, ascending. Never empty.
    pub fn candidate_gateways(&self, device: usize) -> &[usize] {
        &self.candidates[device]
    }

    /// True if `gateway` is among the device's candidates.
    pub fn is_candidate(&self, device: usize, gateway: usize) -> bool {
        self.min_sf(device, gateway) <= self.max_sf(device)
    }

    /// True if the device may use `sf` towards `gateway`.
    pub fn sf_in_range(&self, device: usize, gateway: usize, sf: u8) -> bool {
        sf >= self.min_sf(device, gateway) && sf <= self.max_sf(device)
    }

    /// Devices `gateway` can serve using any SF up to `tier`.
    ///
    /// Clusters are cumulative: the result for tier `s` contains the result
    /// for every tier below `s`.
    pub fn reachable_devices(&self, gateway: usize, tier: u8) -> Vec<usize> {
        (0..self.device_count())
            .filter(|&e| {
                let sf = self.min_sf(e, gateway);
                sf <= tier && sf <= self.max_sf(e)
            })
            .collect()
    }

    /// Channel load the device adds to a gateway when transmitting at `sf`.
    pub fn uf(&self, device: usize, sf: u8) -> UtilizationFactor {
        UtilizationFactor::with_sf(sf, f64::from(airtime(sf)) / f64::from(self.period(device)))
    }

    /// Draws a random valid link for `device`.
    ///
    /// The gateway is uniform over the device's candidates; the SF is
    /// uniform over `[min_sf(device, gateway), max_sf(device)]`.
    pub fn random_link<R: Rng>(&self, device: usize, rng: &mut R) -> Link {
        let candidates = self.candidate_gateways(device);
        let gateway = candidates[rng.random_range(0..candidates.len())];
        let sf = rng.random_range(self.min_sf(device, gateway)..=self.max_sf(device));
        Link { gateway, sf }
    }
}

/// Serialized form of a [`Topology`]: the constructor inputs.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct TopologyData {
    min_sf: Vec<Vec<u8>>,
    periods: Vec<u32>,
}

#[cfg(feature = "serde")]
impl TryFrom<TopologyData> for Topology {
    type Error = PlanError;

    fn try_from(data: TopologyData) -> Result<Self> {
        Topology::new(data.min_sf, data.periods)
    }
}

#[cfg(feature = "serde")]
impl From<Topology> for TopologyData {
    fn from(topo: Topology) -> Self {
        let min_sf = if topo.gateway_count == 0 {
            vec![Vec::new(); topo.periods.len()]
        } else {
            topo.min_sf
                .chunks(topo.gateway_count)
                .map(<[u8]>::to_vec)
                .collect()
        };
        Self {
            min_sf,
            periods: topo.periods,
        }
    }
}

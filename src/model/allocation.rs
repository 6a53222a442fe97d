//! Mutable candidate solution with incremental capacity checks.

use super::topology::{Topology, MAX_SF, MIN_SF};
use super::uf::UtilizationFactor;

/// A device's uplink: the serving gateway and the SF it transmits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    /// Gateway index.
    pub gateway: usize,
    /// Spreading factor, 7..=12.
    pub sf: u8,
}

/// Device → (gateway, SF) assignment under construction.
///
/// Keeps one [`UtilizationFactor`] per gateway equal to the sum of the
/// contributions of the devices linked to it. All mutation goes through
/// methods that keep that sum consistent; the `check_*` methods additionally
/// refuse any change that would saturate a gateway and leave the allocation
/// untouched when they do.
///
/// Cloning produces an independent snapshot, which solvers use to keep a
/// best-so-far solution while searching on.
#[derive(Debug, Clone)]
pub struct Allocation<'t> {
    topology: &'t Topology,
    links: Vec<Option<Link>>,
    gateway_uf: Vec<UtilizationFactor>,
    connected: usize,
}

impl<'t> Allocation<'t> {
    /// An allocation with every device unassigned.
    pub fn new(topology: &'t Topology) -> Self {
        Self {
            topology,
            links: vec![None; topology.device_count()],
            gateway_uf: vec![UtilizationFactor::zero(); topology.gateway_count()],
            connected: 0,
        }
    }

    /// The topology this allocation refers to.
    pub fn topology(&self) -> &'t Topology {
        self.topology
    }

    /// Links `device` to `gateway` without any check.
    ///
    /// `sf` defaults to the gateway's minimum SF for the device. A device
    /// that was already linked is moved, retracting its old contribution.
    /// Callers are responsible for capacity; see
    /// [`check_and_connect`](Self::check_and_connect) for the checked form.
    ///
    /// # Panics
    /// Panics if the resolved SF is not a spreading factor, which happens
    /// when `sf` is `None` and `gateway` cannot hear the device at all.
    pub fn connect(&mut self, device: usize, gateway: usize, sf: Option<u8>) {
        let sf = sf.unwrap_or_else(|| self.topology.min_sf(device, gateway));
        assert!(
            (MIN_SF..=MAX_SF).contains(&sf),
            "device {device} cannot use SF {sf} towards gateway {gateway}"
        );
        self.disconnect(device);
        self.gateway_uf[gateway] += self.topology.uf(device, sf);
        self.links[device] = Some(Link { gateway, sf });
        self.connected += 1;
    }

    /// Links `device` to `gateway` if the gateway has room for it.
    ///
    /// `sf` defaults to the gateway's minimum SF for the device. Returns
    /// `false` without touching any state when the SF is outside the
    /// device's range for that gateway or when the gateway would become
    /// full.
    pub fn check_and_connect(&mut self, device: usize, gateway: usize, sf: Option<u8>) -> bool {
        let sf = sf.unwrap_or_else(|| self.topology.min_sf(device, gateway));
        if !self.topology.sf_in_range(device, gateway, sf) {
            return false;
        }
        if !self.fits(device, gateway, sf) {
            return false;
        }
        self.connect(device, gateway, Some(sf));
        true
    }

    /// Links `device` to `gateway` at the lowest SF with room left.
    ///
    /// Tries SFs from the gateway's minimum for the device up to the
    /// device's maximum. Returns the SF used, or `None` (no mutation) if
    /// none fits.
    pub fn connect_lowest_fitting_sf(&mut self, device: usize, gateway: usize) -> Option<u8> {
        if !self.topology.is_candidate(device, gateway) {
            return None;
        }
        let lowest = self.topology.min_sf(device, gateway);
        let sf = (lowest..=self.topology.max_sf(device)).find(|&sf| self.fits(device, gateway, sf))?;
        self.connect(device, gateway, Some(sf));
        Some(sf)
    }

    /// Moves a linked device to another gateway at that gateway's minimum SF.
    ///
    /// Returns `false` (no mutation) if the device is unlinked, already on
    /// `gateway`, cannot reach it, or the target has no room.
    pub fn check_and_move(&mut self, device: usize, gateway: usize) -> bool {
        match self.links[device] {
            Some(link) if link.gateway != gateway => self.check_and_connect(device, gateway, None),
            _ => false,
        }
    }

    /// Removes the device's link, if any, and its load on the gateway.
    pub fn disconnect(&mut self, device: usize) -> Option<Link> {
        let link = self.links[device].take()?;
        self.gateway_uf[link.gateway] -= self.topology.uf(device, link.sf);
        self.connected -= 1;
        Some(link)
    }

    /// Would the gateway stay below saturation with `device` at `sf`?
    fn fits(&self, device: usize, gateway: usize, sf: u8) -> bool {
        let mut next = self.gateway_uf[gateway] + self.topology.uf(device, sf);
        if let Some(prev) = self.links[device] {
            if prev.gateway == gateway {
                next -= self.topology.uf(device, prev.sf);
            }
        }
        !next.is_full()
    }

    /// Current link of `device`.
    pub fn link(&self, device: usize) -> Option<Link> {
        self.links[device]
    }

    /// Per-device links, `None` for unassigned devices.
    pub fn links(&self) -> &[Option<Link>] {
        &self.links
    }

    /// The complete assignment vector, or `None` while any device is
    /// unassigned.
    pub fn to_links(&self) -> Option<Vec<Link>> {
        self.links.iter().copied().collect()
    }

    /// Accumulated load of `gateway`.
    pub fn gateway_uf(&self, gateway: usize) -> UtilizationFactor {
        self.gateway_uf[gateway]
    }

    /// Number of linked devices.
    pub fn connected_count(&self) -> usize {
        self.connected
    }

    /// True if every device is linked.
    pub fn is_complete(&self) -> bool {
        self.connected == self.links.len()
    }

    /// Devices linked to `gateway`, ascending.
    pub fn devices_of(&self, gateway: usize) -> Vec<usize> {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_some_and(|l| l.gateway == gateway))
            .map(|(e, _)| e)
            .collect()
    }

    /// Gateways carrying traffic, ascending.
    pub fn used_gateways(&self) -> Vec<usize> {
        self.gateway_uf
            .iter()
            .enumerate()
            .filter(|(_, uf)| uf.is_used())
            .map(|(g, _)| g)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topology::fixtures;
    use proptest::prelude::*;

    /// One gateway, devices with period 128 (SF 7 only, 1/128 load each).
    fn crowded(devices: usize) -> Topology {
        Topology::new(vec![vec![7]; devices], vec![128; devices]).unwrap()
    }

    #[test]
    #[should_panic(expected = "cannot use SF")]
    fn test_connect_to_unreachable_gateway_panics() {
        let topo = Topology::new(vec![vec![7, 13]], vec![3200]).unwrap();
        let mut alloc = Allocation::new(&topo);
        alloc.connect(0, 1, None);
    }

    #[test]
    fn test_checked_connect_to_unreachable_gateway_is_rejected() {
        let topo = Topology::new(vec![vec![7, 13]], vec![3200]).unwrap();
        let mut alloc = Allocation::new(&topo);
        assert!(!alloc.check_and_connect(0, 1, None));
        assert_eq!(alloc.connected_count(), 0);
    }

    #[test]
    fn test_new_is_empty() {
        let topo = fixtures::pair();
        let alloc = Allocation::new(&topo);
        assert_eq!(alloc.connected_count(), 0);
        assert!(!alloc.is_complete());
        assert!(alloc.to_links().is_none());
        assert!(alloc.used_gateways().is_empty());
    }

    #[test]
    fn test_connect_defaults_to_min_sf() {
        let topo = fixtures::pair();
        let mut alloc = Allocation::new(&topo);
        alloc.connect(0, 1, None);
        assert_eq!(alloc.link(0), Some(Link { gateway: 1, sf: 9 }));
        assert!((alloc.gateway_uf(1).value(9) - 4.0 / 3200.0).abs() < 1e-12);
        assert_eq!(alloc.connected_count(), 1);
    }

    #[test]
    fn test_reconnect_retracts_previous_load() {
        let topo = fixtures::pair();
        let mut alloc = Allocation::new(&topo);
        alloc.connect(0, 0, None);
        alloc.connect(0, 1, None);
        assert_eq!(alloc.connected_count(), 1);
        assert!(!alloc.gateway_uf(0).is_used());
        assert!(alloc.gateway_uf(1).is_used());
    }

    #[test]
    fn test_check_and_connect_rejects_when_full() {
        // Each device uses 1/128 of SF7: the 128th device would hit 1.0.
        let topo = crowded(128);
        let mut alloc = Allocation::new(&topo);
        for e in 0..127 {
            assert!(alloc.check_and_connect(e, 0, None), "device {e} should fit");
        }
        let before = alloc.clone();
        assert!(!alloc.check_and_connect(127, 0, None));
        assert_eq!(alloc.connected_count(), before.connected_count());
        assert_eq!(alloc.links(), before.links());
        assert_eq!(alloc.gateway_uf(0), before.gateway_uf(0));
    }

    #[test]
    fn test_check_and_connect_rejects_out_of_range_sf() {
        let topo = fixtures::pair();
        let mut alloc = Allocation::new(&topo);
        // Gateway 1 needs SF 9 for device 0.
        assert!(!alloc.check_and_connect(0, 1, Some(8)));
        assert!(alloc.link(0).is_none());
        assert!(alloc.check_and_connect(0, 1, Some(10)));
        assert_eq!(alloc.link(0), Some(Link { gateway: 1, sf: 10 }));
    }

    #[test]
    fn test_lowest_fitting_sf_escalates() {
        // Period 100 => max SF 7, so use a longer period with two SFs.
        let topo = Topology::new(vec![vec![7]; 3], vec![200; 3]).unwrap();
        let mut alloc = Allocation::new(&topo);
        // Pre-load SF7 to 0.999 so nothing else fits at SF7.
        alloc.connect(0, 0, Some(7));
        let mut nearly_full = alloc.gateway_uf(0);
        nearly_full.set(7, 0.999);
        let extra = nearly_full - alloc.gateway_uf(0);
        alloc.gateway_uf[0] += extra;

        assert_eq!(alloc.connect_lowest_fitting_sf(1, 0), Some(8));
        assert_eq!(alloc.link(1), Some(Link { gateway: 0, sf: 8 }));
    }

    #[test]
    fn test_check_and_move() {
        let topo = fixtures::pair();
        let mut alloc = Allocation::new(&topo);
        assert!(!alloc.check_and_move(1, 0), "unlinked device cannot move");
        alloc.connect(1, 1, None);
        assert!(!alloc.check_and_move(1, 1), "same gateway is not a move");
        assert!(alloc.check_and_move(1, 0));
        assert_eq!(alloc.link(1), Some(Link { gateway: 0, sf: 8 }));
        assert!(!alloc.gateway_uf(1).is_used());
        assert_eq!(alloc.connected_count(), 1);
    }

    #[test]
    fn test_disconnect() {
        let topo = fixtures::pair();
        let mut alloc = Allocation::new(&topo);
        alloc.connect(0, 0, None);
        assert_eq!(alloc.disconnect(0), Some(Link { gateway: 0, sf: 7 }));
        assert_eq!(alloc.disconnect(0), None);
        assert_eq!(alloc.connected_count(), 0);
        assert!(!alloc.gateway_uf(0).is_used());
    }

    #[test]
    fn test_devices_of_and_used_gateways() {
        let topo = fixtures::line(6, 3, 3200);
        let mut alloc = Allocation::new(&topo);
        for e in 0..6 {
            alloc.connect(e, e / 2, None);
        }
        assert!(alloc.is_complete());
        assert_eq!(alloc.devices_of(1), vec![2, 3]);
        assert_eq!(alloc.used_gateways(), vec![0, 1, 2]);
        assert_eq!(alloc.to_links().map(|l| l.len()), Some(6));
    }

    #[test]
    fn test_clone_is_independent() {
        let topo = fixtures::pair();
        let mut alloc = Allocation::new(&topo);
        alloc.connect(0, 0, None);
        let snapshot = alloc.clone();
        alloc.connect(1, 0, None);
        assert_eq!(snapshot.connected_count(), 1);
        assert!(snapshot.link(1).is_none());
    }

    proptest! {
        #[test]
        fn prop_checked_connects_never_saturate(
            ops in prop::collection::vec((0usize..40, 0usize..4, 7u8..=12), 1..200)
        ) {
            let topo = fixtures::line(40, 4, 400);
            let mut alloc = Allocation::new(&topo);
            for (e, g, sf) in ops {
                let links_before = alloc.links().to_vec();
                let uf_before: Vec<_> = (0..4).map(|g| alloc.gateway_uf(g)).collect();
                let count_before = alloc.connected_count();
                if !alloc.check_and_connect(e, g, Some(sf)) {
                    prop_assert_eq!(alloc.links(), &links_before[..]);
                    prop_assert_eq!(alloc.connected_count(), count_before);
                    for g in 0..4 {
                        prop_assert_eq!(alloc.gateway_uf(g), uf_before[g]);
                    }
                }
                for g in 0..4 {
                    prop_assert!(!alloc.gateway_uf(g).is_full());
                }
            }
        }
    }
}

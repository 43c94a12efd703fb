use serde::{Deserialize, Serialize};

/// Closed set of reaction channel types the sampler dispatches on.
///
/// `Total` and `Absorption` are synthetic sum channels: they appear in the
/// data tables but are never selected as collision events. The bound-thermal
/// channels replace free elastic/inelastic below the S(a,b) cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionKind {
    Total,
    Elastic,
    Inelastic,
    Fission,
    Capture,
    Absorption,
    ThermalElastic,
    ThermalInelastic,
}

impl ReactionKind {
    /// ENDF/MT-style code for diagnostics and external tallies. The thermal
    /// channels use the conventional synthetic codes 1002/1004.
    pub fn mt(self) -> i32 {
        match self {
            ReactionKind::Total => 1,
            ReactionKind::Elastic => 2,
            ReactionKind::Inelastic => 4,
            ReactionKind::Fission => 18,
            ReactionKind::Absorption => 101,
            ReactionKind::Capture => 102,
            ReactionKind::ThermalElastic => 1002,
            ReactionKind::ThermalInelastic => 1004,
        }
    }

    pub fn from_mt(mt: i32) -> Option<Self> {
        match mt {
            1 => Some(ReactionKind::Total),
            2 => Some(ReactionKind::Elastic),
            4 => Some(ReactionKind::Inelastic),
            18 => Some(ReactionKind::Fission),
            101 => Some(ReactionKind::Absorption),
            102 => Some(ReactionKind::Capture),
            1002 => Some(ReactionKind::ThermalElastic),
            1004 => Some(ReactionKind::ThermalInelastic),
            _ => None,
        }
    }

    /// Sum channels are never sampled as events.
    pub fn is_synthetic(self) -> bool {
        matches!(self, ReactionKind::Total | ReactionKind::Absorption)
    }

    /// Channels removed from analog selection under implicit capture.
    pub fn is_absorbing(self) -> bool {
        matches!(self, ReactionKind::Capture | ReactionKind::Fission)
    }

    pub fn is_bound_thermal(self) -> bool {
        matches!(
            self,
            ReactionKind::ThermalElastic | ReactionKind::ThermalInelastic
        )
    }
}

/// A single reaction channel of a nuclide: a tabulated energy grid with
/// matching cross-section values in barns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub kind: ReactionKind,
    /// Ascending energy grid in eV. Threshold reactions start at threshold.
    pub energy: Vec<f64>,
    /// Cross section values in barns, one per grid point.
    pub cross_section: Vec<f64>,
    /// Q-value of the reaction in eV.
    #[serde(default)]
    pub q_value: f64,
}

impl Reaction {
    pub fn new(kind: ReactionKind, energy: Vec<f64>, cross_section: Vec<f64>) -> Self {
        Reaction {
            kind,
            energy,
            cross_section,
            q_value: 0.0,
        }
    }

    /// Returns the cross section value for a given energy using linear
    /// interpolation. Below the grid, threshold reactions evaluate to their
    /// first tabulated value (zero at threshold by convention); above the
    /// grid, the last value.
    #[inline]
    pub fn cross_section_at(&self, energy: f64) -> Option<f64> {
        if self.energy.is_empty() || self.cross_section.is_empty() {
            return None;
        }

        let n = self.energy.len();

        if energy <= self.energy[0] {
            return Some(self.cross_section[0]);
        }
        if energy >= self.energy[n - 1] {
            return Some(self.cross_section[n - 1]);
        }

        // Binary search for the interval
        match self
            .energy
            .binary_search_by(|e| e.partial_cmp(&energy).unwrap())
        {
            Ok(idx) => Some(self.cross_section[idx]),
            Err(idx) => {
                // idx is the insertion point, so energy is between [idx-1] and [idx]
                let i = idx - 1;
                let e0 = self.energy[i];
                let e1 = self.energy[idx];
                let xs0 = self.cross_section[i];
                let xs1 = self.cross_section[idx];

                let t = (energy - e0) / (e1 - e0);
                Some(xs0 + t * (xs1 - xs0))
            }
        }
    }

    /// Tabulated range of this channel as (first, last) grid energies.
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        match (self.energy.first(), self.energy.last()) {
            (Some(&lo), Some(&hi)) => Some((lo, hi)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_section_at() {
        let reaction = Reaction::new(
            ReactionKind::Capture,
            vec![0.5, 1.0, 2.0, 5.0],
            vec![1.0, 2.0, 3.0, 4.0],
        );

        // Below grid
        assert_eq!(reaction.cross_section_at(0.1), Some(1.0));
        // Exact match
        assert_eq!(reaction.cross_section_at(1.0), Some(2.0));
        // Between grid points (linear interpolation: 2.0 + 0.5*(3.0-2.0) = 2.5)
        assert_eq!(reaction.cross_section_at(1.5), Some(2.5));
        // Above grid
        assert_eq!(reaction.cross_section_at(10.0), Some(4.0));
    }

    #[test]
    fn test_kind_mt_round_trip() {
        for kind in [
            ReactionKind::Total,
            ReactionKind::Elastic,
            ReactionKind::Inelastic,
            ReactionKind::Fission,
            ReactionKind::Capture,
            ReactionKind::Absorption,
            ReactionKind::ThermalElastic,
            ReactionKind::ThermalInelastic,
        ] {
            assert_eq!(ReactionKind::from_mt(kind.mt()), Some(kind));
        }
        assert_eq!(ReactionKind::from_mt(9999), None);
    }

    #[test]
    fn test_synthetic_channels() {
        assert!(ReactionKind::Total.is_synthetic());
        assert!(ReactionKind::Absorption.is_synthetic());
        assert!(!ReactionKind::Elastic.is_synthetic());
        assert!(ReactionKind::Capture.is_absorbing());
        assert!(ReactionKind::Fission.is_absorbing());
        assert!(!ReactionKind::ThermalElastic.is_absorbing());
    }
}

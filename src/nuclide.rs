// Core data model for a single nuclide and its reaction channels.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::SamplingError;
use crate::partial::{Partial, PartialList};
use crate::reaction::{Reaction, ReactionKind};
use crate::thermal::ThermalData;

/// A nuclide with its ordered reaction channels and optional bound
/// thermal-scattering block.
///
/// Identity is (Z, A, isomeric state, temperature, library). Nuclides are
/// built once during data loading, finalized, and shared read-only by all
/// worker threads for the remainder of the run; temperature-interpolated
/// nuclides are the only instances created after loading, and only before
/// transport begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nuclide {
    /// Canonical nuclide name (e.g. "Li6", "H1-H2O").
    pub name: String,
    /// Atomic (proton) number Z.
    pub atomic_number: u32,
    /// Mass number A.
    pub mass_number: u32,
    /// Isomeric state (0 for ground state).
    pub isomeric_state: u32,
    /// Temperature of the evaluation in K.
    pub temperature: f64,
    /// Origin library identifier (e.g. JEFF, ENDF, custom tag).
    pub library: String,
    /// Atomic weight ratio (target mass / neutron mass).
    pub atomic_weight_ratio: f64,
    /// Ordered reaction channels.
    pub reactions: Vec<Reaction>,
    /// Bound thermal-scattering block, present for S(a,b) nuclides.
    pub thermal: Option<ThermalData>,
    /// Optional temperature-independent majorant total (same semantics as
    /// the Total channel). Required for Doppler-broadening rejection.
    pub majorant: Option<Reaction>,
    /// Precomputed partial list over the reaction channels.
    #[serde(skip, default)]
    pub reaction_partials: PartialList,
}

impl Nuclide {
    pub fn new(
        name: impl Into<String>,
        atomic_number: u32,
        mass_number: u32,
        temperature: f64,
        library: impl Into<String>,
        atomic_weight_ratio: f64,
    ) -> Self {
        Nuclide {
            name: name.into(),
            atomic_number,
            mass_number,
            isomeric_state: 0,
            temperature,
            library: library.into(),
            atomic_weight_ratio,
            reactions: Vec::new(),
            thermal: None,
            majorant: None,
            reaction_partials: PartialList::default(),
        }
    }

    pub fn add_reaction(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    pub fn reaction(&self, kind: ReactionKind) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.kind == kind)
    }

    pub fn reaction_index(&self, kind: ReactionKind) -> Option<usize> {
        self.reactions.iter().position(|r| r.kind == kind)
    }

    /// Tabulated range of the total channel as (first, last) grid energies.
    pub fn energy_range(&self) -> Option<(f64, f64)> {
        self.reaction(ReactionKind::Total)
            .and_then(|r| r.energy_range())
    }

    /// Microscopic total cross section at `energy`, in barns.
    #[inline]
    pub fn micro_total_at(&self, energy: f64) -> f64 {
        self.reaction(ReactionKind::Total)
            .and_then(|r| r.cross_section_at(energy))
            .unwrap_or(0.0)
    }

    /// Microscopic majorant total at `energy`; falls back to the plain total
    /// when no majorant has been tabulated.
    #[inline]
    pub fn micro_majorant_at(&self, energy: f64) -> f64 {
        match &self.majorant {
            Some(m) => m.cross_section_at(energy).unwrap_or(0.0),
            None => self.micro_total_at(energy),
        }
    }

    /// Microscopic absorption at `energy`: the Absorption sum channel when
    /// tabulated, otherwise capture + fission.
    #[inline]
    pub fn micro_absorption_at(&self, energy: f64) -> f64 {
        if let Some(r) = self.reaction(ReactionKind::Absorption) {
            return r.cross_section_at(energy).unwrap_or(0.0);
        }
        let mut xs = 0.0;
        for r in &self.reactions {
            if r.kind.is_absorbing() {
                xs += r.cross_section_at(energy).unwrap_or(0.0);
            }
        }
        xs
    }

    /// Combined bound-thermal (S(a,b) elastic + inelastic) cross section at
    /// `energy`. Zero above the cutoff energy.
    #[inline]
    pub fn bound_thermal_xs_at(&self, energy: f64) -> f64 {
        let cutoff = match &self.thermal {
            Some(t) => t.cutoff_energy,
            None => return 0.0,
        };
        if energy >= cutoff {
            return 0.0;
        }
        let mut xs = 0.0;
        for r in &self.reactions {
            if r.kind.is_bound_thermal() {
                xs += r.cross_section_at(energy).unwrap_or(0.0);
            }
        }
        xs
    }

    /// S(a,b) cutoff energy, if this is a bound nuclide.
    pub fn sab_cutoff(&self) -> Option<f64> {
        self.thermal.as_ref().map(|t| t.cutoff_energy)
    }

    /// Whether this nuclide requires Doppler-broadening rejection: it does
    /// whenever a majorant has been tabulated for it.
    pub fn needs_broadening_rejection(&self) -> bool {
        self.majorant.is_some()
    }

    /// Build a default majorant as a windowed running maximum of the total
    /// channel with a small safety margin. Library-supplied majorants take
    /// precedence; this fallback keeps rejection sampling correct for
    /// materials that request broadening-on-demand without one.
    pub fn build_default_majorant(&mut self, margin: f64) -> Result<(), SamplingError> {
        if self.majorant.is_some() {
            return Ok(());
        }
        let (grid, total_xs) = match self.reaction(ReactionKind::Total) {
            Some(total) => (total.energy.clone(), total.cross_section.clone()),
            None => {
                return Err(SamplingError::MissingTotal {
                    nuclide: self.name.clone(),
                })
            }
        };
        let n = total_xs.len();
        let mut xs = vec![0.0; n];
        for i in 0..n {
            let lo = i.saturating_sub(2);
            let hi = (i + 2).min(n - 1);
            let mut m = 0.0f64;
            for j in lo..=hi {
                m = m.max(total_xs[j]);
            }
            xs[i] = m * (1.0 + margin);
        }
        self.majorant = Some(Reaction::new(ReactionKind::Total, grid, xs));
        Ok(())
    }

    /// Validate channel data and precompute the reaction partial list.
    ///
    /// Physical channels (everything except the Total/Absorption sum
    /// channels) become partial entries weighted 1.0 and valid across the
    /// nuclide's full tabulated range; threshold reactions contribute zero
    /// below threshold through their clamped lookup. Negative cross-section
    /// values are clamped to zero with a warning.
    pub fn finalize(&mut self) -> Result<(), SamplingError> {
        let (e_min, e_max) = self
            .energy_range()
            .ok_or_else(|| SamplingError::MissingTotal {
                nuclide: self.name.clone(),
            })?;

        for r in &mut self.reactions {
            let mut clamped = 0usize;
            for v in &mut r.cross_section {
                if *v < 0.0 {
                    *v = 0.0;
                    clamped += 1;
                }
            }
            if clamped > 0 {
                warn!(
                    "nuclide '{}' MT {}: clamped {} negative cross-section entries to zero",
                    self.name,
                    r.kind.mt(),
                    clamped
                );
            }
        }

        let mut entries = Vec::new();
        for (i, r) in self.reactions.iter().enumerate() {
            if r.kind.is_synthetic() {
                continue;
            }
            entries.push(Partial {
                index: i,
                e_min,
                e_max,
                weight: 1.0,
            });
        }
        self.reaction_partials = PartialList { entries };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_nuclide() -> Nuclide {
        let mut nuc = Nuclide::new("X1", 1, 1, 294.0, "test", 1.0);
        let grid = vec![1.0, 10.0];
        nuc.add_reaction(Reaction::new(
            ReactionKind::Total,
            grid.clone(),
            vec![3.0, 3.0],
        ));
        nuc.add_reaction(Reaction::new(
            ReactionKind::Elastic,
            grid.clone(),
            vec![2.0, 2.0],
        ));
        nuc.add_reaction(Reaction::new(ReactionKind::Capture, grid, vec![1.0, 1.0]));
        nuc.finalize().unwrap();
        nuc
    }

    #[test]
    fn test_micro_lookups() {
        let nuc = simple_nuclide();
        assert_eq!(nuc.micro_total_at(5.0), 3.0);
        assert_eq!(nuc.micro_absorption_at(5.0), 1.0);
        // No majorant tabulated: falls back to total
        assert_eq!(nuc.micro_majorant_at(5.0), 3.0);
        assert_eq!(nuc.energy_range(), Some((1.0, 10.0)));
    }

    #[test]
    fn test_partials_skip_sum_channels() {
        let mut nuc = simple_nuclide();
        nuc.add_reaction(Reaction::new(
            ReactionKind::Absorption,
            vec![1.0, 10.0],
            vec![1.0, 1.0],
        ));
        nuc.finalize().unwrap();
        // Total and Absorption excluded
        assert_eq!(nuc.reaction_partials.len(), 2);
        let sum = nuc
            .reaction_partials
            .weighted_total(|i| nuc.reactions[i].cross_section_at(5.0).unwrap());
        assert!((sum - nuc.micro_total_at(5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_negative_xs_clamped() {
        let mut nuc = Nuclide::new("X1", 1, 1, 294.0, "test", 1.0);
        nuc.add_reaction(Reaction::new(
            ReactionKind::Total,
            vec![1.0, 10.0],
            vec![2.0, -0.5],
        ));
        nuc.finalize().unwrap();
        assert_eq!(nuc.micro_total_at(10.0), 0.0);
    }

    #[test]
    fn test_default_majorant_bounds_total() {
        let mut nuc = Nuclide::new("X1", 1, 1, 294.0, "test", 1.0);
        nuc.add_reaction(Reaction::new(
            ReactionKind::Total,
            vec![1.0, 2.0, 4.0, 8.0],
            vec![1.0, 5.0, 2.0, 1.0],
        ));
        nuc.finalize().unwrap();
        nuc.build_default_majorant(0.05).unwrap();
        for &e in &[1.0, 1.5, 2.0, 3.0, 4.0, 6.0] {
            assert!(
                nuc.micro_majorant_at(e) >= nuc.micro_total_at(e),
                "majorant below total at {} eV",
                e
            );
        }
    }

    #[test]
    fn test_missing_total_is_fatal() {
        let mut nuc = Nuclide::new("X1", 1, 1, 294.0, "test", 1.0);
        nuc.add_reaction(Reaction::new(
            ReactionKind::Elastic,
            vec![1.0, 10.0],
            vec![2.0, 2.0],
        ));
        assert!(matches!(
            nuc.finalize(),
            Err(SamplingError::MissingTotal { .. })
        ));
    }

    #[test]
    fn test_bound_thermal_xs_zero_above_cutoff() {
        use crate::thermal::ThermalData;
        let mut nuc = simple_nuclide();
        nuc.thermal = Some(ThermalData {
            inelastic: None,
            elastic: None,
            cutoff_energy: 4.0,
        });
        nuc.add_reaction(Reaction::new(
            ReactionKind::ThermalInelastic,
            vec![1.0, 4.0],
            vec![5.0, 0.0],
        ));
        nuc.finalize().unwrap();
        assert!(nuc.bound_thermal_xs_at(2.0) > 0.0);
        assert_eq!(nuc.bound_thermal_xs_at(5.0), 0.0);
    }
}

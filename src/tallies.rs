// Worker-local scratch counters.
//
// Each worker thread owns one WorkerTallies and passes it into every
// sampling call; no cross-worker synchronization happens inside the kernel.
// After the parallel phase an external reduction step merges the workers'
// scratch into the run totals.

use std::collections::HashMap;

use crate::data::NuclideId;
use crate::reaction::ReactionKind;

#[derive(Debug, Clone, Default)]
pub struct WorkerTallies {
    /// Analog selection counts per nuclide, indexed by arena id.
    pub nuclide_selections: Vec<u64>,
    /// Analog selection counts per (nuclide, reaction channel).
    pub reaction_selections: HashMap<(NuclideId, ReactionKind), u64>,
    /// Weight-accumulated analog reaction rates per (nuclide, channel).
    pub analog_rates: HashMap<(NuclideId, ReactionKind), f64>,
    /// Doppler-rejection attempts (TMS efficiency numerator base).
    pub tms_attempts: u64,
    /// Doppler-rejection failures.
    pub tms_rejections: u64,
    /// Accepted TMS samples whose acceptance ratio exceeded the tolerance.
    pub majorant_violations: u64,
    /// Partial-list walks that completed without a selection.
    pub sampling_failures: u64,
}

impl WorkerTallies {
    pub fn new(n_nuclides: usize) -> Self {
        WorkerTallies {
            nuclide_selections: vec![0; n_nuclides],
            ..Default::default()
        }
    }

    /// Record an analog nuclide/reaction selection with the particle weight.
    pub fn record_selection(&mut self, nuclide: NuclideId, kind: ReactionKind, weight: f64) {
        if nuclide.0 >= self.nuclide_selections.len() {
            self.nuclide_selections.resize(nuclide.0 + 1, 0);
        }
        self.nuclide_selections[nuclide.0] += 1;
        *self.reaction_selections.entry((nuclide, kind)).or_insert(0) += 1;
        *self.analog_rates.entry((nuclide, kind)).or_insert(0.0) += weight;
    }

    /// Fraction of TMS attempts that were accepted, if any were made.
    pub fn tms_efficiency(&self) -> Option<f64> {
        if self.tms_attempts == 0 {
            return None;
        }
        Some(1.0 - self.tms_rejections as f64 / self.tms_attempts as f64)
    }

    /// Fold another worker's scratch into this one. Called by the external
    /// reduction step after the parallel phase.
    pub fn merge(&mut self, other: &WorkerTallies) {
        if other.nuclide_selections.len() > self.nuclide_selections.len() {
            self.nuclide_selections
                .resize(other.nuclide_selections.len(), 0);
        }
        for (i, &n) in other.nuclide_selections.iter().enumerate() {
            self.nuclide_selections[i] += n;
        }
        for (&key, &n) in &other.reaction_selections {
            *self.reaction_selections.entry(key).or_insert(0) += n;
        }
        for (&key, &w) in &other.analog_rates {
            *self.analog_rates.entry(key).or_insert(0.0) += w;
        }
        self.tms_attempts += other.tms_attempts;
        self.tms_rejections += other.tms_rejections;
        self.majorant_violations += other.majorant_violations;
        self.sampling_failures += other.sampling_failures;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut a = WorkerTallies::new(2);
        let mut b = WorkerTallies::new(2);
        a.record_selection(NuclideId(0), ReactionKind::Elastic, 1.0);
        a.record_selection(NuclideId(0), ReactionKind::Elastic, 0.5);
        b.record_selection(NuclideId(1), ReactionKind::Capture, 1.0);
        b.tms_attempts = 10;
        b.tms_rejections = 4;

        a.merge(&b);
        assert_eq!(a.nuclide_selections, vec![2, 1]);
        assert_eq!(
            a.reaction_selections[&(NuclideId(0), ReactionKind::Elastic)],
            2
        );
        assert!(
            (a.analog_rates[&(NuclideId(0), ReactionKind::Elastic)] - 1.5).abs() < 1e-12
        );
        assert_eq!(a.tms_attempts, 10);
        assert!((a.tms_efficiency().unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_none_without_attempts() {
        let t = WorkerTallies::new(1);
        assert_eq!(t.tms_efficiency(), None);
    }
}

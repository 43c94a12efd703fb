// Partial-selection lists: walk-and-subtract weighted selection over a
// material's nuclides or a nuclide's reaction channels.

use serde::{Deserialize, Serialize};

/// One weighted entry of a partial list. `index` points into the owning
/// arena (nuclide index for material lists, reaction index for nuclide
/// lists); the entry is valid on [e_min, e_max) and weighted by `weight`
/// (atomic density, or 1 for reaction channels).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partial {
    pub index: usize,
    pub e_min: f64,
    pub e_max: f64,
    pub weight: f64,
}

/// Validity-interval violation observed during a walk. Carries the offending
/// entry; the caller attaches owner context and promotes it to a fatal
/// [`crate::SamplingError`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialWalkFault {
    pub index: usize,
    pub e_min: f64,
    pub e_max: f64,
}

/// Ordered, precomputed partial-selection list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialList {
    pub entries: Vec<Partial>,
}

impl PartialList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walk the list subtracting `weight * xs_of(index)` from `u`.
    ///
    /// Returns `Ok(Some(index))` for the entry whose subtraction drives `u`
    /// negative, `Ok(None)` if the walk completes with `u` still
    /// non-negative (floating-point boundary effect; the caller counts it
    /// and rejects the collision), and `Err` if any visited entry's validity
    /// interval excludes `energy` (malformed list, fatal upstream).
    pub fn walk<F>(&self, energy: f64, mut u: f64, mut xs_of: F) -> Result<Option<usize>, PartialWalkFault>
    where
        F: FnMut(usize) -> f64,
    {
        for p in &self.entries {
            if energy < p.e_min || energy >= p.e_max {
                return Err(PartialWalkFault {
                    index: p.index,
                    e_min: p.e_min,
                    e_max: p.e_max,
                });
            }
            u -= p.weight * xs_of(p.index);
            if u < 0.0 {
                return Ok(Some(p.index));
            }
        }
        Ok(None)
    }

    /// Weighted sum of all entries' cross sections at `energy`; equals the
    /// list's declared total when the partition invariant holds.
    pub fn weighted_total<F>(&self, mut xs_of: F) -> f64
    where
        F: FnMut(usize) -> f64,
    {
        self.entries.iter().map(|p| p.weight * xs_of(p.index)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_channel_list() -> PartialList {
        // elastic 2.0 b, capture 1.0 b, both valid on [1, 10) eV
        PartialList {
            entries: vec![
                Partial {
                    index: 0,
                    e_min: 1.0,
                    e_max: 10.0,
                    weight: 1.0,
                },
                Partial {
                    index: 1,
                    e_min: 1.0,
                    e_max: 10.0,
                    weight: 1.0,
                },
            ],
        }
    }

    #[test]
    fn test_walk_selects_by_cumulative_subtraction() {
        let list = two_channel_list();
        let xs = |i: usize| if i == 0 { 2.0 } else { 1.0 };

        // u = 1.5: 1.5 - 2.0 < 0 selects entry 0
        assert_eq!(list.walk(5.0, 1.5, xs).unwrap(), Some(0));
        // u = 2.7: 2.7 - 2.0 = 0.7, 0.7 - 1.0 < 0 selects entry 1
        assert_eq!(list.walk(5.0, 2.7, xs).unwrap(), Some(1));
    }

    #[test]
    fn test_walk_exhaustion_is_not_an_error() {
        let list = two_channel_list();
        // u slightly above the total 3.0: walk completes with u >= 0
        let out = list.walk(5.0, 3.0 + 1e-12, |i| if i == 0 { 2.0 } else { 1.0 });
        assert_eq!(out.unwrap(), None);
    }

    #[test]
    fn test_walk_validity_violation_is_fault() {
        let list = two_channel_list();
        let fault = list.walk(0.5, 1.0, |_| 1.0).unwrap_err();
        assert_eq!(fault.index, 0);
        assert_eq!(fault.e_min, 1.0);
    }

    #[test]
    fn test_density_weighted_nuclide_walk() {
        // A at 0.02 with 3.0 b, B at 0.01 with 5.0 b; macro total 0.11
        let list = PartialList {
            entries: vec![
                Partial {
                    index: 0,
                    e_min: 1.0,
                    e_max: 10.0,
                    weight: 0.02,
                },
                Partial {
                    index: 1,
                    e_min: 1.0,
                    e_max: 10.0,
                    weight: 0.01,
                },
            ],
        };
        let xs = |i: usize| if i == 0 { 3.0 } else { 5.0 };
        // u = 0.05: 0.05 - 0.06 < 0 selects A
        assert_eq!(list.walk(5.0, 0.05, xs).unwrap(), Some(0));
        // u = 0.08: 0.08 - 0.06 = 0.02, 0.02 - 0.05 < 0 selects B
        assert_eq!(list.walk(5.0, 0.08, xs).unwrap(), Some(1));
    }

    #[test]
    fn test_weighted_total() {
        let list = PartialList {
            entries: vec![
                Partial {
                    index: 0,
                    e_min: 0.0,
                    e_max: 1.0,
                    weight: 0.02,
                },
                Partial {
                    index: 1,
                    e_min: 0.0,
                    e_max: 1.0,
                    weight: 0.01,
                },
            ],
        };
        let total = list.weighted_total(|i| if i == 0 { 3.0 } else { 5.0 });
        assert!((total - 0.11).abs() < 1e-12);
    }
}

// Material composition and cached macroscopic cross sections.

use serde::{Deserialize, Serialize};

use crate::data::NuclideId;
use crate::error::SamplingError;
use crate::nuclide::Nuclide;
use crate::partial::{Partial, PartialList};
use crate::utilities::interpolate_linear;

/// Material temperature: fixed, or a range when Doppler broadening on
/// demand (TMS) is active and the true temperature varies within the
/// material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Temperature {
    Fixed(f64),
    Range { min: f64, max: f64 },
}

impl Temperature {
    /// TMS rejection sampling is required whenever the temperature is a range.
    pub fn is_range(&self) -> bool {
        matches!(self, Temperature::Range { .. })
    }

    /// Representative temperature for collaborators that need a scalar.
    pub fn nominal(&self) -> f64 {
        match *self {
            Temperature::Fixed(t) => t,
            Temperature::Range { min, max } => 0.5 * (min + max),
        }
    }
}

/// An ordered, non-empty collection of (nuclide, atomic density) pairs with
/// cached macroscopic cross sections on a unified energy grid.
///
/// A material never owns its nuclides; the composition refers into the
/// [`crate::NuclearData`] arena. After [`Material::finalize`] all cached
/// members are immutable and the material is safely shared across worker
/// threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Optional name of the material
    pub name: Option<String>,
    /// Unique identifier for the material
    pub material_id: Option<u32>,
    /// Ordered composition: (nuclide, atomic density in atoms/(barn*cm)).
    pub composition: Vec<(NuclideId, f64)>,
    /// Material temperature (fixed, or a range under TMS).
    pub temperature: Temperature,
    /// Unified energy grid for the cached macroscopic cross sections.
    #[serde(skip, default)]
    pub unified_energy_grid: Vec<f64>,
    /// Macroscopic total cross section on the unified grid, in 1/cm.
    #[serde(skip, default)]
    pub macro_total: Vec<f64>,
    /// Macroscopic absorption cross section on the unified grid.
    #[serde(skip, default)]
    pub macro_absorption: Vec<f64>,
    /// Macroscopic majorant on the unified grid (TMS materials only).
    #[serde(skip, default)]
    pub macro_majorant: Option<Vec<f64>>,
    /// Precomputed partial list over the constituent nuclides.
    #[serde(skip, default)]
    pub nuclide_partials: PartialList,
    /// Common tabulated range [min, max) across all constituents.
    #[serde(skip, default)]
    pub energy_range: (f64, f64),
}

impl Material {
    pub fn new(temperature: Temperature) -> Self {
        Material {
            name: None,
            material_id: None,
            composition: Vec::new(),
            temperature,
            unified_energy_grid: Vec::new(),
            macro_total: Vec::new(),
            macro_absorption: Vec::new(),
            macro_majorant: None,
            nuclide_partials: PartialList::default(),
            energy_range: (0.0, 0.0),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn display_name(&self) -> String {
        match (&self.name, self.material_id) {
            (Some(n), _) => n.clone(),
            (None, Some(id)) => format!("material {}", id),
            (None, None) => String::from("unnamed material"),
        }
    }

    /// Append a nuclide with its atomic density. Order is preserved; it is
    /// the walk order of the partial list.
    pub fn add_nuclide(&mut self, nuclide: NuclideId, density: f64) {
        self.composition.push((nuclide, density));
    }

    /// Whether `energy` lies inside the common tabulated range.
    #[inline]
    pub fn in_range(&self, energy: f64) -> bool {
        energy >= self.energy_range.0 && energy < self.energy_range.1
    }

    /// Macroscopic total at `energy` on the unified grid.
    #[inline]
    pub fn macro_total_at(&self, energy: f64) -> f64 {
        interpolate_linear(&self.unified_energy_grid, &self.macro_total, energy)
    }

    /// Macroscopic absorption at `energy` on the unified grid.
    #[inline]
    pub fn macro_absorption_at(&self, energy: f64) -> f64 {
        interpolate_linear(&self.unified_energy_grid, &self.macro_absorption, energy)
    }

    /// Total interaction cross section used for collision sampling: the
    /// macroscopic majorant when TMS is active, the plain total otherwise.
    #[inline]
    pub fn total_xs(&self, energy: f64) -> f64 {
        match &self.macro_majorant {
            Some(maj) => interpolate_linear(&self.unified_energy_grid, maj, energy),
            None => self.macro_total_at(energy),
        }
    }

    /// Build the unified grid, the cached macroscopic cross sections, the
    /// optional majorant, and the nuclide partial list.
    pub fn finalize(&mut self, nuclides: &[Nuclide]) -> Result<(), SamplingError> {
        if self.composition.is_empty() {
            return Err(SamplingError::EmptyComposition {
                material: self.display_name(),
            });
        }

        // Common range: intersection of the constituents' tabulated ranges.
        let mut e_min = f64::MIN;
        let mut e_max = f64::MAX;
        for &(id, density) in &self.composition {
            let nuc = &nuclides[id.0];
            if density < 0.0 {
                return Err(SamplingError::NegativeDensity {
                    material: self.display_name(),
                    nuclide: nuc.name.clone(),
                    density,
                });
            }
            let (lo, hi) = nuc
                .energy_range()
                .ok_or_else(|| SamplingError::MissingTotal {
                    nuclide: nuc.name.clone(),
                })?;
            e_min = e_min.max(lo);
            e_max = e_max.min(hi);
        }
        if e_min >= e_max {
            return Err(SamplingError::NoCommonEnergyRange {
                material: self.display_name(),
            });
        }
        self.energy_range = (e_min, e_max);

        // Unified grid: union of the constituents' total grids, clipped.
        let mut grid = Vec::new();
        for &(id, _) in &self.composition {
            let nuc = &nuclides[id.0];
            if let Some(total) = nuc.reaction(crate::reaction::ReactionKind::Total) {
                grid.extend(
                    total
                        .energy
                        .iter()
                        .copied()
                        .filter(|&e| e >= e_min && e <= e_max),
                );
            }
        }
        grid.push(e_min);
        grid.push(e_max);
        grid.sort_by(|a, b| a.partial_cmp(b).unwrap());
        grid.dedup();
        self.unified_energy_grid = grid;

        // Macroscopic cross sections on the unified grid.
        let n = self.unified_energy_grid.len();
        let mut macro_total = vec![0.0; n];
        let mut macro_absorption = vec![0.0; n];
        let mut macro_majorant = if self.temperature.is_range() {
            Some(vec![0.0; n])
        } else {
            None
        };
        for (i, &e) in self.unified_energy_grid.iter().enumerate() {
            for &(id, density) in &self.composition {
                let nuc = &nuclides[id.0];
                macro_total[i] += density * nuc.micro_total_at(e);
                macro_absorption[i] += density * nuc.micro_absorption_at(e);
                if let Some(maj) = macro_majorant.as_mut() {
                    maj[i] += density * nuc.micro_majorant_at(e);
                }
            }
        }
        self.macro_total = macro_total;
        self.macro_absorption = macro_absorption;
        self.macro_majorant = macro_majorant;

        // Nuclide partial list, in composition order.
        let entries = self
            .composition
            .iter()
            .map(|&(id, density)| {
                let (lo, hi) = nuclides[id.0].energy_range().unwrap();
                Partial {
                    index: id.0,
                    e_min: lo,
                    e_max: hi,
                    weight: density,
                }
            })
            .collect();
        self.nuclide_partials = PartialList { entries };
        Ok(())
    }
}

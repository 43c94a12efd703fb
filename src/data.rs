// Typed arenas for the process-lifetime nuclear data tables.
//
// The arena owns all instances of a kind; cross references are plain integer
// ids, so Material/Nuclide/ThermalLaw data stays free of lifetimes and is
// shared read-only across worker threads after finalization.

use serde::{Deserialize, Serialize};

use crate::error::SamplingError;
use crate::material::Material;
use crate::nuclide::Nuclide;

/// Handle into [`NuclearData::nuclides`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NuclideId(pub usize);

/// Handle into [`NuclearData::materials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub usize);

/// The read-only table set consumed by the samplers. Built once by the data
/// loader, finalized before transport, then never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NuclearData {
    pub nuclides: Vec<Nuclide>,
    pub materials: Vec<Material>,
}

impl NuclearData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nuclide(&mut self, nuclide: Nuclide) -> NuclideId {
        self.nuclides.push(nuclide);
        NuclideId(self.nuclides.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    #[inline]
    pub fn nuclide(&self, id: NuclideId) -> &Nuclide {
        &self.nuclides[id.0]
    }

    #[inline]
    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    /// Finalize the whole table set: build per-nuclide majorants where
    /// broadening-on-demand materials require them, validate and precompute
    /// every partial list, and cache macroscopic cross sections. Must be
    /// called once after loading, before any sampling.
    pub fn finalize(&mut self) -> Result<(), SamplingError> {
        // Nuclides referenced by a range-temperature material need a
        // majorant for rejection sampling; default to the windowed-max
        // construction when the library supplied none.
        let mut needs_majorant = vec![false; self.nuclides.len()];
        for mat in &self.materials {
            if mat.temperature.is_range() {
                for &(id, _) in &mat.composition {
                    needs_majorant[id.0] = true;
                }
            }
        }
        for (i, nuc) in self.nuclides.iter_mut().enumerate() {
            if needs_majorant[i] {
                nuc.build_default_majorant(0.05)?;
            }
            nuc.finalize()?;
        }

        let NuclearData {
            nuclides,
            materials,
        } = self;
        for mat in materials.iter_mut() {
            mat.finalize(nuclides)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Temperature;
    use crate::reaction::{Reaction, ReactionKind};

    #[test]
    fn test_finalize_builds_majorants_for_tms_materials() {
        let mut data = NuclearData::new();
        let mut nuc = Nuclide::new("A", 1, 1, 294.0, "test", 1.0);
        nuc.add_reaction(Reaction::new(
            ReactionKind::Total,
            vec![1.0, 10.0],
            vec![3.0, 3.0],
        ));
        nuc.add_reaction(Reaction::new(
            ReactionKind::Elastic,
            vec![1.0, 10.0],
            vec![3.0, 3.0],
        ));
        let id = data.add_nuclide(nuc);

        let mut mat = Material::new(Temperature::Range {
            min: 300.0,
            max: 600.0,
        });
        mat.add_nuclide(id, 0.05);
        data.add_material(mat);

        data.finalize().unwrap();
        assert!(data.nuclide(id).majorant.is_some());
        assert!(data.nuclide(id).needs_broadening_rejection());
        // Majorant includes the safety margin
        assert!(data.nuclide(id).micro_majorant_at(5.0) > 3.0);
    }
}

// Collision target and reaction selection.
//
// The hot path of the kernel: given a material and an incident state, pick
// the colliding nuclide and reaction channel. Rejection ("virtual
// collision") and out-of-range are ordinary outcomes the transport loop
// handles every history; only data-consistency faults return errors.

use log::warn;
use rand::Rng;

use crate::data::{MaterialId, NuclearData, NuclideId};
use crate::error::SamplingError;
use crate::material::Temperature;
use crate::nuclide::Nuclide;
use crate::particle::ParticleType;
use crate::physics::{CxsTargetMotion, FreeGasCorrection, PotentialCorrection, TargetMotionSampler};
use crate::physics::AdditiveXs;
use crate::reaction::ReactionKind;
use crate::tallies::WorkerTallies;

/// Tolerance on the TMS acceptance ratio before a majorant violation is
/// flagged.
const MAJORANT_TOLERANCE: f64 = 1.000001;

/// Outcome of one collision-sampling attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// A nuclide and reaction channel were selected.
    Selected {
        nuclide: NuclideId,
        /// Index of the selected channel in the nuclide's reaction list.
        reaction: usize,
        kind: ReactionKind,
        /// Collision energy in eV: the incident energy, or the relative
        /// energy substituted by Doppler-broadening rejection.
        collision_energy: f64,
    },
    /// Virtual collision; the caller retries or moves the particle on.
    Rejected,
    /// Incident energy outside the material's tabulated range.
    OutOfRange,
}

/// Target/reaction sampler over a finalized [`NuclearData`] table set.
///
/// Stateless apart from the shared read-only tables and its collaborators;
/// one instance is shared by all worker threads, each of which brings its own
/// rng and [`WorkerTallies`] scratch to every call.
pub struct CollisionSampler<'a, T = CxsTargetMotion, P = FreeGasCorrection> {
    data: &'a NuclearData,
    target_motion: T,
    potential: P,
    extras: Vec<&'a dyn AdditiveXs>,
    implicit_capture: bool,
}

impl<'a> CollisionSampler<'a> {
    pub fn new(data: &'a NuclearData) -> Self {
        CollisionSampler {
            data,
            target_motion: CxsTargetMotion,
            potential: FreeGasCorrection,
            extras: Vec::new(),
            implicit_capture: false,
        }
    }
}

impl<'a, T, P> CollisionSampler<'a, T, P>
where
    T: TargetMotionSampler,
    P: PotentialCorrection,
{
    /// Build a sampler with explicit target-motion and potential-correction
    /// collaborators.
    pub fn with_collaborators(data: &'a NuclearData, target_motion: T, potential: P) -> Self {
        CollisionSampler {
            data,
            target_motion,
            potential,
            extras: Vec::new(),
            implicit_capture: false,
        }
    }

    /// Enable or disable implicit-capture variance reduction. With it on,
    /// absorption is removed from the sampled total and capture/fission are
    /// never selected as events.
    pub fn set_implicit_capture(&mut self, enabled: bool) {
        self.implicit_capture = enabled;
    }

    /// Register an opaque additive cross-section contribution. Summed into
    /// the material total before sampling.
    pub fn add_extra(&mut self, extra: &'a dyn AdditiveXs) {
        self.extras.push(extra);
    }

    /// Sample the colliding nuclide and reaction channel for one collision.
    ///
    /// `Rejected` and `OutOfRange` are frequent, expected outcomes; errors
    /// mean the tables are inconsistent and the run must stop.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        material_id: MaterialId,
        particle_type: ParticleType,
        energy: f64,
        weight: f64,
        worker: &mut WorkerTallies,
        rng: &mut R,
    ) -> Result<CollisionOutcome, SamplingError> {
        let material = self.data.material(material_id);

        if !material.in_range(energy) {
            return Ok(CollisionOutcome::OutOfRange);
        }

        // Sampled total: majorant (TMS) or plain total, plus opaque extras,
        // minus absorption under implicit capture.
        let mut total = material.total_xs(energy);
        for extra in &self.extras {
            total += extra.value(material, energy);
        }
        if self.implicit_capture {
            total -= material.macro_absorption_at(energy);
        }
        if total <= 0.0 {
            worker.sampling_failures += 1;
            return Ok(CollisionOutcome::Rejected);
        }

        // Nuclide walk.
        let tms = material.temperature.is_range();
        let u = rng.gen::<f64>() * total;
        let picked = material
            .nuclide_partials
            .walk(energy, u, |i| {
                let nuc = &self.data.nuclides[i];
                let mut xs = if tms {
                    nuc.micro_majorant_at(energy)
                } else {
                    nuc.micro_total_at(energy)
                };
                if self.implicit_capture {
                    xs -= nuc.micro_absorption_at(energy);
                }
                xs
            })
            .map_err(|fault| SamplingError::PartialValidity {
                owner: material.display_name(),
                entry: self.data.nuclides[fault.index].name.clone(),
                e_min: fault.e_min,
                e_max: fault.e_max,
                energy,
            })?;
        let nuclide_id = match picked {
            Some(i) => NuclideId(i),
            None => {
                // u landed past the nuclide sum: an extras contribution or a
                // floating-point boundary. Either way the collision is
                // virtual.
                worker.sampling_failures += 1;
                return Ok(CollisionOutcome::Rejected);
            }
        };
        let nuclide = self.data.nuclide(nuclide_id);

        // Doppler-broadening rejection. Photons see no target motion.
        let mut collision_energy = energy;
        let mut micro_total = nuclide.micro_total_at(energy);
        let mut g = 1.0;
        if particle_type == ParticleType::Neutron
            && tms
            && nuclide.needs_broadening_rejection()
        {
            let temperature = match material.temperature {
                Temperature::Range { min, max } => rng.gen_range(min..=max),
                Temperature::Fixed(t) => t,
            };
            worker.tms_attempts += 1;
            let (relative_energy, xs) =
                self.target_motion
                    .resample(nuclide, energy, temperature, rng);
            g = self.potential.factor(nuclide, energy, temperature);
            let f = g * xs / nuclide.micro_majorant_at(energy);
            if f > MAJORANT_TOLERANCE {
                worker.majorant_violations += 1;
                warn!(
                    "majorant of nuclide '{}' exceeded at E = {:.6e} eV (ratio {:.6})",
                    nuclide.name, energy, f
                );
            }
            if rng.gen::<f64>() >= f {
                worker.tms_rejections += 1;
                return Ok(CollisionOutcome::Rejected);
            }
            collision_energy = relative_energy;
            micro_total = xs;
        }

        // Keep the collision energy inside the nuclide's tabulated range so
        // the reaction walk's validity intervals hold.
        if let Some((lo, hi)) = nuclide.energy_range() {
            collision_energy = collision_energy.clamp(lo, hi);
            if collision_energy >= hi {
                collision_energy = hi * (1.0 - 1e-15);
            }
        }

        // Reaction walk over the channel partial list.
        let mut walk_total = micro_total;
        if self.implicit_capture {
            walk_total -= nuclide.micro_absorption_at(collision_energy);
        }
        if walk_total <= 0.0 {
            worker.sampling_failures += 1;
            return Ok(CollisionOutcome::Rejected);
        }
        let u = rng.gen::<f64>() * walk_total;
        let picked = nuclide
            .reaction_partials
            .walk(collision_energy, u, |i| {
                channel_xs(
                    nuclide,
                    i,
                    energy,
                    collision_energy,
                    g,
                    self.implicit_capture,
                )
            })
            .map_err(|fault| SamplingError::PartialValidity {
                owner: nuclide.name.clone(),
                entry: format!("MT {}", nuclide.reactions[fault.index].kind.mt()),
                e_min: fault.e_min,
                e_max: fault.e_max,
                energy: collision_energy,
            })?;
        let reaction = match picked {
            Some(i) => i,
            None => {
                worker.sampling_failures += 1;
                return Ok(CollisionOutcome::Rejected);
            }
        };

        let kind = nuclide.reactions[reaction].kind;
        worker.record_selection(nuclide_id, kind, weight);
        Ok(CollisionOutcome::Selected {
            nuclide: nuclide_id,
            reaction,
            kind,
            collision_energy,
        })
    }
}

/// Contribution of one reaction channel to the reaction walk.
///
/// Channels are evaluated at the (possibly Doppler-substituted) collision
/// energy. Below the S(a,b) cutoff of a bound nuclide, the free-atom elastic
/// channel instead contributes `elastic_xs(E0) - bound_xs(Ecol)/g`, handing
/// its share to the bound-thermal channels while keeping the channel sum
/// equal to the accepted total. Capture and fission contribute nothing under
/// implicit capture.
fn channel_xs(
    nuclide: &Nuclide,
    index: usize,
    incident_energy: f64,
    collision_energy: f64,
    g: f64,
    implicit_capture: bool,
) -> f64 {
    let r = &nuclide.reactions[index];
    if implicit_capture && r.kind.is_absorbing() {
        return 0.0;
    }
    match r.kind {
        ReactionKind::Elastic
            if nuclide
                .sab_cutoff()
                .map_or(false, |cutoff| collision_energy < cutoff) =>
        {
            let free = r.cross_section_at(incident_energy).unwrap_or(0.0);
            let bound = nuclide.bound_thermal_xs_at(collision_energy) / g;
            (free - bound).max(0.0)
        }
        _ => r.cross_section_at(collision_energy).unwrap_or(0.0),
    }
}

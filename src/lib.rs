//! Collision-outcome sampling kernel for Monte Carlo particle transport.
//!
//! Given read-only nuclear data tables, an incident particle state, and a
//! worker-local rng, the kernel selects the colliding nuclide and reaction
//! channel ([`CollisionSampler`]), samples bound thermal-scattering outgoing
//! states ([`sample_thermal_scatter`]), and synthesizes thermal nuclides at
//! non-tabulated temperatures at setup time ([`interpolate_thermal`]).

pub mod data;
pub mod error;
pub mod fast_rng;
pub mod material;
pub mod nuclide;
pub mod partial;
pub mod particle;
pub mod physics;
pub mod reaction;
pub mod sampler;
pub mod tallies;
pub mod thermal;
pub mod thermal_interp;
pub mod thermal_sample;
pub mod utilities;

pub use data::{MaterialId, NuclearData, NuclideId};
pub use error::SamplingError;
pub use fast_rng::FastRng;
pub use material::{Material, Temperature};
pub use nuclide::Nuclide;
pub use partial::{Partial, PartialList};
pub use particle::{Particle, ParticleType};
pub use physics::{
    AdditiveXs, CxsTargetMotion, FreeGasCorrection, NoCorrection, PotentialCorrection,
    TargetMotionSampler,
};
pub use reaction::{Reaction, ReactionKind};
pub use sampler::{CollisionOutcome, CollisionSampler};
pub use tallies::WorkerTallies;
pub use thermal::{
    ContinuousInelasticLaw, ContinuousTable, DiscreteElasticLaw, DiscreteInelasticLaw,
    DiscreteLine, ExactElasticLaw, ThermalData, ThermalLaw,
};
pub use thermal_interp::{clear_interpolated_cache, interpolate_thermal};
pub use thermal_sample::{sample_thermal_scatter, THERMAL_RETRY_LIMIT};

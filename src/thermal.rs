// S(a,b) bound thermal-scattering law data.
//
// One variant per algorithmic case; the outgoing-state sampler matches on
// these exhaustively.

use serde::{Deserialize, Serialize};

/// Secondary distribution at one incident-energy grid point of a
/// continuous-tabulated inelastic law: outgoing-energy breakpoints with a
/// lin-lin probability density, its running CDF, and one fixed-size set of
/// equiprobable discrete cosines per breakpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousTable {
    pub energy_out: Vec<f64>,
    pub pdf: Vec<f64>,
    pub cdf: Vec<f64>,
    pub cosines: Vec<Vec<f64>>,
}

/// Continuous-tabulated inelastic law: one [`ContinuousTable`] per incident
/// grid energy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuousInelasticLaw {
    pub incident_energy: Vec<f64>,
    pub tables: Vec<ContinuousTable>,
}

/// One discrete secondary line of a coarse inelastic treatment: a single
/// outgoing energy with its equiprobable cosine set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscreteLine {
    pub energy_out: f64,
    pub cosines: Vec<f64>,
}

/// Discrete inelastic law: per incident grid energy, a fixed-size set of
/// equiprobable (outgoing-energy, cosine-set) lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscreteInelasticLaw {
    pub incident_energy: Vec<f64>,
    pub lines: Vec<Vec<DiscreteLine>>,
}

/// Discrete (incoherent) elastic law: per incident grid energy, a fixed-size
/// set of equiprobable discrete cosines. Outgoing energy equals incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscreteElasticLaw {
    pub incident_energy: Vec<f64>,
    pub cosines: Vec<Vec<f64>>,
}

/// Exact (coherent) elastic law: a tabulated cumulative recoil-energy moment
/// per incident grid energy; the cosine follows analytically as
/// mu = 1 - 2*recoil/E. Outgoing energy equals incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactElasticLaw {
    pub incident_energy: Vec<f64>,
    pub recoil: Vec<f64>,
}

/// Polymorphic thermal-scattering law block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ThermalLaw {
    ContinuousInelastic(ContinuousInelasticLaw),
    DiscreteInelastic(DiscreteInelasticLaw),
    DiscreteElastic(DiscreteElasticLaw),
    ExactElastic(ExactElasticLaw),
}

impl ThermalLaw {
    /// Discriminant name for diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            ThermalLaw::ContinuousInelastic(_) => "continuous-inelastic",
            ThermalLaw::DiscreteInelastic(_) => "discrete-inelastic",
            ThermalLaw::DiscreteElastic(_) => "discrete-elastic",
            ThermalLaw::ExactElastic(_) => "exact-elastic",
        }
    }

    pub fn incident_grid(&self) -> &[f64] {
        match self {
            ThermalLaw::ContinuousInelastic(l) => &l.incident_energy,
            ThermalLaw::DiscreteInelastic(l) => &l.incident_energy,
            ThermalLaw::DiscreteElastic(l) => &l.incident_energy,
            ThermalLaw::ExactElastic(l) => &l.incident_energy,
        }
    }
}

/// Thermal-scattering block owned by a bound nuclide: the laws backing the
/// ThermalElastic / ThermalInelastic channels and the cutoff energy above
/// which free-atom physics takes over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalData {
    pub inelastic: Option<ThermalLaw>,
    pub elastic: Option<ThermalLaw>,
    /// S(a,b) cutoff energy in eV.
    pub cutoff_energy: f64,
}

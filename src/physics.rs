// Collaborator interfaces of the sampling kernel and their default
// implementations: target-velocity resampling for Doppler-broadening
// rejection, the low-energy potential-scattering correction, opaque additive
// cross-section contributions, and azimuthal direction rotation.

use nalgebra::Vector3;
use rand::Rng;

use crate::material::Material;
use crate::nuclide::Nuclide;

/// Boltzmann constant in eV/K
pub const K_B: f64 = 8.617333e-5;

/// Doppler/target-velocity resampler consumed by the TMS rejection step.
///
/// Given a nuclide and the incident (lab) energy, draws a thermal target
/// velocity at the exact temperature and returns the relative collision
/// energy together with the microscopic total cross section evaluated at
/// that energy.
pub trait TargetMotionSampler: Sync {
    fn resample<R: Rng + ?Sized>(
        &self,
        nuclide: &Nuclide,
        energy: f64,
        temperature: f64,
        rng: &mut R,
    ) -> (f64, f64);
}

/// Low-energy potential-scattering correction factor g applied to the
/// exact-temperature cross section in the TMS acceptance ratio.
pub trait PotentialCorrection: Sync {
    fn factor(&self, nuclide: &Nuclide, energy: f64, temperature: f64) -> f64;
}

/// Opaque additive macroscopic contribution (equilibrium-poison feedback,
/// acceleration terms, density overlays, on-the-fly burnup terms). Summed
/// into the material total before sampling; internals are out of scope.
pub trait AdditiveXs: Sync {
    fn value(&self, material: &Material, energy: f64) -> f64;
}

/// Sample a target velocity using the constant-cross-section (CXS)
/// approximation: a Maxwellian velocity distribution reweighted by the
/// relative speed through rejection sampling.
///
/// Returns the target velocity in units consistent with the neutron
/// velocity (sqrt(eV)).
pub fn sample_cxs_target_velocity<R: Rng + ?Sized>(
    awr: f64,
    neutron_energy: f64,
    neutron_direction: &[f64; 3],
    temperature_k: f64,
    rng: &mut R,
) -> Vector3<f64> {
    let k_t = K_B * temperature_k;

    // Reduced neutron velocity: beta_vn = sqrt(awr * E / kT)
    let beta_vn = (awr * neutron_energy / k_t).sqrt();

    // Probability weighting factor
    let alpha = 1.0 / (1.0 + std::f64::consts::PI.sqrt() * beta_vn / 2.0);

    let beta_vt_sq: f64;
    let mu: f64;

    loop {
        let r1: f64 = rng.gen();
        let r2: f64 = rng.gen();

        let beta_vt_sq_candidate = if rng.gen::<f64>() < alpha {
            // With probability alpha, sample from p(y) = y*e^(-y)
            -(r1.ln() + r2.ln())
        } else {
            // With probability 1-alpha, sample from p(y) = y^2 * e^(-y^2)
            let c = (std::f64::consts::PI / 2.0 * rng.gen::<f64>()).cos();
            -r1.ln() - r2.ln() * c * c
        };

        let beta_vt = beta_vt_sq_candidate.sqrt();

        // Cosine of the angle between neutron and target velocity
        let mu_candidate = 2.0 * rng.gen::<f64>() - 1.0;

        // accept_prob = |v_rel| / |v_rel_max|
        let accept_prob = (beta_vn * beta_vn + beta_vt_sq_candidate
            - 2.0 * beta_vn * beta_vt * mu_candidate)
            .sqrt()
            / (beta_vn + beta_vt);

        if rng.gen::<f64>() < accept_prob {
            beta_vt_sq = beta_vt_sq_candidate;
            mu = mu_candidate;
            break;
        }
    }

    // Speed of the target nucleus
    let vt = (beta_vt_sq * k_t / awr).sqrt();

    let u = Vector3::new(
        neutron_direction[0],
        neutron_direction[1],
        neutron_direction[2],
    );

    // Rotate by angle mu around a random azimuthal angle
    let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
    vt * rotate_about(&u, mu, phi)
}

/// Default target-motion resampler for TMS: CXS target velocity draw, then
/// the relative collision energy and the nuclide's tabulated total at that
/// energy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CxsTargetMotion;

impl TargetMotionSampler for CxsTargetMotion {
    fn resample<R: Rng + ?Sized>(
        &self,
        nuclide: &Nuclide,
        energy: f64,
        temperature: f64,
        rng: &mut R,
    ) -> (f64, f64) {
        // The target velocity distribution is isotropic, so the relative
        // energy statistics do not depend on the incident direction; use a
        // fixed axis.
        let direction = [0.0, 0.0, 1.0];
        let v_t = sample_cxs_target_velocity(
            nuclide.atomic_weight_ratio,
            energy,
            &direction,
            temperature,
            rng,
        );

        // Neutron velocity in the lab (velocity = sqrt(energy) in units
        // where the neutron mass is 1)
        let v_n = Vector3::new(0.0, 0.0, energy.sqrt());
        let v_rel = v_n - v_t;
        let relative_energy = v_rel.dot(&v_rel);

        let xs = nuclide.micro_total_at(relative_energy);
        (relative_energy, xs)
    }
}

/// Error function, Abramowitz & Stegun 7.1.26 (max error ~1.5e-7).
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let y = 1.0
        - (((((1.061405429 * t - 1.453152027) * t) + 1.421413741) * t - 0.284496736) * t
            + 0.254829592)
            * t
            * (-x * x).exp();
    sign * y
}

/// Default low-energy potential-scattering correction: the free-gas factor
///
///   g = (1 + 1/(2 a^2)) erf(a) + exp(-a^2) / (a sqrt(pi)),  a^2 = A E / kT
///
/// which approaches 1 well above thermal energies.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeGasCorrection;

impl PotentialCorrection for FreeGasCorrection {
    fn factor(&self, nuclide: &Nuclide, energy: f64, temperature: f64) -> f64 {
        let k_t = K_B * temperature;
        let a_sq = nuclide.atomic_weight_ratio * energy / k_t;
        if a_sq > 100.0 {
            return 1.0;
        }
        let a = a_sq.sqrt();
        (1.0 + 0.5 / a_sq) * erf(a) + (-a_sq).exp() / (a * std::f64::consts::PI.sqrt())
    }
}

/// Correction factor pinned to 1, for libraries that fold the potential
/// correction into their majorant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrection;

impl PotentialCorrection for NoCorrection {
    fn factor(&self, _nuclide: &Nuclide, _energy: f64, _temperature: f64) -> f64 {
        1.0
    }
}

/// Rotate `u` to a new unit vector with cosine `mu` relative to `u`, at
/// azimuthal angle `phi`.
fn rotate_about(u: &Vector3<f64>, mu: f64, phi: f64) -> Vector3<f64> {
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    let perp = if u.x.abs() < 0.99 {
        Vector3::new(1.0, 0.0, 0.0).cross(u).normalize()
    } else {
        Vector3::new(0.0, 1.0, 0.0).cross(u).normalize()
    };
    let ortho = u.cross(&perp);
    mu * u + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho
}

/// Rotate a particle direction by scattering cosine `mu` about itself, with
/// a uniformly sampled azimuthal angle. The only mutation of caller-owned
/// state performed by the kernel.
pub fn rotate_direction<R: Rng + ?Sized>(direction: &mut [f64; 3], mu: f64, rng: &mut R) {
    let phi = rng.gen_range(0.0..2.0 * std::f64::consts::PI);

    let [ux, uy, uz] = *direction;
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();

    let (new_ux, new_uy, new_uz) = if uz.abs() < 0.999 {
        // General case
        let factor = sin_theta / (1.0 - uz * uz).sqrt();
        let cos_phi = phi.cos();
        let sin_phi = phi.sin();

        (
            mu * ux + factor * (ux * uz * cos_phi - uy * sin_phi),
            mu * uy + factor * (uy * uz * cos_phi + ux * sin_phi),
            mu * uz - factor * (1.0 - uz * uz).sqrt() * cos_phi,
        )
    } else {
        // Beam nearly parallel to the z-axis
        let cos_phi = phi.cos();
        let sin_phi = phi.sin();
        let sign = if uz > 0.0 { 1.0 } else { -1.0 };

        (sin_theta * cos_phi, sin_theta * sin_phi, sign * mu)
    };

    *direction = [new_ux, new_uy, new_uz];

    // Renormalize against floating-point drift
    let norm = (new_ux * new_ux + new_uy * new_uy + new_uz * new_uz).sqrt();
    if norm > 1e-10 {
        direction[0] /= norm;
        direction[1] /= norm;
        direction[2] /= norm;
    }
}

// Outgoing energy and cosine sampling for bound thermal-scattering laws.

use rand::Rng;

use crate::error::SamplingError;
use crate::nuclide::Nuclide;
use crate::physics::rotate_direction;
use crate::reaction::ReactionKind;
use crate::thermal::{
    ContinuousInelasticLaw, DiscreteElasticLaw, DiscreteInelasticLaw, ExactElasticLaw, ThermalLaw,
};
use crate::utilities::{bracket, cdf_bin};

/// Hard cap on energy+cosine redraws for the continuous law. Exhausting it
/// means the S(a,b) tables are malformed and the run must stop.
pub const THERMAL_RETRY_LIMIT: usize = 100;

/// Sample the outgoing state of a bound thermal-scattering event.
///
/// Looks up the law backing the selected ThermalElastic / ThermalInelastic
/// channel, samples an outgoing energy and scattering cosine, and rotates
/// `direction` in place about itself by the accepted cosine (the only
/// mutation of caller-owned state). Returns the outgoing energy.
pub fn sample_thermal_scatter<R: Rng + ?Sized>(
    nuclide: &Nuclide,
    kind: ReactionKind,
    energy: f64,
    direction: &mut [f64; 3],
    rng: &mut R,
) -> Result<f64, SamplingError> {
    let missing = || SamplingError::MissingThermalLaw {
        nuclide: nuclide.name.clone(),
        mt: kind.mt(),
    };
    let thermal = nuclide.thermal.as_ref().ok_or_else(missing)?;
    let law = match kind {
        ReactionKind::ThermalElastic => thermal.elastic.as_ref(),
        ReactionKind::ThermalInelastic => thermal.inelastic.as_ref(),
        _ => None,
    }
    .ok_or_else(missing)?;

    let (e_out, mu) = match law {
        ThermalLaw::ContinuousInelastic(l) => sample_continuous(nuclide, l, energy, rng)?,
        ThermalLaw::DiscreteInelastic(l) => sample_discrete_inelastic(l, energy, rng),
        ThermalLaw::DiscreteElastic(l) => (energy, sample_discrete_elastic(l, energy, rng)),
        ThermalLaw::ExactElastic(l) => (energy, exact_elastic_cosine(l, energy)),
    };

    rotate_direction(direction, mu, rng);
    Ok(e_out)
}

/// Continuous-tabulated inelastic sampling.
///
/// The incident bracket's nearer grid point supplies the CDF table; the
/// cosine is interpolated between both bracket tables with the incident
/// fraction, then smeared toward its closer tabulated neighbor. Out-of-domain
/// draws are retried as a whole, up to [`THERMAL_RETRY_LIMIT`] times.
fn sample_continuous<R: Rng + ?Sized>(
    nuclide: &Nuclide,
    law: &ContinuousInelasticLaw,
    energy: f64,
    rng: &mut R,
) -> Result<(f64, f64), SamplingError> {
    if law.tables.is_empty() {
        return Err(SamplingError::MalformedThermalTable {
            nuclide: nuclide.name.clone(),
            energy,
            detail: "law carries no secondary tables",
        });
    }
    let grid = &law.incident_energy;
    let (i, r) = if grid.len() < 2 {
        (0, 0.0)
    } else {
        bracket(grid, energy)
    };
    let i_hi = (i + 1).min(law.tables.len() - 1);

    // Nearer-point rule for the secondary-energy table
    let pick = if r < 0.5 { i } else { i_hi };
    let table = &law.tables[pick];
    let e_grid = grid[pick];

    let n = table.energy_out.len();
    if n < 2
        || table.pdf.len() != n
        || table.cdf.len() != n
        || table.cosines.len() != n
        || table.cosines.iter().any(|row| row.is_empty())
    {
        return Err(SamplingError::MalformedThermalTable {
            nuclide: nuclide.name.clone(),
            energy,
            detail: "outgoing-energy, pdf, cdf and cosine arrays must have \
                     matching lengths of at least 2",
        });
    }

    for _ in 0..THERMAL_RETRY_LIMIT {
        // Inverse-CDF draw of the outgoing-energy bin
        let rho: f64 = rng.gen();
        let k = cdf_bin(&table.cdf, rho).min(table.energy_out.len().saturating_sub(2));

        // Invert the bin's lin-lin density
        let e_k = table.energy_out[k];
        let p_k = table.pdf[k];
        let c_k = table.cdf[k];
        let de = table.energy_out[k + 1] - e_k;
        let slope = if de > 0.0 {
            (table.pdf[k + 1] - p_k) / de
        } else {
            0.0
        };
        let raw = if slope != 0.0 {
            e_k + ((p_k * p_k + 2.0 * slope * (rho - c_k)).max(0.0).sqrt() - p_k) / slope
        } else if p_k > 0.0 {
            e_k + (rho - c_k) / p_k
        } else {
            e_k
        };

        // Map the raw offset relative to the table's own incident energy:
        // scale multiplicatively below half the grid energy, shift
        // additively above, preserving detailed balance near threshold.
        let e_out = if raw < 0.5 * e_grid {
            raw * energy / e_grid
        } else {
            raw + energy - e_grid
        };

        // Equiprobable discrete cosine, interpolated between the two
        // original grid points with the incident fraction
        let n_mu = table.cosines[k].len();
        let j = ((rng.gen::<f64>() * n_mu as f64) as usize).min(n_mu - 1);
        let mu_at = |t_idx: usize| -> f64 {
            let t = &law.tables[t_idx];
            let kk = k.min(t.cosines.len() - 1);
            let row = &t.cosines[kk];
            row[j.min(row.len() - 1)]
        };
        let mu_lo = mu_at(i);
        let mu_hi = mu_at(i_hi);
        let mut mu = mu_lo + r * (mu_hi - mu_lo);

        // Smear toward the closer tabulated neighbor; the array ends use the
        // synthetic neighbors -1-(mu+1) and 1+(1-mu)
        let row = &table.cosines[k];
        let jj = j.min(row.len() - 1);
        let prev = if jj == 0 { -2.0 - mu } else { row[jj - 1] };
        let next = if jj + 1 >= row.len() {
            2.0 - mu
        } else {
            row[jj + 1]
        };
        let gap = (mu - prev).abs().min((next - mu).abs());
        mu += (rng.gen::<f64>() - 0.5) * gap;

        if e_out > 0.0 && (-1.0..=1.0).contains(&mu) {
            return Ok((e_out, mu));
        }
    }

    Err(SamplingError::RetryBudgetExhausted {
        nuclide: nuclide.name.clone(),
        energy,
        limit: THERMAL_RETRY_LIMIT,
    })
}

/// Discrete inelastic: a uniformly chosen secondary line, with outgoing
/// energy and cosine blended linearly between the bracket grid points.
fn sample_discrete_inelastic<R: Rng + ?Sized>(
    law: &DiscreteInelasticLaw,
    energy: f64,
    rng: &mut R,
) -> (f64, f64) {
    let grid = &law.incident_energy;
    let (i, r) = if grid.len() < 2 {
        (0, 0.0)
    } else {
        bracket(grid, energy)
    };
    let i_hi = (i + 1).min(law.lines.len() - 1);

    let lines_lo = &law.lines[i];
    let lines_hi = &law.lines[i_hi];
    let n_lines = lines_lo.len();
    let j = ((rng.gen::<f64>() * n_lines as f64) as usize).min(n_lines - 1);
    let lo = &lines_lo[j];
    let hi = &lines_hi[j.min(lines_hi.len() - 1)];

    let e_out = lo.energy_out + r * (hi.energy_out - lo.energy_out);

    let n_mu = lo.cosines.len();
    let m = ((rng.gen::<f64>() * n_mu as f64) as usize).min(n_mu - 1);
    let mu_lo = lo.cosines[m];
    let mu_hi = hi.cosines[m.min(hi.cosines.len() - 1)];
    let mu = (mu_lo + r * (mu_hi - mu_lo)).clamp(-1.0, 1.0);

    (e_out.max(f64::MIN_POSITIVE), mu)
}

/// Discrete (incoherent) elastic: a uniformly chosen equiprobable cosine,
/// blended linearly between the bracket grid points. Energy is unchanged.
fn sample_discrete_elastic<R: Rng + ?Sized>(
    law: &DiscreteElasticLaw,
    energy: f64,
    rng: &mut R,
) -> f64 {
    let grid = &law.incident_energy;
    let (i, r) = if grid.len() < 2 {
        (0, 0.0)
    } else {
        bracket(grid, energy)
    };
    let i_hi = (i + 1).min(law.cosines.len() - 1);

    let row_lo = &law.cosines[i];
    let row_hi = &law.cosines[i_hi];
    let n_mu = row_lo.len();
    let j = ((rng.gen::<f64>() * n_mu as f64) as usize).min(n_mu - 1);
    let mu_lo = row_lo[j];
    let mu_hi = row_hi[j.min(row_hi.len() - 1)];
    (mu_lo + r * (mu_hi - mu_lo)).clamp(-1.0, 1.0)
}

/// Exact (coherent) elastic: the cosine follows analytically from the
/// tabulated cumulative recoil-energy moment at the nearest grid point at or
/// below the incident energy: mu = 1 - 2*recoil/E.
fn exact_elastic_cosine(law: &ExactElasticLaw, energy: f64) -> f64 {
    let grid = &law.incident_energy;
    let idx = match grid
        .binary_search_by(|e| e.partial_cmp(&energy).unwrap())
    {
        Ok(i) => i,
        Err(0) => 0,
        Err(i) => i - 1,
    };
    let recoil = law.recoil[idx.min(law.recoil.len() - 1)];
    (1.0 - 2.0 * recoil / energy).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal::{ContinuousTable, DiscreteLine, ThermalData};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn continuous_law() -> ContinuousInelasticLaw {
        // Two incident grid points with flat secondary densities
        let table = |scale: f64| ContinuousTable {
            energy_out: vec![0.1 * scale, 0.5 * scale, 1.0 * scale],
            pdf: vec![1.0 / (0.9 * scale); 3],
            cdf: vec![0.0, 0.444444444, 1.0],
            cosines: vec![
                vec![-0.6, 0.0, 0.6],
                vec![-0.6, 0.0, 0.6],
                vec![-0.6, 0.0, 0.6],
            ],
        };
        ContinuousInelasticLaw {
            incident_energy: vec![0.5, 2.0],
            tables: vec![table(0.5), table(2.0)],
        }
    }

    fn bound_nuclide(law: ThermalLaw, elastic: bool) -> Nuclide {
        let mut nuc = Nuclide::new("H-bound", 1, 1, 294.0, "test", 0.999);
        nuc.thermal = Some(ThermalData {
            inelastic: if elastic { None } else { Some(law.clone()) },
            elastic: if elastic { Some(law) } else { None },
            cutoff_energy: 4.0,
        });
        nuc
    }

    #[test]
    fn test_continuous_sampling_domain() {
        let nuc = bound_nuclide(ThermalLaw::ContinuousInelastic(continuous_law()), false);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20_000 {
            let mut dir = [0.0, 0.0, 1.0];
            let e_out = sample_thermal_scatter(
                &nuc,
                ReactionKind::ThermalInelastic,
                1.0,
                &mut dir,
                &mut rng,
            )
            .unwrap();
            assert!(e_out > 0.0, "e_out = {}", e_out);
            let norm = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
            assert!((norm - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_continuous_retry_exhaustion_is_fatal() {
        // Degenerate table whose every draw maps to e_out = 0
        let law = ContinuousInelasticLaw {
            incident_energy: vec![0.5, 2.0],
            tables: vec![
                ContinuousTable {
                    energy_out: vec![0.0, 0.0],
                    pdf: vec![0.0, 0.0],
                    cdf: vec![0.0, 1.0],
                    cosines: vec![vec![0.0], vec![0.0]],
                },
                ContinuousTable {
                    energy_out: vec![0.0, 0.0],
                    pdf: vec![0.0, 0.0],
                    cdf: vec![0.0, 1.0],
                    cosines: vec![vec![0.0], vec![0.0]],
                },
            ],
        };
        let nuc = bound_nuclide(ThermalLaw::ContinuousInelastic(law), false);
        let mut rng = StdRng::seed_from_u64(1);
        let mut dir = [0.0, 0.0, 1.0];
        let out = sample_thermal_scatter(
            &nuc,
            ReactionKind::ThermalInelastic,
            1.0,
            &mut dir,
            &mut rng,
        );
        assert!(matches!(
            out,
            Err(SamplingError::RetryBudgetExhausted { limit: 100, .. })
        ));
    }

    #[test]
    fn test_single_breakpoint_table_is_fatal() {
        // One outgoing-energy breakpoint cannot define a lin-lin bin
        let table = ContinuousTable {
            energy_out: vec![0.1],
            pdf: vec![1.0],
            cdf: vec![1.0],
            cosines: vec![vec![0.0]],
        };
        let law = ContinuousInelasticLaw {
            incident_energy: vec![0.5, 2.0],
            tables: vec![table.clone(), table],
        };
        let nuc = bound_nuclide(ThermalLaw::ContinuousInelastic(law), false);
        let mut rng = StdRng::seed_from_u64(2);
        let mut dir = [0.0, 0.0, 1.0];
        let out = sample_thermal_scatter(
            &nuc,
            ReactionKind::ThermalInelastic,
            1.0,
            &mut dir,
            &mut rng,
        );
        assert!(matches!(
            out,
            Err(SamplingError::MalformedThermalTable { .. })
        ));
    }

    #[test]
    fn test_discrete_elastic_keeps_energy() {
        let law = ThermalLaw::DiscreteElastic(DiscreteElasticLaw {
            incident_energy: vec![0.5, 2.0],
            cosines: vec![vec![-0.9, -0.3, 0.3, 0.9], vec![-0.8, -0.2, 0.4, 0.8]],
        });
        let nuc = bound_nuclide(law, true);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let mut dir = [0.0, 0.0, 1.0];
            let e_out = sample_thermal_scatter(
                &nuc,
                ReactionKind::ThermalElastic,
                1.0,
                &mut dir,
                &mut rng,
            )
            .unwrap();
            assert_eq!(e_out, 1.0);
        }
    }

    #[test]
    fn test_discrete_inelastic_blends_lines() {
        let line = |e: f64| DiscreteLine {
            energy_out: e,
            cosines: vec![-0.5, 0.5],
        };
        let law = ThermalLaw::DiscreteInelastic(DiscreteInelasticLaw {
            incident_energy: vec![1.0, 3.0],
            lines: vec![vec![line(0.2)], vec![line(0.6)]],
        });
        let nuc = bound_nuclide(law, false);
        let mut rng = StdRng::seed_from_u64(5);
        let mut dir = [0.0, 0.0, 1.0];
        // Midpoint of the incident bracket: blended outgoing energy 0.4
        let e_out = sample_thermal_scatter(
            &nuc,
            ReactionKind::ThermalInelastic,
            2.0,
            &mut dir,
            &mut rng,
        )
        .unwrap();
        assert!((e_out - 0.4).abs() < 1e-12, "e_out = {}", e_out);
    }

    #[test]
    fn test_exact_elastic_analytic_cosine() {
        let law = ExactElasticLaw {
            incident_energy: vec![1.0, 2.0, 4.0],
            recoil: vec![0.25, 0.5, 1.0],
        };
        // At E = 2.0: mu = 1 - 2*0.5/2.0 = 0.5
        assert!((exact_elastic_cosine(&law, 2.0) - 0.5).abs() < 1e-12);
        // Between grid points the moment at the lower point applies
        assert!((exact_elastic_cosine(&law, 3.0) - (1.0 - 2.0 * 0.5 / 3.0)).abs() < 1e-12);
        // Clamped to [-1, 1] at small energies
        assert_eq!(exact_elastic_cosine(&law, 0.1), -1.0);
    }

    #[test]
    fn test_missing_law_is_fatal() {
        let nuc = Nuclide::new("bare", 1, 1, 294.0, "test", 1.0);
        let mut rng = StdRng::seed_from_u64(9);
        let mut dir = [0.0, 0.0, 1.0];
        let out =
            sample_thermal_scatter(&nuc, ReactionKind::ThermalInelastic, 1.0, &mut dir, &mut rng);
        assert!(matches!(
            out,
            Err(SamplingError::MissingThermalLaw { mt: 1004, .. })
        ));
    }
}

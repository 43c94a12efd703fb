// Setup-time temperature interpolation of thermal-scattering nuclides.
//
// Synthesizes a new bound nuclide at a non-tabulated temperature by blending
// two bracket-temperature evaluations of the same isotope. Runs once per
// (pair, temperature) before transport; the result is cached and becomes
// part of the read-only tables. Never called concurrently with sampling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::error::SamplingError;
use crate::nuclide::Nuclide;
use crate::reaction::ReactionKind;
use crate::thermal::{ContinuousInelasticLaw, ThermalLaw};
use crate::utilities::interpolate_linear;

// Cache of synthesized nuclides keyed by (name, library, temperature in mK).
// Integer millikelvin keeps the key hashable without f64 equality.
static INTERPOLATED_CACHE: Lazy<Mutex<HashMap<(String, String, u64), Arc<Nuclide>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cache_key(name: &str, library: &str, temperature: f64) -> (String, String, u64) {
    (
        name.to_string(),
        library.to_string(),
        (temperature * 1000.0).round() as u64,
    )
}

/// Clear the interpolated-nuclide cache (tests and repeated setups).
pub fn clear_interpolated_cache() {
    match INTERPOLATED_CACHE.lock() {
        Ok(mut cache) => cache.clear(),
        Err(poisoned) => poisoned.into_inner().clear(),
    }
}

/// Synthesize a nuclide at `target` K from two bracket-temperature
/// evaluations of the same isotope.
///
/// At an endpoint temperature the matching bracket is returned as-is (same
/// allocation, no copy). Otherwise the result is a deep copy of `nuc1`
/// renamed with an interpolation marker, with every thermal-law cross
/// section and secondary payload blended between the brackets: plain linear
/// for cross sections and cosines, reciprocal for inelastic outgoing
/// energies.
pub fn interpolate_thermal(
    nuc1: &Arc<Nuclide>,
    nuc2: &Arc<Nuclide>,
    target: f64,
) -> Result<Arc<Nuclide>, SamplingError> {
    let t1 = nuc1.temperature;
    let t2 = nuc2.temperature;

    if target == t1 {
        return Ok(Arc::clone(nuc1));
    }
    if target == t2 {
        return Ok(Arc::clone(nuc2));
    }
    if !(t1 < t2) || target < t1 || target > t2 {
        return Err(SamplingError::TemperatureOutsideBracket {
            nuclide: nuc1.name.clone(),
            t1,
            t2,
            target,
        });
    }
    if nuc1.atomic_number != nuc2.atomic_number
        || nuc1.mass_number != nuc2.mass_number
        || nuc1.isomeric_state != nuc2.isomeric_state
        || nuc1.library != nuc2.library
    {
        return Err(SamplingError::MismatchedBrackets {
            nuclide1: nuc1.name.clone(),
            nuclide2: nuc2.name.clone(),
        });
    }

    let key = cache_key(&nuc1.name, &nuc1.library, target);
    if let Ok(cache) = INTERPOLATED_CACHE.lock() {
        if let Some(hit) = cache.get(&key) {
            return Ok(Arc::clone(hit));
        }
    }

    let f = (target - t1) / (t2 - t1);

    // Deep copy: brackets are reused elsewhere and must never be aliased.
    let mut out = (**nuc1).clone();
    out.temperature = target;
    out.name = format!("{}-interp{:.0}K", nuc1.name, target);

    // Blend the thermal channels' cross sections.
    for kind in [ReactionKind::ThermalElastic, ReactionKind::ThermalInelastic] {
        let r2 = match nuc2.reaction(kind) {
            Some(r) => r,
            None => continue,
        };
        let Some(idx) = out.reaction_index(kind) else {
            continue;
        };
        let r_out = &mut out.reactions[idx];
        let same_grid = r_out.energy.len() == r2.energy.len()
            && r_out
                .energy
                .iter()
                .zip(&r2.energy)
                .all(|(a, b)| a == b);
        for i in 0..r_out.cross_section.len() {
            let x2 = if same_grid {
                r2.cross_section[i]
            } else {
                // Align nuc2 onto nuc1's grid first, then blend in temperature
                interpolate_linear(&r2.energy, &r2.cross_section, r_out.energy[i])
            };
            r_out.cross_section[i] = (1.0 - f) * r_out.cross_section[i] + f * x2;
        }
    }

    // Blend the law payloads.
    if let (Some(th_out), Some(th2)) = (out.thermal.as_mut(), nuc2.thermal.as_ref()) {
        blend_optional_law(
            &mut th_out.inelastic,
            th2.inelastic.as_ref(),
            f,
            &nuc1.name,
            &nuc2.name,
        )?;
        blend_optional_law(
            &mut th_out.elastic,
            th2.elastic.as_ref(),
            f,
            &nuc1.name,
            &nuc2.name,
        )?;
    }

    // Keep derived tables consistent with the blended data.
    out.finalize()?;

    let out = Arc::new(out);
    if let Ok(mut cache) = INTERPOLATED_CACHE.lock() {
        cache.insert(key, Arc::clone(&out));
    }
    Ok(out)
}

fn blend_optional_law(
    law1: &mut Option<ThermalLaw>,
    law2: Option<&ThermalLaw>,
    f: f64,
    name1: &str,
    name2: &str,
) -> Result<(), SamplingError> {
    let mismatch = || SamplingError::MismatchedThermalLaws {
        nuclide1: name1.to_string(),
        nuclide2: name2.to_string(),
    };
    match (law1.as_mut(), law2) {
        (None, None) => Ok(()),
        (Some(l1), Some(l2)) => blend_law(l1, l2, f).ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

/// Blend `l2` into `l1` with temperature fraction `f`. Returns None when the
/// variants differ.
fn blend_law(l1: &mut ThermalLaw, l2: &ThermalLaw, f: f64) -> Option<()> {
    match (l1, l2) {
        (ThermalLaw::ContinuousInelastic(a), ThermalLaw::ContinuousInelastic(b)) => {
            blend_continuous(a, b, f);
            Some(())
        }
        (ThermalLaw::DiscreteInelastic(a), ThermalLaw::DiscreteInelastic(b)) => {
            for (i, lines) in a.lines.iter_mut().enumerate() {
                let i2 = i.min(b.lines.len() - 1);
                for (j, line) in lines.iter_mut().enumerate() {
                    let other = &b.lines[i2][j.min(b.lines[i2].len() - 1)];
                    // Reciprocal blend for inelastic outgoing energies
                    line.energy_out = reciprocal_blend(line.energy_out, other.energy_out, f);
                    for (m, mu) in line.cosines.iter_mut().enumerate() {
                        let mu2 = other.cosines[m.min(other.cosines.len() - 1)];
                        *mu = (1.0 - f) * *mu + f * mu2;
                    }
                }
            }
            Some(())
        }
        (ThermalLaw::DiscreteElastic(a), ThermalLaw::DiscreteElastic(b)) => {
            for (i, row) in a.cosines.iter_mut().enumerate() {
                let i2 = i.min(b.cosines.len() - 1);
                for (j, mu) in row.iter_mut().enumerate() {
                    let mu2 = b.cosines[i2][j.min(b.cosines[i2].len() - 1)];
                    *mu = (1.0 - f) * *mu + f * mu2;
                }
            }
            Some(())
        }
        (ThermalLaw::ExactElastic(a), ThermalLaw::ExactElastic(b)) => {
            for (i, w) in a.recoil.iter_mut().enumerate() {
                let w2 = b.recoil[i.min(b.recoil.len() - 1)];
                *w = (1.0 - f) * *w + f * w2;
            }
            Some(())
        }
        _ => None,
    }
}

fn blend_continuous(a: &mut ContinuousInelasticLaw, b: &ContinuousInelasticLaw, f: f64) {
    let same_grid = a.incident_energy.len() == b.incident_energy.len()
        && a.incident_energy
            .iter()
            .zip(&b.incident_energy)
            .all(|(x, y)| x == y);

    for (i, table) in a.tables.iter_mut().enumerate() {
        // Locate nuc2's table(s) for this incident energy: the matching
        // index when grids coincide, otherwise the bracketing interval in
        // nuc2's grid interpolated to nuc1's incident energy.
        let (i2_lo, i2_hi, w) = if same_grid {
            (i, i, 0.0)
        } else {
            let e = a.incident_energy[i];
            let (lo, frac) = crate::utilities::bracket(&b.incident_energy, e);
            (lo, (lo + 1).min(b.tables.len() - 1), frac)
        };
        let t_lo = &b.tables[i2_lo];
        let t_hi = &b.tables[i2_hi];

        for k in 0..table.energy_out.len() {
            let kk_lo = k.min(t_lo.energy_out.len() - 1);
            let kk_hi = k.min(t_hi.energy_out.len() - 1);

            // Inelastic outgoing energies: reciprocal blend
            let e2 = (1.0 - w) * t_lo.energy_out[kk_lo] + w * t_hi.energy_out[kk_hi];
            table.energy_out[k] = reciprocal_blend(table.energy_out[k], e2, f);

            // Probability payloads: plain linear blend
            let p2 = (1.0 - w) * t_lo.pdf[kk_lo] + w * t_hi.pdf[kk_hi];
            table.pdf[k] = (1.0 - f) * table.pdf[k] + f * p2;
            let c2 = (1.0 - w) * t_lo.cdf[kk_lo] + w * t_hi.cdf[kk_hi];
            table.cdf[k] = (1.0 - f) * table.cdf[k] + f * c2;

            // Cosines: plain linear blend
            for (j, mu) in table.cosines[k].iter_mut().enumerate() {
                let row_lo = &t_lo.cosines[kk_lo];
                let row_hi = &t_hi.cosines[kk_hi];
                let mu2 = (1.0 - w) * row_lo[j.min(row_lo.len() - 1)]
                    + w * row_hi[j.min(row_hi.len() - 1)];
                *mu = (1.0 - f) * *mu + f * mu2;
            }
        }
    }
}

/// Reciprocal blend 1/E = (1-f)/E1 + f/E2, preserving detailed balance near
/// threshold. Degenerates to the linear blend when either energy is zero.
fn reciprocal_blend(e1: f64, e2: f64, f: f64) -> f64 {
    if e1 <= 0.0 || e2 <= 0.0 {
        return (1.0 - f) * e1 + f * e2;
    }
    1.0 / ((1.0 - f) / e1 + f / e2)
}

// Error taxonomy for the collision sampling kernel.
//
// Expected non-events (energy out of range, Doppler rejection, walk
// exhaustion) are ordinary outcome variants, not errors. Everything in
// `SamplingError` indicates malformed or mismatched nuclear data and must
// abort the run: continuing would silently bias the statistics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplingError {
    /// A partial-selection walk visited an entry whose validity interval
    /// does not contain the sampling energy. The list was built wrong or the
    /// underlying tables are inconsistent.
    #[error(
        "partial list of {owner} has entry '{entry}' valid on [{e_min:.6e}, {e_max:.6e}) eV, \
         which excludes sampling energy {energy:.6e} eV"
    )]
    PartialValidity {
        owner: String,
        entry: String,
        e_min: f64,
        e_max: f64,
        energy: f64,
    },

    /// The bounded thermal-scattering retry loop ran out of attempts without
    /// producing an in-domain (energy, cosine) pair.
    #[error(
        "thermal scattering for nuclide '{nuclide}' exhausted {limit} retries at \
         E = {energy:.6e} eV; the S(a,b) tables are malformed"
    )]
    RetryBudgetExhausted {
        nuclide: String,
        energy: f64,
        limit: usize,
    },

    /// Thermal-table interpolation was asked for a temperature outside its
    /// declared bracket.
    #[error(
        "interpolation temperature {target} K outside bracket [{t1} K, {t2} K] \
         for nuclide '{nuclide}'"
    )]
    TemperatureOutsideBracket {
        nuclide: String,
        t1: f64,
        t2: f64,
        target: f64,
    },

    /// A continuous thermal-scattering table cannot be sampled because its
    /// arrays are missing or inconsistent.
    #[error(
        "continuous thermal table of nuclide '{nuclide}' at E = {energy:.6e} eV \
         is malformed: {detail}"
    )]
    MalformedThermalTable {
        nuclide: String,
        energy: f64,
        detail: &'static str,
    },

    /// A bound-thermal reaction was selected but the nuclide carries no
    /// matching scattering-law block.
    #[error("nuclide '{nuclide}' has no thermal scattering law for MT {mt}")]
    MissingThermalLaw { nuclide: String, mt: i32 },

    /// Bracket nuclides carry different thermal-law variants; blending them
    /// is meaningless.
    #[error(
        "nuclides '{nuclide1}' and '{nuclide2}' carry different thermal-law \
         variants and cannot be interpolated"
    )]
    MismatchedThermalLaws { nuclide1: String, nuclide2: String },

    /// Bracket nuclides must describe the same isotope from the same library.
    #[error(
        "nuclides '{nuclide1}' and '{nuclide2}' are not the same isotope/library \
         and cannot bracket a temperature interpolation"
    )]
    MismatchedBrackets { nuclide1: String, nuclide2: String },

    /// A material was finalized with no composition entries.
    #[error("material '{material}' has an empty composition")]
    EmptyComposition { material: String },

    /// Atomic densities must be non-negative.
    #[error("negative atomic density {density} for nuclide '{nuclide}' in material '{material}'")]
    NegativeDensity {
        material: String,
        nuclide: String,
        density: f64,
    },

    /// Every nuclide used in transport needs a total cross-section channel.
    #[error("nuclide '{nuclide}' has no total cross-section channel")]
    MissingTotal { nuclide: String },

    /// The tabulated ranges of a material's nuclides do not overlap.
    #[error("nuclides of material '{material}' share no common tabulated energy range")]
    NoCommonEnergyRange { material: String },
}

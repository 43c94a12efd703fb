use serde::{Deserialize, Serialize};

/// Species tracked by the transport loop. Photons never take the TMS or
/// bound-thermal branches of the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleType {
    Neutron,
    Photon,
}

/// Minimal particle state consumed by the sampling kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub energy: f64,
    pub direction: [f64; 3],
    pub weight: f64,
    pub alive: bool,
    pub id: u64,
}

impl Particle {
    pub fn new(direction: [f64; 3], energy: f64) -> Self {
        Particle {
            energy,
            direction,
            weight: 1.0,
            alive: true,
            id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_new() {
        let p = Particle::new([0.0, 0.0, 1.0], 2.0e6);
        assert_eq!(p.energy, 2.0e6);
        assert_eq!(p.direction, [0.0, 0.0, 1.0]);
        assert_eq!(p.weight, 1.0);
        assert!(p.alive);
    }
}

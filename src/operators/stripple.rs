//! Stripple: strain + ripple mutation (spec §4.7).
//!
//! Grounded on the teacher's `Mutator::breathing` (cell-scale strain) composed
//! with `Mutator::rattle`/`twist` (per-atom sinusoidal displacement),
//! generalized into the two named parameters the spec calls for: `sigma`
//! (maximum lattice strain magnitude, see [`crate::operators::strain`]) and
//! `rho` (maximum ripple displacement amplitude). Following
//! `original_source/src/xtalopt/genetic.cpp`'s `stripple` operator, the ripple
//! is the product of two independent cosine waves, one per in-plane axis, each
//! with its own period and phase, displacing the third (out-of-plane)
//! fractional coordinate. A zero-intensity stripple (`sigma = 0`, `rho = 0`)
//! must leave the structure identical after wrapping (spec §8 scenario S5).

use rand::Rng;
use std::f64::consts::TAU;

use crate::core::crystal::CrystalBody;
use crate::operators::strain::apply_random_strain;

/// Apply a strained cell plus a two-axis cosine-product "ripple" displacement
/// to every atom's fractional coordinate: picking a random displacement axis
/// `k` and the two remaining in-plane axes `(a, b)`, each atom's `k`-th
/// fractional coordinate is shifted by
/// `rho * cos(2*pi*eta*frac[a] + phi1) * cos(2*pi*mu*frac[b] + phi2)`, with
/// `eta`, `mu`, `phi1`, `phi2` drawn once per call.
pub fn stripple<R: Rng + ?Sized>(parent: &CrystalBody, sigma: f64, rho: f64, rng: &mut R) -> CrystalBody {
    let strained_cell = apply_random_strain(&parent.cell, sigma, rng);
    let mut child = CrystalBody::new(strained_cell);

    let disp_axis = rng.gen_range(0..3);
    let axis_a = (disp_axis + 1) % 3;
    let axis_b = (disp_axis + 2) % 3;
    let eta = rng.gen_range(1.0..3.0);
    let mu = rng.gen_range(1.0..3.0);
    let phi1 = rng.gen_range(0.0..TAU);
    let phi2 = rng.gen_range(0.0..TAU);

    for atom in &parent.atoms {
        let frac = parent.cell.cart_to_frac(&atom.position);
        let mut new_frac = frac;
        if rho > 0.0 {
            let ripple = rho
                * (TAU * eta * frac[axis_a] + phi1).cos()
                * (TAU * mu * frac[axis_b] + phi2).cos();
            new_frac[disp_axis] += ripple;
        }
        let cart = strained_cell.frac_to_cart(&new_frac);
        child.add_atom(atom.atomic_number, cart);
    }
    child.wrap();
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Cell;
    use nalgebra::{Matrix3, Vector3};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cubic(a: f64) -> Cell {
        Cell::new(Matrix3::new(a, 0.0, 0.0, 0.0, a, 0.0, 0.0, 0.0, a))
    }

    #[test]
    fn scenario_s5_zero_intensity_is_identity_after_wrap() {
        let mut parent = CrystalBody::new(cubic(5.0));
        parent.add_atom(11, Vector3::new(1.2, 2.3, 0.4));
        parent.add_atom(17, Vector3::new(4.1, 0.9, 3.3));
        let mut expected = parent.clone();
        expected.wrap();

        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let child = stripple(&parent, 0.0, 0.0, &mut rng);

        assert_eq!(child.atoms.len(), expected.atoms.len());
        for (c, e) in child.atoms.iter().zip(expected.atoms.iter()) {
            assert_eq!(c.atomic_number, e.atomic_number);
            assert!((c.position - e.position).norm() < 1e-9);
        }
    }

    #[test]
    fn nonzero_intensity_changes_atom_positions() {
        let mut parent = CrystalBody::new(cubic(5.0));
        parent.add_atom(11, Vector3::new(1.2, 2.3, 0.4));
        parent.add_atom(17, Vector3::new(4.1, 0.9, 3.3));

        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let child = stripple(&parent, 0.05, 0.05, &mut rng);
        let moved = parent
            .atoms
            .iter()
            .zip(child.atoms.iter())
            .any(|(p, c)| (p.position - c.position).norm() > 1e-6);
        assert!(moved);
    }
}

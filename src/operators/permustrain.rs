//! Permustrain: atomic-identity permutation + strain (spec §4.7).
//!
//! Grounded on the teacher's `Mutator::swap` (exchange the positions of two
//! randomly chosen atoms) composed with [`crate::operators::strain`]'s
//! strain helper, generalized from swapping *positions* to swapping *species*
//! between two sites of differing element so composition is exactly
//! preserved (only the site assignment changes, not the count of each
//! element).

use rand::Rng;

use crate::core::crystal::CrystalBody;
use crate::operators::strain::apply_random_strain;

/// Swap the species of `swap_count` randomly chosen pairs of sites that
/// currently hold different elements, then strain the cell by up to `sigma`.
/// Composition is unchanged by construction.
pub fn permustrain<R: Rng + ?Sized>(
    parent: &CrystalBody,
    swap_count: usize,
    sigma: f64,
    rng: &mut R,
) -> CrystalBody {
    let mut child = parent.clone();
    let n = child.atoms.len();
    if n >= 2 {
        for _ in 0..swap_count {
            let i = rng.gen_range(0..n);
            let j = rng.gen_range(0..n);
            if i != j && child.atoms[i].atomic_number != child.atoms[j].atomic_number {
                let tmp = child.atoms[i].atomic_number;
                child.atoms[i].atomic_number = child.atoms[j].atomic_number;
                child.atoms[j].atomic_number = tmp;
            }
        }
    }
    child.cell = apply_random_strain(&child.cell, sigma, rng);
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
    fn permutation_preserves_composition() {
        let mut parent = CrystalBody::new(cubic(5.0));
        for i in 0..3 {
            parent.add_atom(11, Vector3::new(i as f64, 0.0, 0.0));
        }
        for i in 0..3 {
            parent.add_atom(17, Vector3::new(i as f64, 2.0, 2.0));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let child = permustrain(&parent, 5, 0.02, &mut rng);
        assert_eq!(child.observed_composition(), parent.observed_composition());
    }
}

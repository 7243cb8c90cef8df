//! Shared lattice-strain helper used by `stripple` and `permustrain` (spec §4.7).
//!
//! Grounded on the teacher's `Mutator::breathing`/`rotate` (randomized,
//! bounded-magnitude linear transforms applied to a cluster) generalized from
//! an isotropic scale factor to a full symmetric strain tensor applied to the
//! cell matrix while fractional atomic coordinates are held fixed, and on
//! `original_source/src/xtalopt/genetic.cpp`'s strain mutation, which draws
//! each tensor entry from a Gaussian of standard deviation `sigma` and then
//! rescales the result back to the parent's own volume so strain only changes
//! shape, never size.

use nalgebra::Matrix3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::core::geometry::Cell;

/// Apply a random symmetric strain of standard deviation `sigma` to `cell`,
/// then rescale the result back to `cell`'s own volume. `sigma = 0` is a
/// no-op (identity strain), matching the expectation that a zero-intensity
/// mutation leaves the cell numerically unchanged (spec §4.7, §8 scenario S5).
pub fn apply_random_strain<R: Rng + ?Sized>(cell: &Cell, sigma: f64, rng: &mut R) -> Cell {
    if sigma <= 0.0 {
        return *cell;
    }
    let normal = Normal::new(0.0, sigma).expect("sigma must be finite and positive here");
    let mut e = |rng: &mut R| normal.sample(rng);
    let exx = e(rng);
    let eyy = e(rng);
    let ezz = e(rng);
    let exy = e(rng) * 0.5;
    let exz = e(rng) * 0.5;
    let eyz = e(rng) * 0.5;
    #[rustfmt::skip]
    let strain = Matrix3::new(
        1.0 + exx, exy,       exz,
        exy,       1.0 + eyy, eyz,
        exz,       eyz,       1.0 + ezz,
    );
    let mut strained = Cell::new(cell.matrix * strain);
    strained.set_volume(cell.volume());
    strained
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3 as M3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_sigma_is_exact_identity() {
        let cell = Cell::new(M3::new(4.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let strained = apply_random_strain(&cell, 0.0, &mut rng);
        assert_eq!(strained, cell);
    }

    #[test]
    fn nonzero_sigma_preserves_volume() {
        let cell = Cell::new(M3::new(4.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let strained = apply_random_strain(&cell, 0.08, &mut rng);
        assert!((strained.volume() - cell.volume()).abs() < 1e-9);
        assert!(strained != cell, "a nonzero sigma should actually change the cell shape");
    }
}

//! Permutomic: pure atomic-identity permutation, no strain (spec §4.7).
//!
//! Grounded the same way as [`crate::operators::permustrain`] but without the
//! strain pass, matching the distinction `original_source` draws between the
//! two operators: permutomic only ever reassigns which site holds which
//! element.

use rand::Rng;

use crate::core::crystal::CrystalBody;

/// Swap the species of `swap_count` randomly chosen pairs of differing-
/// element sites. Composition and cell are unchanged.
pub fn permutomic<R: Rng + ?Sized>(parent: &CrystalBody, swap_count: usize, rng: &mut R) -> CrystalBody {
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
    child.wrap();
    child
}

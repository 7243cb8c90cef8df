//! Permucomp: permute composition (spec §4.7 "Target composition selection").
//!
//! Grounded on the teacher's stoichiometry-repair step inside
//! [`crate::engine::operators::crossover_cut_splice`] (reassign surplus
//! species to deficit species), reused here as the whole operator rather than
//! a repair pass: given a list of allowed compositions, pick the one closest
//! (by [`CompositionEntry::mean_abs_deviation`]) to the parent's current
//! composition *other than* the parent's own, then reassign atoms until the
//! child matches it exactly.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::composition::CompositionEntry;
use crate::core::crystal::CrystalBody;

/// Among `allowed`, choose the composition with the lowest mean absolute
/// deviation from `observed`, breaking ties by input order. Returns `None` if
/// `allowed` is empty.
pub fn select_target_composition<'a>(
    observed: &CompositionEntry,
    allowed: &'a [CompositionEntry],
) -> Option<&'a CompositionEntry> {
    allowed
        .iter()
        .min_by(|a, b| {
            observed
                .mean_abs_deviation(a)
                .total_cmp(&observed.mean_abs_deviation(b))
        })
}

/// Reassign the child's atoms so its composition matches `target` exactly,
/// preferring a composition distinct from the parent's own when one is
/// available in `allowed` (spec §4.7).
pub fn permucomp<R: Rng + ?Sized>(
    parent: &CrystalBody,
    allowed: &[CompositionEntry],
    rng: &mut R,
) -> Option<CrystalBody> {
    let observed = parent.observed_composition();
    let candidates: Vec<&CompositionEntry> = allowed.iter().filter(|c| **c != observed).collect();
    let target = if candidates.is_empty() {
        select_target_composition(&observed, allowed)?
    } else {
        *candidates
            .iter()
            .min_by(|a, b| {
                observed
                    .mean_abs_deviation(a)
                    .total_cmp(&observed.mean_abs_deviation(b))
            })
            .unwrap()
    };

    if target.total_atoms() != parent.atoms.len() {
        // This operator only reassigns identities; changing the atom count
        // is the generator's job (box/spacegroup mode), not a mutation.
        return None;
    }

    let mut child = parent.clone();
    let mut pool: Vec<u32> = target
        .counts
        .iter()
        .flat_map(|&(z, n)| std::iter::repeat(z).take(n))
        .collect();
    pool.shuffle(rng);
    for (atom, z) in child.atoms.iter_mut().zip(pool.into_iter()) {
        atom.atomic_number = z;
    }
    child.wrap();
    Some(child)
}

//! Cut-and-splice crossover (spec §4.7).
//!
//! Grounded directly on the teacher's
//! [`crate::engine::operators::crossover_cut_splice`]: rotate/center each
//! parent's atoms, sort by height along a random axis, cut both parents at a
//! common fraction and splice, then repair the child's per-element counts
//! back to the target composition by randomly reassigning surplus atoms of
//! over-represented species to deficit species. Generalized here from a
//! single-cluster (unit-cell-less) representation to periodic cells: atoms
//! are cut by fractional coordinate along a random lattice direction, and the
//! child inherits parent 1's cell.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::crystal::{Atom, CrystalBody};

/// Cut both parents along a random fractional axis at a shared cut fraction
/// in `(0, 1)`, take the low side from `p1` and the high side from `p2`, then
/// repair composition so the child matches `p1`'s composition exactly (spec
/// §4.7, §8 scenario S4: "crossover preserves composition").
///
/// Returns `None` if either parent has too few atoms to guarantee at least one
/// atom from each side.
pub fn crossover_cut_splice<R: Rng + ?Sized>(
    p1: &CrystalBody,
    p2: &CrystalBody,
    rng: &mut R,
) -> Option<CrystalBody> {
    if p1.atoms.len() < 2 || p2.atoms.len() < 2 {
        return None;
    }

    let axis = rng.gen_range(0..3);
    let mut p1_atoms: Vec<(f64, Atom)> = p1
        .atoms
        .iter()
        .map(|a| {
            let f = p1.cell.cart_to_frac(&a.position);
            (f[axis], *a)
        })
        .collect();
    let mut p2_atoms: Vec<(f64, Atom)> = p2
        .atoms
        .iter()
        .map(|a| {
            let f = p2.cell.cart_to_frac(&a.position);
            (f[axis], *a)
        })
        .collect();
    p1_atoms.sort_by(|a, b| a.0.total_cmp(&b.0));
    p2_atoms.sort_by(|a, b| a.0.total_cmp(&b.0));

    let cut = rng.gen_range(0.05..0.95);

    let mut child = CrystalBody::new(p1.cell);
    for (f, atom) in &p1_atoms {
        if *f < cut {
            child.atoms.push(*atom);
        }
    }
    for (f, atom) in &p2_atoms {
        if *f >= cut {
            child.atoms.push(*atom);
        }
    }
    if child.atoms.is_empty() {
        return None;
    }

    repair_composition(&mut child, &target_counts(p1), rng);
    child.wrap();
    Some(child)
}

fn target_counts(p1: &CrystalBody) -> Vec<(u32, usize)> {
    p1.observed_composition().counts
}

/// Reassign the child's over-represented species to under-represented ones
/// (chosen uniformly at random among surplus/deficit sites) until its
/// composition matches `target` exactly.
fn repair_composition<R: Rng + ?Sized>(child: &mut CrystalBody, target: &[(u32, usize)], rng: &mut R) {
    let observed = child.observed_composition();

    let mut deficits: Vec<u32> = Vec::new();
    for &(z, want) in target {
        let have = observed.count_of(z);
        if have < want {
            deficits.extend(std::iter::repeat(z).take(want - have));
        }
    }
    deficits.shuffle(rng);

    for &(z, want) in target {
        let have = child.atoms.iter().filter(|a| a.atomic_number == z).count();
        if have > want {
            let surplus = have - want;
            let mut idxs: Vec<usize> = child
                .atoms
                .iter()
                .enumerate()
                .filter(|(_, a)| a.atomic_number == z)
                .map(|(i, _)| i)
                .collect();
            idxs.shuffle(rng);
            for &idx in idxs.iter().take(surplus) {
                if let Some(new_z) = deficits.pop() {
                    child.atoms[idx].atomic_number = new_z;
                }
            }
        }
    }
}

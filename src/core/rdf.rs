//! Normalized radial-distribution-function similarity fingerprint (spec §4.2).
//!
//! Grounded on the teacher's [`crate::analysis::topology::generate_hash_key`]
//! (same shape: build a fingerprint vector from pairwise geometry, normalize it,
//! compare by dot product) generalized from a graph-spectrum/PMOI hash to the
//! Gaussian-smeared, cosine-cutoff-windowed RDF histogram the spec requires.

use nalgebra::Vector3;

use crate::core::crystal::Atom;
use crate::core::geometry::Cell;

/// A normalized `[bin][iA][iB]` (`iA <= iB`) RDF histogram over a fixed species
/// ordering, stored densely for simple dot-product comparison.
#[derive(Debug, Clone)]
pub struct Rdf {
    nbins: usize,
    nspecies: usize,
    cutoff: f64,
    data: Vec<f64>,
}

fn cosine_soft_cutoff(d: f64, cutoff: f64) -> f64 {
    let onset = 0.99 * cutoff;
    if d <= onset {
        1.0
    } else if d >= cutoff {
        0.0
    } else {
        (cutoff - d) / (cutoff - onset)
    }
}

impl Rdf {
    fn index(&self, bin: usize, ia: usize, ib: usize) -> usize {
        bin * self.nspecies * self.nspecies + ia * self.nspecies + ib
    }

    /// Dot product against another RDF built with the same `(nbins, cutoff,
    /// species ordering)`. Both vectors are unit-Frobenius-norm, so this is a
    /// cosine similarity in `[-1, 1]`, conventionally in `[0, 1]` for physical
    /// histograms.
    pub fn dot(&self, other: &Rdf) -> f64 {
        assert_eq!(self.nbins, other.nbins, "RDF bin count mismatch");
        assert_eq!(self.nspecies, other.nspecies, "RDF species count mismatch");
        self.data.iter().zip(other.data.iter()).map(|(a, b)| a * b).sum()
    }
}

/// `iA <= iB` over `species_order`; atomic numbers not present in
/// `species_order` are ignored.
fn species_pair_index(species_order: &[u32], za: u32, zb: u32) -> Option<(usize, usize)> {
    let ia = species_order.iter().position(|&s| s == za)?;
    let ib = species_order.iter().position(|&s| s == zb)?;
    Some(if ia <= ib { (ia, ib) } else { (ib, ia) })
}

/// Build the normalized RDF of a structure (spec §4.2).
pub fn calculate_normalized_rdf(
    atoms: &[Atom],
    cell: &Cell,
    species_order: &[u32],
    nbins: usize,
    cutoff: f64,
    sigma: f64,
) -> Rdf {
    let n = species_order.len();
    let width = cutoff / nbins as f64;
    let mut data = vec![0.0_f64; nbins * n * n];

    let inv = cell
        .matrix
        .transpose()
        .try_inverse()
        .expect("cell matrix must be invertible");
    let image_bound = |row: usize| -> i32 { (cutoff * inv.row(row).norm()).ceil() as i32 + 1 };
    let (n1, n2, n3) = (image_bound(0), image_bound(1), image_bound(2));

    for i in 0..atoms.len() {
        for j in i..atoms.len() {
            let Some((ia, ib)) = species_pair_index(species_order, atoms[i].atomic_number, atoms[j].atomic_number)
            else {
                continue;
            };
            for t1 in -n1..=n1 {
                for t2 in -n2..=n2 {
                    for t3 in -n3..=n3 {
                        if i == j && t1 == 0 && t2 == 0 && t3 == 0 {
                            continue;
                        }
                        let shift = cell.matrix.transpose() * Vector3::new(t1 as f64, t2 as f64, t3 as f64);
                        let d = (atoms[j].position + shift - atoms[i].position).norm();
                        if d <= 1e-9 || d >= cutoff {
                            continue;
                        }

                        let soft = cosine_soft_cutoff(d, cutoff);
                        let k_lo = ((d - 3.0 * sigma) / width).floor().max(0.0) as usize;
                        let k_hi = (((d + 3.0 * sigma) / width).ceil() as isize)
                            .clamp(0, nbins as isize - 1) as usize;
                        for k in k_lo..=k_hi {
                            let center = (k as f64 + 0.5) * width;
                            let gauss = (-0.5 * ((d - center) / sigma).powi(2)).exp();
                            let mut w = gauss * soft;
                            if ia == ib {
                                // undo the double self-image count for same-species pairs
                                w *= 0.5;
                            }
                            let idx = k * n * n + ia * n + ib;
                            data[idx] += w;
                        }
                    }
                }
            }
        }
    }

    let norm = data.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 1e-12 {
        for x in data.iter_mut() {
            *x /= norm;
        }
    }

    Rdf {
        nbins,
        nspecies: n,
        cutoff,
        data,
    }
}

/// Two structures are similar if their RDF dot product exceeds `1 - epsilon`.
pub fn rdf_similar(a: &Rdf, b: &Rdf, epsilon: f64) -> bool {
    a.dot(b) > 1.0 - epsilon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crystal::Atom;
    use nalgebra::Matrix3;

    fn cubic(a: f64) -> Cell {
        Cell::new(Matrix3::new(a, 0.0, 0.0, 0.0, a, 0.0, 0.0, 0.0, a))
    }

    fn simple_rocksalt(a: f64) -> (Vec<Atom>, Cell) {
        let cell = cubic(a);
        let atoms = vec![
            Atom { atomic_number: 11, position: Vector3::new(0.0, 0.0, 0.0) },
            Atom { atomic_number: 17, position: Vector3::new(a / 2.0, a / 2.0, a / 2.0) },
        ];
        (atoms, cell)
    }

    #[test]
    fn rdf_self_similarity_is_near_one() {
        let (atoms, cell) = simple_rocksalt(5.6);
        let species = [11, 17];
        let rdf = calculate_normalized_rdf(&atoms, &cell, &species, 100, 8.0, 0.08);
        assert!((rdf.dot(&rdf) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rdf_similarity_is_symmetric() {
        let (atoms_a, cell_a) = simple_rocksalt(5.6);
        let (atoms_b, cell_b) = simple_rocksalt(5.62);
        let species = [11, 17];
        let rdf_a = calculate_normalized_rdf(&atoms_a, &cell_a, &species, 100, 8.0, 0.08);
        let rdf_b = calculate_normalized_rdf(&atoms_b, &cell_b, &species, 100, 8.0, 0.08);
        assert!((rdf_a.dot(&rdf_b) - rdf_b.dot(&rdf_a)).abs() < 1e-12);
    }

    #[test]
    fn dissimilar_structures_fall_below_threshold() {
        let (atoms_a, cell_a) = simple_rocksalt(5.6);
        let cell_b = cubic(12.0);
        let atoms_b = vec![
            Atom { atomic_number: 11, position: Vector3::new(0.0, 0.0, 0.0) },
            Atom { atomic_number: 17, position: Vector3::new(1.0, 1.0, 1.0) },
        ];
        let species = [11, 17];
        let rdf_a = calculate_normalized_rdf(&atoms_a, &cell_a, &species, 100, 8.0, 0.08);
        let rdf_b = calculate_normalized_rdf(&atoms_b, &cell_b, &species, 100, 8.0, 0.08);
        assert!(!rdf_similar(&rdf_a, &rdf_b, 1e-3));
    }
}

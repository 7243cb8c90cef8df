//! Composition targets and per-species minimum-distance radii.
//!
//! Grounded on the teacher's [`crate::core::chemistry::InteractionGrid`] (a flat
//! N×N table of squared collision thresholds keyed by species index); here the
//! table is keyed by atomic number directly so it composes with arbitrary element
//! sets without a species-index indirection, and an explicit per-pair override map
//! matches spec §3's "unless overridden by an explicit per-pair entry".

use std::collections::HashMap;

/// An ordered (element, count) list plus the implied total atom count (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CompositionEntry {
    /// (atomic_number, count) pairs, in a stable, caller-chosen order.
    pub counts: Vec<(u32, usize)>,
}

impl CompositionEntry {
    pub fn new(counts: Vec<(u32, usize)>) -> Self {
        Self { counts }
    }

    pub fn total_atoms(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn count_of(&self, z: u32) -> usize {
        self.counts
            .iter()
            .find(|(e, _)| *e == z)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Observed composition of an (unordered) list of atomic numbers, in the
    /// order elements are first encountered.
    pub fn observed(atomic_numbers: &[u32]) -> Self {
        let mut counts: Vec<(u32, usize)> = Vec::new();
        for &z in atomic_numbers {
            if let Some(entry) = counts.iter_mut().find(|(e, _)| *e == z) {
                entry.1 += 1;
            } else {
                counts.push((z, 1));
            }
        }
        Self { counts }
    }

    /// Mean absolute element-wise deviation from another composition's counts,
    /// used when selecting the closest allowed composition to an observed one
    /// (spec §4.7 "Target composition selection").
    pub fn mean_abs_deviation(&self, other: &CompositionEntry) -> f64 {
        let mut elements: Vec<u32> = self.counts.iter().map(|(e, _)| *e).collect();
        for (e, _) in &other.counts {
            if !elements.contains(e) {
                elements.push(*e);
            }
        }
        if elements.is_empty() {
            return 0.0;
        }
        let total: f64 = elements
            .iter()
            .map(|e| (self.count_of(*e) as f64 - other.count_of(*e) as f64).abs())
            .sum();
        total / elements.len() as f64
    }
}

/// Mapping element → effective minimum radius, plus explicit per-pair overrides
/// (spec §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ElementRadii {
    min_radius: HashMap<u32, f64>,
    covalent_radius: HashMap<u32, f64>,
    scale_factor: f64,
    /// Explicit minimum distance for an (A, B) pair, keyed with A <= B.
    pair_overrides: HashMap<(u32, u32), f64>,
}

impl ElementRadii {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            min_radius: HashMap::new(),
            covalent_radius: HashMap::new(),
            scale_factor,
            pair_overrides: HashMap::new(),
        }
    }

    pub fn set_species(&mut self, z: u32, min_radius: f64, covalent_radius: f64) {
        self.min_radius.insert(z, min_radius);
        self.covalent_radius.insert(z, covalent_radius);
    }

    pub fn set_pair_override(&mut self, a: u32, b: u32, min_distance: f64) {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.pair_overrides.insert(key, min_distance);
    }

    /// `max(minRadius, covalentRadius * scaleFactor)`.
    pub fn radius(&self, z: u32) -> f64 {
        let min_r = self.min_radius.get(&z).copied().unwrap_or(0.0);
        let cov_r = self.covalent_radius.get(&z).copied().unwrap_or(0.0);
        min_r.max(cov_r * self.scale_factor)
    }

    /// Minimum allowed distance between an atom of species `a` and one of `b`.
    pub fn min_distance(&self, a: u32, b: u32) -> f64 {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&d) = self.pair_overrides.get(&key) {
            return d;
        }
        self.radius(a) + self.radius(b)
    }

    pub fn max_radius(&self) -> f64 {
        self.min_radius
            .keys()
            .map(|z| self.radius(*z))
            .fold(0.0_f64, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_composition_preserves_encounter_order() {
        let comp = CompositionEntry::observed(&[8, 1, 1, 8, 8]);
        assert_eq!(comp.counts, vec![(8, 3), (1, 2)]);
        assert_eq!(comp.total_atoms(), 5);
    }

    #[test]
    fn pair_override_takes_precedence_over_sum_of_radii() {
        let mut radii = ElementRadii::new(0.5);
        radii.set_species(1, 0.3, 0.6);
        radii.set_species(8, 0.6, 0.7);
        let default_min = radii.min_distance(1, 8);
        assert!((default_min - (radii.radius(1) + radii.radius(8))).abs() < 1e-12);

        radii.set_pair_override(1, 8, 0.2);
        assert_eq!(radii.min_distance(1, 8), 0.2);
        assert_eq!(radii.min_distance(8, 1), 0.2);
    }

    #[test]
    fn mean_abs_deviation_is_zero_for_identical_compositions() {
        let a = CompositionEntry::new(vec![(1, 2), (8, 1)]);
        let b = CompositionEntry::new(vec![(1, 2), (8, 1)]);
        assert_eq!(a.mean_abs_deviation(&b), 0.0);
    }
}

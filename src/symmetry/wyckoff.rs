//! Static Wyckoff orbit database and the spacegroup-mode integer-partition
//! solver (spec §3 "Wyckoff orbit", §4.4).
//!
//! Data is transcribed verbatim from
//! `original_source/src/xtalopt/spgInit/wyckoffDatabase.h` for a curated subset
//! of spacegroups spanning every crystal system (see SPEC_FULL.md §4.4 for the
//! full rationale). That header stores, per spacegroup, only the *first*
//! Wyckoff position of each orbit (its own comment: "the x,y,z coordinates for
//! the first wyckoff position of each wyckoff position") — the remaining
//! `multiplicity - 1` symmetry-equivalent points of a free orbit are generated
//! by the spacegroup's full symmetry-operator table, which is not part of the
//! retrieved pack. [`WyckoffOrbit::generate_copy`] documents the resulting,
//! explicitly acknowledged simplification (see `DESIGN.md`): each of the
//! `multiplicity` atoms contributed by an orbit is produced by evaluating the
//! same affine generator at an independently drawn free-parameter triple,
//! rather than the crystallographically exact symmetry orbit of one point.
//! Per DESIGN NOTES §9, every generator string is parsed once (at first use,
//! via [`std::sync::OnceLock`]) into a reusable affine expression.

use std::collections::HashMap;
use std::sync::OnceLock;

use nalgebra::Vector3;
use rand::Rng;
use regex::Regex;

/// One term of a parsed affine expression: `coeff_x*x + coeff_y*y + coeff_z*z + constant`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineComponent {
    pub coeff: Vector3<f64>,
    pub constant: f64,
}

impl AffineComponent {
    fn evaluate(&self, free: &Vector3<f64>) -> f64 {
        self.coeff.dot(free) + self.constant
    }

    fn parse(token: &str) -> Self {
        let token = token.trim();

        static CONST_RE: OnceLock<Regex> = OnceLock::new();
        static VAR_RE: OnceLock<Regex> = OnceLock::new();

        let const_re = CONST_RE.get_or_init(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap());
        if let Some(m) = const_re.find(token) {
            if m.as_str() == token {
                return AffineComponent {
                    coeff: Vector3::zeros(),
                    constant: token.parse().unwrap_or(0.0),
                };
            }
        }

        let var_re = VAR_RE.get_or_init(|| {
            Regex::new(r"^(?P<sign>[+-]?)(?P<coef>\d*\.?\d*)(?P<var>[xyz])(?P<rest>[+-]\d+(\.\d+)?)?$")
                .unwrap()
        });
        let caps = var_re
            .captures(token)
            .unwrap_or_else(|| panic!("unparseable wyckoff affine term: {token:?}"));

        let sign = if &caps["sign"] == "-" { -1.0 } else { 1.0 };
        let coef_str = &caps["coef"];
        let coef = if coef_str.is_empty() {
            1.0
        } else {
            coef_str.parse().unwrap_or(1.0)
        };
        let magnitude = sign * coef;
        let var = &caps["var"];
        let constant = caps
            .name("rest")
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);

        let mut coeff = Vector3::zeros();
        match var {
            "x" => coeff.x = magnitude,
            "y" => coeff.y = magnitude,
            "z" => coeff.z = magnitude,
            _ => unreachable!(),
        }
        AffineComponent { coeff, constant }
    }
}

#[derive(Debug, Clone)]
pub struct WyckoffOrbit {
    pub letter: char,
    pub multiplicity: u32,
    generator: String,
    components: [AffineComponent; 3],
}

impl WyckoffOrbit {
    fn new(letter: char, multiplicity: u32, generator: &str) -> Self {
        let parts: Vec<&str> = generator.split(',').collect();
        assert_eq!(parts.len(), 3, "wyckoff generator must have 3 comma-separated terms");
        let components = [
            AffineComponent::parse(parts[0]),
            AffineComponent::parse(parts[1]),
            AffineComponent::parse(parts[2]),
        ];
        Self {
            letter,
            multiplicity,
            generator: generator.to_string(),
            components,
        }
    }

    pub fn generator_str(&self) -> &str {
        &self.generator
    }

    /// True if this orbit has at least one free parameter (`x`, `y`, or `z`).
    pub fn is_free(&self) -> bool {
        self.components.iter().any(|c| c.coeff.norm_squared() > 0.0)
    }

    pub fn evaluate(&self, free: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            self.components[0].evaluate(free),
            self.components[1].evaluate(free),
            self.components[2].evaluate(free),
        )
    }

    /// Produce `multiplicity` fractional positions contributed by this orbit
    /// (see the module doc for the documented simplification). For a fixed
    /// (no free parameter) orbit with `multiplicity > 1` this necessarily
    /// returns `multiplicity` copies of the *same* point, since the database
    /// gives no symmetry operators to generate the remaining equivalent
    /// points; callers that enforce minimum interatomic distances (e.g.
    /// [`crate::generate::random_gen::generate_spacegroup_mode_checked`])
    /// will reject and retry such a result rather than accept coincident
    /// atoms.
    pub fn generate_copy<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vector3<f64>> {
        (0..self.multiplicity)
            .map(|_| {
                let free = if self.is_free() {
                    Vector3::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>())
                } else {
                    Vector3::zeros()
                };
                let mut p = self.evaluate(&free);
                p.x = p.x.rem_euclid(1.0);
                p.y = p.y.rem_euclid(1.0);
                p.z = p.z.rem_euclid(1.0);
                p
            })
            .collect()
    }
}

macro_rules! orbit {
    ($letter:expr, $mult:expr, $gen:expr) => {
        WyckoffOrbit::new($letter, $mult, $gen)
    };
}

fn build_database() -> HashMap<u32, Vec<WyckoffOrbit>> {
    let mut db = HashMap::new();

    db.insert(1, vec![orbit!('a', 1, "x,y,z")]);

    db.insert(
        2,
        vec![
            orbit!('a', 1, "0,0,0"),
            orbit!('b', 1, "0,0,0.5"),
            orbit!('c', 1, "0,0.5,0"),
            orbit!('d', 1, "0.5,0,0"),
            orbit!('e', 1, "0.5,0.5,0"),
            orbit!('f', 1, "0.5,0,0.5"),
            orbit!('g', 1, "0,0.5,0.5"),
            orbit!('h', 1, "0.5,0.5,0.5"),
            orbit!('i', 2, "x,y,z"),
        ],
    );

    db.insert(
        25,
        vec![
            orbit!('a', 1, "0,0,z"),
            orbit!('b', 1, "0,0.5,z"),
            orbit!('c', 1, "0.5,0,z"),
            orbit!('d', 1, "0.5,0.5,z"),
            orbit!('e', 2, "x,0,z"),
            orbit!('f', 2, "x,0.5,z"),
            orbit!('g', 2, "0,y,z"),
            orbit!('h', 2, "0.5,y,z"),
            orbit!('i', 4, "x,y,z"),
        ],
    );

    db.insert(
        47,
        vec![
            orbit!('a', 1, "0,0,0"),
            orbit!('b', 1, "0.5,0,0"),
            orbit!('c', 1, "0,0,0.5"),
            orbit!('d', 1, "0.5,0,0.5"),
            orbit!('e', 1, "0,0.5,0"),
            orbit!('f', 1, "0.5,0.5,0"),
            orbit!('g', 1, "0,0.5,0.5"),
            orbit!('h', 1, "0.5,0.5,0.5"),
            orbit!('i', 2, "x,0,0"),
            orbit!('j', 2, "x,0,0.5"),
            orbit!('k', 2, "x,0.5,0"),
            orbit!('l', 2, "x,0.5,0.5"),
            orbit!('m', 2, "0,y,0"),
            orbit!('n', 2, "0,y,0.5"),
            orbit!('o', 2, "0.5,y,0"),
            orbit!('p', 2, "0.5,y,0.5"),
            orbit!('q', 2, "0,0,z"),
            orbit!('r', 2, "0,0.5,z"),
            orbit!('s', 2, "0.5,0,z"),
            orbit!('t', 2, "0.5,0.5,z"),
            orbit!('u', 4, "0,y,z"),
            orbit!('v', 4, "0.5,y,z"),
            orbit!('w', 4, "x,0,z"),
            orbit!('x', 4, "x,0.5,z"),
            orbit!('y', 4, "x,y,0"),
            orbit!('z', 4, "x,y,0.5"),
            orbit!('A', 8, "x,y,z"),
        ],
    );

    db.insert(
        62,
        vec![
            orbit!('a', 4, "0,0,0"),
            orbit!('b', 4, "0,0,0.5"),
            orbit!('c', 4, "x,0.25,z"),
            orbit!('d', 8, "x,y,z"),
        ],
    );

    db.insert(
        139,
        vec![
            orbit!('a', 2, "0,0,0"),
            orbit!('b', 2, "0,0,0.5"),
            orbit!('c', 4, "0,0.5,0"),
            orbit!('d', 4, "0,0.5,0.25"),
            orbit!('e', 4, "0,0,z"),
            orbit!('f', 8, "0.25,0.25,0.25"),
            orbit!('g', 8, "0,0.5,z"),
            orbit!('h', 8, "x,x,0"),
            orbit!('i', 8, "x,0,0"),
            orbit!('j', 8, "x,0.5,0"),
            orbit!('k', 16, "x,x+0.5,0.25"),
            orbit!('l', 16, "x,y,0"),
            orbit!('m', 16, "x,x,z"),
            orbit!('n', 16, "0,y,z"),
            orbit!('o', 32, "x,y,z"),
        ],
    );

    db.insert(
        141,
        vec![
            orbit!('a', 4, "0,0.75,0.125"),
            orbit!('b', 4, "0,0.25,0.375"),
            orbit!('c', 8, "0,0,0"),
            orbit!('d', 8, "0,0,0.5"),
            orbit!('e', 8, "0,0.25,z"),
            orbit!('f', 16, "x,0,0"),
            orbit!('g', 16, "x,x+0.25,0.875"),
            orbit!('h', 16, "0,y,z"),
            orbit!('i', 32, "x,y,z"),
        ],
    );

    db.insert(
        166,
        vec![
            orbit!('a', 3, "0,0,0"),
            orbit!('b', 3, "0,0,0.5"),
            orbit!('c', 6, "0,0,z"),
            orbit!('d', 9, "0.5,0,0.5"),
            orbit!('e', 9, "0.5,0,0"),
            orbit!('f', 18, "x,0,0"),
            orbit!('g', 18, "x,0,0.5"),
            orbit!('h', 18, "x,-x,z"),
            orbit!('i', 36, "x,y,z"),
        ],
    );

    db.insert(
        194,
        vec![
            orbit!('a', 2, "0,0,0"),
            orbit!('b', 2, "0,0,0.25"),
            orbit!('c', 2, "0.333333,0.666667,0.25"),
            orbit!('d', 2, "0.333333,0.666667,0.75"),
            orbit!('e', 4, "0,0,z"),
            orbit!('f', 4, "0.333333,0.666667,z"),
            orbit!('g', 6, "0.5,0,0"),
            orbit!('h', 6, "x,2x,0.25"),
            orbit!('i', 12, "x,0,0"),
            orbit!('j', 12, "x,y,0.25"),
            orbit!('k', 12, "x,2x,z"),
            orbit!('l', 24, "x,y,z"),
        ],
    );

    db.insert(
        195,
        vec![
            orbit!('a', 1, "0,0,0"),
            orbit!('b', 1, "0.5,0.5,0.5"),
            orbit!('c', 3, "0,0.5,0.5"),
            orbit!('d', 3, "0.5,0,0"),
            orbit!('e', 4, "x,x,x"),
            orbit!('f', 6, "x,0,0"),
            orbit!('g', 6, "x,0,0.5"),
            orbit!('h', 6, "x,0.5,0"),
            orbit!('i', 6, "x,0.5,0.5"),
            orbit!('j', 12, "x,y,z"),
        ],
    );

    db.insert(
        198,
        vec![orbit!('a', 4, "x,x,x"), orbit!('b', 12, "x,y,z")],
    );

    db.insert(
        205,
        vec![
            orbit!('a', 4, "0,0,0"),
            orbit!('b', 4, "0.5,0.5,0.5"),
            orbit!('c', 8, "x,x,x"),
            orbit!('d', 24, "x,y,z"),
        ],
    );

    db.insert(
        221,
        vec![
            orbit!('a', 1, "0,0,0"),
            orbit!('b', 1, "0.5,0.5,0.5"),
            orbit!('c', 3, "0,0.5,0.5"),
            orbit!('d', 3, "0.5,0,0"),
            orbit!('e', 6, "x,0,0"),
            orbit!('f', 6, "x,0.5,0.5"),
            orbit!('g', 8, "x,x,x"),
            orbit!('h', 12, "x,0.5,0"),
            orbit!('i', 12, "0,y,y"),
            orbit!('j', 12, "0.5,y,y"),
            orbit!('k', 24, "0,y,z"),
            orbit!('l', 24, "0.5,y,z"),
            orbit!('m', 24, "x,x,z"),
            orbit!('n', 48, "x,y,z"),
        ],
    );

    db.insert(
        225,
        vec![
            orbit!('a', 4, "0,0,0"),
            orbit!('b', 4, "0.5,0.5,0.5"),
            orbit!('c', 8, "0.25,0.25,0.25"),
            orbit!('d', 24, "0,0.25,0.25"),
            orbit!('e', 24, "x,0,0"),
            orbit!('f', 32, "x,x,x"),
            orbit!('g', 48, "x,0.25,0.25"),
            orbit!('h', 48, "0,y,y"),
            orbit!('i', 48, "0.5,y,y"),
            orbit!('j', 96, "0,y,z"),
            orbit!('k', 96, "x,x,z"),
            orbit!('l', 192, "x,y,z"),
        ],
    );

    db.insert(
        227,
        vec![
            orbit!('a', 8, "0.125,0.125,0.125"),
            orbit!('b', 8, "0.375,0.375,0.375"),
            orbit!('c', 16, "0,0,0"),
            orbit!('d', 16, "0.5,0.5,0.5"),
            orbit!('e', 32, "x,x,x"),
            orbit!('f', 48, "x,0.125,0.125"),
            orbit!('g', 96, "x,x,z"),
            orbit!('h', 96, "0,y,-y"),
            orbit!('i', 192, "x,y,z"),
        ],
    );

    db.insert(
        230,
        vec![
            orbit!('a', 16, "0,0,0"),
            orbit!('b', 16, "0.125,0.125,0.125"),
            orbit!('c', 24, "0.125,0,0.25"),
            orbit!('d', 24, "0.375,0,0.25"),
            orbit!('e', 32, "x,x,x"),
            orbit!('f', 48, "x,0,0.25"),
            orbit!('g', 48, "0.125,y,-y+0.25"),
            orbit!('h', 96, "x,y,z"),
        ],
    );

    db
}

static DATABASE: OnceLock<HashMap<u32, Vec<WyckoffOrbit>>> = OnceLock::new();

/// Orbits for a spacegroup, or `None` if it is outside the curated subset —
/// callers must fall back (e.g. to box-mode generation) in that case, exactly
/// as spec §4.4 requires when "no partition exists".
pub fn wyckoff_db(spacegroup: u32) -> Option<&'static [WyckoffOrbit]> {
    DATABASE.get_or_init(build_database).get(&spacegroup).map(|v| v.as_slice())
}

pub fn curated_spacegroups() -> Vec<u32> {
    let mut sgs: Vec<u32> = DATABASE.get_or_init(build_database).keys().copied().collect();
    sgs.sort_unstable();
    sgs
}

/// Solve the integer-partition problem: choose a multiset of orbit indices
/// whose multiplicities sum exactly to `target`. Fixed-position orbits may
/// appear at most once; free orbits may be reused. Returns `None` if no
/// partition is found within the search budget (spec §4.4).
pub fn find_partition(target: usize, orbits: &[WyckoffOrbit]) -> Option<Vec<usize>> {
    if target == 0 {
        return Some(Vec::new());
    }
    let mut used_fixed = vec![false; orbits.len()];
    let mut chosen = Vec::new();
    let mut budget = 200_000u32;
    if search(target, 0, orbits, &mut used_fixed, &mut chosen, &mut budget) {
        Some(chosen)
    } else {
        None
    }
}

fn search(
    remaining: usize,
    idx: usize,
    orbits: &[WyckoffOrbit],
    used_fixed: &mut [bool],
    chosen: &mut Vec<usize>,
    budget: &mut u32,
) -> bool {
    if remaining == 0 {
        return true;
    }
    if idx >= orbits.len() || *budget == 0 {
        return false;
    }
    *budget -= 1;

    // Option: skip this orbit entirely and move on.
    if search(remaining, idx + 1, orbits, used_fixed, chosen, budget) {
        return true;
    }

    let m = orbits[idx].multiplicity as usize;
    if m > remaining {
        return false;
    }

    if orbits[idx].is_free() {
        chosen.push(idx);
        if search(remaining - m, idx, orbits, used_fixed, chosen, budget) {
            return true;
        }
        chosen.pop();
    } else if !used_fixed[idx] {
        used_fixed[idx] = true;
        chosen.push(idx);
        if search(remaining - m, idx + 1, orbits, used_fixed, chosen, budget) {
            return true;
        }
        chosen.pop();
        used_fixed[idx] = false;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn sg1_is_fully_general() {
        let orbits = wyckoff_db(1).unwrap();
        assert_eq!(orbits.len(), 1);
        assert!(orbits[0].is_free());
        assert_eq!(orbits[0].multiplicity, 1);
    }

    #[test]
    fn fixed_point_orbit_evaluates_to_literal_position() {
        let orbits = wyckoff_db(2).unwrap();
        let a = orbits.iter().find(|o| o.letter == 'a').unwrap();
        assert!(!a.is_free());
        let p = a.evaluate(&Vector3::zeros());
        assert_eq!(p, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn compound_term_parses_coefficient_and_offset() {
        let orbits = wyckoff_db(139).unwrap();
        let k = orbits.iter().find(|o| o.letter == 'k').unwrap();
        assert_eq!(k.generator_str(), "x,x+0.5,0.25");
        let p = k.evaluate(&Vector3::new(0.2, 0.0, 0.0));
        assert!((p.x - 0.2).abs() < 1e-12);
        assert!((p.y - 0.7).abs() < 1e-12);
        assert!((p.z - 0.25).abs() < 1e-12);
    }

    #[test]
    fn negative_coefficient_term_parses() {
        let orbits = wyckoff_db(166).unwrap();
        let h = orbits.iter().find(|o| o.letter == 'h').unwrap();
        let p = h.evaluate(&Vector3::new(0.3, 0.0, 0.4));
        assert!((p.x - 0.3).abs() < 1e-12);
        assert!((p.y - (-0.3)).abs() < 1e-12);
        assert!((p.z - 0.4).abs() < 1e-12);
    }

    #[test]
    fn partition_finds_exact_fit_with_fixed_orbits_used_once() {
        let orbits = wyckoff_db(2).unwrap().to_vec();
        // eight multiplicity-1 fixed orbits (a..h): requesting 8 atoms must use
        // each exactly once, not double-use any of them.
        let indices = find_partition(8, &orbits).unwrap();
        assert_eq!(indices.len(), 8);
        let mut seen = std::collections::HashSet::new();
        for i in &indices {
            assert!(seen.insert(*i), "fixed orbit reused");
        }
    }

    #[test]
    fn partition_fails_when_no_combination_sums_to_target() {
        // spacegroup 198 only has orbits of multiplicity 4 and 12.
        let orbits = wyckoff_db(198).unwrap().to_vec();
        assert!(find_partition(5, &orbits).is_none());
        assert!(find_partition(16, &orbits).is_some());
    }

    #[test]
    fn generate_copy_produces_multiplicity_many_points_in_unit_cube() {
        let orbits = wyckoff_db(225).unwrap();
        let l = orbits.iter().find(|o| o.letter == 'l').unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let points = l.generate_copy(&mut rng);
        assert_eq!(points.len(), 192);
        for p in &points {
            assert!((0.0..1.0).contains(&p.x));
            assert!((0.0..1.0).contains(&p.y));
            assert!((0.0..1.0).contains(&p.z));
        }
    }
}

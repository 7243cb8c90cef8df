//! Fitness Engine: multi-objective raw fitness, sort/trim/normalize into a
//! cumulative selection list (spec §4.6).
//!
//! Grounded directly on `original_source/src/globalsearch/optbase.cpp`'s
//! `calculateProb`/`getProbabilityList`: each candidate's raw fitness is
//! `sum(weight_i * partial_i) + (1 - sum(weight_i)) * partial_enthalpy`, where
//! `partial` is `(max-x)/spread` for a `Minimize` term, `(x-min)/spread` for a
//! `Maximize` term, and `0` for a `Filter` term, with any zero-spread term's
//! contribution corrected to zero rather than left as `NaN` so one
//! degenerate objective doesn't poison the whole fitness. Candidates whose raw
//! fitness is all-`NaN` or all-equal get a uniform cumulative list instead;
//! otherwise the pool is sorted ascending by raw fitness, trimmed down to
//! `pool_size` from the low end, normalized to sum to `1`, and replaced by its
//! running cumulative sum.

use serde::{Deserialize, Serialize};

use crate::error::{Result, XtalError};

const ZERO8: f64 = 1e-8;

/// How a single objective term contributes to raw fitness (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    Minimize,
    Maximize,
    /// A filtration objective: already enforced elsewhere, contributes
    /// nothing to the fitness ranking.
    Filter,
}

/// A single weighted objective term; `weight` is in `[0,1]` and every term's
/// weight (plus `hardness_weight` if enabled) must not exceed `1` in total.
/// Sourced from [`crate::settings::Settings::objective_terms`], pairing
/// positionally with each candidate's [`FitnessCandidate::objectives`] entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObjectiveTerm {
    pub weight: f64,
    pub kind: ObjectiveKind,
}

/// One candidate's inputs to the fitness calculation: its enthalpy, Vickers
/// hardness (`< 0` means "not calculated", matching [`crate::core::crystal::CrystalBody::hardness`]),
/// and per-term objective values (indexed the same as the `objective_terms`
/// slice passed to [`cumulative_probability_list`]).
#[derive(Debug, Clone)]
pub struct FitnessCandidate {
    pub enthalpy: f64,
    pub hardness: f64,
    pub objectives: Vec<f64>,
}

/// `(max-x)/spread` for `Minimize`, `(x-min)/spread` for `Maximize`, `0` for
/// `Filter`; zeroed out entirely if `spread < ZERO8` (spec §4.6: "if the
/// spread for any objective/property is zero, its contribution is zero").
fn partial(x: f64, lo: f64, hi: f64, kind: ObjectiveKind) -> f64 {
    let spread = hi - lo;
    if spread < ZERO8 {
        return 0.0;
    }
    match kind {
        ObjectiveKind::Minimize => (hi - x) / spread,
        ObjectiveKind::Maximize => (x - lo) / spread,
        ObjectiveKind::Filter => 0.0,
    }
}

struct Bounds {
    enthalpy_lo: f64,
    enthalpy_hi: f64,
    hardness_lo: f64,
    hardness_hi: f64,
    objective_lo: Vec<f64>,
    objective_hi: Vec<f64>,
}

fn compute_bounds(candidates: &[FitnessCandidate], n_terms: usize) -> Bounds {
    let mut bounds = Bounds {
        enthalpy_lo: f64::MAX,
        enthalpy_hi: f64::MIN,
        hardness_lo: f64::MAX,
        hardness_hi: f64::MIN,
        objective_lo: vec![f64::MAX; n_terms],
        objective_hi: vec![f64::MIN; n_terms],
    };
    for c in candidates {
        bounds.enthalpy_lo = bounds.enthalpy_lo.min(c.enthalpy);
        bounds.enthalpy_hi = bounds.enthalpy_hi.max(c.enthalpy);
        bounds.hardness_lo = bounds.hardness_lo.min(c.hardness);
        bounds.hardness_hi = bounds.hardness_hi.max(c.hardness);
        for i in 0..n_terms {
            let v = c.objectives.get(i).copied().unwrap_or(0.0);
            bounds.objective_lo[i] = bounds.objective_lo[i].min(v);
            bounds.objective_hi[i] = bounds.objective_hi[i].max(v);
        }
    }
    bounds
}

fn raw_fitness(
    candidate: &FitnessCandidate,
    bounds: &Bounds,
    hardness_weight: f64,
    objective_terms: &[ObjectiveTerm],
) -> f64 {
    let mut weights_total = 0.0;
    let mut fitness_total = 0.0;

    for (i, term) in objective_terms.iter().enumerate() {
        let x = candidate.objectives.get(i).copied().unwrap_or(0.0);
        let contrib = partial(x, bounds.objective_lo[i], bounds.objective_hi[i], term.kind);
        weights_total += term.weight;
        fitness_total += term.weight * contrib;
    }

    if hardness_weight >= 0.0 {
        let contrib = partial(
            candidate.hardness,
            bounds.hardness_lo,
            bounds.hardness_hi,
            ObjectiveKind::Maximize,
        );
        weights_total += hardness_weight;
        fitness_total += hardness_weight * contrib;
    }

    let enthalpy_contrib = partial(
        candidate.enthalpy,
        bounds.enthalpy_lo,
        bounds.enthalpy_hi,
        ObjectiveKind::Minimize,
    );
    fitness_total += (1.0 - weights_total) * enthalpy_contrib;
    fitness_total
}

/// Build a cumulative probability list over `candidates`: `(original_index,
/// cumulative)` pairs in ascending-raw-fitness order, so the last entry always
/// carries the best candidate and ends at exactly `1.0` (spec §4.6, testable
/// property #4). `objective_terms` pairs positionally with each candidate's
/// `objectives` vector; `hardness_weight < 0` disables the hardness term
/// entirely, matching [`crate::settings::Settings::hardness_weight`].
///
/// A single candidate always gets probability `1.0`. If every candidate's raw
/// fitness is `NaN` or they are all mutually equal, every candidate instead
/// gets an equal share of the cumulative range (spec §4.6 step 1). Otherwise
/// the pool is sorted ascending by raw fitness, trimmed to `pool_size` by
/// dropping the lowest-fitness entries, normalized to sum to `1`, and
/// replaced by its running cumulative sum.
pub fn cumulative_probability_list(
    candidates: &[FitnessCandidate],
    pool_size: usize,
    hardness_weight: f64,
    objective_terms: &[ObjectiveTerm],
) -> Result<Vec<(usize, f64)>> {
    if candidates.is_empty() || pool_size == 0 {
        return Err(XtalError::ConfigError(
            "cumulative_probability_list: candidates and pool_size must be nonempty".into(),
        ));
    }
    if candidates.len() == 1 {
        return Ok(vec![(0, 1.0)]);
    }

    let bounds = compute_bounds(candidates, objective_terms.len());
    let mut raw: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, raw_fitness(c, &bounds, hardness_weight, objective_terms)))
        .collect();

    let reference = raw[0].1;
    let all_nan = raw.iter().all(|(_, p)| p.is_nan());
    let all_equal = raw
        .iter()
        .all(|(_, p)| p.is_nan() || (p - reference).abs() <= ZERO8);
    if all_nan || all_equal {
        let share = 1.0 / raw.len() as f64;
        let mut running = 0.0;
        let mut cumulative: Vec<(usize, f64)> = raw
            .into_iter()
            .map(|(i, _)| {
                running += share;
                (i, running)
            })
            .collect();
        if let Some(last) = cumulative.last_mut() {
            last.1 = 1.0;
        }
        return Ok(cumulative);
    }

    raw.sort_by(|a, b| a.1.total_cmp(&b.1));
    while raw.len() > pool_size {
        raw.remove(0);
    }

    let sum: f64 = raw.iter().map(|(_, p)| p).sum();
    let mut running = 0.0;
    let mut cumulative: Vec<(usize, f64)> = raw
        .into_iter()
        .map(|(i, p)| {
            running += p / sum;
            (i, running)
        })
        .collect();
    if let Some(last) = cumulative.last_mut() {
        last.1 = 1.0;
    }
    Ok(cumulative)
}

/// Select an original index from a cumulative probability list via a draw `u`
/// in `[0, 1)` (spec §4.6): the first entry whose cumulative value exceeds
/// `u`.
pub fn select_index(cumulative: &[(usize, f64)], u: f64) -> usize {
    cumulative
        .iter()
        .find(|(_, c)| u < *c)
        .map(|(i, _)| *i)
        .unwrap_or_else(|| cumulative.last().map(|(i, _)| *i).unwrap_or(0))
}

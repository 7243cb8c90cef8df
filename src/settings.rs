//! Process-wide, reloadable configuration knobs.
//!
//! Per spec §5 the settings object is treated as immutable after initialization;
//! runtime-tunable knobs are reloaded atomically from a single file between ticks
//! by swapping the `Arc` behind [`SettingsHandle`], never mutating a live `Settings`
//! in place.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, XtalError};

/// Breeding-method mix; `p_strip + p_perm + p_cross` must sum to 100 (spec §4.8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BreedingProbabilities {
    pub p_strip: u32,
    pub p_perm: u32,
    pub p_cross: u32,
}

impl BreedingProbabilities {
    pub fn validate(&self) -> Result<()> {
        let sum = self.p_strip + self.p_perm + self.p_cross;
        if sum != 100 {
            return Err(XtalError::ConfigError(format!(
                "breeding probabilities must sum to 100, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for BreedingProbabilities {
    fn default() -> Self {
        Self {
            p_strip: 35,
            p_perm: 35,
            p_cross: 30,
        }
    }
}

/// Per-step retry/failure policy (spec §4.8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailAction {
    KeepTrying,
    Kill,
    ReplaceWithRandom,
    ReplaceWithNewOffspring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub breeding: BreedingProbabilities,

    /// Fitness-engine hardness weight in `[0,1]`; negative disables it.
    pub hardness_weight: f64,
    /// Fitness-engine objective terms (spec §4.6), positionally paired with
    /// each candidate's hardness-oracle-derived objective values. Empty means
    /// the fitness engine ranks purely by enthalpy (and hardness, if enabled).
    pub objective_terms: Vec<crate::fitness::ObjectiveTerm>,
    /// Number of survivors kept by the fitness engine's probability list.
    pub pool_size: usize,

    /// Composition tolerances / bounds for variable-composition mode.
    pub min_atoms: usize,
    pub max_atoms: usize,

    /// Maximum concurrent `Submitted`/`InProcess` structures; `None` = unbounded.
    pub running_job_limit: Option<usize>,
    /// Target number of in-progress structures the queue tries to maintain.
    pub continuous_structures: usize,
    /// Stop once the tracker holds at least this many structures.
    pub max_structures: usize,

    pub fail_limit: u32,
    pub fail_action: FailAction,

    /// Stripple/permustrain strain-magnitude range (spec §4.7): `sigma` is
    /// drawn from `[sigma_min, sigma_max]`.
    pub sigma_min: f64,
    pub sigma_max: f64,
    /// Stripple ripple-amplitude range (spec §4.7): `rho` is drawn from
    /// `[rho_min, rho_max]`.
    pub rho_min: f64,
    pub rho_max: f64,
    /// Number of species-swap attempts `permustrain` performs per call.
    pub permustrain_swap_count: usize,

    /// How many history snapshots a `Crystal` retains before dropping the oldest
    /// (DESIGN NOTES §9: history grows without bound otherwise).
    pub max_history_len: usize,

    /// `add_atom_randomly` placement attempt budget.
    pub max_placement_attempts: u32,
    /// Generation-level retry count before a `GenerationFailure` is surfaced.
    pub max_generation_retries: u32,

    /// RDF similarity comparison parameters.
    pub rdf_nbins: usize,
    pub rdf_cutoff: f64,
    pub rdf_sigma: f64,
    pub rdf_similarity_epsilon: f64,

    /// Niggli reduction iteration budget.
    pub niggli_max_iters: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            breeding: BreedingProbabilities::default(),
            hardness_weight: -1.0,
            objective_terms: Vec::new(),
            pool_size: 20,
            min_atoms: 1,
            max_atoms: 40,
            running_job_limit: None,
            continuous_structures: 4,
            max_structures: 500,
            fail_limit: 3,
            fail_action: FailAction::KeepTrying,
            sigma_min: 0.0,
            sigma_max: 0.15,
            rho_min: 0.0,
            rho_max: 0.1,
            permustrain_swap_count: 2,
            max_history_len: 50,
            max_placement_attempts: 1000,
            max_generation_retries: 100,
            rdf_nbins: 200,
            rdf_cutoff: 8.0,
            rdf_sigma: 0.08,
            rdf_similarity_epsilon: 1e-3,
            niggli_max_iters: 200,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.breeding.validate()?;
        if self.min_atoms == 0 {
            return Err(XtalError::ConfigError("min_atoms must be >= 1".into()));
        }
        if self.max_atoms < self.min_atoms {
            return Err(XtalError::ConfigError(
                "max_atoms must be >= min_atoms".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.hardness_weight) && self.hardness_weight >= 0.0 {
            return Err(XtalError::ConfigError(
                "hardness_weight must be in [0,1] or negative to disable".into(),
            ));
        }
        if self.pool_size == 0 {
            return Err(XtalError::ConfigError("pool_size must be >= 1".into()));
        }
        if self.sigma_max < self.sigma_min {
            return Err(XtalError::ConfigError("sigma_max must be >= sigma_min".into()));
        }
        if self.rho_max < self.rho_min {
            return Err(XtalError::ConfigError("rho_max must be >= rho_min".into()));
        }
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            XtalError::ConfigError(format!("reading {}: {e}", path.as_ref().display()))
        })?;
        let settings: Settings = serde_json::from_str(&text)
            .map_err(|e| XtalError::ConfigError(format!("parsing settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Process-wide settings cell, reloaded atomically between ticks.
///
/// Grounded on the teacher's `Params` being passed around as a plain cloneable
/// struct; here the indirection is a single `RwLock<Arc<Settings>>` swap so every
/// reader that already holds a cloned `Arc<Settings>` keeps a consistent snapshot
/// for the duration of its tick even if a reload happens concurrently.
#[derive(Clone)]
pub struct SettingsHandle(Arc<RwLock<Arc<Settings>>>);

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(settings))))
    }

    pub fn get(&self) -> Arc<Settings> {
        self.0.read().clone()
    }

    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let fresh = Settings::from_file(path)?;
        *self.0.write() = Arc::new(fresh);
        Ok(())
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn breeding_probabilities_must_sum_to_100() {
        let bad = BreedingProbabilities {
            p_strip: 10,
            p_perm: 10,
            p_cross: 10,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn settings_handle_reload_swaps_atomically() {
        let handle = SettingsHandle::default();
        let before = handle.get();
        assert_eq!(before.pool_size, 20);

        let dir = std::env::temp_dir().join(format!("xtalopt-settings-test-{}", uuid::Uuid::new_v4()));
        let mut custom = Settings::default();
        custom.pool_size = 7;
        fs::write(&dir, serde_json::to_string(&custom).unwrap()).unwrap();

        handle.reload_from_file(&dir).unwrap();
        assert_eq!(handle.get().pool_size, 7);
        // the previously fetched snapshot is unaffected
        assert_eq!(before.pool_size, 20);

        let _ = fs::remove_file(&dir);
    }
}

//! Queue Manager: drives every tracked [`Crystal`] through the optimization
//! state machine, keeps the in-progress population topped up by breeding
//! (spec §4.7, §4.8), and retires near-duplicate finished structures.
//!
//! Grounded on [`crate::solvers::ga::GeneticAlgorithm::solve`]'s generation
//! loop (batch-evaluate a population, rank, refill) generalized from a
//! synchronous per-generation batch evaluation into the asynchronous,
//! any-time submit/poll/fetch loop spec §4.8 describes, with an explicit cap
//! on concurrently running jobs instead of the teacher's implicit "evaluate
//! everything in the current population at once" model. The dual hardness/
//! objective oracle rendezvous (`std::thread::scope`, blocking both calls to
//! completion before advancing past the final step) is grounded on
//! `original_source/src/globalsearch/optbase.cpp`'s synchronous
//! `calculateObjectivesAndHardness`-style step, generalized to Rust's scoped
//! threads instead of a condition-variable rendezvous.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::composition::{CompositionEntry, ElementRadii};
use crate::core::crystal::{Crystal, CrystalBody, ObjectivesState, State};
use crate::core::rdf::{calculate_normalized_rdf, rdf_similar};
use crate::core::tracker::Tracker;
use crate::error::{Result, XtalError};
use crate::fitness::{cumulative_probability_list, select_index, FitnessCandidate};
use crate::generate::random_gen::generate_box_mode;
use crate::oracle::{HardnessOracle, JobStatus, ObjectiveOracle, OptimizerAdapter};
use crate::operators::crossover::crossover_cut_splice;
use crate::operators::permustrain::permustrain;
use crate::operators::stripple::stripple;
use crate::settings::{FailAction, Settings, SettingsHandle};

/// States eligible to start a fresh optimization step.
const READY_STATES: [State; 2] = [State::WaitingForOptimization, State::StepOptimized];

/// States that occupy a "running job" slot (spec §4.8, §5: `running_job_limit`
/// bounds `Submitted + InProcess`).
const RUNNING_STATES: [State; 2] = [State::Submitted, State::InProcess];

/// States a structure cannot leave on its own; the breeding loop no longer
/// counts them toward `continuous_structures` (spec §4.8).
const TERMINAL_STATES: [State; 4] = [State::Error, State::Killed, State::Removed, State::Similar];

/// `TERMINAL_STATES` plus `Optimized`: a structure has stopped consuming a
/// population "slot" once it lands in any of these (spec §4.8: "keeps the
/// in-progress count at `continuous_structures`").
const FINISHED_STATES: [State; 5] =
    [State::Optimized, State::Error, State::Killed, State::Removed, State::Similar];

/// Fixed parameters the breeding/refill loop needs to produce a fresh
/// candidate (spec §4.5, §4.7): the target composition, its minimum-distance
/// radii, and the random-cell volume range used by wholly-random fallback
/// generation.
#[derive(Debug, Clone)]
pub struct BreedingContext {
    pub composition: CompositionEntry,
    pub radii: ElementRadii,
    pub min_volume: f64,
    pub max_volume: f64,
}

pub struct QueueManager {
    tracker: Arc<Tracker>,
    settings: SettingsHandle,
    breeding: BreedingContext,
    generation: u32,
    next_local_id: AtomicU32,
    rng: Mutex<ChaCha8Rng>,
    hardness_oracle: Box<dyn HardnessOracle>,
    objective_oracle: Box<dyn ObjectiveOracle>,
}

impl QueueManager {
    pub fn new(
        tracker: Arc<Tracker>,
        settings: SettingsHandle,
        breeding: BreedingContext,
        generation: u32,
        seed: u64,
        hardness_oracle: Box<dyn HardnessOracle>,
        objective_oracle: Box<dyn ObjectiveOracle>,
    ) -> Self {
        Self {
            tracker,
            settings,
            breeding,
            generation,
            next_local_id: AtomicU32::new(0),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            hardness_oracle,
            objective_oracle,
        }
    }

    fn running_job_limit(&self) -> Option<usize> {
        self.settings.get().running_job_limit
    }

    /// Submit as many ready structures as the running-job limit allows.
    /// Returns the number of structures submitted this call (spec §8 scenario
    /// S6: with `running_job_limit = 2` and 3 eligible structures, exactly 2
    /// end up `Submitted`/`InProcess` and the third stays
    /// `WaitingForOptimization`).
    pub fn submit_ready(&self, adapter: &dyn OptimizerAdapter) -> Result<usize> {
        let limit = self.running_job_limit();
        let mut submitted = 0usize;

        for crystal in self.tracker.snapshot() {
            if let Some(limit) = limit {
                let running = self.tracker.count_in_states(&RUNNING_STATES);
                if running >= limit {
                    break;
                }
            }
            if !READY_STATES.contains(&crystal.status()) {
                continue;
            }

            let step = { crystal.read().current_opt_step };
            let job_id = adapter.submit(&crystal.read(), step)?;
            {
                let mut w = crystal.write();
                w.job_id = Some(job_id);
                w.set_status(State::Submitted);
            }
            self.tracker.notify_updated(crystal.clone());
            submitted += 1;
        }
        Ok(submitted)
    }

    /// Poll every `Submitted`/`InProcess` structure once; advance `Submitted`
    /// to `InProcess` on the adapter's first `Running` report, and hand
    /// `Finished` jobs to [`Self::complete_step`]. A `Failed` poll applies
    /// `Settings.fail_action` once `fail_count` exceeds `fail_limit` (spec
    /// §4.8, §7).
    pub fn poll_running(&self, adapter: &dyn OptimizerAdapter, final_step: u32) -> Result<()> {
        for crystal in self.tracker.snapshot() {
            if !RUNNING_STATES.contains(&crystal.status()) {
                continue;
            }
            let job_id = match crystal.read().job_id.clone() {
                Some(id) => id,
                None => continue,
            };

            match adapter.poll(&job_id)? {
                JobStatus::Running => {
                    if crystal.status() == State::Submitted {
                        crystal.write().set_status(State::InProcess);
                        self.tracker.notify_updated(crystal.clone());
                    }
                }
                JobStatus::Finished => {
                    self.complete_step(&crystal, adapter, &job_id, final_step)?;
                }
                JobStatus::Failed => {
                    self.record_failure(&crystal)?;
                }
            }
        }
        Ok(())
    }

    /// Incorporate a finished step's relaxed structure, then (on the final
    /// step) rendezvous the hardness and objective oracles before deciding
    /// `Optimized` vs `Similar` (spec §4.8).
    fn complete_step(
        &self,
        crystal: &Arc<Crystal>,
        adapter: &dyn OptimizerAdapter,
        job_id: &str,
        final_step: u32,
    ) -> Result<()> {
        let template = crystal.read().clone();
        let (relaxed, energy) = adapter.fetch(job_id, &template)?;
        let reached_final = {
            let mut w = crystal.write();
            w.cell = relaxed.cell;
            w.atoms = relaxed.atoms;
            w.energy = Some(energy);
            w.enthalpy = Some(energy);
            w.current_opt_step += 1;
            w.push_history(self.settings.get().max_history_len);
            w.wrap();
            let reached_final = w.current_opt_step >= final_step;
            w.set_status(if reached_final { State::Updating } else { State::StepOptimized });
            reached_final
        };
        self.tracker.notify_updated(crystal.clone());
        if !reached_final {
            return Ok(());
        }

        self.run_oracles(crystal)?;
        Ok(())
    }

    /// Rendezvous the hardness and objective oracles on a structure that has
    /// just finished its last optimization step, then decide whether it is
    /// retained, dismissed as a similarity duplicate, or marked as an
    /// objective failure (spec §4.8: "the hardness oracle and the objective
    /// oracle are invoked concurrently; the structure moves to `Optimized`
    /// once both return").
    fn run_oracles(&self, crystal: &Arc<Crystal>) -> Result<()> {
        let body = crystal.read().clone();
        let (hardness_result, objective_result) = std::thread::scope(|scope| {
            let hardness_handle = scope.spawn(|| self.hardness_oracle.evaluate(&body));
            let objective_handle = scope.spawn(|| self.objective_oracle.evaluate(&body, ""));
            (
                hardness_handle.join().expect("hardness oracle thread panicked"),
                objective_handle.join().expect("objective oracle thread panicked"),
            )
        });

        crystal.write().set_status(State::ObjectiveCalculation);
        self.tracker.notify_updated(crystal.clone());

        let hardness = hardness_result.unwrap_or_else(|e| {
            warn!("hardness oracle failed for {}: {e}", crystal.tag());
            -1.0
        });
        crystal.write().hardness = hardness;

        let settings = self.settings.get();
        match objective_result {
            Ok(value) => {
                let mut w = crystal.write();
                w.objectives = vec![value];
                w.objectives_state = ObjectivesState::Retain;
                w.objective_fail_count = 0;
                w.set_status(State::ObjectiveRetain);
            }
            Err(e) => {
                warn!("objective oracle failed for {}: {e}", crystal.tag());
                let mut w = crystal.write();
                w.objective_fail_count += 1;
                if w.objective_fail_count > settings.fail_limit {
                    w.objectives_state = ObjectivesState::Fail;
                    w.set_status(State::ObjectiveFail);
                } else {
                    w.objectives_state = ObjectivesState::NotCalculated;
                    w.set_status(State::ObjectiveRetain);
                }
            }
        }
        self.tracker.notify_updated(crystal.clone());

        if crystal.status() == State::ObjectiveFail {
            return Ok(());
        }
        self.check_similarity(crystal);
        Ok(())
    }

    /// Compare `crystal`'s RDF against every already-`Optimized` structure
    /// (spec §4.2); a match above the similarity threshold moves it to
    /// `Similar` instead of `Optimized`. Each pairwise comparison uses the
    /// union of both structures' species as the RDF's species ordering, since
    /// no single global ordering is stored anywhere.
    fn check_similarity(&self, crystal: &Arc<Crystal>) {
        let settings = self.settings.get();
        let (atoms, cell) = {
            let body = crystal.read();
            (body.atoms.clone(), body.cell)
        };

        for other in self.tracker.snapshot() {
            if Arc::ptr_eq(&other, crystal) || other.status() != State::Optimized {
                continue;
            }
            let (other_atoms, other_cell) = {
                let body = other.read();
                (body.atoms.clone(), body.cell)
            };

            let mut species: Vec<u32> = atoms.iter().map(|a| a.atomic_number).collect();
            for a in &other_atoms {
                if !species.contains(&a.atomic_number) {
                    species.push(a.atomic_number);
                }
            }
            species.sort_unstable();
            species.dedup();

            let rdf_a = calculate_normalized_rdf(
                &atoms, &cell, &species, settings.rdf_nbins, settings.rdf_cutoff, settings.rdf_sigma,
            );
            let rdf_b = calculate_normalized_rdf(
                &other_atoms, &other_cell, &species, settings.rdf_nbins, settings.rdf_cutoff, settings.rdf_sigma,
            );
            if rdf_similar(&rdf_a, &rdf_b, settings.rdf_similarity_epsilon) {
                crystal.write().set_status(State::Similar);
                self.tracker.notify_updated(crystal.clone());
                return;
            }
        }

        crystal.write().set_status(State::Optimized);
        self.tracker.notify_updated(crystal.clone());
    }

    /// Apply `Settings.fail_action` once `fail_count` exceeds `fail_limit`
    /// (spec §4.8, §7): `KeepTrying` resets the counter and restarts the
    /// current step; `Kill` marks the structure `Killed`; `ReplaceWithRandom`/
    /// `ReplaceWithNewOffspring` overwrite the structure in place with a fresh
    /// random or bred candidate, keeping its tag, and restart it from step 0.
    fn record_failure(&self, crystal: &Arc<Crystal>) -> Result<()> {
        let settings = self.settings.get();
        let over_limit = {
            let mut w = crystal.write();
            w.fail_count += 1;
            w.fail_count > settings.fail_limit
        };

        if !over_limit {
            crystal.write().set_status(State::Restart);
            self.tracker.notify_updated(crystal.clone());
            return Ok(());
        }

        match settings.fail_action {
            FailAction::KeepTrying => {
                let mut w = crystal.write();
                w.fail_count = 0;
                w.set_status(State::Restart);
            }
            FailAction::Kill => {
                crystal.write().set_status(State::Killed);
            }
            FailAction::ReplaceWithRandom => {
                let body = self.random_candidate(&settings)?;
                self.overwrite_in_place(crystal, body);
            }
            FailAction::ReplaceWithNewOffspring => {
                let body = self.produce_candidate(&settings)?;
                self.overwrite_in_place(crystal, body);
            }
        }
        self.tracker.notify_updated(crystal.clone());
        Ok(())
    }

    fn overwrite_in_place(&self, crystal: &Arc<Crystal>, body: CrystalBody) {
        let mut w = crystal.write();
        w.cell = body.cell;
        w.atoms = body.atoms;
        w.current_opt_step = 0;
        w.fail_count = 0;
        w.energy = None;
        w.enthalpy = None;
        w.set_status(State::WaitingForOptimization);
    }

    /// Top the tracked population back up to `Settings.continuous_structures`
    /// in-progress structures, stopping once `Settings.max_structures` total
    /// structures have ever been tracked (spec §4.8's termination cutoff).
    /// Returns the number of fresh structures inserted.
    pub fn refill_population(&self) -> Result<usize> {
        let settings = self.settings.get();
        let mut created = 0usize;
        loop {
            if self.tracker.size() >= settings.max_structures {
                break;
            }
            let in_progress = self.tracker.size() - self.tracker.count_in_states(&FINISHED_STATES);
            if in_progress >= settings.continuous_structures {
                break;
            }
            let body = self.produce_candidate(&settings)?;
            let local_id = self.next_local_id.fetch_add(1, Ordering::Relaxed);
            let crystal = Arc::new(Crystal::new(self.generation, local_id, body.cell));
            {
                let mut w = crystal.write();
                w.atoms = body.atoms;
                w.set_status(State::WaitingForOptimization);
            }
            self.tracker.insert(crystal);
            created += 1;
        }
        Ok(created)
    }

    fn candidate_pool(&self) -> Vec<Arc<Crystal>> {
        self.tracker
            .snapshot()
            .into_iter()
            .filter(|c| c.status() == State::Optimized)
            .collect()
    }

    fn fitness_list(&self, pool: &[Arc<Crystal>], settings: &Settings) -> Result<Vec<(usize, f64)>> {
        let candidates: Vec<FitnessCandidate> = pool
            .iter()
            .map(|c| {
                let body = c.read();
                FitnessCandidate {
                    enthalpy: body.enthalpy.unwrap_or(0.0),
                    hardness: body.hardness,
                    objectives: body.objectives.clone(),
                }
            })
            .collect();
        cumulative_probability_list(&candidates, settings.pool_size, settings.hardness_weight, &settings.objective_terms)
    }

    /// Select a breeding method by `Settings.breeding`'s mix, picking
    /// parent(s) via the fitness engine's cumulative list (spec §4.6, §4.7,
    /// §4.8: "Breeding picks parents via §4.6"). Falls back to wholly-random
    /// generation if there is no finished population yet to breed from, or if
    /// crossover is chosen but fewer than two parents are available.
    fn produce_candidate(&self, settings: &Settings) -> Result<CrystalBody> {
        let pool = self.candidate_pool();
        if pool.is_empty() {
            return self.random_candidate(settings);
        }
        let cumulative = self.fitness_list(&pool, settings)?;

        let mut rng = self.rng.lock();
        let roll = rng.gen_range(0..100u32);
        let sigma = rng.gen_range(settings.sigma_min..=settings.sigma_max);
        let rho = rng.gen_range(settings.rho_min..=settings.rho_max);

        let mut draw_parent = |rng: &mut ChaCha8Rng| -> CrystalBody {
            let u: f64 = rng.gen();
            let idx = select_index(&cumulative, u);
            pool[idx].read().clone()
        };

        if roll < settings.breeding.p_strip {
            let parent = draw_parent(&mut rng);
            Ok(stripple(&parent, sigma, rho, &mut *rng))
        } else if roll < settings.breeding.p_strip + settings.breeding.p_perm {
            let parent = draw_parent(&mut rng);
            Ok(permustrain(&parent, settings.permustrain_swap_count, sigma, &mut *rng))
        } else if pool.len() >= 2 {
            let p1 = draw_parent(&mut rng);
            let p2 = draw_parent(&mut rng);
            crossover_cut_splice(&p1, &p2, &mut *rng)
                .ok_or_else(|| XtalError::GenerationFailure("crossover: parents too small to cut".into()))
        } else {
            drop(rng);
            self.random_candidate(settings)
        }
    }

    fn random_candidate(&self, settings: &Settings) -> Result<CrystalBody> {
        let mut rng = self.rng.lock();
        generate_box_mode(
            &self.breeding.composition,
            &self.breeding.radii,
            self.breeding.min_volume,
            self.breeding.max_volume,
            settings,
            &mut *rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Cell;
    use crate::settings::Settings;
    use nalgebra::Matrix3;
    use std::collections::HashMap;

    fn cubic(a: f64) -> Cell {
        Cell::new(Matrix3::new(a, 0.0, 0.0, 0.0, a, 0.0, 0.0, 0.0, a))
    }

    fn test_breeding() -> BreedingContext {
        let mut radii = ElementRadii::new(1.0);
        radii.set_species(11, 0.4, 0.4);
        radii.set_species(17, 0.4, 0.4);
        BreedingContext {
            composition: CompositionEntry::new(vec![(11, 2), (17, 2)]),
            radii,
            min_volume: 200.0,
            max_volume: 220.0,
        }
    }

    struct AlwaysOkHardnessOracle;
    impl HardnessOracle for AlwaysOkHardnessOracle {
        fn evaluate(&self, _body: &CrystalBody) -> Result<f64> {
            Ok(10.0)
        }
    }

    struct AlwaysOkObjectiveOracle;
    impl ObjectiveOracle for AlwaysOkObjectiveOracle {
        fn evaluate(&self, _body: &CrystalBody, _script_output: &str) -> Result<f64> {
            Ok(0.0)
        }
    }

    fn test_manager(tracker: Arc<Tracker>, settings: SettingsHandle) -> QueueManager {
        QueueManager::new(
            tracker,
            settings,
            test_breeding(),
            1,
            99,
            Box::new(AlwaysOkHardnessOracle),
            Box::new(AlwaysOkObjectiveOracle),
        )
    }

    struct MockAdapter {
        next_id: Mutex<u32>,
        statuses: Mutex<HashMap<String, JobStatus>>,
    }

    impl MockAdapter {
        fn new() -> Self {
            Self {
                next_id: Mutex::new(0),
                statuses: Mutex::new(HashMap::new()),
            }
        }
    }

    impl OptimizerAdapter for MockAdapter {
        fn submit(&self, _body: &CrystalBody, _step: u32) -> Result<String> {
            let mut n = self.next_id.lock();
            *n += 1;
            let id = format!("job{n}");
            self.statuses.lock().insert(id.clone(), JobStatus::Running);
            Ok(id)
        }

        fn poll(&self, job_id: &str) -> Result<JobStatus> {
            Ok(self.statuses.lock().get(job_id).copied().unwrap_or(JobStatus::Failed))
        }

        fn fetch(&self, _job_id: &str, template: &CrystalBody) -> Result<(CrystalBody, f64)> {
            Ok((template.clone(), -1.0))
        }
    }

    fn waiting_crystal(gen: u32, id: u32) -> Arc<Crystal> {
        let crystal = Arc::new(Crystal::new(gen, id, cubic(5.0)));
        crystal.write().set_status(State::WaitingForOptimization);
        crystal
    }

    #[test]
    fn scenario_s6_running_job_limit_caps_concurrent_jobs() {
        let tracker = Arc::new(Tracker::new());
        for i in 0..3 {
            tracker.insert(waiting_crystal(1, i));
        }
        let mut settings = Settings::default();
        settings.running_job_limit = Some(2);
        let handle = SettingsHandle::new(settings);
        let manager = test_manager(tracker.clone(), handle);
        let adapter = MockAdapter::new();

        let submitted = manager.submit_ready(&adapter).unwrap();
        assert_eq!(submitted, 2);
        assert_eq!(tracker.count_in_states(&RUNNING_STATES), 2);
        assert_eq!(tracker.count_in_states(&[State::WaitingForOptimization]), 1);

        // A second call must not submit the third while the limit is saturated.
        let submitted_again = manager.submit_ready(&adapter).unwrap();
        assert_eq!(submitted_again, 0);
    }

    #[test]
    fn poll_running_advances_submitted_to_in_process() {
        let tracker = Arc::new(Tracker::new());
        tracker.insert(waiting_crystal(1, 0));
        let handle = SettingsHandle::new(Settings::default());
        let manager = test_manager(tracker.clone(), handle);
        let adapter = MockAdapter::new();

        manager.submit_ready(&adapter).unwrap();
        manager.poll_running(&adapter, 1).unwrap();
        let crystal = tracker.snapshot().into_iter().next().unwrap();
        assert_eq!(crystal.status(), State::InProcess);
    }

    #[test]
    fn poll_running_marks_final_step_optimized() {
        let tracker = Arc::new(Tracker::new());
        tracker.insert(waiting_crystal(1, 0));
        let handle = SettingsHandle::new(Settings::default());
        let manager = test_manager(tracker.clone(), handle);
        let adapter = MockAdapter::new();

        manager.submit_ready(&adapter).unwrap();
        // First poll: Running -> InProcess.
        let crystal = tracker.snapshot().into_iter().next().unwrap();
        {
            let job_id = crystal.read().job_id.clone().unwrap();
            adapter.statuses.lock().insert(job_id, JobStatus::Finished);
        }
        manager.poll_running(&adapter, 1).unwrap();
        assert_eq!(crystal.status(), State::Optimized);
        assert_eq!(crystal.read().hardness, 10.0);
        assert_eq!(crystal.read().objectives, vec![0.0]);
    }

    #[test]
    fn record_failure_restarts_below_fail_limit() {
        let tracker = Arc::new(Tracker::new());
        let crystal = waiting_crystal(1, 0);
        crystal.write().set_status(State::Submitted);
        tracker.insert(crystal.clone());
        let mut settings = Settings::default();
        settings.fail_limit = 3;
        let handle = SettingsHandle::new(settings);
        let manager = test_manager(tracker.clone(), handle);

        manager.record_failure(&crystal).unwrap();
        assert_eq!(crystal.status(), State::Restart);
        assert_eq!(crystal.read().fail_count, 1);
    }

    #[test]
    fn record_failure_kill_action_marks_killed_once_over_limit() {
        let tracker = Arc::new(Tracker::new());
        let crystal = waiting_crystal(1, 0);
        tracker.insert(crystal.clone());
        let mut settings = Settings::default();
        settings.fail_limit = 0;
        settings.fail_action = FailAction::Kill;
        let handle = SettingsHandle::new(settings);
        let manager = test_manager(tracker.clone(), handle);

        manager.record_failure(&crystal).unwrap();
        assert_eq!(crystal.status(), State::Killed);
    }

    #[test]
    fn record_failure_replace_with_random_keeps_tag_and_restarts() {
        let tracker = Arc::new(Tracker::new());
        let crystal = waiting_crystal(1, 0);
        let tag = crystal.tag();
        tracker.insert(crystal.clone());
        let mut settings = Settings::default();
        settings.fail_limit = 0;
        settings.fail_action = FailAction::ReplaceWithRandom;
        let handle = SettingsHandle::new(settings);
        let manager = test_manager(tracker.clone(), handle);

        manager.record_failure(&crystal).unwrap();
        assert_eq!(crystal.status(), State::WaitingForOptimization);
        assert_eq!(crystal.read().fail_count, 0);
        assert_eq!(crystal.tag(), tag);
        assert_eq!(crystal.read().atoms.len(), 4);
    }

    #[test]
    fn refill_population_tops_up_to_continuous_structures() {
        let tracker = Arc::new(Tracker::new());
        let mut settings = Settings::default();
        settings.continuous_structures = 3;
        settings.max_structures = 100;
        let handle = SettingsHandle::new(settings);
        let manager = test_manager(tracker.clone(), handle);

        let created = manager.refill_population().unwrap();
        assert_eq!(created, 3);
        assert_eq!(tracker.count_in_states(&[State::WaitingForOptimization]), 3);

        // A second call with the population already full creates nothing more.
        let created_again = manager.refill_population().unwrap();
        assert_eq!(created_again, 0);
    }

    #[test]
    fn refill_population_respects_max_structures_cutoff() {
        let tracker = Arc::new(Tracker::new());
        let mut settings = Settings::default();
        settings.continuous_structures = 10;
        settings.max_structures = 2;
        let handle = SettingsHandle::new(settings);
        let manager = test_manager(tracker.clone(), handle);

        let created = manager.refill_population().unwrap();
        assert_eq!(created, 2);
        assert_eq!(tracker.size(), 2);
    }
}

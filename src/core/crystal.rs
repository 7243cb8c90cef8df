//! The Structure Model: one crystal candidate (spec §3, §4.2).
//!
//! Grounded on the teacher's [`crate::core::domain::Cluster`]/`ClusterStatus`
//! (id, generation, atoms, lattice, status, energy) generalized to the full
//! field list of spec §3, and on `original_source/src/globalsearch/structure.h`'s
//! `State`/`ObjectivesState` enums for the state names.
//!
//! Per DESIGN NOTES §9, the reentrant per-object read/write lock the spec's prose
//! describes is replaced by a lock-free [`AtomicU8`]-encoded status (cheap "what
//! state is this in" reads from any thread) plus a single `parking_lot::RwLock`
//! guarding everything else. Status is only ever changed through a
//! [`CrystalWriteGuard`], so "status is modified only under its write lock"
//! (spec §3) is a compile-time property rather than a convention.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::composition::{CompositionEntry, ElementRadii};
use crate::core::geometry::Cell;

/// Queue Manager state machine states (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum State {
    Empty,
    WaitingForOptimization,
    Submitted,
    InProcess,
    Updating,
    StepOptimized,
    Optimized,
    Error,
    Killed,
    Removed,
    Similar,
    Restart,
    ObjectiveCalculation,
    ObjectiveRetain,
    ObjectiveFail,
    ObjectiveDismiss,
}

impl State {
    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(v: u8) -> Self {
        const STATES: [State; 16] = [
            State::Empty,
            State::WaitingForOptimization,
            State::Submitted,
            State::InProcess,
            State::Updating,
            State::StepOptimized,
            State::Optimized,
            State::Error,
            State::Killed,
            State::Removed,
            State::Similar,
            State::Restart,
            State::ObjectiveCalculation,
            State::ObjectiveRetain,
            State::ObjectiveFail,
            State::ObjectiveDismiss,
        ];
        STATES[v as usize]
    }
}

/// Per-objective outcome (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ObjectivesState {
    NotCalculated,
    Retain,
    Dismiss,
    Fail,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Atom {
    pub atomic_number: u32,
    pub position: Vector3<f64>,
}

/// A monotone history snapshot (spec §3: "append-only except via explicit
/// delete").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub atomic_numbers: Vec<u32>,
    pub positions: Vec<Vector3<f64>>,
    pub energy: Option<f64>,
    pub enthalpy: Option<f64>,
    pub cell: Cell,
}

/// Result of an `add_atom_randomly` placement attempt (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementResult {
    Placed,
    NoFit,
}

/// Everything about a `Crystal` guarded by the single `RwLock` (spec §3 minus
/// `status`, which lives in the lock-free atomic word).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrystalBody {
    pub cell: Cell,
    pub atoms: Vec<Atom>,
    pub bonds: Option<Vec<(usize, usize)>>,

    pub current_opt_step: u32,
    pub enthalpy: Option<f64>,
    pub energy: Option<f64>,

    pub objectives: Vec<f64>,
    pub objectives_state: ObjectivesState,
    pub objective_fail_count: u32,

    /// Vickers hardness; `< 0` means unknown (spec §3).
    pub hardness: f64,

    pub fail_count: u32,
    pub history: Vec<HistoryEntry>,

    pub rank: Option<u32>,
    pub dist_above_hull: Option<f64>,
    pub parent_tag: Option<String>,
    pub has_valid_composition: bool,

    pub job_id: Option<String>,
    pub loc_path: Option<String>,
    pub rem_path: Option<String>,
    pub opt_timer_start: Option<DateTime<Utc>>,
    pub opt_timer_end: Option<DateTime<Utc>>,
}

impl CrystalBody {
    pub fn new(cell: Cell) -> Self {
        Self {
            cell,
            atoms: Vec::new(),
            bonds: None,
            current_opt_step: 0,
            enthalpy: None,
            energy: None,
            objectives: Vec::new(),
            objectives_state: ObjectivesState::NotCalculated,
            objective_fail_count: 0,
            hardness: -1.0,
            fail_count: 0,
            history: Vec::new(),
            rank: None,
            dist_above_hull: None,
            parent_tag: None,
            has_valid_composition: true,
            job_id: None,
            loc_path: None,
            rem_path: None,
            opt_timer_start: None,
            opt_timer_end: None,
        }
    }

    pub fn pv(&self) -> Option<f64> {
        match (self.enthalpy, self.energy) {
            (Some(h), Some(e)) => Some(h - e),
            _ => None,
        }
    }

    pub fn has_enthalpy(&self) -> bool {
        self.enthalpy.is_some()
    }

    pub fn add_atom(&mut self, atomic_number: u32, cartesian: Vector3<f64>) {
        self.atoms.push(Atom {
            atomic_number,
            position: cartesian,
        });
    }

    /// `add_atom_randomly` (spec §4.2): first atom goes to the origin;
    /// subsequent atoms are drawn uniformly in the fractional cube and accepted
    /// iff no neighbor image of any existing atom is within
    /// `radii.min_distance(Z, existing)`.
    pub fn add_atom_randomly<R: Rng + ?Sized>(
        &mut self,
        atomic_number: u32,
        radii: &ElementRadii,
        max_attempts: u32,
        rng: &mut R,
    ) -> PlacementResult {
        if self.atoms.is_empty() {
            self.add_atom(atomic_number, Vector3::zeros());
            return PlacementResult::Placed;
        }

        for _ in 0..max_attempts {
            let frac = Vector3::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>());
            let cart = self.cell.frac_to_cart(&frac);

            let ok = self.atoms.iter().all(|atom| {
                let existing_frac = self.cell.cart_to_frac(&atom.position);
                let d = self.cell.shortest_interatomic_distance(&frac, &existing_frac);
                d >= radii.min_distance(atomic_number, atom.atomic_number)
            });

            if ok {
                self.add_atom(atomic_number, cart);
                return PlacementResult::Placed;
            }
        }
        PlacementResult::NoFit
    }

    /// Pairwise interatomic-distance check (spec §4.2). Every pair is tested
    /// against the full 26-image minimum distance; an early-exit on raw
    /// cartesian separation was considered but dropped; periodic wrapping can
    /// make the true minimum-image distance far smaller than the direct one,
    /// so such a shortcut could miss real violations.
    pub fn check_interatomic_distances(&self, radii: &ElementRadii) -> bool {
        for i in 0..self.atoms.len() {
            for j in (i + 1)..self.atoms.len() {
                let fi = self.cell.cart_to_frac(&self.atoms[i].position);
                let fj = self.cell.cart_to_frac(&self.atoms[j].position);
                let d = self.cell.shortest_interatomic_distance(&fi, &fj);
                let required = radii.min_distance(self.atoms[i].atomic_number, self.atoms[j].atomic_number);
                if d < required {
                    return false;
                }
            }
        }
        true
    }

    /// Wrap every atom's fractional coordinate into `[0,1)` (spec §3 invariant:
    /// "fractional coordinates are wrapped to `[0,1)` after every composing
    /// operation").
    pub fn wrap(&mut self) {
        for atom in self.atoms.iter_mut() {
            let f = self.cell.cart_to_frac(&atom.position);
            let wrapped = Cell::wrap_fractional(&f);
            atom.position = self.cell.frac_to_cart(&wrapped);
        }
    }

    pub fn observed_composition(&self) -> CompositionEntry {
        CompositionEntry::observed(&self.atoms.iter().map(|a| a.atomic_number).collect::<Vec<_>>())
    }

    /// Append a history snapshot, dropping the oldest entry once `max_len` is
    /// exceeded (DESIGN NOTES §9 / open-question resolution in DESIGN.md).
    pub fn push_history(&mut self, max_len: usize) {
        let entry = HistoryEntry {
            atomic_numbers: self.atoms.iter().map(|a| a.atomic_number).collect(),
            positions: self.atoms.iter().map(|a| a.position).collect(),
            energy: self.energy,
            enthalpy: self.enthalpy,
            cell: self.cell,
        };
        self.history.push(entry);
        while self.history.len() > max_len {
            self.history.remove(0);
        }
    }
}

/// One candidate structure (spec §3).
#[derive(Debug)]
pub struct Crystal {
    pub id: Uuid,
    pub generation: u32,
    pub local_id: u32,
    status: AtomicU8,
    body: RwLock<CrystalBody>,
}

impl Crystal {
    pub fn new(generation: u32, local_id: u32, cell: Cell) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation,
            local_id,
            status: AtomicU8::new(State::Empty.to_u8()),
            body: RwLock::new(CrystalBody::new(cell)),
        }
    }

    pub fn tag(&self) -> String {
        format!("{}x{}", self.generation, self.local_id)
    }

    pub fn status(&self) -> State {
        State::from_u8(self.status.load(AtomicOrdering::Acquire))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, CrystalBody> {
        self.body.read()
    }

    pub fn write(&self) -> CrystalWriteGuard<'_> {
        CrystalWriteGuard {
            status: &self.status,
            guard: self.body.write(),
        }
    }
}

/// Write access to a [`Crystal`]'s body; the only way to change its status.
pub struct CrystalWriteGuard<'a> {
    status: &'a AtomicU8,
    guard: RwLockWriteGuard<'a, CrystalBody>,
}

impl<'a> CrystalWriteGuard<'a> {
    pub fn set_status(&mut self, new: State) {
        self.status.store(new.to_u8(), AtomicOrdering::Release);
    }
}

impl<'a> Deref for CrystalWriteGuard<'a> {
    type Target = CrystalBody;
    fn deref(&self) -> &CrystalBody {
        &self.guard
    }
}

impl<'a> DerefMut for CrystalWriteGuard<'a> {
    fn deref_mut(&mut self) -> &mut CrystalBody {
        &mut self.guard
    }
}

//! Random structure generation: box mode and spacegroup mode (spec §4.5).
//!
//! Grounded on the teacher's `Cluster::new_random` (random cell + rejection-
//! sampled atom placement) for box mode, and on [`crate::symmetry::wyckoff`]'s
//! integer-partition solver for spacegroup mode. Both modes retry up to
//! `Settings::max_generation_retries` times before returning
//! [`XtalError::GenerationFailure`] (spec §4.5, §7).

use rand::Rng;

use crate::core::composition::{CompositionEntry, ElementRadii};
use crate::core::crystal::{CrystalBody, PlacementResult};
use crate::core::geometry::Cell;
use crate::error::{Result, XtalError};
use crate::settings::Settings;
use crate::symmetry::wyckoff::{self, WyckoffOrbit};

/// Draw a random cell with volume in `[min_volume, max_volume]` and angles in
/// `[min_angle_deg, max_angle_deg]`, consistent with the teacher's uniform
/// box-parameter sampling generalized to triclinic angles.
pub fn random_cell<R: Rng + ?Sized>(
    min_volume: f64,
    max_volume: f64,
    min_angle_deg: f64,
    max_angle_deg: f64,
    rng: &mut R,
) -> Cell {
    let alpha = rng.gen_range(min_angle_deg..=max_angle_deg);
    let beta = rng.gen_range(min_angle_deg..=max_angle_deg);
    let gamma = rng.gen_range(min_angle_deg..=max_angle_deg);
    // Start from a unit-edge cell at these angles, then rescale to a random
    // volume in range; avoids degenerate edge-length ratios skewing the search.
    let unit = Cell::from_params(1.0, 1.0, 1.0, alpha, beta, gamma);
    let target_volume = rng.gen_range(min_volume..=max_volume);
    let mut cell = unit;
    cell.set_volume(target_volume);
    cell
}

/// Box-mode generation (spec §4.5): random cell, then every atom of
/// `composition` placed via rejection sampling. Retries the whole cell+atoms
/// attempt up to `settings.max_generation_retries` times.
pub fn generate_box_mode<R: Rng + ?Sized>(
    composition: &CompositionEntry,
    radii: &ElementRadii,
    min_volume: f64,
    max_volume: f64,
    settings: &Settings,
    rng: &mut R,
) -> Result<CrystalBody> {
    for _ in 0..settings.max_generation_retries {
        let cell = random_cell(min_volume, max_volume, 60.0, 120.0, rng);
        let mut body = CrystalBody::new(cell);
        let mut ok = true;
        for &(z, count) in &composition.counts {
            for _ in 0..count {
                let result =
                    body.add_atom_randomly(z, radii, settings.max_placement_attempts, rng);
                if result == PlacementResult::NoFit {
                    ok = false;
                    break;
                }
            }
            if !ok {
                break;
            }
        }
        if ok {
            body.wrap();
            return Ok(body);
        }
    }
    Err(XtalError::GenerationFailure(format!(
        "box mode: no valid placement found for {:?} after {} retries",
        composition.counts, settings.max_generation_retries
    )))
}

/// Spacegroup-mode generation (spec §4.5, §4.4): for every element, solve the
/// orbit integer-partition for its required count and instantiate the chosen
/// orbits. Falls back to the caller (returns `Err`) if the spacegroup is
/// uncurated or no partition exists for some element.
pub fn generate_spacegroup_mode<R: Rng + ?Sized>(
    spacegroup: u32,
    composition: &CompositionEntry,
    cell: Cell,
    settings: &Settings,
    rng: &mut R,
) -> Result<CrystalBody> {
    let orbits = wyckoff::wyckoff_db(spacegroup).ok_or_else(|| {
        XtalError::GenerationFailure(format!("spacegroup {spacegroup} is not in the curated database"))
    })?;

    let mut body = CrystalBody::new(cell);
    for &(z, count) in &composition.counts {
        let indices = wyckoff::find_partition(count, orbits).ok_or_else(|| {
            XtalError::GenerationFailure(format!(
                "no wyckoff orbit partition sums to {count} atoms of element {z} in spacegroup {spacegroup}"
            ))
        })?;
        for idx in indices {
            place_orbit(&mut body, &orbits[idx], z, rng);
        }
    }

    body.wrap();
    Ok(body)
}

fn place_orbit<R: Rng + ?Sized>(body: &mut CrystalBody, orbit: &WyckoffOrbit, z: u32, rng: &mut R) {
    for frac in orbit.generate_copy(rng) {
        let cart = body.cell.frac_to_cart(&frac);
        body.add_atom(z, cart);
    }
}

/// Retry-wrapped spacegroup-mode generation that also enforces interatomic
/// distance constraints against `radii`, matching box mode's acceptance
/// criterion (spec §4.5).
pub fn generate_spacegroup_mode_checked<R: Rng + ?Sized>(
    spacegroup: u32,
    composition: &CompositionEntry,
    radii: &ElementRadii,
    min_volume: f64,
    max_volume: f64,
    settings: &Settings,
    rng: &mut R,
) -> Result<CrystalBody> {
    let mut last_err = None;
    for _ in 0..settings.max_generation_retries {
        let cell = random_cell(min_volume, max_volume, 60.0, 120.0, rng);
        match generate_spacegroup_mode(spacegroup, composition, cell, settings, rng) {
            Ok(body) => {
                if body.check_interatomic_distances(radii) {
                    return Ok(body);
                }
                last_err = Some(XtalError::RadiiViolation(format!(
                    "spacegroup {spacegroup}: generated structure violates minimum interatomic distances"
                )));
            }
            Err(e) => return Err(e), // partition failure won't improve with more retries
        }
    }
    Err(last_err.unwrap_or_else(|| {
        XtalError::GenerationFailure(format!(
            "spacegroup mode: no valid placement found for spacegroup {spacegroup} after {} retries",
            settings.max_generation_retries
        ))
    }))
}

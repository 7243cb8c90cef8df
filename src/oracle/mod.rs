//! External interfaces: optimizer adapter, hardness oracle, objective oracle
//! (spec §6).
//!
//! The `OptimizerAdapter` trait is grounded on the teacher's
//! [`crate::engine::evaluator::Evaluator`] trait (submit-a-structure,
//! get-a-result boundary around an external physics engine), split here into
//! separate submit/poll/fetch steps to match the Queue Manager's
//! asynchronous job model (spec §4.8). [`ScriptObjectiveOracle`] mirrors
//! [`crate::engine::external::gulp::GulpEvaluator::run_process`]'s
//! stdin/stdout piping, but the hardness and objective oracles themselves are
//! called synchronously from within the Queue Manager's breeding loop (spec
//! §4.8: both are rendezvoused before a structure leaves `Updating`), not
//! through the submit/poll/fetch protocol `OptimizerAdapter` uses.

use std::io::Write as _;
use std::process::{Command, Stdio};

use log::warn;

use crate::core::crystal::CrystalBody;
use crate::error::{Result, XtalError};

/// Outcome of polling a previously submitted optimization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Finished,
    Failed,
}

/// An external geometry-optimization engine, addressed through an
/// asynchronous submit/poll/fetch protocol so the Queue Manager can track
/// many running jobs without blocking a thread per job (spec §4.8, §6).
pub trait OptimizerAdapter: Send + Sync {
    /// Submit `body` for its next optimization step; returns an
    /// implementation-defined job id.
    fn submit(&self, body: &CrystalBody, step: u32) -> Result<String>;

    /// Non-blocking poll of a previously submitted job.
    fn poll(&self, job_id: &str) -> Result<JobStatus>;

    /// Fetch the relaxed structure and energy of a finished job. Only valid
    /// after `poll` returns [`JobStatus::Finished`].
    fn fetch(&self, job_id: &str, template: &CrystalBody) -> Result<(CrystalBody, f64)>;
}

/// Vickers hardness via the empirical Teter model: `H = 0.151 * G`, where `G`
/// is the shear modulus in GPa (spec §6).
pub fn vickers_hardness(shear_modulus_gpa: f64) -> f64 {
    0.151 * shear_modulus_gpa
}

/// Hardness oracle boundary (spec §6, §4.8): compute a structure's Vickers
/// hardness from its shear modulus. Invoked synchronously by the Queue
/// Manager alongside the objective oracle (spec §4.8's dual-oracle
/// rendezvous), so implementations should block on whatever external
/// calculation they wrap rather than returning a job handle.
pub trait HardnessOracle: Send + Sync {
    fn evaluate(&self, body: &CrystalBody) -> Result<f64>;
}

/// A hardness oracle that derives the shear modulus from a fixed per-species
/// elastic-constant table (spec §6's "mock" calculator for development
/// without an external elasticity engine).
pub struct TableHardnessOracle {
    /// `(atomic_number, shear_modulus_gpa)` pairs; a structure's shear modulus
    /// is the composition-weighted average over atoms present.
    pub table: Vec<(u32, f64)>,
}

impl HardnessOracle for TableHardnessOracle {
    fn evaluate(&self, body: &CrystalBody) -> Result<f64> {
        if body.atoms.is_empty() {
            return Err(XtalError::OracleFailure(
                "cannot evaluate hardness of a structure with no atoms".into(),
            ));
        }
        let mut total = 0.0;
        let mut count = 0usize;
        for atom in &body.atoms {
            let g = self
                .table
                .iter()
                .find(|(z, _)| *z == atom.atomic_number)
                .map(|(_, g)| *g)
                .ok_or_else(|| {
                    XtalError::OracleFailure(format!(
                        "no shear-modulus entry for atomic number {}",
                        atom.atomic_number
                    ))
                })?;
            total += g;
            count += 1;
        }
        Ok(vickers_hardness(total / count as f64))
    }
}

/// Objective oracle boundary (spec §6): writes `output.POSCAR`, runs a
/// user-supplied script, and parses its first whitespace-separated token as
/// an `f64`. A non-numeric first token, or a `NaN`/`Inf` value, is an
/// [`XtalError::OracleFailure`] (spec §7).
pub trait ObjectiveOracle: Send + Sync {
    fn evaluate(&self, body: &CrystalBody, script_output: &str) -> Result<f64> {
        let _ = body;
        parse_objective_output(script_output)
    }
}

/// Parse an objective script's stdout: the first whitespace-separated token
/// must parse as a finite `f64`.
pub fn parse_objective_output(output: &str) -> Result<f64> {
    let token = output
        .split_whitespace()
        .next()
        .ok_or_else(|| XtalError::OracleFailure("objective script produced no output".into()))?;
    let value: f64 = token
        .parse()
        .map_err(|_| XtalError::OracleFailure(format!("objective script output {token:?} is not a number")))?;
    if !value.is_finite() {
        return Err(XtalError::OracleFailure(format!(
            "objective script returned a non-finite value: {value}"
        )));
    }
    Ok(value)
}

/// A user-supplied external objective script invoked on a written
/// `output.POSCAR` (spec §6). Grounded on
/// [`crate::engine::external::gulp::GulpEvaluator::run_process`]'s
/// stdin/stdout piping.
pub struct ScriptObjectiveOracle {
    pub script_path: String,
}

impl ObjectiveOracle for ScriptObjectiveOracle {
    fn evaluate(&self, body: &CrystalBody, _script_output: &str) -> Result<f64> {
        let poscar = crate::poscar::write_poscar(body, "objective");
        let mut child = Command::new(&self.script_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| XtalError::OracleFailure(format!("failed to spawn objective script: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(poscar.as_bytes());
        }

        let output = child
            .wait_with_output()
            .map_err(|e| XtalError::OracleFailure(format!("failed to read objective script output: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("objective script exited with failure: {stderr}");
            return Err(XtalError::OracleFailure(format!(
                "objective script exited with a failure status: {stderr}"
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_objective_output(&stdout)
    }
}

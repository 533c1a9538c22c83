//! The fixpoint model checker for ENF formulas.
//!
//! [`evaluate`] maps an ENF tree to the boolean function denoting its set of
//! satisfying states; [`check`] normalizes first and then tests whether the
//! initial state belongs to that set. EU is a least fixpoint and EG a
//! greatest fixpoint over the preimage operator; both iterate until the
//! canonical handles stop changing.

use log::{debug, info};
use thiserror::Error;

use crate::bdd::{Bdd, StorageFull};
use crate::ctl::Ctl;
use crate::net::{PetriNet, TransitionId};
use crate::props::Property;
use crate::reference::Ref;
use crate::symbolic::SymbolicNet;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckError {
    /// The evaluator received a non-ENF operator; `normalize` was skipped or
    /// incomplete.
    #[error("malformed formula: operator {operator} is not in existential normal form")]
    MalformedFormula { operator: &'static str },

    /// An atom references a transition the net does not have.
    #[error("unknown transition #{id}")]
    UnknownTransition { id: TransitionId },

    /// A fixpoint exceeded the finite-state-space bound. This cannot happen
    /// for a correct encoding; it indicates an algebra bug.
    #[error("fixpoint did not converge within {bound} iterations")]
    NonConvergence { bound: u64 },

    /// The node table is (nearly) exhausted.
    #[error("BDD node table is full ({nodes} of {capacity} nodes in use)")]
    AlgebraFailure { nodes: usize, capacity: usize },
}

impl From<StorageFull> for CheckError {
    fn from(e: StorageFull) -> Self {
        CheckError::AlgebraFailure {
            nodes: e.capacity,
            capacity: e.capacity,
        }
    }
}

/// Fails once the node table passes 15/16 occupancy, leaving headroom for
/// the operation in flight. An operation that still outgrows the table
/// surfaces as [`StorageFull`] and converts to the same error.
fn ensure_headroom(bdd: &Bdd) -> Result<(), CheckError> {
    let nodes = bdd.num_nodes();
    let capacity = bdd.capacity();
    if nodes >= capacity - capacity / 16 {
        Err(CheckError::AlgebraFailure { nodes, capacity })
    } else {
        Ok(())
    }
}

/// Set of states in which at least one transition from `ids` is enabled.
///
/// Both the empty list and the `True` sentinel denote constant truth.
fn fireable(model: &SymbolicNet, ids: &[TransitionId]) -> Result<Ref, CheckError> {
    let bdd = model.bdd();
    if ids.is_empty() {
        return Ok(bdd.one);
    }
    let mut result = bdd.zero;
    for &id in ids {
        if id >= model.net().num_transitions() {
            return Err(CheckError::UnknownTransition { id });
        }
        result = bdd.apply_or(result, model.enabled(id)?)?;
    }
    Ok(result)
}

/// Evaluates an ENF formula to the boolean function over current-state
/// variables denoting its satisfying states.
pub fn evaluate(model: &SymbolicNet, formula: &Ctl) -> Result<Ref, CheckError> {
    let bdd = model.bdd();
    ensure_headroom(bdd)?;

    match formula {
        Ctl::True => Ok(bdd.one),
        Ctl::Fireable(ids) => fireable(model, ids),
        Ctl::Not(f) => Ok(-evaluate(model, f)?),
        Ctl::And(f, g) => {
            let f = evaluate(model, f)?;
            let g = evaluate(model, g)?;
            Ok(bdd.apply_and(f, g)?)
        }
        Ctl::Or(f, g) => {
            let f = evaluate(model, f)?;
            let g = evaluate(model, g)?;
            Ok(bdd.apply_or(f, g)?)
        }
        Ctl::EX(f) => {
            let f = evaluate(model, f)?;
            Ok(model.preimage(f)?)
        }
        Ctl::EU(f, g) => {
            let phi = evaluate(model, f)?;
            let psi = evaluate(model, g)?;
            least_fixpoint(model, phi, psi)
        }
        Ctl::EG(f) => {
            let phi = evaluate(model, f)?;
            greatest_fixpoint(model, phi)
        }
        other => Err(CheckError::MalformedFormula {
            operator: other.operator_name(),
        }),
    }
}

/// `E[phi U psi]`: grow from `psi`, adding `phi`-states that can reach the
/// current set, until stable.
fn least_fixpoint(model: &SymbolicNet, phi: Ref, psi: Ref) -> Result<Ref, CheckError> {
    let bdd = model.bdd();
    let bound = model.marking_bound();
    let mut z = psi;
    let mut steps = 0u64;
    loop {
        ensure_headroom(bdd)?;
        let next = bdd.apply_or(z, bdd.apply_and(phi, model.preimage(z)?)?)?;
        if next == z {
            debug!("EU converged after {} iterations", steps);
            return Ok(z);
        }
        z = next;
        steps += 1;
        if steps > bound {
            return Err(CheckError::NonConvergence { bound });
        }
    }
}

/// `EG phi`: shrink from `phi`, keeping only states that can stay inside,
/// until stable.
fn greatest_fixpoint(model: &SymbolicNet, phi: Ref) -> Result<Ref, CheckError> {
    let bdd = model.bdd();
    let bound = model.marking_bound();
    let mut z = phi;
    let mut steps = 0u64;
    loop {
        ensure_headroom(bdd)?;
        let next = bdd.apply_and(z, model.preimage(z)?)?;
        if next == z {
            debug!("EG converged after {} iterations", steps);
            return Ok(z);
        }
        z = next;
        steps += 1;
        if steps > bound {
            return Err(CheckError::NonConvergence { bound });
        }
    }
}

/// Checks whether `formula` holds in the net's initial state.
///
/// Consumes the formula: it is normalized to ENF, evaluated, and the result
/// holds iff the initial state lies inside the satisfying set, i.e.
/// `initial ∧ ¬sat` is empty.
pub fn check(model: &SymbolicNet, formula: Ctl) -> Result<bool, CheckError> {
    let normalized = formula.normalize();
    debug!("normalized formula: {}", normalized);
    let sat = evaluate(model, &normalized)?;
    let bdd = model.bdd();
    Ok(bdd.is_zero(bdd.apply_and(model.initial(), -sat)?))
}

/// Per-property outcome of a batch run.
pub struct Verdict {
    pub id: String,
    pub result: Result<bool, CheckError>,
}

/// Checks a list of properties against a net.
///
/// One property's failure never aborts the rest. After an
/// [`AlgebraFailure`][CheckError::AlgebraFailure] the manager and the
/// symbolic model are rebuilt so the remaining properties start from a fresh
/// table.
pub fn check_properties(net: &PetriNet, properties: &[Property], table_bits: usize) -> Vec<Verdict> {
    let mut verdicts = Vec::with_capacity(properties.len());
    let mut index = 0;

    while index < properties.len() {
        let bdd = Bdd::new(table_bits);
        let model = match SymbolicNet::new(&bdd, net) {
            Ok(model) => model,
            Err(e) => {
                // The net itself does not fit: record a failure for the
                // current property and move on.
                let property = &properties[index];
                info!("property '{}' failed: {}", property.id, CheckError::from(e));
                verdicts.push(Verdict {
                    id: property.id.clone(),
                    result: Err(e.into()),
                });
                index += 1;
                continue;
            }
        };

        while index < properties.len() {
            let property = &properties[index];
            let result = check(&model, property.formula.clone());
            let table_full = matches!(result, Err(CheckError::AlgebraFailure { .. }));
            match &result {
                Ok(verdict) => info!("property '{}': {}", property.id, verdict),
                Err(e) => info!("property '{}' failed: {}", property.id, e),
            }
            verdicts.push(Verdict {
                id: property.id.clone(),
                result,
            });
            index += 1;
            if table_full {
                // Rebuild the manager for the remaining properties.
                break;
            }
        }
    }

    verdicts
}

//! Symbolic forward reachability: a synchronous BFS over the per-transition
//! firing relations, starting from the initial marking.

use log::info;
use num_bigint::BigUint;

use crate::checker::CheckError;
use crate::reference::Ref;
use crate::symbolic::SymbolicNet;

/// Result of a reachability run.
pub struct Reachability {
    /// The set of reachable markings, over current-state variables.
    pub states: Ref,
    /// Number of BFS layers that added at least one new marking.
    pub layers: u64,
    /// Cardinality of `states`.
    pub count: BigUint,
}

/// Computes the set of markings reachable from the initial state.
///
/// Each iteration adds, for every transition, the one-step successors of the
/// frontier so far; the loop stops when a full sweep adds nothing. The layer
/// sequence is monotone, so convergence within the number of distinct
/// markings is guaranteed; exceeding that bound means the encoding is broken.
pub fn explore(model: &SymbolicNet) -> Result<Reachability, CheckError> {
    let bdd = model.bdd();
    let bound = model.marking_bound();

    let mut states = model.initial();
    let mut layers = 0u64;
    loop {
        let mut next = states;
        for t in 0..model.net().num_transitions() {
            next = bdd.apply_or(next, model.image(t, states)?)?;
        }
        if next == states {
            break;
        }
        states = next;
        layers += 1;
        if layers > bound {
            return Err(CheckError::NonConvergence { bound });
        }
    }

    let count = model.count_states(states);
    info!(
        "reachability converged after {} layers: {} markings, {} BDD nodes",
        layers,
        count,
        bdd.size(states)
    );

    Ok(Reachability {
        states,
        layers,
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::Bdd;
    use crate::net::{Arc, ArcDir, PetriNet};
    use crate::symbolic::cur_var;

    /// `p0 -> t -> p1`, with `p0` initially marked.
    fn handover_net() -> PetriNet {
        let mut net = PetriNet::new("handover");
        let p0 = net.add_place("p0", 1);
        let p1 = net.add_place("p1", 0);
        net.add_transition(
            "t",
            vec![
                Arc {
                    dir: ArcDir::In,
                    place: p0,
                },
                Arc {
                    dir: ArcDir::Out,
                    place: p1,
                },
            ],
        );
        net
    }

    #[test]
    fn test_two_reachable_markings() {
        let net = handover_net();
        let bdd = Bdd::default();
        let model = SymbolicNet::new(&bdd, &net).unwrap();

        let reach = explore(&model).unwrap();
        assert_eq!(reach.count, BigUint::from(2u32));
        assert_eq!(reach.layers, 1);

        // Exactly {p0 marked, p1 marked}.
        let p0 = bdd.cube([cur_var(0) as i32, -(cur_var(1) as i32)]).unwrap();
        let p1 = bdd.cube([-(cur_var(0) as i32), cur_var(1) as i32]).unwrap();
        assert_eq!(reach.states, bdd.apply_or(p0, p1).unwrap());
    }

    #[test]
    fn test_no_transitions_reaches_only_initial() {
        let mut net = PetriNet::new("frozen");
        net.add_place("p0", 1);
        net.add_place("p1", 0);

        let bdd = Bdd::default();
        let model = SymbolicNet::new(&bdd, &net).unwrap();

        let reach = explore(&model).unwrap();
        assert_eq!(reach.states, model.initial());
        assert_eq!(reach.count, BigUint::from(1u32));
        assert_eq!(reach.layers, 0);
    }

    #[test]
    fn test_layers_are_monotone() {
        // Re-run the BFS by hand and check every layer contains the previous.
        let mut net = handover_net();
        net.add_transition(
            "u",
            vec![
                Arc {
                    dir: ArcDir::In,
                    place: 1,
                },
                Arc {
                    dir: ArcDir::Out,
                    place: 0,
                },
            ],
        );

        let bdd = Bdd::default();
        let model = SymbolicNet::new(&bdd, &net).unwrap();
        let bound = model.marking_bound();

        let mut states = model.initial();
        let mut iterations = 0u64;
        loop {
            let mut next = states;
            for t in 0..net.num_transitions() {
                next = bdd.apply_or(next, model.image(t, states).unwrap()).unwrap();
            }
            assert!(bdd.is_implies(states, next), "layer lost states");
            if next == states {
                break;
            }
            states = next;
            iterations += 1;
            assert!(iterations <= bound, "BFS exceeded the marking bound");
        }

        assert_eq!(states, explore(&model).unwrap().states);
    }
}

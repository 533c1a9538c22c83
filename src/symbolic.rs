//! Symbolic encoding of 1-safe Petri-net semantics as boolean functions.
//!
//! Every place `p` owns an interleaved pair of BDD variables: `2p + 1` for
//! the current marking and `2p + 2` for the next marking (the manager
//! reserves variable 0 for the terminal, hence the shift). A transition's
//! firing relation constrains both vectors; the interleaving keeps related
//! variables adjacent in the ordering.

use log::info;
use num_bigint::BigUint;

use crate::bdd::{Bdd, StorageFull};
use crate::net::{ArcDir, PetriNet, PlaceId, TransitionId};
use crate::reference::Ref;

/// Current-state variable of a place.
pub fn cur_var(place: PlaceId) -> u32 {
    2 * place as u32 + 1
}

/// Next-state variable of a place.
pub fn next_var(place: PlaceId) -> u32 {
    2 * place as u32 + 2
}

struct TransitionEncoding {
    /// Firing relation over current and next variables, frame conjuncts
    /// included.
    relation: Ref,
    /// Current-state variables of the places adjacent to the transition.
    support: Vec<u32>,
}

/// A net encoded into a BDD manager: the initial-state predicate, the
/// per-transition firing relations and their combined disjunction, plus the
/// renaming maps between the two state vectors.
pub struct SymbolicNet<'a> {
    bdd: &'a Bdd,
    net: &'a PetriNet,
    initial: Ref,
    relation: Ref,
    transitions: Vec<TransitionEncoding>,
    next_vars: Vec<u32>,
    /// current -> next, for priming a state set.
    prime: Vec<(u32, u32)>,
    /// next -> current, for folding an image back.
    unprime: Vec<(u32, u32)>,
}

impl<'a> SymbolicNet<'a> {
    pub fn new(bdd: &'a Bdd, net: &'a PetriNet) -> Result<Self, StorageFull> {
        let initial = bdd.cube(net.places().iter().enumerate().map(|(p, place)| {
            let v = cur_var(p) as i32;
            if place.initial_marking == 1 {
                v
            } else {
                -v
            }
        }))?;

        let mut transitions = Vec::with_capacity(net.num_transitions());
        let mut relation = bdd.zero;
        for t in net.transitions() {
            let mut rel = bdd.one;
            let mut adjacent = vec![false; net.num_places()];
            for arc in &t.arcs {
                adjacent[arc.place] = true;
                let cur = bdd.mk_var(cur_var(arc.place))?;
                let nxt = bdd.mk_var(next_var(arc.place))?;
                rel = match arc.dir {
                    // The place held a token and it is consumed.
                    ArcDir::In => bdd.apply_and(rel, bdd.apply_and(cur, -nxt)?)?,
                    // The place receives a token.
                    ArcDir::Out => bdd.apply_and(rel, nxt)?,
                };
            }
            // Frame: places the transition does not touch keep their marking.
            for p in 0..net.num_places() {
                if !adjacent[p] {
                    let keep = bdd.apply_eq(bdd.mk_var(next_var(p))?, bdd.mk_var(cur_var(p))?)?;
                    rel = bdd.apply_and(rel, keep)?;
                }
            }
            let support = (0..net.num_places())
                .filter(|&p| adjacent[p])
                .map(cur_var)
                .collect();
            relation = bdd.apply_or(relation, rel)?;
            transitions.push(TransitionEncoding { relation: rel, support });
        }

        let next_vars = (0..net.num_places()).map(next_var).collect();
        let prime = (0..net.num_places())
            .map(|p| (cur_var(p), next_var(p)))
            .collect();
        let unprime = (0..net.num_places())
            .map(|p| (next_var(p), cur_var(p)))
            .collect();

        info!(
            "encoded net '{}': {} places, {} transitions, {} BDD nodes live",
            net.name,
            net.num_places(),
            net.num_transitions(),
            bdd.num_nodes()
        );

        Ok(Self {
            bdd,
            net,
            initial,
            relation,
            transitions,
            next_vars,
            prime,
            unprime,
        })
    }

    pub fn bdd(&self) -> &'a Bdd {
        self.bdd
    }
    pub fn net(&self) -> &'a PetriNet {
        self.net
    }

    /// The predicate denoting exactly the initial marking vector.
    pub fn initial(&self) -> Ref {
        self.initial
    }

    /// The combined firing relation, the disjunction over all transitions.
    pub fn relation(&self) -> Ref {
        self.relation
    }

    /// Firing relation of a single transition.
    pub fn transition_relation(&self, t: TransitionId) -> Ref {
        self.transitions[t].relation
    }

    /// Current-state variables of the places adjacent to `t`.
    pub fn transition_support(&self, t: TransitionId) -> &[u32] {
        &self.transitions[t].support
    }

    /// States in which `t` is enabled: every input place holds a token.
    pub fn enabled(&self, t: TransitionId) -> Result<Ref, StorageFull> {
        let mut res = self.bdd.one;
        for arc in &self.net.transition(t).arcs {
            if arc.dir == ArcDir::In {
                let cur = self.bdd.mk_var(cur_var(arc.place))?;
                res = self.bdd.apply_and(res, cur)?;
            }
        }
        Ok(res)
    }

    /// Preimage: the states with at least one one-step successor in `set`.
    ///
    /// `∃ next. (relation ∧ set[cur -> next])`, a current-state predicate.
    pub fn preimage(&self, set: Ref) -> Result<Ref, StorageFull> {
        let primed = self.bdd.rename(set, &self.prime)?;
        let product = self.bdd.apply_and(self.relation, primed)?;
        self.bdd.exists(product, &self.next_vars)
    }

    /// One-step successors of `set` through transition `t`, folded back onto
    /// current-state variables.
    pub fn image(&self, t: TransitionId, set: Ref) -> Result<Ref, StorageFull> {
        let enc = &self.transitions[t];
        let step = self.bdd.apply_and(set, enc.relation)?;
        let step = self.bdd.exists(step, &enc.support)?;
        self.bdd.rename(step, &self.unprime)
    }

    /// Number of markings in a current-state predicate.
    pub fn count_states(&self, set: Ref) -> BigUint {
        let p = self.net.num_places();
        // The set does not depend on next-state variables; counting over all
        // 2p variables over-counts by exactly 2^p.
        self.bdd.sat_count(set, 2 * p) >> p
    }

    /// Upper bound on fixpoint iterations: the number of distinct markings,
    /// saturating at `u64::MAX`.
    pub fn marking_bound(&self) -> u64 {
        1u64.checked_shl(self.net.num_places() as u32)
            .unwrap_or(u64::MAX)
    }
}

//! The 1-safe Petri-net data model.
//!
//! Places get dense, 0-based identifiers in insertion order; arcs reference
//! places by identifier, so the structure carries no lifetimes or pointers.
//! The net is immutable once loaded.

/// Dense, 0-based index of a place in its net.
pub type PlaceId = usize;
/// Dense, 0-based index of a transition in its net.
pub type TransitionId = usize;

#[derive(Debug, Clone)]
pub struct Place {
    pub name: String,
    /// Initial token count, 0 or 1 (the net is 1-safe).
    pub initial_marking: u8,
}

/// Direction of an arc.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ArcDir {
    /// Place-to-transition arc: a precondition, consumes the token.
    In,
    /// Transition-to-place arc: a postcondition, produces a token.
    Out,
}

#[derive(Debug, Clone)]
pub struct Arc {
    pub dir: ArcDir,
    pub place: PlaceId,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub name: String,
    pub arcs: Vec<Arc>,
}

#[derive(Debug, Clone)]
pub struct PetriNet {
    pub name: String,
    places: Vec<Place>,
    transitions: Vec<Transition>,
}

impl PetriNet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            places: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn add_place(&mut self, name: impl Into<String>, initial_marking: u8) -> PlaceId {
        let id = self.places.len();
        self.places.push(Place {
            name: name.into(),
            initial_marking,
        });
        id
    }

    pub fn add_transition(
        &mut self,
        name: impl Into<String>,
        arcs: Vec<Arc>,
    ) -> TransitionId {
        let id = self.transitions.len();
        self.transitions.push(Transition {
            name: name.into(),
            arcs,
        });
        id
    }

    pub fn num_places(&self) -> usize {
        self.places.len()
    }
    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn place(&self, id: PlaceId) -> &Place {
        &self.places[id]
    }
    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id]
    }

    pub fn find_place(&self, name: &str) -> Option<PlaceId> {
        self.places.iter().position(|p| p.name == name)
    }
    pub fn find_transition(&self, name: &str) -> Option<TransitionId> {
        self.transitions.iter().position(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_ids() {
        let mut net = PetriNet::new("two-phase");
        let p0 = net.add_place("p0", 1);
        let p1 = net.add_place("p1", 0);
        assert_eq!(p0, 0);
        assert_eq!(p1, 1);

        let t = net.add_transition(
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
        assert_eq!(t, 0);
        assert_eq!(net.num_places(), 2);
        assert_eq!(net.num_transitions(), 1);
        assert_eq!(net.find_transition("t"), Some(0));
        assert_eq!(net.find_place("p1"), Some(1));
        assert_eq!(net.find_place("nope"), None);
    }
}

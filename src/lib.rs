//! # smc: Symbolic CTL Model Checking for 1-Safe Petri Nets
//!
//! **`smc`** checks branching-time (CTL) properties of 1-safe Petri nets
//! symbolically, representing sets of markings and the transition relation
//! as **Binary Decision Diagrams (BDDs)**.
//!
//! ## How it works
//!
//! Each place `p` gets two boolean variables: one for the current marking
//! and one for the marking after a step. Firing a transition is a relation
//! over both variable sets, and a CTL operator becomes a fixpoint over
//! preimages of that relation. Because BDDs are **canonical** --- for a
//! fixed variable ordering every boolean function has exactly one
//! representation --- a fixpoint has converged exactly when two handles
//! compare equal.
//!
//! ## Key Features
//!
//! - **Manager-Centric BDD Algebra**: All operations go through the
//!   [`Bdd`][crate::bdd::Bdd] manager. This ensures structural sharing
//!   (hash consing) and maintains the canonical form invariant.
//! - **Full CTL**: Formulas in the rich surface syntax (`AG`, `EF`, `AU`,
//!   `ER`, ...) are rewritten into existential normal form and evaluated
//!   with three fixpoint engines (`EX`, `EU`, `EG`).
//! - **Reachability**: A symbolic breadth-first exploration reports the
//!   number of reachable markings without ever enumerating them.
//! - **Loaders**: Nets are read from textual ANDL descriptions
//!   ([`andl`]), properties from XML files ([`props`]).
//!
//! ## Basic Usage
//!
//! ```rust
//! use smc::andl;
//! use smc::bdd::Bdd;
//! use smc::checker;
//! use smc::ctl::Ctl;
//! use smc::symbolic::SymbolicNet;
//!
//! // A token moving from p0 to p1.
//! let net = andl::parse_net(
//!     "pn handover {
//!         places { [p0 = 1] [p1 = 0] }
//!         transitions { [t : [p0 - 1] & [p1 + 1]] }
//!     }",
//! )
//! .unwrap();
//!
//! let bdd = Bdd::default();
//! let model = SymbolicNet::new(&bdd, &net).unwrap();
//!
//! // EF !fireable(t): some reachable marking disables t.
//! let phi = Ctl::ef(Ctl::not(Ctl::Fireable(vec![0])));
//! assert!(checker::check(&model, phi).unwrap());
//!
//! // AG fireable(t): t stays fireable forever --- it does not.
//! let psi = Ctl::ag(Ctl::Fireable(vec![0]));
//! assert!(!checker::check(&model, psi).unwrap());
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: The [`Bdd`][crate::bdd::Bdd] manager and core algorithms.
//! - **[`net`]**: The 1-safe Petri-net data model.
//! - **[`ctl`]**: The CTL syntax tree and its normalization.
//! - **[`symbolic`]**: Encoding of a net into initial state and transition
//!   relation BDDs.
//! - **[`checker`]**: The fixpoint model checker and the batch driver.
//! - **[`reach`]**: Symbolic reachability exploration.

pub mod andl;
pub mod bdd;
pub mod cache;
pub mod checker;
pub mod ctl;
pub mod dot;
pub mod net;
pub mod props;
pub mod reach;
pub mod reference;
pub mod sat;
pub mod symbolic;
pub mod table;
pub mod utils;

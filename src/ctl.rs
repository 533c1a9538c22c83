//! CTL formula trees and normalization to existential normal form (ENF).
//!
//! ENF keeps only negation, conjunction, disjunction, EX, EU and EG; the
//! other eight temporal operators are rewritten in terms of these. The
//! checker only accepts ENF trees, so [`Ctl::normalize`] must run first.

use std::fmt;

use crate::net::TransitionId;

/// A CTL formula over "is any of these transitions enabled" atoms.
///
/// Nodes exclusively own their children; `normalize` consumes the tree and
/// returns a fresh one, so a formula cannot be observed half-rewritten.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Ctl {
    /// The constant-true predicate.
    True,
    /// True in states where at least one of the listed transitions is
    /// enabled. The empty list also denotes constant true.
    Fireable(Vec<TransitionId>),
    Not(Box<Ctl>),
    And(Box<Ctl>, Box<Ctl>),
    Or(Box<Ctl>, Box<Ctl>),
    EX(Box<Ctl>),
    EF(Box<Ctl>),
    EG(Box<Ctl>),
    EU(Box<Ctl>, Box<Ctl>),
    ER(Box<Ctl>, Box<Ctl>),
    AX(Box<Ctl>),
    AF(Box<Ctl>),
    AG(Box<Ctl>),
    AU(Box<Ctl>, Box<Ctl>),
    AR(Box<Ctl>, Box<Ctl>),
}

impl Ctl {
    pub fn not(f: Ctl) -> Ctl {
        Ctl::Not(Box::new(f))
    }
    pub fn and(f: Ctl, g: Ctl) -> Ctl {
        Ctl::And(Box::new(f), Box::new(g))
    }
    pub fn or(f: Ctl, g: Ctl) -> Ctl {
        Ctl::Or(Box::new(f), Box::new(g))
    }
    pub fn ex(f: Ctl) -> Ctl {
        Ctl::EX(Box::new(f))
    }
    pub fn ef(f: Ctl) -> Ctl {
        Ctl::EF(Box::new(f))
    }
    pub fn eg(f: Ctl) -> Ctl {
        Ctl::EG(Box::new(f))
    }
    pub fn eu(f: Ctl, g: Ctl) -> Ctl {
        Ctl::EU(Box::new(f), Box::new(g))
    }
    pub fn er(f: Ctl, g: Ctl) -> Ctl {
        Ctl::ER(Box::new(f), Box::new(g))
    }
    pub fn ax(f: Ctl) -> Ctl {
        Ctl::AX(Box::new(f))
    }
    pub fn af(f: Ctl) -> Ctl {
        Ctl::AF(Box::new(f))
    }
    pub fn ag(f: Ctl) -> Ctl {
        Ctl::AG(Box::new(f))
    }
    pub fn au(f: Ctl, g: Ctl) -> Ctl {
        Ctl::AU(Box::new(f), Box::new(g))
    }
    pub fn ar(f: Ctl, g: Ctl) -> Ctl {
        Ctl::AR(Box::new(f), Box::new(g))
    }

    /// Operator name, for diagnostics.
    pub fn operator_name(&self) -> &'static str {
        match self {
            Ctl::True => "true",
            Ctl::Fireable(_) => "is-fireable",
            Ctl::Not(_) => "NOT",
            Ctl::And(..) => "AND",
            Ctl::Or(..) => "OR",
            Ctl::EX(_) => "EX",
            Ctl::EF(_) => "EF",
            Ctl::EG(_) => "EG",
            Ctl::EU(..) => "EU",
            Ctl::ER(..) => "ER",
            Ctl::AX(_) => "AX",
            Ctl::AF(_) => "AF",
            Ctl::AG(_) => "AG",
            Ctl::AU(..) => "AU",
            Ctl::AR(..) => "AR",
        }
    }

    /// Rewrites the formula into existential normal form.
    ///
    /// Each rewrite strictly decreases the number of non-ENF operators, so
    /// the recursion terminates, and normalizing an already-normal tree is
    /// the identity (up to reallocation).
    ///
    /// Rules for the derived operators:
    ///
    /// ```text
    /// EF φ     = E[true U φ]
    /// AX φ     = ¬EX ¬φ
    /// AG φ     = ¬E[true U ¬φ]
    /// AF φ     = ¬EG ¬φ
    /// A[φ R ψ] = ¬E[¬φ U ¬ψ]
    /// A[φ U ψ] = ¬(E[¬ψ U (¬φ ∧ ¬ψ)] ∨ EG ¬ψ)
    /// E[φ R ψ] = E[ψ U (φ ∧ ψ)] ∨ EG ψ
    /// ```
    pub fn normalize(self) -> Ctl {
        match self {
            Ctl::True | Ctl::Fireable(_) => self,
            Ctl::Not(f) => Ctl::not(f.normalize()),
            Ctl::And(f, g) => Ctl::and(f.normalize(), g.normalize()),
            Ctl::Or(f, g) => Ctl::or(f.normalize(), g.normalize()),
            Ctl::EX(f) => Ctl::ex(f.normalize()),
            Ctl::EG(f) => Ctl::eg(f.normalize()),
            Ctl::EU(f, g) => Ctl::eu(f.normalize(), g.normalize()),
            Ctl::EF(f) => Ctl::eu(Ctl::True, f.normalize()),
            Ctl::AX(f) => Ctl::not(Ctl::ex(Ctl::not(f.normalize()))),
            Ctl::AG(f) => Ctl::not(Ctl::eu(Ctl::True, Ctl::not(f.normalize()))),
            Ctl::AF(f) => Ctl::not(Ctl::eg(Ctl::not(f.normalize()))),
            Ctl::AR(f, g) => Ctl::not(Ctl::eu(
                Ctl::not(f.normalize()),
                Ctl::not(g.normalize()),
            )),
            Ctl::ER(f, g) => {
                let f = f.normalize();
                let g = g.normalize();
                Ctl::or(
                    Ctl::eu(g.clone(), Ctl::and(f, g.clone())),
                    Ctl::eg(g),
                )
            }
            Ctl::AU(f, g) => {
                // ¬E[¬g R ¬f]... spelled out: ¬(E[¬g U (¬f ∧ ¬g)] ∨ EG ¬g)
                let nf = Ctl::not(f.normalize());
                let ng = Ctl::not(g.normalize());
                Ctl::not(Ctl::or(
                    Ctl::eu(ng.clone(), Ctl::and(nf, ng.clone())),
                    Ctl::eg(ng),
                ))
            }
        }
    }

    /// True iff the tree uses only ENF operators.
    pub fn is_normalized(&self) -> bool {
        match self {
            Ctl::True | Ctl::Fireable(_) => true,
            Ctl::Not(f) | Ctl::EX(f) | Ctl::EG(f) => f.is_normalized(),
            Ctl::And(f, g) | Ctl::Or(f, g) | Ctl::EU(f, g) => {
                f.is_normalized() && g.is_normalized()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Ctl {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ctl::True => write!(out, "true"),
            Ctl::Fireable(ts) => {
                write!(out, "is-fireable(")?;
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(out, ",")?;
                    }
                    write!(out, "#{}", t)?;
                }
                write!(out, ")")
            }
            Ctl::Not(f) => write!(out, "!({})", f),
            Ctl::And(f, g) => write!(out, "({} && {})", f, g),
            Ctl::Or(f, g) => write!(out, "({} || {})", f, g),
            Ctl::EX(f) => write!(out, "EX ({})", f),
            Ctl::EF(f) => write!(out, "EF ({})", f),
            Ctl::EG(f) => write!(out, "EG ({})", f),
            Ctl::EU(f, g) => write!(out, "E[{} U {}]", f, g),
            Ctl::ER(f, g) => write!(out, "E[{} R {}]", f, g),
            Ctl::AX(f) => write!(out, "AX ({})", f),
            Ctl::AF(f) => write!(out, "AF ({})", f),
            Ctl::AG(f) => write!(out, "AG ({})", f),
            Ctl::AU(f, g) => write!(out, "A[{} U {}]", f, g),
            Ctl::AR(f, g) => write!(out, "A[{} R {}]", f, g),
        }
    }
}

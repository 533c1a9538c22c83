//! Loader for XML property files.
//!
//! A property file holds a `<property-set>` with one `<property>` per
//! formula to check:
//!
//! ```xml
//! <property-set>
//!   <property>
//!     <id>safety-01</id>
//!     <formula>
//!       <all-paths><globally><negation>
//!         <is-fireable><transition>t3</transition></is-fireable>
//!       </negation></globally></all-paths>
//!     </formula>
//!   </property>
//! </property-set>
//! ```
//!
//! Path quantifiers (`all-paths`, `exists-path`) wrap one of `globally`,
//! `finally`, `next` or `until`; state formulas are `negation`,
//! `conjunction`, `disjunction`, `is-fireable` and `true`. Transition names
//! inside `is-fireable` are resolved against the net at load time. The
//! reader handles exactly this shape of XML (prolog, comments, nested
//! elements, text); attributes are skipped.

use thiserror::Error;

use crate::ctl::Ctl;
use crate::net::PetriNet;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropsError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("expected a <property-set> root, found <{0}>")]
    BadRoot(String),

    #[error("property without an <id>")]
    MissingId,

    #[error("property '{id}': {msg}")]
    BadFormula { id: String, msg: String },

    #[error("property '{id}': unknown transition '{name}'")]
    UnknownTransition { id: String, name: String },
}

/// A named formula to check against a net.
#[derive(Debug, Clone)]
pub struct Property {
    pub id: String,
    pub description: Option<String>,
    pub formula: Ctl,
}

#[derive(Debug)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Reader {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.input[self.pos..].starts_with(prefix.as_bytes())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn skip_until(&mut self, marker: &str) -> Result<(), PropsError> {
        while self.pos < self.input.len() {
            if self.starts_with(marker) {
                self.pos += marker.len();
                return Ok(());
            }
            self.pos += 1;
        }
        Err(PropsError::Xml(format!("unterminated '{}'", marker)))
    }

    /// Skips whitespace, prologs and comments up to the next tag or text.
    fn skip_misc(&mut self) -> Result<(), PropsError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_until("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn read_name(&mut self) -> Result<String, PropsError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'-' || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(PropsError::Xml("expected a tag name".to_string()));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn read_element(&mut self) -> Result<Element, PropsError> {
        if self.peek() != Some(b'<') {
            return Err(PropsError::Xml("expected '<'".to_string()));
        }
        self.pos += 1;
        let name = self.read_name()?;

        // Skip attributes.
        while let Some(c) = self.peek() {
            if c == b'>' || c == b'/' {
                break;
            }
            self.pos += 1;
        }
        if self.starts_with("/>") {
            self.pos += 2;
            return Ok(Element {
                name,
                children: Vec::new(),
                text: String::new(),
            });
        }
        if self.peek() != Some(b'>') {
            return Err(PropsError::Xml(format!("unterminated <{}> tag", name)));
        }
        self.pos += 1;

        let mut children = Vec::new();
        let mut text = String::new();
        loop {
            if self.starts_with("<!--") {
                self.skip_until("-->")?;
            } else if self.starts_with("</") {
                self.pos += 2;
                let closing = self.read_name()?;
                if closing != name {
                    return Err(PropsError::Xml(format!(
                        "mismatched </{}> inside <{}>",
                        closing, name
                    )));
                }
                self.skip_whitespace();
                if self.peek() != Some(b'>') {
                    return Err(PropsError::Xml(format!("unterminated </{}>", closing)));
                }
                self.pos += 1;
                return Ok(Element {
                    name,
                    children,
                    text: text.trim().to_string(),
                });
            } else if self.peek() == Some(b'<') {
                children.push(self.read_element()?);
            } else if self.peek().is_some() {
                // Take the whole text run at once so multi-byte characters
                // are not decoded byte by byte.
                let start = self.pos;
                while self.peek().is_some() && self.peek() != Some(b'<') {
                    self.pos += 1;
                }
                text.push_str(&String::from_utf8_lossy(&self.input[start..self.pos]));
            } else {
                return Err(PropsError::Xml(format!("unterminated <{}>", name)));
            }
        }
    }
}

enum FormulaError {
    Msg(String),
    UnknownTransition(String),
}

fn convert(elem: &Element, net: &PetriNet) -> Result<Ctl, FormulaError> {
    let only_child = |what: &str| -> Result<&Element, FormulaError> {
        if elem.children.len() == 1 {
            Ok(&elem.children[0])
        } else {
            Err(FormulaError::Msg(format!(
                "<{}> takes exactly one {}",
                elem.name, what
            )))
        }
    };

    match elem.name.as_str() {
        "true" => Ok(Ctl::True),

        "negation" => Ok(Ctl::not(convert(only_child("operand")?, net)?)),

        "conjunction" | "disjunction" => {
            if elem.children.len() < 2 {
                return Err(FormulaError::Msg(format!(
                    "<{}> takes at least two operands",
                    elem.name
                )));
            }
            let mut operands = elem.children.iter().map(|c| convert(c, net));
            let mut result = operands.next().unwrap()?;
            for operand in operands {
                result = if elem.name == "conjunction" {
                    Ctl::and(result, operand?)
                } else {
                    Ctl::or(result, operand?)
                };
            }
            Ok(result)
        }

        "is-fireable" => {
            let mut ids = Vec::new();
            for child in &elem.children {
                if child.name != "transition" {
                    return Err(FormulaError::Msg(format!(
                        "<is-fireable> takes <transition> elements, found <{}>",
                        child.name
                    )));
                }
                let id = net
                    .find_transition(&child.text)
                    .ok_or_else(|| FormulaError::UnknownTransition(child.text.clone()))?;
                ids.push(id);
            }
            Ok(Ctl::Fireable(ids))
        }

        "all-paths" | "exists-path" => {
            let all = elem.name == "all-paths";
            let path = only_child("path formula")?;
            match path.name.as_str() {
                "globally" => {
                    let inner = convert_only_child(path, net)?;
                    Ok(if all { Ctl::ag(inner) } else { Ctl::eg(inner) })
                }
                "finally" => {
                    let inner = convert_only_child(path, net)?;
                    Ok(if all { Ctl::af(inner) } else { Ctl::ef(inner) })
                }
                "next" => {
                    let inner = convert_only_child(path, net)?;
                    Ok(if all { Ctl::ax(inner) } else { Ctl::ex(inner) })
                }
                "until" => {
                    let before = path.child("before").ok_or_else(|| {
                        FormulaError::Msg("<until> needs a <before>".to_string())
                    })?;
                    let reach = path
                        .child("reach")
                        .ok_or_else(|| FormulaError::Msg("<until> needs a <reach>".to_string()))?;
                    let phi = convert_only_child(before, net)?;
                    let psi = convert_only_child(reach, net)?;
                    Ok(if all {
                        Ctl::au(phi, psi)
                    } else {
                        Ctl::eu(phi, psi)
                    })
                }
                other => Err(FormulaError::Msg(format!(
                    "unknown path operator <{}>",
                    other
                ))),
            }
        }

        other => Err(FormulaError::Msg(format!("unknown operator <{}>", other))),
    }
}

fn convert_only_child(elem: &Element, net: &PetriNet) -> Result<Ctl, FormulaError> {
    if elem.children.len() == 1 {
        convert(&elem.children[0], net)
    } else {
        Err(FormulaError::Msg(format!(
            "<{}> takes exactly one operand",
            elem.name
        )))
    }
}

/// Parses a property file, resolving transition names against `net`.
pub fn parse_properties(input: &str, net: &PetriNet) -> Result<Vec<Property>, PropsError> {
    let mut reader = Reader::new(input);
    reader.skip_misc()?;
    let root = reader.read_element()?;
    if root.name != "property-set" {
        return Err(PropsError::BadRoot(root.name));
    }

    let mut properties = Vec::new();
    for elem in &root.children {
        if elem.name != "property" {
            return Err(PropsError::Xml(format!(
                "expected <property>, found <{}>",
                elem.name
            )));
        }

        let id = elem
            .child("id")
            .map(|c| c.text.clone())
            .filter(|s| !s.is_empty())
            .ok_or(PropsError::MissingId)?;
        let description = elem
            .child("description")
            .map(|c| c.text.clone())
            .filter(|s| !s.is_empty());
        let formula_elem = elem.child("formula").ok_or_else(|| PropsError::BadFormula {
            id: id.clone(),
            msg: "missing <formula>".to_string(),
        })?;
        if formula_elem.children.len() != 1 {
            return Err(PropsError::BadFormula {
                id,
                msg: "<formula> takes exactly one operand".to_string(),
            });
        }

        let formula = convert(&formula_elem.children[0], net).map_err(|e| match e {
            FormulaError::Msg(msg) => PropsError::BadFormula { id: id.clone(), msg },
            FormulaError::UnknownTransition(name) => PropsError::UnknownTransition {
                id: id.clone(),
                name,
            },
        })?;

        properties.push(Property {
            id,
            description,
            formula,
        });
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{Arc, ArcDir};

    fn two_place_net() -> PetriNet {
        let mut net = PetriNet::new("n");
        let p0 = net.add_place("p0", 1);
        let p1 = net.add_place("p1", 0);
        net.add_transition(
            "t0",
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
    fn test_parse_single_property() {
        let xml = r#"<?xml version="1.0"?>
            <property-set>
              <!-- checked nightly -->
              <property>
                <id>live-01</id>
                <description>t0 stays fireable somewhere</description>
                <formula>
                  <exists-path><globally>
                    <is-fireable><transition>t0</transition></is-fireable>
                  </globally></exists-path>
                </formula>
              </property>
            </property-set>"#;
        let props = parse_properties(xml, &two_place_net()).unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].id, "live-01");
        assert_eq!(
            props[0].description.as_deref(),
            Some("t0 stays fireable somewhere")
        );
        assert_eq!(props[0].formula, Ctl::eg(Ctl::Fireable(vec![0])));
    }

    #[test]
    fn test_parse_until_and_booleans() {
        let xml = r#"
            <property-set>
              <property>
                <id>p</id>
                <formula>
                  <all-paths><until>
                    <before><true/></before>
                    <reach>
                      <disjunction>
                        <negation><is-fireable><transition>t0</transition></is-fireable></negation>
                        <conjunction><true/><true/></conjunction>
                      </disjunction>
                    </reach>
                  </until></all-paths>
                </formula>
              </property>
            </property-set>"#;
        let props = parse_properties(xml, &two_place_net()).unwrap();
        let expected = Ctl::au(
            Ctl::True,
            Ctl::or(
                Ctl::not(Ctl::Fireable(vec![0])),
                Ctl::and(Ctl::True, Ctl::True),
            ),
        );
        assert_eq!(props[0].formula, expected);
    }

    #[test]
    fn test_unknown_transition() {
        let xml = r#"
            <property-set>
              <property>
                <id>p</id>
                <formula>
                  <is-fireable><transition>bogus</transition></is-fireable>
                </formula>
              </property>
            </property-set>"#;
        let err = parse_properties(xml, &two_place_net()).unwrap_err();
        assert_eq!(
            err,
            PropsError::UnknownTransition {
                id: "p".to_string(),
                name: "bogus".to_string(),
            }
        );
    }

    #[test]
    fn test_transition_name_with_multibyte_characters() {
        let net = crate::andl::parse_net(
            "pn n { places { [p0 = 1] [p1 = 0] } transitions { [tä : [p0 - 1] & [p1 + 1]] } }",
        )
        .unwrap();
        let xml = r#"
            <property-set>
              <property>
                <id>umlaut</id>
                <formula>
                  <is-fireable><transition>tä</transition></is-fireable>
                </formula>
              </property>
            </property-set>"#;
        let props = parse_properties(xml, &net).unwrap();
        assert_eq!(props[0].formula, Ctl::Fireable(vec![0]));
    }

    #[test]
    fn test_missing_id() {
        let xml = "<property-set><property><formula><true/></formula></property></property-set>";
        assert_eq!(
            parse_properties(xml, &two_place_net()).unwrap_err(),
            PropsError::MissingId
        );
    }

    #[test]
    fn test_unknown_operator() {
        let xml = r#"
            <property-set>
              <property>
                <id>p</id>
                <formula><deadlock/></formula>
              </property>
            </property-set>"#;
        let err = parse_properties(xml, &two_place_net()).unwrap_err();
        assert!(matches!(err, PropsError::BadFormula { .. }));
    }

    #[test]
    fn test_mismatched_tags() {
        let xml = "<property-set><property></formula></property></property-set>";
        assert!(matches!(
            parse_properties(xml, &two_place_net()).unwrap_err(),
            PropsError::Xml(_)
        ));
    }

    #[test]
    fn test_bad_root() {
        let err = parse_properties("<properties/>", &two_place_net()).unwrap_err();
        assert_eq!(err, PropsError::BadRoot("properties".to_string()));
    }
}

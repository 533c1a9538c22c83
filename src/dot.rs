//! BDD to DOT (Graphviz) conversion.
//!
//! The generated output follows these conventions:
//! - terminal nodes (0 and 1) are squares at the bottom (sink rank);
//! - variable nodes are circles, grouped per variable level (same rank);
//! - solid lines are high (then) edges, dashed lines are low (else) edges;
//! - dotted lines with a hollow circle are complement edges;
//! - root nodes are rectangles at the top (source rank).

use std::collections::BTreeMap;

use crate::bdd::Bdd;
use crate::reference::Ref;

/// Visual options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    pub node_shape: &'static str,
    pub terminal_shape: &'static str,
    pub root_shape: &'static str,
    pub high_edge_style: &'static str,
    pub low_edge_style: &'static str,
    pub negated_edge_style: &'static str,
    /// Use HTML labels with subscripts for variables.
    pub use_html_labels: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            node_shape: "circle",
            terminal_shape: "square",
            root_shape: "rect",
            high_edge_style: "solid",
            low_edge_style: "dashed",
            negated_edge_style: "dotted",
            use_html_labels: true,
        }
    }
}

impl Bdd {
    /// Renders the diagrams rooted at `roots` in DOT format.
    ///
    /// Render with e.g. `dot -Tpng out.dot -o out.png`.
    pub fn to_dot(&self, roots: &[Ref]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(roots, &DotConfig::default())
    }

    pub fn to_dot_with_config(
        &self,
        roots: &[Ref],
        config: &DotConfig,
    ) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [shape={}, fixedsize=true];", config.node_shape)?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "0 [shape={}, label=\"0\"];", config.terminal_shape)?;
        writeln!(dot, "1 [shape={}, label=\"1\"];", config.terminal_shape)?;
        writeln!(dot, "}}")?;

        let all_nodes = self.descendants(roots.iter().copied());

        // Group nodes by variable so each level shares a rank.
        let mut levels = BTreeMap::<u32, Vec<u32>>::new();
        for &id in all_nodes.iter() {
            if id == 1 {
                continue; // terminal, handled above
            }
            levels.entry(self.variable(id)).or_default().push(id);
        }

        for level in levels.values() {
            writeln!(dot, "{{ rank=same")?;
            for &id in level.iter() {
                let label = if config.use_html_labels {
                    format!("<x<SUB>{}</SUB>>", self.variable(id))
                } else {
                    format!("\"x{}\"", self.variable(id))
                };
                writeln!(dot, "{} [label={}];", id, label)?;
            }
            writeln!(dot, "}}")?;
        }

        for &id in all_nodes.iter() {
            if id == 1 {
                continue;
            }

            let high = self.high(id);
            assert!(!high.is_negated()); // canonicity: high edges are regular
            writeln!(
                dot,
                "{} -- {} [style={}];",
                id,
                high.index(),
                config.high_edge_style
            )?;

            let low = self.low(id);
            if low.is_negated() {
                if low.index() == 1 {
                    // Complemented terminal, i.e. the 0 sink.
                    writeln!(dot, "{} -- 0 [style={}];", id, config.low_edge_style)?;
                } else {
                    writeln!(
                        dot,
                        "{} -- {} [style={}, dir=forward, arrowhead=odot];",
                        id,
                        low.index(),
                        config.negated_edge_style
                    )?;
                }
            } else {
                writeln!(
                    dot,
                    "{} -- {} [style={}];",
                    id,
                    low.index(),
                    config.low_edge_style
                )?;
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(
                dot,
                "r{} [shape={}, label=\"{}\"];",
                i, config.root_shape, root
            )?;
        }
        writeln!(dot, "}}")?;

        for (i, &root) in roots.iter().enumerate() {
            if root.is_negated() {
                if root.index() == 1 {
                    writeln!(dot, "r{} -- 0;", i)?;
                } else {
                    writeln!(dot, "r{} -- {} [dir=forward, arrowhead=odot];", i, root.index())?;
                }
            } else {
                writeln!(dot, "r{} -- {};", i, root.index())?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_dot_basic() {
        let bdd = Bdd::default();
        let f = bdd.cube([-1, 2, 3]).unwrap();

        let dot = bdd.to_dot(&[f]).unwrap();
        assert!(dot.starts_with("graph {"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_to_dot_multiple_roots() {
        let bdd = Bdd::default();
        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let f = bdd.apply_and(x1, x2).unwrap();

        let dot = bdd.to_dot(&[f, bdd.zero, bdd.one]).unwrap();
        assert!(dot.starts_with("graph {"));
    }

    #[test]
    fn test_to_dot_with_config() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1).unwrap();

        let config = DotConfig {
            use_html_labels: false,
            ..DotConfig::default()
        };

        let dot = bdd.to_dot_with_config(&[x], &config).unwrap();
        assert!(dot.contains("\"x1\""));
    }
}

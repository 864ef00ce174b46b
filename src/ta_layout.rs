//! Graph Drawing
//!
//! Force-directed placement of a finished graph and SVG rendering of the
//! result. The graph is copied into an `fdg_sim` force graph (a petgraph
//! `StableGraph`) and simulated with the Fruchterman-Reingold force; the final
//! node locations are scaled into the drawing area. Only reads the graph;
//! nothing here feeds back into the simulation.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fdg_sim::{force, Dimensions, ForceGraph, ForceGraphHelper, Simulation, SimulationParameters};
use petgraph::stable_graph::NodeIndex;

use crate::ta_graph::Graph;
use crate::ta_interface::{CallCount, NodeId};

const NODE_RADIUS: f64 = 8.0;

/// Layout parameters
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Force simulation steps
    pub iterations: usize,

    /// Time step per simulation step
    pub delta_time: f32,

    /// Drawing area in pixels
    pub width: f64,
    pub height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            delta_time: 0.035,
            width: 800.0,
            height: 800.0,
        }
    }
}

/// Node positions for a graph, ready to render
#[derive(Debug, Clone)]
pub struct GraphLayout {
    positions: Vec<(f64, f64)>,
    edges: Vec<(NodeId, NodeId)>,
    width: f64,
    height: f64,
}

impl GraphLayout {
    /// Run the force simulation for `config.iterations` steps and fit the
    /// result into the drawing area
    pub fn compute(graph: &Graph, config: &LayoutConfig) -> Self {
        let edges = graph.edges();

        let mut force_graph: ForceGraph<NodeId, ()> = ForceGraph::default();
        let indices: Vec<NodeIndex> = (0..graph.node_count())
            .map(|node| force_graph.add_force_node(node.to_string(), node))
            .collect();
        for &(u, v) in &edges {
            force_graph.add_edge(indices[u], indices[v], ());
        }

        let parameters = SimulationParameters::new(
            200.0,
            Dimensions::Two,
            force::fruchterman_reingold(45.0, 0.975),
        );
        let mut simulation = Simulation::from_graph(force_graph, parameters);
        for _ in 0..config.iterations {
            simulation.update(config.delta_time);
        }

        let raw: Vec<(f64, f64)> = indices
            .iter()
            .map(|&index| {
                simulation
                    .get_graph()
                    .node_weight(index)
                    .map_or((0.0, 0.0), |n| (n.location.x as f64, n.location.y as f64))
            })
            .collect();

        Self {
            positions: fit_to_frame(&raw, config.width, config.height),
            edges,
            width: config.width,
            height: config.height,
        }
    }

    pub fn positions(&self) -> &[(f64, f64)] {
        &self.positions
    }

    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    /// Render as SVG. With `calls`, reached nodes are filled differently from
    /// unreached ones.
    pub fn to_svg(&self, calls: Option<&[CallCount]>) -> String {
        let mut svg = String::new();
        // writing into a String cannot fail
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

        for &(u, v) in &self.edges {
            let (a, b) = (self.positions[u], self.positions[v]);
            let _ = writeln!(
                svg,
                r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#999" stroke-width="1"/>"##,
                a.0, a.1, b.0, b.1
            );
        }

        for (node, &(x, y)) in self.positions.iter().enumerate() {
            let reached = calls
                .and_then(|c| c.get(node))
                .map_or(false, |&count| count > 0);
            let fill = if reached { "#d62728" } else { "#1f77b4" };
            let _ = writeln!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="{}" fill="{}"/>"#,
                x, y, NODE_RADIUS, fill
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="9" text-anchor="middle" dy="3" fill="white">{}</text>"#,
                x, y, node
            );
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write `to_svg` output to `path`
    pub fn write_svg<P: AsRef<Path>>(&self, path: P, calls: Option<&[CallCount]>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.to_svg(calls).as_bytes())?;
        writer.flush()
    }
}

/// Scale simulation coordinates into `width` x `height`, keeping a margin for
/// the node circles. A layout with no extent is centered.
fn fit_to_frame(raw: &[(f64, f64)], width: f64, height: f64) -> Vec<(f64, f64)> {
    let margin = NODE_RADIUS * 2.0;
    let (cx, cy) = (width / 2.0, height / 2.0);

    let finite = raw.iter().filter(|(x, y)| x.is_finite() && y.is_finite());
    let (min_x, max_x, min_y, max_y) = finite.fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(a, b, c, d), &(x, y)| (a.min(x), b.max(x), c.min(y), d.max(y)),
    );
    let span = (max_x - min_x).max(max_y - min_y);
    let usable = (width.min(height) - 2.0 * margin).max(0.0);

    raw.iter()
        .map(|&(x, y)| {
            if !span.is_finite() || span <= f64::EPSILON || !x.is_finite() || !y.is_finite() {
                return (cx, cy);
            }
            let scale = usable / span;
            (
                cx + (x - (min_x + max_x) / 2.0) * scale,
                cy + (y - (min_y + max_y) / 2.0) * scale,
            )
        })
        .collect()
}

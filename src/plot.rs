//! Turns fetched node and edge tables into a drawable network plot.
//!
//! [`GraphRenderer`] runs one linear pass per call: fetch nodes, map their
//! attributes, fetch edges, build the directed graph, then line up sizes
//! and colors with the graph's node order. Nothing is cached between
//! calls; every render re-fetches both tables through the [`TableSource`].

use crate::colormap::{Colormap, Normalize};
use crate::error::{Error, Result};
use crate::graph::RenderedGraph;
use crate::network::{CommunitySet, EdgeRecord, NetworkTables, NodeAttributes, NodeId, NodeRecord};
use crate::render::Renderer;
use crate::table::{Fetched, TableSource, TableSpec};
use serde::{Deserialize, Serialize};

/// Marker fill used when no color attribute is requested.
pub const DEFAULT_NODE_COLOR: &str = "#1f78b4";

pub const DEFAULT_TITLE: &str = "Hartford drug user social network";
pub const DEFAULT_SIZE_ATTR: &str = "_HypGrp_";
pub const DEFAULT_LIMIT: usize = 1000;

/// Parameters for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    /// Restrict nodes and edges to one community. Negative means none.
    pub filter_community: Option<i64>,
    /// Figure side length in inches.
    pub size: f64,
    /// Numeric node column driving marker size.
    pub size_attr: String,
    /// Numeric node column driving marker color and the legend.
    pub color_attr: Option<String>,
    pub size_multiplier: f64,
    pub title: String,
    /// Row cap for each fetch.
    pub limit: usize,
    pub colormap: Colormap,
}

impl Default for PlotRequest {
    fn default() -> Self {
        Self {
            filter_community: None,
            size: 18.0,
            size_attr: DEFAULT_SIZE_ATTR.to_string(),
            color_attr: None,
            size_multiplier: 500.0,
            title: DEFAULT_TITLE.to_string(),
            limit: DEFAULT_LIMIT,
            colormap: Colormap::default(),
        }
    }
}

impl PlotRequest {
    pub fn community(&self) -> Option<i64> {
        self.filter_community.filter(|c| *c >= 0)
    }

    /// Color column, treating an empty name as no coloring.
    pub fn color_attr(&self) -> Option<&str> {
        self.color_attr.as_deref().filter(|c| !c.is_empty())
    }
}

/// A node as it will be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    /// Marker area in points squared.
    pub size: f64,
    /// Raw color attribute value.
    pub color_value: Option<f64>,
    /// Resolved fill color.
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub value: f64,
    pub color: String,
}

impl LegendEntry {
    pub fn label_for(value: f64) -> String {
        format!("Community {:2.0}", value)
    }
}

/// Everything needed to draw the figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPlot {
    pub title: String,
    /// Figure side length in inches.
    pub size: f64,
    /// Nodes in graph order.
    pub nodes: Vec<PlotNode>,
    /// Distinct edges in graph order.
    pub edges: Vec<EdgeRecord>,
    pub communities: CommunitySet,
    pub legend: Vec<LegendEntry>,
    /// Fetched nodes with no edges, which are not drawn.
    pub unconnected: usize,
}

impl NetworkPlot {
    pub fn node(&self, id: &NodeId) -> Option<&PlotNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// Fetches the network tables and prepares plots from them.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphRenderer;

impl GraphRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Fetch both tables and lay out the plot data.
    pub fn prepare(
        &self,
        source: &dyn TableSource,
        tables: &NetworkTables,
        request: &PlotRequest,
    ) -> Result<NetworkPlot> {
        let community = request.community();
        let color_attr = request.color_attr();

        let nodes = fetch(source, &tables.node_spec(community), request.limit)?;
        let records = NodeRecord::from_table(&nodes.table, &request.size_attr, color_attr)?;
        let attrs = NodeAttributes::from_records(&records, request.size_multiplier);

        let edges = fetch(source, &tables.edge_spec(community), request.limit)?;
        let rows = EdgeRecord::from_table(&edges.table)?;
        let graph = RenderedGraph::from_edges(&rows);
        let edges: Vec<EdgeRecord> = graph
            .edges()
            .map(|(s, t)| EdgeRecord {
                source: s.clone(),
                target: t.clone(),
            })
            .collect();
        if edges.len() < rows.len() {
            tracing::debug!(
                rows = rows.len(),
                edges = edges.len(),
                "repeated edge rows merged"
            );
        }

        let norm = match (attrs.communities.min(), attrs.communities.max()) {
            (Some(lo), Some(hi)) if color_attr.is_some() => Some(Normalize::new(lo, hi)),
            _ => None,
        };
        let fill_for = |value: Option<f64>| match (value, norm) {
            (Some(v), Some(norm)) => request.colormap.hex(norm.apply(v)),
            _ => DEFAULT_NODE_COLOR.to_string(),
        };

        let mut plot_nodes = Vec::with_capacity(graph.node_count());
        for id in graph.nodes() {
            let &(x, y) = attrs
                .positions
                .get(id)
                .ok_or_else(|| Error::MissingNode(id.to_string()))?;
            let size = attrs.sizes.get(id).copied().unwrap_or_default();
            let color_value = color_attr.and_then(|_| attrs.colors.get(id).copied());

            plot_nodes.push(PlotNode {
                id: id.clone(),
                x,
                y,
                size,
                color_value,
                fill: fill_for(color_value),
            });
        }

        let legend = match norm {
            Some(norm) => attrs
                .communities
                .values()
                .iter()
                .map(|&value| LegendEntry {
                    label: LegendEntry::label_for(value),
                    value,
                    color: request.colormap.hex(norm.apply(value)),
                })
                .collect(),
            None => Vec::new(),
        };

        let unconnected = attrs
            .positions
            .keys()
            .filter(|id| !graph.contains(id))
            .count();
        if unconnected > 0 {
            tracing::debug!(unconnected, "nodes without edges are not drawn");
        }

        tracing::info!(
            nodes = plot_nodes.len(),
            edges = edges.len(),
            communities = attrs.communities.len(),
            "prepared network plot"
        );

        Ok(NetworkPlot {
            title: request.title.clone(),
            size: request.size,
            nodes: plot_nodes,
            edges,
            communities: attrs.communities,
            legend,
            unconnected,
        })
    }

    /// Prepare the plot and draw it with `renderer`.
    pub fn render_to(
        &self,
        source: &dyn TableSource,
        tables: &NetworkTables,
        request: &PlotRequest,
        renderer: &dyn Renderer,
    ) -> Result<String> {
        let plot = self.prepare(source, tables, request)?;
        Ok(renderer.render(&plot))
    }
}

fn fetch(source: &dyn TableSource, spec: &TableSpec, limit: usize) -> Result<Fetched> {
    match &spec.filter {
        Some(filter) => tracing::debug!(table = %spec.name, %filter, limit, "fetching"),
        None => tracing::debug!(table = %spec.name, limit, "fetching"),
    }

    let fetched = source.fetch(spec, limit)?;
    if fetched.truncated() {
        tracing::warn!(
            table = %spec.name,
            matched = fetched.matched,
            kept = fetched.table.len(),
            "row limit reached, table truncated"
        );
    }
    Ok(fetched)
}

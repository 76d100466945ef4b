//! Netplot - community-colored social network figures.
//!
//! Fetches a node table (precomputed layout coordinates plus attribute
//! columns) and an edge table from a table source, maps node attributes to
//! marker size and color, and draws the directed graph as a static SVG
//! figure with a title and a community legend.

pub mod colormap;
pub mod config;
pub mod error;
pub mod graph;
pub mod network;
pub mod plot;
pub mod render;
pub mod table;

pub use crate::config::NetplotConfig;
pub use error::{Error, Result};
pub use network::{CommunitySet, EdgeRecord, NetworkTables, NodeId, NodeRecord};
pub use plot::{GraphRenderer, NetworkPlot, PlotRequest};
pub use render::Renderer;
pub use table::{ColumnTable, FileTableSource, Filter, TableSource, TableSpec};

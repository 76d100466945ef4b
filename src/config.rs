//! Configuration loading for netplot.
//!
//! Configuration is loaded from TOML files with environment variable overrides.

use crate::colormap::Colormap;
use crate::plot::{PlotRequest, DEFAULT_LIMIT, DEFAULT_SIZE_ATTR, DEFAULT_TITLE};
use crate::render::svg::SvgRenderer;
use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.default.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NetplotConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Directory holding `<table>.json` or `<table>.csv` files.
    #[serde(default = "default_source_directory")]
    pub directory: String,

    #[serde(default = "default_nodes_table")]
    pub nodes_table: String,

    #[serde(default = "default_edges_table")]
    pub edges_table: String,

    /// Row cap for each fetch.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            directory: default_source_directory(),
            nodes_table: default_nodes_table(),
            edges_table: default_edges_table(),
            limit: default_limit(),
        }
    }
}

fn default_source_directory() -> String {
    "data".to_string()
}

fn default_nodes_table() -> String {
    "nodes".to_string()
}

fn default_edges_table() -> String {
    "edges".to_string()
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Figure side in inches.
    #[serde(default = "default_size")]
    pub size: f64,

    #[serde(default = "default_dpi")]
    pub dpi: f64,

    #[serde(default = "default_size_attr")]
    pub size_attr: String,

    /// Empty disables coloring and the legend.
    #[serde(default)]
    pub color_attr: String,

    #[serde(default = "default_size_multiplier")]
    pub size_multiplier: f64,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_colormap")]
    pub colormap: String,

    #[serde(default = "default_title_font_size")]
    pub title_font_size: f64,

    #[serde(default = "default_font_size")]
    pub label_font_size: f64,

    #[serde(default = "default_font_size")]
    pub legend_font_size: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            dpi: default_dpi(),
            size_attr: default_size_attr(),
            color_attr: String::new(),
            size_multiplier: default_size_multiplier(),
            title: default_title(),
            colormap: default_colormap(),
            title_font_size: default_title_font_size(),
            label_font_size: default_font_size(),
            legend_font_size: default_font_size(),
        }
    }
}

fn default_size() -> f64 {
    18.0
}

fn default_dpi() -> f64 {
    72.0
}

fn default_size_attr() -> String {
    DEFAULT_SIZE_ATTR.to_string()
}

fn default_size_multiplier() -> f64 {
    500.0
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_colormap() -> String {
    "jet".to_string()
}

fn default_title_font_size() -> f64 {
    30.0
}

fn default_font_size() -> f64 {
    11.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Also write the prepared plot data as JSON.
    #[serde(default)]
    pub save_data: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            save_data: false,
        }
    }
}

fn default_output_directory() -> String {
    "output".to_string()
}

impl NetplotConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("NETPLOT").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Plot request built from the `[render]` and `[source]` sections.
    pub fn plot_request(&self) -> Result<PlotRequest> {
        let color_attr = Some(self.render.color_attr.clone()).filter(|c| !c.is_empty());
        Ok(PlotRequest {
            filter_community: None,
            size: self.render.size,
            size_attr: self.render.size_attr.clone(),
            color_attr,
            size_multiplier: self.render.size_multiplier,
            title: self.render.title.clone(),
            limit: self.source.limit,
            colormap: self.render.colormap.parse::<Colormap>()?,
        })
    }

    pub fn svg_renderer(&self) -> SvgRenderer {
        SvgRenderer {
            dpi: self.render.dpi,
            title_font_size: self.render.title_font_size,
            label_font_size: self.render.label_font_size,
            legend_font_size: self.render.legend_font_size,
            ..SvgRenderer::default()
        }
    }
}

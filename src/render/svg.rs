//! Static SVG figure of a network plot.
//!
//! Sizes follow the usual plotting conventions: the figure side is given
//! in inches, fonts in points, and marker sizes as areas in points
//! squared. `dpi` converts all of them to pixels.
//!
//! Layout of the figure:
//! - Title band across the top
//! - Axes area below it, holding edges, nodes and labels
//! - Legend box in the upper-left corner of the axes, one row per community

use crate::plot::NetworkPlot;
use crate::render::Renderer;
use std::collections::HashMap;

/// Fraction of the data range added on each side of the axes.
const MARGIN: f64 = 0.05;

pub struct SvgRenderer {
    pub dpi: f64,
    pub title_font_size: f64,
    pub label_font_size: f64,
    pub legend_font_size: f64,
    pub edge_width: f64,
    pub edge_opacity: f64,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            dpi: 72.0,
            title_font_size: 30.0,
            label_font_size: 11.0,
            legend_font_size: 11.0,
            edge_width: 1.0,
            edge_opacity: 0.5,
        }
    }
}

/// A node placed on the canvas.
struct PlacedNode<'a> {
    label: &'a str,
    x: f64,
    y: f64,
    radius: f64,
    fill: &'a str,
}

/// Maps data coordinates into the axes rectangle, y pointing up.
struct Axes {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Axes {
    fn fit(plot: &NetworkPlot, left: f64, top: f64, width: f64, height: f64) -> Self {
        let xs = plot.nodes.iter().map(|n| n.x);
        let ys = plot.nodes.iter().map(|n| n.y);
        Self {
            left,
            top,
            width,
            height,
            x_range: padded_range(xs),
            y_range: padded_range(ys),
        }
    }

    fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let cx = self.left + (x - x0) / (x1 - x0) * self.width;
        let cy = self.top + (1.0 - (y - y0) / (y1 - y0)) * self.height;
        (cx, cy)
    }
}

/// Data range widened by the margin. A single value is centered.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if lo > hi {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        return (lo - 0.5, hi + 0.5);
    }
    let pad = (hi - lo) * MARGIN;
    (lo - pad, hi + pad)
}

/// Escape text for use in SVG content and attributes.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

impl SvgRenderer {
    /// Pixels per point.
    fn scale(&self) -> f64 {
        self.dpi / 72.0
    }

    /// Canvas side in pixels.
    fn side(&self, plot: &NetworkPlot) -> f64 {
        (plot.size * self.dpi).max(1.0)
    }

    fn title_band(&self) -> f64 {
        self.title_font_size * self.scale() * 2.0
    }

    fn place_nodes<'a>(&self, plot: &'a NetworkPlot, axes: &Axes) -> Vec<PlacedNode<'a>> {
        let scale = self.scale();
        plot.nodes
            .iter()
            .map(|node| {
                let (x, y) = axes.to_canvas(node.x, node.y);
                PlacedNode {
                    label: &node.id.0,
                    x,
                    y,
                    radius: node.size.max(0.0).sqrt() / 2.0 * scale,
                    fill: &node.fill,
                }
            })
            .collect()
    }

    /// Straight edges clipped at the node circles, each ending in an arrowhead.
    fn draw_edges(&self, plot: &NetworkPlot, placed: &[PlacedNode]) -> Vec<String> {
        let pos_map: HashMap<&str, &PlacedNode> = placed.iter().map(|p| (p.label, p)).collect();
        let width = self.edge_width * self.scale();

        plot.edges
            .iter()
            .filter_map(|edge| {
                let src = pos_map.get(edge.source.0.as_str())?;
                let tgt = pos_map.get(edge.target.0.as_str())?;

                let dx = tgt.x - src.x;
                let dy = tgt.y - src.y;
                let dist = (dx * dx + dy * dy).sqrt();

                // Overlapping markers leave nothing visible to draw
                if dist <= src.radius + tgt.radius {
                    return None;
                }

                let angle = dy.atan2(dx);
                let start_x = src.x + angle.cos() * src.radius;
                let start_y = src.y + angle.sin() * src.radius;
                let end_x = tgt.x - angle.cos() * tgt.radius;
                let end_y = tgt.y - angle.sin() * tgt.radius;

                Some(format!(
                    r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="black" stroke-width="{:.2}" stroke-opacity="{:.2}" marker-end="url(#arrow)"/>"#,
                    start_x, start_y, end_x, end_y, width, self.edge_opacity
                ))
            })
            .collect()
    }

    fn draw_nodes(&self, placed: &[PlacedNode]) -> Vec<String> {
        placed
            .iter()
            .map(|node| {
                format!(
                    r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"/>"#,
                    node.x, node.y, node.radius, node.fill
                )
            })
            .collect()
    }

    fn draw_labels(&self, placed: &[PlacedNode]) -> Vec<String> {
        let font_size = self.label_font_size * self.scale();
        placed
            .iter()
            .map(|node| {
                format!(
                    r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" font-family="sans-serif" text-anchor="middle" dominant-baseline="central">{}</text>"#,
                    node.x,
                    node.y,
                    font_size,
                    escape(node.label)
                )
            })
            .collect()
    }

    fn draw_title(&self, plot: &NetworkPlot, side: f64) -> String {
        format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" font-family="sans-serif" text-anchor="middle" dominant-baseline="central">{}</text>"#,
            side / 2.0,
            self.title_band() / 2.0,
            self.title_font_size * self.scale(),
            escape(&plot.title)
        )
    }

    /// Legend box with one thick color swatch and label per community.
    fn draw_legend(&self, plot: &NetworkPlot) -> Vec<String> {
        if plot.legend.is_empty() {
            return Vec::new();
        }

        let scale = self.scale();
        let font_size = self.legend_font_size * scale;
        let row_height = font_size * 1.6;
        let swatch_len = font_size * 2.0;
        let swatch_width = 10.0 * scale;
        let pad = font_size * 0.6;

        let longest = plot
            .legend
            .iter()
            .map(|e| e.label.chars().count())
            .max()
            .unwrap_or(0) as f64;
        let box_width = pad * 3.0 + swatch_len + longest * font_size * 0.6;
        let box_height = pad * 2.0 + row_height * plot.legend.len() as f64;
        let left = pad;
        let top = self.title_band() + pad;

        let mut elements = vec![format!(
            r##"<rect class="legend" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="white" fill-opacity="0.8" stroke="#cccccc" rx="{:.1}"/>"##,
            left,
            top,
            box_width,
            box_height,
            3.0 * scale
        )];

        for (i, entry) in plot.legend.iter().enumerate() {
            let y = top + pad + row_height * (i as f64 + 0.5);
            let x = left + pad;
            elements.push(format!(
                r#"<line class="legend-swatch" x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{:.1}"/>"#,
                x,
                y,
                x + swatch_len,
                y,
                entry.color,
                swatch_width
            ));
            elements.push(format!(
                r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" font-family="sans-serif" dominant-baseline="central" xml:space="preserve">{}</text>"#,
                x + swatch_len + pad,
                y,
                font_size,
                escape(&entry.label)
            ));
        }

        elements
    }

    fn generate_defs(&self) -> String {
        let size = 10.0 * self.scale();
        format!(
            r#"<defs>
    <marker id="arrow" viewBox="0 0 10 10" refX="10" refY="5" markerUnits="userSpaceOnUse" markerWidth="{:.1}" markerHeight="{:.1}" orient="auto">
      <path d="M 0 0 L 10 5 L 0 10 z" fill="black" fill-opacity="{:.2}"/>
    </marker>
  </defs>"#,
            size, size, self.edge_opacity
        )
    }

    fn wrap_svg(&self, side: f64, defs: &str, content: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.0} {:.0}" width="{:.0}" height="{:.0}">
  {}
  <rect width="100%" height="100%" fill="white"/>
  {}
</svg>"#,
            side, side, side, side, defs, content
        )
    }
}

impl Renderer for SvgRenderer {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn render(&self, plot: &NetworkPlot) -> String {
        let side = self.side(plot);
        let band = self.title_band().min(side / 2.0);
        let axes = Axes::fit(plot, 0.0, band, side, side - band);
        let placed = self.place_nodes(plot, &axes);

        let sections = [
            self.draw_edges(plot, &placed),
            self.draw_nodes(&placed),
            self.draw_labels(&placed),
            vec![self.draw_title(plot, side)],
            self.draw_legend(plot),
        ];
        let content: Vec<String> = sections.into_iter().flatten().collect();

        self.wrap_svg(side, &self.generate_defs(), &content.join("\n  "))
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

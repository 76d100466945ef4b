//! Renderers - each turns a prepared network plot into an output document.

pub mod svg;

use crate::plot::NetworkPlot;
use std::path::{Path, PathBuf};

/// Trait for all plot renderers.
pub trait Renderer {
    /// Name of this renderer.
    fn name(&self) -> &'static str;

    /// Draw the plot.
    /// Returns the output document as a string.
    fn render(&self, plot: &NetworkPlot) -> String;

    /// File extension for this renderer's output.
    fn extension(&self) -> &'static str;
}

/// Path for the JSON dump of a plot written to `output`.
///
/// Uses a `.data.json` suffix on the output's stem so it never collides
/// with the figure itself, whatever extension that has.
pub fn plot_data_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "network".to_string());
    output.with_file_name(format!("{}.data.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_path_next_to_output() {
        assert_eq!(
            plot_data_path(Path::new("out/network.svg")),
            PathBuf::from("out/network.data.json")
        );
    }

    #[test]
    fn test_data_path_never_overwrites_output() {
        let output = Path::new("plots/figure.json");
        let data = plot_data_path(output);
        assert_ne!(data, output);
        assert_eq!(data, PathBuf::from("plots/figure.data.json"));
    }
}

//! End-to-end rendering from table files on disk.

use netplot::network::NodeId;
use netplot::render::svg::SvgRenderer;
use netplot::{Error, FileTableSource, GraphRenderer, NetworkTables, PlotRequest, Renderer};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NODES_JSON: &str = r#"{
    "_Value_": [1, 2, 3, 4, 5],
    "_AllXCoord_": [0.0, 1.0, 2.0, 3.0, 9.0],
    "_AllYCoord_": [0.0, 2.0, 1.0, 3.0, 9.0],
    "_HypGrp_": [0, 2, 1, 0.05, 1],
    "_Community_": [3, 1, 3, 2, 2]
}"#;

const EDGES_CSV: &str = "_Source_,_Target_,_SCommunity_,_TCommunity_
1,2,3,1
2,3,1,3
3,1,3,3
4,1,2,3
";

fn write_tables(dir: &Path) {
    fs::write(dir.join("nodes.json"), NODES_JSON).unwrap();
    fs::write(dir.join("edges.csv"), EDGES_CSV).unwrap();
}

fn colored() -> PlotRequest {
    PlotRequest {
        color_attr: Some("_Community_".to_string()),
        ..PlotRequest::default()
    }
}

#[test]
fn test_render_from_files() {
    let tmp = TempDir::new().unwrap();
    write_tables(tmp.path());
    let source = FileTableSource::new(tmp.path());

    let plot = GraphRenderer::new()
        .prepare(&source, &NetworkTables::default(), &colored())
        .unwrap();

    let ids: Vec<&str> = plot.nodes.iter().map(|n| n.id.0.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);
    assert_eq!(plot.unconnected, 1);
    assert_eq!(plot.communities.values(), &[1.0, 2.0, 3.0]);
    assert_eq!(plot.legend.len(), 3);

    let node4 = plot.node(&NodeId::from("4")).unwrap();
    assert!((node4.size - 50.0).abs() < 1e-9);

    let svg = SvgRenderer::default().render(&plot);
    assert_eq!(svg.matches("<circle").count(), 4);
    assert_eq!(svg.matches("class=\"legend-swatch\"").count(), 3);
    assert!(svg.contains("Hartford drug user social network"));
}

#[test]
fn test_community_filter_from_files() {
    let tmp = TempDir::new().unwrap();
    write_tables(tmp.path());
    let source = FileTableSource::new(tmp.path());
    let request = PlotRequest {
        filter_community: Some(3),
        ..colored()
    };

    let plot = GraphRenderer::new()
        .prepare(&source, &NetworkTables::default(), &request)
        .unwrap();

    assert_eq!(plot.edges.len(), 1);
    assert_eq!(plot.nodes.len(), 2);
    // Only community 3 was fetched, so the legend has a single entry
    assert_eq!(plot.legend.len(), 1);
    assert_eq!(plot.legend[0].label, "Community  3");
}

#[test]
fn test_render_to_writes_svg() {
    let tmp = TempDir::new().unwrap();
    write_tables(tmp.path());
    let source = FileTableSource::new(tmp.path());
    let renderer = SvgRenderer::default();

    let svg = GraphRenderer::new()
        .render_to(&source, &NetworkTables::default(), &PlotRequest::default(), &renderer)
        .unwrap();

    let path = tmp.path().join(format!("network.{}", renderer.extension()));
    fs::write(&path, &svg).unwrap();
    assert!(path.exists());
    assert!(!svg.contains("class=\"legend\""));
}

#[test]
fn test_missing_table() {
    let tmp = TempDir::new().unwrap();
    let source = FileTableSource::new(tmp.path());
    let err = GraphRenderer::new()
        .prepare(&source, &NetworkTables::default(), &PlotRequest::default())
        .unwrap_err();
    assert!(matches!(err, Error::TableNotFound { .. }));
}

#[test]
fn test_missing_color_column() {
    let tmp = TempDir::new().unwrap();
    write_tables(tmp.path());
    let source = FileTableSource::new(tmp.path());
    let request = PlotRequest {
        color_attr: Some("_Nope_".to_string()),
        ..PlotRequest::default()
    };
    let err = GraphRenderer::new()
        .prepare(&source, &NetworkTables::default(), &request)
        .unwrap_err();
    assert!(matches!(err, Error::MissingColumn { column, .. } if column == "_Nope_"));
}

#[test]
fn test_empty_edge_table_renders_empty_figure() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("nodes.json"), NODES_JSON).unwrap();
    fs::write(
        tmp.path().join("edges.csv"),
        "_Source_,_Target_,_SCommunity_,_TCommunity_\n",
    )
    .unwrap();
    let source = FileTableSource::new(tmp.path());

    let plot = GraphRenderer::new()
        .prepare(&source, &NetworkTables::default(), &PlotRequest::default())
        .unwrap();
    assert!(plot.nodes.is_empty());
    assert_eq!(plot.unconnected, 5);

    let svg = SvgRenderer::default().render(&plot);
    assert_eq!(svg.matches("<circle").count(), 0);
}

#[test]
fn test_plot_data_round_trips_through_json() {
    let tmp = TempDir::new().unwrap();
    write_tables(tmp.path());
    let source = FileTableSource::new(tmp.path());

    let plot = GraphRenderer::new()
        .prepare(&source, &NetworkTables::default(), &colored())
        .unwrap();
    let json = serde_json::to_string(&plot).unwrap();
    assert!(json.contains("\"legend\""));
    let back: netplot::NetworkPlot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.nodes.len(), plot.nodes.len());
}

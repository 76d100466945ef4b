//! Netplot CLI - render social network figures from node and edge tables.

use anyhow::Result;
use clap::Parser;
use netplot::config::NetplotConfig;
use netplot::network::{CommunitySet, NetworkTables, COMMUNITY_COLUMN};
use netplot::plot::GraphRenderer;
use netplot::render::{plot_data_path, Renderer};
use netplot::table::{FileTableSource, TableSource};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "netplot")]
#[command(about = "Render community-colored social network graphs")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "netplot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Render the network as an SVG figure
    Render {
        /// Node table name
        #[arg(long)]
        nodes: Option<String>,

        /// Edge table name
        #[arg(long)]
        edges: Option<String>,

        /// Only draw this community (negative draws everything)
        #[arg(short, long, allow_negative_numbers = true)]
        community: Option<i64>,

        /// Figure side length in inches
        #[arg(long)]
        size: Option<f64>,

        /// Node column driving marker size
        #[arg(long)]
        size_attr: Option<String>,

        /// Node column driving marker color and the legend
        #[arg(long)]
        color_attr: Option<String>,

        /// Scale factor applied to the size attribute
        #[arg(long)]
        size_multiplier: Option<f64>,

        /// Figure title
        #[arg(long)]
        title: Option<String>,

        /// Row cap for each table fetch
        #[arg(long)]
        limit: Option<usize>,

        /// Directory holding the tables
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save the prepared plot data as JSON
        #[arg(long)]
        save_data: bool,
    },

    /// List the communities present in the node table
    Communities {
        /// Node table name
        #[arg(long)]
        nodes: Option<String>,

        /// Node column holding the community value
        #[arg(long)]
        color_attr: Option<String>,

        /// Only count nodes of this community
        #[arg(short, long, allow_negative_numbers = true)]
        community: Option<i64>,

        /// Directory holding the tables
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("netplot=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = NetplotConfig::load(Path::new(&cli.config))?;

    match cli.command {
        Commands::Render {
            nodes,
            edges,
            community,
            size,
            size_attr,
            color_attr,
            size_multiplier,
            title,
            limit,
            data_dir,
            output,
            save_data,
        } => {
            let mut request = config.plot_request()?;
            request.filter_community = community;
            if let Some(size) = size {
                request.size = size;
            }
            if let Some(attr) = size_attr {
                request.size_attr = attr;
            }
            if let Some(attr) = color_attr {
                request.color_attr = Some(attr);
            }
            if let Some(multiplier) = size_multiplier {
                request.size_multiplier = multiplier;
            }
            if let Some(title) = title {
                request.title = title;
            }
            if let Some(limit) = limit {
                request.limit = limit;
            }

            let tables = NetworkTables::new(
                nodes.unwrap_or_else(|| config.source.nodes_table.clone()),
                edges.unwrap_or_else(|| config.source.edges_table.clone()),
            );
            let source = FileTableSource::new(
                data_dir.unwrap_or_else(|| PathBuf::from(&config.source.directory)),
            );
            let renderer = config.svg_renderer();
            let save_data = save_data || config.output.save_data;

            println!(
                "Rendering {} / {} from {} as {}...",
                tables.nodes,
                tables.edges,
                source.dir().display(),
                renderer.name()
            );

            let plot = GraphRenderer::new().prepare(&source, &tables, &request)?;
            println!(
                "  {} nodes, {} edges, {} communities",
                plot.nodes.len(),
                plot.edges.len(),
                plot.communities.len()
            );
            if plot.unconnected > 0 {
                println!("  {} nodes without edges not drawn", plot.unconnected);
            }

            let result = renderer.render(&plot);

            let output_path = match output {
                Some(path) => path,
                None => {
                    let output_dir = PathBuf::from(&config.output.directory);
                    let name = match request.community() {
                        Some(c) => format!("network_community_{}", c),
                        None => "network".to_string(),
                    };
                    output_dir.join(format!("{}.{}", name, renderer.extension()))
                }
            };

            if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_path, &result)?;
            println!("Saved to {}", output_path.display());

            if save_data {
                let data_path = plot_data_path(&output_path);
                let data_json = serde_json::to_string_pretty(&plot)?;
                fs::write(&data_path, data_json)?;
                println!("Saved plot data to {}", data_path.display());
            }
        }

        Commands::Communities {
            nodes,
            color_attr,
            community,
            data_dir,
        } => {
            let tables = NetworkTables::new(
                nodes.unwrap_or_else(|| config.source.nodes_table.clone()),
                config.source.edges_table.clone(),
            );
            let source = FileTableSource::new(
                data_dir.unwrap_or_else(|| PathBuf::from(&config.source.directory)),
            );
            let column = color_attr
                .or_else(|| Some(config.render.color_attr.clone()).filter(|c| !c.is_empty()))
                .unwrap_or_else(|| COMMUNITY_COLUMN.to_string());

            let fetched = source.fetch(
                &tables.node_spec(community.filter(|c| *c >= 0)),
                config.source.limit,
            )?;
            let values = fetched.table.numbers(&column)?;
            let set = CommunitySet::from_values(values.iter().copied());

            println!(
                "{} communities in '{}' ({} nodes):",
                set.len(),
                column,
                fetched.table.len()
            );
            for value in set.values() {
                let count = values.iter().filter(|v| *v == value).count();
                println!("  {:>6}  {} nodes", value, count);
            }
        }
    }

    Ok(())
}

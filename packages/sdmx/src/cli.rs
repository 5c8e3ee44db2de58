//! Command-line interface for the SDMX client.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::client::SdmxClient;
use crate::config::{
    ClientConfig, DataQuery, DEFAULT_AGENCY_ID, DEFAULT_BASE_URL, HTTP_TIMEOUT_SECS,
};
use crate::error::Result;
use crate::model::{TimeSeries, TimeSeriesMap};

/// SDMX REST client - Fetch code lists, dataflows and time series from SDMX-ML web services.
#[derive(Parser)]
#[command(name = "sdmx-rest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the SDMX service
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maintenance agency used in agency-scoped queries
    #[arg(long, global = true, default_value = DEFAULT_AGENCY_ID)]
    pub agency: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = HTTP_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Write YAML to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// List dataflows, optionally a single one by ID.
    Dataflows {
        /// Dataflow ID (e.g., EXR)
        id: Option<String>,
    },

    /// List organisation schemes and their agencies.
    OrganisationSchemes,

    /// List concepts, optionally restricted to a dataflow.
    Concepts {
        /// Dataflow ID
        flow: Option<String>,
    },

    /// List the code lists of a dataflow.
    CodeLists {
        /// Dataflow ID
        flow: String,
    },

    /// List key families (data structure definitions).
    KeyFamilies {
        /// Dataflow or key family ID
        flow: Option<String>,
    },

    /// List category schemes and the dataflows filed under them.
    CategorySchemes {
        /// Category scheme ID
        flow: Option<String>,
    },

    /// Fetch time series of a dataflow.
    Data {
        /// Dataflow ID
        flow: String,

        /// Frequency code (A, Q or M)
        #[arg(long)]
        freq: Option<String>,

        /// Series key value (e.g., USD)
        #[arg(long)]
        key: Option<String>,

        /// First period (e.g., 2019-01)
        #[arg(long)]
        start: Option<String>,

        /// Last period (e.g., 2019-12)
        #[arg(long)]
        end: Option<String>,
    },

    /// List the schemas imported by the service description.
    Services,
}

impl Commands {
    fn describe(&self) -> String {
        match self {
            Commands::Dataflows { id: Some(id) } => format!("dataflow {id}"),
            Commands::Dataflows { id: None } => "dataflows".to_string(),
            Commands::OrganisationSchemes => "organisation schemes".to_string(),
            Commands::Concepts { .. } => "concepts".to_string(),
            Commands::CodeLists { flow } => format!("code lists of {flow}"),
            Commands::KeyFamilies { .. } => "key families".to_string(),
            Commands::CategorySchemes { .. } => "category schemes".to_string(),
            Commands::Data { flow, .. } => format!("data of {flow}"),
            Commands::Services => "service description".to_string(),
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    execute(Cli::parse())
}

/// Execute a parsed command line.
pub fn execute(cli: Cli) -> Result<()> {
    // Validate inputs before making HTTP requests
    let config = ClientConfig::new(&cli.base_url, &cli.agency)?
        .with_timeout(Duration::from_secs(cli.timeout));
    let client = SdmxClient::new(config)?;

    eprintln!(
        "{} {} from {}",
        style("Fetching").bold(),
        style(cli.command.describe()).cyan(),
        style(&cli.base_url).green()
    );

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Downloading and extracting...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let rendered = fetch_yaml(&client, cli.command);
    pb.finish_and_clear();

    write_output(&rendered?, cli.output.as_deref())
}

/// Fetch the resource a command names and render its mapping as YAML.
fn fetch_yaml(client: &SdmxClient, command: Commands) -> Result<String> {
    match command {
        Commands::Dataflows { id } => to_yaml(client.dataflow(id.as_deref())?.extract()?),
        Commands::OrganisationSchemes => to_yaml(client.organisation_scheme()?.extract()?),
        Commands::Concepts { flow } => to_yaml(client.concept(flow.as_deref())?.extract()?),
        Commands::CodeLists { flow } => to_yaml(client.code_list(&flow)?.extract()?),
        Commands::KeyFamilies { flow } => to_yaml(client.key_family(flow.as_deref())?.extract()?),
        Commands::CategorySchemes { flow } => {
            to_yaml(client.category_scheme(flow.as_deref())?.extract()?)
        }
        Commands::Data {
            flow,
            freq,
            key,
            start,
            end,
        } => {
            let query = DataQuery {
                flow_ref: flow,
                freq,
                key,
                start_period: start,
                end_period: end,
            };
            let extractor = client.data_extraction(&query)?;
            to_yaml(&series_by_key(extractor.extract()?))
        }
        Commands::Services => to_yaml(client.service_description()?.extract()?),
    }
}

/// Group series by their key.
///
/// Surrogate IDs differ per run, so output is keyed by dimension values. A
/// dataset may repeat a key (in different groups), hence a list per key.
fn series_by_key(series: &TimeSeriesMap) -> BTreeMap<String, Vec<&TimeSeries>> {
    let mut by_key: BTreeMap<String, Vec<&TimeSeries>> = BTreeMap::new();
    for ts in series.values() {
        by_key
            .entry(ts.dimensions.to_key_string())
            .or_default()
            .push(ts);
    }
    by_key
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_yaml_ng::to_string(value)?)
}

fn write_output(yaml: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, yaml)?;
            eprintln!(
                "{} {}",
                style("Saved to:").green().bold(),
                path.display()
            );
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

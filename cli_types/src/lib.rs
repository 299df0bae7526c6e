use anyhow::{anyhow, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum GraphKind {
    /// Measured values as reported
    #[value(name = "raw")]
    Raw,
    /// Percent change relative to the first point of the series
    #[value(name = "percentfromfirst")]
    PercentFromFirst,
    /// Percent change relative to the previous point of the series
    #[value(name = "percentrelative")]
    PercentRelative,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Info,
    Dashboard,
    Status,
    Bootstrap,
    Graphs,
    Compare,
    #[value(name = "self-profile")]
    SelfProfile,
}

#[derive(Parser)]
#[command(version, name = "perf-graphs")]
pub struct Cli {
    /// Increase verbosity level (can be specified multiple times.) The first level sets level
    /// "info", second sets level "debug", and third sets level "trace" for the logger.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Create a versionless command for manpage generation
    pub fn command_without_version() -> clap::Command {
        let mut cmd = Self::command();
        cmd = cmd.version(None::<&str>);
        cmd
    }
}

/// Range, statistic and normalization of a graph request. The server applies these.
#[derive(Args, Clone, Debug, Default)]
pub struct CliRequest {
    /// Start of the commit range (commit sha or YYYY-MM-DD date). Unbounded if omitted.
    #[arg(long)]
    pub start: Option<String>,

    /// End of the commit range (commit sha or YYYY-MM-DD date). Unbounded if omitted.
    #[arg(long)]
    pub end: Option<String>,

    /// Statistic to graph, e.g. "instructions:u". Falls back to the configured default.
    #[arg(long, value_parser=parse_spaceless_string)]
    pub stat: Option<String>,

    /// Normalization the server applies before returning the series
    #[arg(short, long, value_enum)]
    pub kind: Option<GraphKind>,
}

/// Series name filters, wildcards when omitted.
#[derive(Args, Clone, Debug, Default)]
pub struct CliSeriesFilter {
    /// Only select this benchmark
    #[arg(short, long, value_parser=parse_spaceless_string)]
    pub benchmark: Option<String>,

    /// Only select this profile (e.g. check, debug, opt)
    #[arg(short, long, value_parser=parse_spaceless_string)]
    pub profile: Option<String>,

    /// Only select this scenario (e.g. full, incr-full)
    #[arg(short, long, value_parser=parse_spaceless_string)]
    pub scenario: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the endpoint URLs of the performance site
    Urls {
        /// Origin of the site, e.g. "https://perf.example.org". Falls back to the configured origin.
        #[arg(long)]
        origin: Option<String>,

        /// Print only this endpoint
        #[arg(short, long, value_enum)]
        endpoint: Option<Endpoint>,
    },

    /// Print the graph data URL for the given query
    RequestUrl {
        /// Origin of the site. Falls back to the configured origin.
        #[arg(long)]
        origin: Option<String>,

        #[command(flatten)]
        request: CliRequest,

        #[command(flatten)]
        series: CliSeriesFilter,
    },

    /// Check a saved graph payload for consistency.
    ///
    /// Interpolated indices outside of their series are always an error.
    /// With `--strict`, every series must also hold exactly one point per commit.
    Validate {
        /// JSON payload, or "-" for stdin
        input: PathBuf,

        /// Also require every series to align with the commit list
        #[arg(long)]
        strict: bool,
    },

    /// Narrow a saved graph payload down to the selected series
    Select {
        /// JSON payload, or "-" for stdin
        input: PathBuf,

        /// JSON output file, or "-" for stdout
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        series: CliSeriesFilter,
    },

    /// Print statistics for every selected series
    Summary {
        /// JSON payload, or "-" for stdin
        input: PathBuf,

        /// Regular expressions on benchmark names, select benchmarks matching any of them
        #[arg(short, long)]
        filter: Vec<String>,

        #[command(flatten)]
        series: CliSeriesFilter,
    },

    /// Create an HTML or CSV report from a saved graph payload
    Report {
        /// JSON payload, or "-" for stdin
        input: PathBuf,

        /// Output file, format is inferred from the extension (html or csv). "-" writes CSV to stdout.
        #[arg(short, long, default_value = "output.html")]
        output: PathBuf,

        /// Regular expressions on benchmark names, select benchmarks matching any of them
        #[arg(short, long)]
        filter: Vec<String>,

        /// Title of the HTML report
        #[arg(long)]
        title: Option<String>,

        /// HTML template with placeholders such as {{PLOTLY_BODY}}
        #[arg(long)]
        template: Option<PathBuf>,

        /// CSS file to embed in the HTML report
        #[arg(long)]
        custom_css: Option<PathBuf>,

        /// Statistic the payload was requested for, shown as the y axis label.
        /// Falls back to the configured default.
        #[arg(long, value_parser=parse_spaceless_string)]
        stat: Option<String>,

        #[command(flatten)]
        series: CliSeriesFilter,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where it was read from
    Show {},

    /// Store the site origin in the local configuration file
    SetOrigin {
        /// Origin of the site, e.g. "https://perf.example.org"
        origin: String,
    },
}

fn parse_spaceless_string(s: &str) -> Result<String> {
    if s.split_whitespace().count() > 1 {
        Err(anyhow!("invalid string/key/value: found space in '{}'", s))
    } else {
        Ok(String::from(s))
    }
}

//! Endpoint table of the performance site.
//!
//! Every endpoint lives below `<origin>/perf`. URLs are built by plain string
//! concatenation so the origin is used exactly as given.

use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::api::GraphsSelector;
use crate::query;

pub const PERF_PREFIX: &str = "/perf";

pub const INFO_URL: &str = "/perf/info";
pub const DASHBOARD_DATA_URL: &str = "/perf/dashboard";
pub const STATUS_DATA_URL: &str = "/perf/status_page";
pub const BOOTSTRAP_DATA_URL: &str = "/perf/bootstrap";
pub const GRAPH_DATA_URL: &str = "/perf/graphs";
pub const COMPARE_DATA_URL: &str = "/perf/get";
pub const SELF_PROFILE_DATA_URL: &str = "/perf/self-profile";

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URL '{0}' cannot carry a query string")]
    NotABase(String),

    #[error("unknown endpoint '{0}'")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Info,
    Dashboard,
    Status,
    Bootstrap,
    Graphs,
    Compare,
    SelfProfile,
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::Info,
        Endpoint::Dashboard,
        Endpoint::Status,
        Endpoint::Bootstrap,
        Endpoint::Graphs,
        Endpoint::Compare,
        Endpoint::SelfProfile,
    ];

    /// Path below the origin, including the `/perf` prefix.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Info => INFO_URL,
            Endpoint::Dashboard => DASHBOARD_DATA_URL,
            Endpoint::Status => STATUS_DATA_URL,
            Endpoint::Bootstrap => BOOTSTRAP_DATA_URL,
            Endpoint::Graphs => GRAPH_DATA_URL,
            Endpoint::Compare => COMPARE_DATA_URL,
            Endpoint::SelfProfile => SELF_PROFILE_DATA_URL,
        }
    }

    /// Path below the `/perf` prefix.
    pub fn suffix(self) -> &'static str {
        &self.path()[PERF_PREFIX.len()..]
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Info => "info",
            Endpoint::Dashboard => "dashboard",
            Endpoint::Status => "status",
            Endpoint::Bootstrap => "bootstrap",
            Endpoint::Graphs => "graphs",
            Endpoint::Compare => "compare",
            Endpoint::SelfProfile => "self-profile",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| EndpointError::Unknown(s.to_string()))
    }
}

impl From<perf_graphs_cli_types::Endpoint> for Endpoint {
    fn from(endpoint: perf_graphs_cli_types::Endpoint) -> Self {
        use perf_graphs_cli_types::Endpoint as Cli;
        match endpoint {
            Cli::Info => Endpoint::Info,
            Cli::Dashboard => Endpoint::Dashboard,
            Cli::Status => Endpoint::Status,
            Cli::Bootstrap => Endpoint::Bootstrap,
            Cli::Graphs => Endpoint::Graphs,
            Cli::Compare => Endpoint::Compare,
            Cli::SelfProfile => Endpoint::SelfProfile,
        }
    }
}

/// Endpoint URLs of one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    origin: String,
}

impl Endpoints {
    pub fn new(origin: impl Into<String>) -> Self {
        Endpoints {
            origin: origin.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.origin, endpoint.path())
    }

    pub fn info_url(&self) -> String {
        self.url(Endpoint::Info)
    }

    pub fn dashboard_data_url(&self) -> String {
        self.url(Endpoint::Dashboard)
    }

    pub fn status_data_url(&self) -> String {
        self.url(Endpoint::Status)
    }

    pub fn bootstrap_data_url(&self) -> String {
        self.url(Endpoint::Bootstrap)
    }

    pub fn graph_data_url(&self) -> String {
        self.url(Endpoint::Graphs)
    }

    pub fn compare_data_url(&self) -> String {
        self.url(Endpoint::Compare)
    }

    pub fn self_profile_data_url(&self) -> String {
        self.url(Endpoint::SelfProfile)
    }

    pub fn all(&self) -> impl Iterator<Item = (Endpoint, String)> + '_ {
        Endpoint::ALL.into_iter().map(|e| (e, self.url(e)))
    }

    /// URL of a graph request for `selector`.
    ///
    /// Unlike the plain URL accessors this needs the origin to form an absolute URL.
    pub fn graph_request_url(&self, selector: &GraphsSelector) -> Result<Url, EndpointError> {
        let raw = self.graph_data_url();
        let mut url = Url::parse(&raw).map_err(|source| EndpointError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(EndpointError::NotABase(raw));
        }
        url.query_pairs_mut()
            .extend_pairs(query::to_query_pairs(selector));
        Ok(url)
    }
}

//! Wire types of the graph endpoint.
//!
//! A [`GraphsSelector`] is sent as the query of a request to
//! [`GRAPH_DATA_URL`](crate::endpoints::GRAPH_DATA_URL) and the server answers
//! with a [`GraphData`] document. Both are plain data: they are created from
//! user input or by deserializing a response and are read-only afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum GraphDataError {
    #[error("interpolated index {index} out of range for {len} points")]
    InterpolatedIndexOutOfRange { index: usize, len: usize },

    #[error("series {series} has {points} points but there are {commits} commits")]
    Misaligned {
        series: String,
        points: usize,
        commits: usize,
    },

    #[error("invalid graph data: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("unknown graph kind '{0}', expected one of raw, percentfromfirst, percentrelative")]
pub struct UnknownGraphKind(String);

/// Normalization the server applies to a series before returning it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    #[default]
    Raw,
    PercentFromFirst,
    PercentRelative,
}

impl GraphKind {
    pub const ALL: [GraphKind; 3] = [
        GraphKind::Raw,
        GraphKind::PercentFromFirst,
        GraphKind::PercentRelative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GraphKind::Raw => "raw",
            GraphKind::PercentFromFirst => "percentfromfirst",
            GraphKind::PercentRelative => "percentrelative",
        }
    }
}

impl Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphKind {
    type Err = UnknownGraphKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownGraphKind(s.to_string()))
    }
}

impl From<perf_graphs_cli_types::GraphKind> for GraphKind {
    fn from(kind: perf_graphs_cli_types::GraphKind) -> Self {
        match kind {
            perf_graphs_cli_types::GraphKind::Raw => GraphKind::Raw,
            perf_graphs_cli_types::GraphKind::PercentFromFirst => GraphKind::PercentFromFirst,
            perf_graphs_cli_types::GraphKind::PercentRelative => GraphKind::PercentRelative,
        }
    }
}

/// One end of the commit range of a query.
///
/// On the wire this is an opaque string. The empty string leaves the range
/// open, a `YYYY-MM-DD` date selects by commit date and anything else is taken
/// as a commit identifier. The string is written back exactly as it was read.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Bound {
    #[default]
    None,
    Date(NaiveDate),
    Commit(String),
}

impl Bound {
    pub fn is_none(&self) -> bool {
        matches!(self, Bound::None)
    }
}

impl From<String> for Bound {
    fn from(s: String) -> Self {
        if s.is_empty() {
            return Bound::None;
        }
        match NaiveDate::parse_from_str(&s, DATE_FORMAT) {
            // Only canonical dates, "2022-1-5" stays an identifier so it round-trips verbatim
            Ok(date) if date.format(DATE_FORMAT).to_string() == s => Bound::Date(date),
            _ => Bound::Commit(s),
        }
    }
}

impl From<&str> for Bound {
    fn from(s: &str) -> Self {
        Bound::from(s.to_string())
    }
}

impl From<Bound> for String {
    fn from(bound: Bound) -> Self {
        bound.to_string()
    }
}

impl FromStr for Bound {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Bound::from(s))
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::None => Ok(()),
            Bound::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Bound::Commit(id) => f.write_str(id),
        }
    }
}

/// Query of the graph endpoint.
///
/// `benchmark`, `scenario` and `profile` are wildcards when `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphsSelector {
    #[serde(default)]
    pub start: Bound,
    #[serde(default)]
    pub end: Bound,
    #[serde(default)]
    pub kind: GraphKind,
    pub stat: String,
    #[serde(default, deserialize_with = "deserialize_name_filter")]
    pub benchmark: Option<String>,
    #[serde(default, deserialize_with = "deserialize_name_filter")]
    pub scenario: Option<String>,
    #[serde(default, deserialize_with = "deserialize_name_filter")]
    pub profile: Option<String>,
}

/// An empty name filter is a wildcard, same as an absent one.
pub(crate) fn name_filter(name: impl Into<String>) -> Option<String> {
    Some(name.into()).filter(|name| !name.is_empty())
}

fn deserialize_name_filter<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(name_filter))
}

impl Default for GraphsSelector {
    /// The landing page query: every series of the default statistic over the full range.
    fn default() -> Self {
        GraphsSelector::new(defaults::DEFAULT_STAT)
    }
}

impl GraphsSelector {
    pub fn new(stat: impl Into<String>) -> Self {
        GraphsSelector {
            start: Bound::None,
            end: Bound::None,
            kind: GraphKind::Raw,
            stat: stat.into(),
            benchmark: None,
            scenario: None,
            profile: None,
        }
    }

    #[must_use]
    pub fn with_range(mut self, start: impl Into<Bound>, end: impl Into<Bound>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: GraphKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = name_filter(benchmark);
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = name_filter(profile);
        self
    }

    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = name_filter(scenario);
        self
    }

    /// Whether this is the landing page query the server answers from its precomputed response.
    pub fn is_default(&self) -> bool {
        *self == GraphsSelector::default()
    }
}

/// Wire form of a [`Series`] before its indices have been checked.
#[derive(Deserialize)]
struct RawSeries {
    points: Vec<f64>,
    #[serde(default, alias = "is_interpolated")]
    interpolated_indices: BTreeSet<usize>,
}

impl TryFrom<RawSeries> for Series {
    type Error = GraphDataError;

    fn try_from(raw: RawSeries) -> Result<Self, Self::Error> {
        Series::new(raw.points, raw.interpolated_indices)
    }
}

/// Measurements of one benchmark, profile and scenario across a commit range.
///
/// Points whose index is in `interpolated_indices` were filled in by the
/// server rather than measured. Every such index points into `points`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct Series {
    points: Vec<f64>,
    interpolated_indices: BTreeSet<usize>,
}

impl Series {
    pub fn new(
        points: Vec<f64>,
        interpolated_indices: impl IntoIterator<Item = usize>,
    ) -> Result<Self, GraphDataError> {
        let interpolated_indices: BTreeSet<usize> = interpolated_indices.into_iter().collect();
        if let Some(&index) = interpolated_indices.range(points.len()..).next() {
            return Err(GraphDataError::InterpolatedIndexOutOfRange {
                index,
                len: points.len(),
            });
        }
        Ok(Series {
            points,
            interpolated_indices,
        })
    }

    /// A series in which every point was measured.
    pub fn measured_only(points: Vec<f64>) -> Self {
        Series {
            points,
            interpolated_indices: BTreeSet::new(),
        }
    }

    pub fn push(&mut self, value: f64, interpolated: bool) {
        if interpolated {
            self.interpolated_indices.insert(self.points.len());
        }
        self.points.push(value);
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn interpolated_indices(&self) -> &BTreeSet<usize> {
        &self.interpolated_indices
    }

    pub fn is_interpolated(&self, index: usize) -> bool {
        self.interpolated_indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(index, value, interpolated)` for every point.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64, bool)> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(|(i, &v)| (i, v, self.is_interpolated(i)))
    }

    /// `(index, value)` of the points that were actually measured.
    pub fn measured(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.iter()
            .filter(|(_, _, interpolated)| !interpolated)
            .map(|(i, v, _)| (i, v))
    }
}

/// A commit on the x axis of a graph: its date as seconds since the epoch and its sha.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitRef(pub i64, pub String);

impl CommitRef {
    pub fn new(timestamp: i64, sha: impl Into<String>) -> Self {
        CommitRef(timestamp, sha.into())
    }

    pub fn timestamp(&self) -> i64 {
        self.0
    }

    pub fn sha(&self) -> &str {
        &self.1
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    /// Leading characters of the sha, used as axis labels.
    pub fn short_sha(&self, len: usize) -> &str {
        match self.1.char_indices().nth(len) {
            Some((end, _)) => &self.1[..end],
            None => &self.1,
        }
    }
}

pub type ScenarioSeries = BTreeMap<String, Series>;
pub type ProfileSeries = BTreeMap<String, ScenarioSeries>;

/// Coordinates of one series inside [`GraphData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey<'a> {
    pub benchmark: &'a str,
    pub profile: &'a str,
    pub scenario: &'a str,
}

impl Display for SeriesKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.benchmark, self.profile, self.scenario)
    }
}

/// A series whose point count differs from the number of commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Misalignment {
    pub series: String,
    pub points: usize,
    pub commits: usize,
}

impl From<Misalignment> for GraphDataError {
    fn from(m: Misalignment) -> Self {
        GraphDataError::Misaligned {
            series: m.series,
            points: m.points,
            commits: m.commits,
        }
    }
}

/// Response of the graph endpoint.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub commits: Vec<CommitRef>,
    /// benchmark -> profile -> scenario -> series
    pub benchmarks: BTreeMap<String, ProfileSeries>,
}

impl GraphData {
    pub fn new(commits: Vec<CommitRef>) -> Self {
        GraphData {
            commits,
            benchmarks: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, GraphDataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, GraphDataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, GraphDataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Insert a series, returning the one it replaces.
    pub fn insert(
        &mut self,
        benchmark: impl Into<String>,
        profile: impl Into<String>,
        scenario: impl Into<String>,
        series: Series,
    ) -> Option<Series> {
        self.benchmarks
            .entry(benchmark.into())
            .or_default()
            .entry(profile.into())
            .or_default()
            .insert(scenario.into(), series)
    }

    pub fn series(&self, benchmark: &str, profile: &str, scenario: &str) -> Option<&Series> {
        self.benchmarks
            .get(benchmark)?
            .get(profile)?
            .get(scenario)
    }

    /// All series in benchmark, profile, scenario order.
    pub fn iter_series(&self) -> impl Iterator<Item = (SeriesKey<'_>, &Series)> {
        self.benchmarks.iter().flat_map(|(benchmark, profiles)| {
            profiles.iter().flat_map(move |(profile, scenarios)| {
                scenarios.iter().map(move |(scenario, series)| {
                    (
                        SeriesKey {
                            benchmark,
                            profile,
                            scenario,
                        },
                        series,
                    )
                })
            })
        })
    }

    pub fn series_count(&self) -> usize {
        self.iter_series().count()
    }

    pub fn is_empty(&self) -> bool {
        self.series_count() == 0
    }

    /// Series that do not hold exactly one point per commit.
    pub fn misaligned_series(&self) -> Vec<Misalignment> {
        let commits = self.commits.len();
        self.iter_series()
            .filter(|(_, series)| series.len() != commits)
            .map(|(key, series)| Misalignment {
                series: key.to_string(),
                points: series.len(),
                commits,
            })
            .collect()
    }

    /// Fails on the first series that does not line up with the commit list.
    pub fn validate_alignment(&self) -> Result<(), GraphDataError> {
        match self.misaligned_series().into_iter().next() {
            Some(m) => Err(m.into()),
            None => Ok(()),
        }
    }
}

//! URL query encoding of a [`GraphsSelector`].

use log::debug;
use thiserror::Error;
use url::form_urlencoded;

use crate::api::{name_filter, Bound, GraphKind, GraphsSelector, UnknownGraphKind};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query has no 'stat' parameter")]
    MissingStat,

    #[error(transparent)]
    InvalidKind(#[from] UnknownGraphKind),
}

/// Query parameters in the order the dashboard sends them.
///
/// Range, kind and stat are always present. The name filters only appear when set.
pub fn to_query_pairs(selector: &GraphsSelector) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("start", selector.start.to_string()),
        ("end", selector.end.to_string()),
        ("kind", selector.kind.to_string()),
        ("stat", selector.stat.clone()),
    ];
    let filters = [
        ("benchmark", &selector.benchmark),
        ("scenario", &selector.scenario),
        ("profile", &selector.profile),
    ];
    for (key, value) in filters {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            pairs.push((key, value.to_string()));
        }
    }
    pairs
}

pub fn to_query_string(selector: &GraphsSelector) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(to_query_pairs(selector))
        .finish()
}

/// Parse a selector from a query string, with or without the leading `?`.
///
/// A missing kind means raw and missing bounds leave the range open. Empty
/// name filters are wildcards. When a key repeats, the last value wins.
pub fn from_query_string(query: &str) -> Result<GraphsSelector, QueryError> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut stat = None;
    let mut selector = GraphsSelector::new(String::new());

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "start" => selector.start = Bound::from(value.into_owned()),
            "end" => selector.end = Bound::from(value.into_owned()),
            "kind" => selector.kind = value.parse::<GraphKind>()?,
            "stat" => stat = Some(value.into_owned()),
            "benchmark" => selector.benchmark = name_filter(value),
            "scenario" => selector.scenario = name_filter(value),
            "profile" => selector.profile = name_filter(value),
            other => debug!("Ignoring unknown query parameter '{other}'"),
        }
    }

    selector.stat = stat.filter(|s| !s.is_empty()).ok_or(QueryError::MissingStat)?;
    Ok(selector)
}

use perf_graphs::query::{from_query_string, to_query_string};
use perf_graphs::{Endpoint, Endpoints, GraphData, GraphKind, GraphsSelector, Series};

/// Shaped like a response of the graph endpoint, including the older field name
/// for interpolated points and a summary pseudo-benchmark.
const SERVER_RESPONSE: &str = r#"{
  "commits": [
    [1672531200, "1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d"],
    [1672617600, "2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e"],
    [1672704000, "3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f"],
    [1672790400, "4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e2f3a"]
  ],
  "benchmarks": {
    "Summary": {
      "check": {
        "full": {"points": [1.0, 1.01, 0.99, 1.0], "is_interpolated": []}
      }
    },
    "cargo-0.60.0": {
      "debug": {
        "full": {"points": [12.5, 12.5, 12.75, 12.6], "is_interpolated": [1]},
        "incr-patched: println": {"points": [3.25, 3.5, 3.5, 3.5], "is_interpolated": [2, 3]}
      },
      "opt": {
        "incr-unchanged": {"points": [0.5, 0.5, 0.5, 0.5], "interpolated_indices": [0, 1, 2, 3]}
      }
    }
  }
}"#;

#[test]
fn server_response_roundtrips() {
    let data = GraphData::from_json(SERVER_RESPONSE).unwrap();
    assert_eq!(data.commits.len(), 4);
    assert_eq!(data.series_count(), 4);
    assert!(data.misaligned_series().is_empty());

    let encoded = data.to_json().unwrap();
    // Re-encoding uses the current field name only
    assert!(!encoded.contains("is_interpolated"));
    let decoded = GraphData::from_json(&encoded).unwrap();
    assert_eq!(decoded.commits, data.commits);
    assert_eq!(decoded.benchmarks, data.benchmarks);
}

#[test]
fn interpolated_indices_are_within_points() {
    let data = GraphData::from_json(SERVER_RESPONSE).unwrap();
    for (key, series) in data.iter_series() {
        assert!(
            series
                .interpolated_indices()
                .iter()
                .all(|&i| i < series.points().len()),
            "{key} has an interpolated index outside of its points"
        );
    }
    let series = data
        .series("cargo-0.60.0", "debug", "incr-patched: println")
        .unwrap();
    assert_eq!(series.measured().count(), 2);
}

#[test]
fn selecting_a_profile_keeps_the_commit_axis() {
    let data = GraphData::from_json(SERVER_RESPONSE).unwrap();
    let selected = data.select(&GraphsSelector::default().with_profile("debug"));
    assert_eq!(selected.commits, data.commits);
    assert_eq!(selected.series_count(), 2);
    assert!(selected.validate_alignment().is_ok());
}

#[test]
fn landing_page_request() {
    let endpoints = Endpoints::new("https://perf.example.org");
    let selector = GraphsSelector::default();
    assert!(selector.is_default());

    let url = endpoints.graph_request_url(&selector).unwrap();
    assert_eq!(
        url.as_str(),
        "https://perf.example.org/perf/graphs?start=&end=&kind=raw&stat=instructions%3Au"
    );
    assert_eq!(
        endpoints.url(Endpoint::Graphs),
        "https://perf.example.org/perf/graphs"
    );

    let query = url.query().unwrap();
    assert_eq!(from_query_string(query).unwrap(), selector);
}

#[test]
fn selector_query_roundtrip_for_every_kind() {
    for kind in GraphKind::ALL {
        let selector = GraphsSelector::new("task-clock")
            .with_range("2023-01-01", "2023-02-01")
            .with_kind(kind)
            .with_scenario("incr-patched: println");
        assert_eq!(from_query_string(&to_query_string(&selector)).unwrap(), selector);
    }
}

#[test]
fn built_series_serializes_its_interpolated_points() {
    let mut series = Series::default();
    for (value, interpolated) in [(1.0, false), (1.0, true), (1.0, true), (2.0, false)] {
        series.push(value, interpolated);
    }
    let json = serde_json::to_value(&series).unwrap();
    assert_eq!(json["interpolated_indices"], serde_json::json!([1, 2]));
    assert_eq!(json["points"], serde_json::json!([1.0, 1.0, 1.0, 2.0]));
}

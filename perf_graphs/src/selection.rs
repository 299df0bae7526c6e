use anyhow::{Context, Result};
use regex::Regex;

use crate::api::{GraphData, GraphsSelector};

fn matches_filter(filter: &Option<String>, name: &str) -> bool {
    filter
        .as_deref()
        .filter(|f| !f.is_empty())
        .map_or(true, |f| f == name)
}

impl GraphsSelector {
    /// Whether the series at these coordinates is selected. Unset filters match everything.
    pub fn matches(&self, benchmark: &str, profile: &str, scenario: &str) -> bool {
        matches_filter(&self.benchmark, benchmark)
            && matches_filter(&self.profile, profile)
            && matches_filter(&self.scenario, scenario)
    }
}

impl GraphData {
    /// Copy of this response holding only the series `selector` matches.
    ///
    /// The commit list is kept as is so the remaining series stay aligned with it.
    /// Only the name filters are applied, range, stat and kind were already
    /// resolved by the server that produced the response.
    pub fn select(&self, selector: &GraphsSelector) -> GraphData {
        self.retain_series(|benchmark, profile, scenario| {
            selector.matches(benchmark, profile, scenario)
        })
    }

    /// Copy of this response holding only benchmarks whose name matches any of `filters`.
    pub fn filter_benchmarks(&self, filters: &[Regex]) -> GraphData {
        self.retain_series(|benchmark, _, _| matches_any_filter(benchmark, filters))
    }

    fn retain_series<F>(&self, mut keep: F) -> GraphData
    where
        F: FnMut(&str, &str, &str) -> bool,
    {
        let mut selected = GraphData::new(self.commits.clone());
        for (key, series) in self.iter_series() {
            if keep(key.benchmark, key.profile, key.scenario) {
                selected.insert(key.benchmark, key.profile, key.scenario, series.clone());
            }
        }
        selected
    }
}

/// Compile filter patterns into regex objects
pub fn compile_filters(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("Invalid regex pattern: '{}'", pattern))
        })
        .collect()
}

/// Check if a benchmark name matches any of the compiled filters
/// Returns true if filters is empty (no filters = match all)
pub fn matches_any_filter(name: &str, filters: &[Regex]) -> bool {
    if filters.is_empty() {
        return true;
    }
    filters.iter().any(|re| re.is_match(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CommitRef, Series};

    fn sample() -> GraphData {
        let mut data = GraphData::new(vec![CommitRef::new(1, "a"), CommitRef::new(2, "b")]);
        for benchmark in ["syn", "regex", "serde"] {
            for profile in ["check", "opt"] {
                for scenario in ["full", "incr-full"] {
                    data.insert(
                        benchmark,
                        profile,
                        scenario,
                        Series::measured_only(vec![1.0, 2.0]),
                    );
                }
            }
        }
        data
    }

    #[test]
    fn test_unset_filters_match_everything() {
        let selector = GraphsSelector::default();
        assert!(selector.matches("anything", "check", "full"));
        let data = sample();
        assert_eq!(data.select(&selector), data);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let mut selector = GraphsSelector::default();
        selector.benchmark = Some(String::new());
        assert!(selector.matches("syn", "check", "full"));
        let data = sample();
        assert_eq!(data.select(&selector), data);
    }

    #[test]
    fn test_matches_requires_every_set_filter() {
        let selector = GraphsSelector::default()
            .with_benchmark("syn")
            .with_profile("opt");
        assert!(selector.matches("syn", "opt", "full"));
        assert!(selector.matches("syn", "opt", "incr-full"));
        assert!(!selector.matches("syn", "check", "full"));
        assert!(!selector.matches("regex", "opt", "full"));
    }

    #[test]
    fn test_select_keeps_commits() {
        let data = sample();
        let selected = data.select(&GraphsSelector::default().with_scenario("full"));
        assert_eq!(selected.commits, data.commits);
        assert_eq!(selected.series_count(), 6);
        assert!(selected
            .iter_series()
            .all(|(key, _)| key.scenario == "full"));
    }

    #[test]
    fn test_select_nothing() {
        let selected = sample().select(&GraphsSelector::default().with_benchmark("missing"));
        assert!(selected.is_empty());
        assert!(selected.benchmarks.is_empty());
    }

    #[test]
    fn test_filter_benchmarks() {
        let filters = compile_filters(&["^s".to_string()]).unwrap();
        let filtered = sample().filter_benchmarks(&filters);
        assert_eq!(
            filtered.benchmarks.keys().collect::<Vec<_>>(),
            vec!["serde", "syn"]
        );
        assert_eq!(sample().filter_benchmarks(&[]), sample());
    }

    #[test]
    fn test_compile_invalid_regex() {
        let patterns = vec!["[invalid".to_string()];
        assert!(compile_filters(&patterns).is_err());
    }

    #[test]
    fn test_matches_any_filter_or_logic() {
        let patterns = vec!["^syn$".to_string(), "regex".to_string()];
        let filters = compile_filters(&patterns).unwrap();
        assert!(matches_any_filter("syn", &filters));
        assert!(matches_any_filter("regex-1.5.5", &filters));
        assert!(!matches_any_filter("synstructure", &filters));
    }
}

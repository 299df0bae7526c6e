use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use itertools::Itertools;
use plotly::{
    common::{Font, LegendGroupTitle, Marker, Mode, Title, Visible},
    layout::{Axis, Legend},
    Configuration, Layout, Plot, Scatter,
};

use crate::{
    api::{CommitRef, GraphData, Series, SeriesKey},
    defaults, input,
};

/// Options of an HTML report. Unset values fall back to configuration, then defaults.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub title: Option<String>,
    pub template_path: Option<PathBuf>,
    pub custom_css_path: Option<PathBuf>,
    /// Label of the y axis, usually the statistic the payload was requested for
    pub y_axis_label: Option<String>,
}

/// Metadata for rendering report templates
struct ReportMetadata {
    title: String,
    custom_css: String,
    timestamp: String,
    commit_range: String,
    depth: usize,
}

impl ReportMetadata {
    fn new(title: Option<String>, custom_css: String, commits: &[CommitRef]) -> ReportMetadata {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let len = defaults::DEFAULT_COMMIT_HASH_DISPLAY_LENGTH_METADATA;
        // Commits are ordered oldest first
        let commit_range = match (commits.first(), commits.last()) {
            (Some(first), Some(last)) if commits.len() > 1 => {
                format!("{}..{}", first.short_sha(len), last.short_sha(len))
            }
            (Some(only), _) => only.short_sha(len).to_string(),
            _ => "No commits".to_string(),
        };

        ReportMetadata {
            title: title.unwrap_or_else(|| defaults::DEFAULT_REPORT_TITLE.to_string()),
            custom_css,
            timestamp,
            commit_range,
            depth: commits.len(),
        }
    }
}

/// Default HTML template used when no custom template is provided.
const DEFAULT_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{TITLE}}</title>
    {{PLOTLY_HEAD}}
    <style>{{CUSTOM_CSS}}</style>
</head>
<body>
    {{PLOTLY_BODY}}
</body>
</html>"#;

/// Color of the markers highlighting interpolated points.
const INTERPOLATED_MARKER_COLOR: &str = "gray";

/// Extract Plotly JavaScript dependencies and plot content
///
/// - `plotly_head`: Script tags for Plotly.js library (from CDN)
/// - `plotly_body`: Inline div + script for the actual plot content
fn extract_plotly_parts(plot: &Plot) -> (String, String) {
    let plotly_head = Plot::online_cdn_js();
    // None auto-generates a unique div ID
    let plotly_body = plot.to_inline_html(None);
    (plotly_head, plotly_body)
}

fn apply_template(template: &str, plot: &Plot, metadata: &ReportMetadata) -> Vec<u8> {
    let (plotly_head, plotly_body) = extract_plotly_parts(plot);

    template
        .replace("{{TITLE}}", &metadata.title)
        .replace("{{PLOTLY_HEAD}}", &plotly_head)
        .replace("{{PLOTLY_BODY}}", &plotly_body)
        .replace("{{CUSTOM_CSS}}", &metadata.custom_css)
        .replace("{{TIMESTAMP}}", &metadata.timestamp)
        .replace("{{COMMIT_RANGE}}", &metadata.commit_range)
        .replace("{{DEPTH}}", &metadata.depth.to_string())
        .into_bytes()
}

fn read_optional_file(path: Option<&PathBuf>, what: &str) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        bail!("{} file not found: {}", what, path.display());
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| anyhow!("Failed to read {} file {}: {}", what, path.display(), e))
}

fn hover_text(commit: &CommitRef, value: f64, interpolated: bool) -> String {
    let date = commit
        .datetime()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let note = if interpolated { " (interpolated)" } else { "" };
    format!(
        "{} {}<br>{}{}",
        commit.short_sha(defaults::DEFAULT_COMMIT_HASH_DISPLAY_LENGTH_METADATA),
        date,
        value,
        note
    )
}

trait Reporter<'a> {
    fn add_commits(&mut self, commits: &'a [CommitRef]);
    fn add_series(&mut self, key: SeriesKey<'a>, series: &'a Series);
    fn as_bytes(&self) -> Vec<u8>;
}

struct PlotlyReporter<'a> {
    plot: Plot,
    commits: &'a [CommitRef],
    y_axis_label: Option<String>,
    template: Option<String>,
    metadata: Option<ReportMetadata>,
}

impl<'a> PlotlyReporter<'a> {
    fn new() -> PlotlyReporter<'a> {
        let config = Configuration::default().responsive(true).fill_frame(false);
        let mut plot = Plot::new();
        plot.set_configuration(config);
        PlotlyReporter {
            plot,
            commits: &[],
            y_axis_label: None,
            template: None,
            metadata: None,
        }
    }

    fn hover_texts(&self, points: &[(usize, f64, bool)]) -> Vec<String> {
        points
            .iter()
            .map(|&(i, v, interpolated)| match self.commits.get(i) {
                Some(commit) => hover_text(commit, v, interpolated),
                None => v.to_string(),
            })
            .collect()
    }

    fn layout(&self) -> Layout {
        let (tick_values, tick_texts): (Vec<_>, Vec<_>) = self
            .commits
            .iter()
            .enumerate()
            .map(|(n, c)| {
                (
                    n as f64,
                    c.short_sha(defaults::DEFAULT_COMMIT_HASH_DISPLAY_LENGTH_AXIS)
                        .to_owned(),
                )
            })
            .unzip();
        let x_axis = Axis::new()
            .tick_values(tick_values)
            .tick_text(tick_texts)
            .tick_angle(45.0)
            .tick_font(Font::new().family("monospace"));

        let title = self
            .metadata
            .as_ref()
            .map(|m| m.title.clone())
            .unwrap_or_else(|| defaults::DEFAULT_REPORT_TITLE.to_string());

        let mut layout = Layout::new()
            .title(Title::from(title))
            .x_axis(x_axis)
            .legend(
                Legend::new()
                    .group_click(plotly::layout::GroupClick::ToggleItem)
                    .orientation(plotly::common::Orientation::Horizontal),
            );
        if let Some(label) = &self.y_axis_label {
            layout = layout.y_axis(Axis::new().title(Title::from(label.as_str())));
        }
        layout
    }
}

impl<'a> Reporter<'a> for PlotlyReporter<'a> {
    fn add_commits(&mut self, commits: &'a [CommitRef]) {
        self.commits = commits;
    }

    fn add_series(&mut self, key: SeriesKey<'a>, series: &'a Series) {
        let points = series.iter().collect_vec();
        let label = format!("{}/{}", key.profile, key.scenario);

        let (x, y): (Vec<usize>, Vec<f64>) = points.iter().map(|&(i, v, _)| (i, v)).unzip();
        let trace = Scatter::new(x, y)
            .mode(Mode::LinesMarkers)
            .name(&label)
            .legend_group(key.benchmark)
            .legend_group_title(LegendGroupTitle::from(key.benchmark))
            .show_legend(true)
            .hover_text_array(self.hover_texts(&points));
        self.plot.add_trace(trace);

        let interpolated = points
            .iter()
            .copied()
            .filter(|&(_, _, interpolated)| interpolated)
            .collect_vec();
        if interpolated.is_empty() {
            return;
        }

        let (x, y): (Vec<usize>, Vec<f64>) =
            interpolated.iter().map(|&(i, v, _)| (i, v)).unzip();
        let trace = Scatter::new(x, y)
            .mode(Mode::Markers)
            .marker(Marker::new().color(INTERPOLATED_MARKER_COLOR).size(10))
            .name(format!("{} (interpolated)", label))
            .legend_group(key.benchmark)
            .visible(Visible::LegendOnly)
            .show_legend(true)
            .hover_text_array(self.hover_texts(&interpolated));
        self.plot.add_trace(trace);
    }

    fn as_bytes(&self) -> Vec<u8> {
        let mut plot = self.plot.clone();
        plot.set_layout(self.layout());

        let template = self.template.as_deref().unwrap_or(DEFAULT_HTML_TEMPLATE);
        let default_metadata = ReportMetadata {
            title: defaults::DEFAULT_REPORT_TITLE.to_string(),
            custom_css: String::new(),
            timestamp: String::new(),
            commit_range: String::new(),
            depth: 0,
        };
        let metadata = self.metadata.as_ref().unwrap_or(&default_metadata);

        apply_template(template, &plot, metadata)
    }
}

/// CSV row of a single point
struct CsvPointRow<'a> {
    key: SeriesKey<'a>,
    commit: Option<&'a CommitRef>,
    value: f64,
    interpolated: bool,
}

impl CsvPointRow<'_> {
    /// Format as a tab-delimited CSV line
    /// Float values are formatted to always include at least one decimal place
    fn to_csv_line(&self) -> String {
        let value_str = if self.value.fract() == 0.0 && self.value.is_finite() {
            format!("{:.1}", self.value)
        } else {
            self.value.to_string()
        };
        let (sha, timestamp) = match self.commit {
            Some(commit) => (commit.sha().to_string(), commit.timestamp().to_string()),
            None => (String::new(), String::new()),
        };

        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.key.benchmark,
            self.key.profile,
            self.key.scenario,
            sha,
            timestamp,
            value_str,
            self.interpolated
        )
    }
}

struct CsvReporter<'a> {
    commits: &'a [CommitRef],
    series: Vec<(SeriesKey<'a>, &'a Series)>,
}

impl CsvReporter<'_> {
    fn new() -> Self {
        CsvReporter {
            commits: &[],
            series: Vec::new(),
        }
    }
}

impl<'a> Reporter<'a> for CsvReporter<'a> {
    fn add_commits(&mut self, commits: &'a [CommitRef]) {
        self.commits = commits;
    }

    fn add_series(&mut self, key: SeriesKey<'a>, series: &'a Series) {
        self.series.push((key, series));
    }

    fn as_bytes(&self) -> Vec<u8> {
        if self.series.is_empty() {
            return Vec::new();
        }

        let mut lines =
            vec!["benchmark\tprofile\tscenario\tcommit\ttimestamp\tvalue\tinterpolated".to_string()];

        for (key, series) in &self.series {
            for (i, value, interpolated) in series.iter() {
                let row = CsvPointRow {
                    key: *key,
                    commit: self.commits.get(i),
                    value,
                    interpolated,
                };
                lines.push(row.to_csv_line());
            }
        }

        let mut output = lines.join("\n");
        output.push('\n');
        output.into_bytes()
    }
}

enum OutputFormat {
    Html,
    Csv,
}

impl OutputFormat {
    fn from_file_name(path: &Path) -> Option<OutputFormat> {
        if path == Path::new("-") {
            return Some(OutputFormat::Csv);
        }
        let extension = path.extension()?.to_ascii_lowercase();
        match extension.to_str()? {
            "html" => Some(OutputFormat::Html),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

fn render<'a>(mut reporter: Box<dyn Reporter<'a> + 'a>, data: &'a GraphData) -> Vec<u8> {
    reporter.add_commits(&data.commits);
    for (key, series) in data.iter_series() {
        reporter.add_series(key, series);
    }
    reporter.as_bytes()
}

/// Render `data` as HTML or CSV, picked by the extension of `output`.
pub fn render_report(data: &GraphData, output: &Path, options: &ReportOptions) -> Result<Vec<u8>> {
    let format = OutputFormat::from_file_name(output)
        .ok_or_else(|| anyhow!("Could not infer output format of {}", output.display()))?;

    let reporter: Box<dyn Reporter<'_> + '_> = match format {
        OutputFormat::Csv => Box::new(CsvReporter::new()),
        OutputFormat::Html => {
            let template = read_optional_file(options.template_path.as_ref(), "Template")?;
            let custom_css =
                read_optional_file(options.custom_css_path.as_ref(), "Custom CSS")?.unwrap_or_default();
            let mut reporter = PlotlyReporter::new();
            reporter.template = template;
            reporter.metadata = Some(ReportMetadata::new(
                options.title.clone(),
                custom_css,
                &data.commits,
            ));
            reporter.y_axis_label = options.y_axis_label.clone();
            Box::new(reporter)
        }
    };

    Ok(render(reporter, data))
}

pub fn report(data: &GraphData, output: &Path, options: &ReportOptions) -> Result<()> {
    if data.is_empty() {
        bail!("No series selected, nothing to report");
    }
    let bytes = render_report(data, output, options)?;
    input::write_output(output, &bytes)?;
    log::info!(
        "Wrote report with {} series to {}",
        data.series_count(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_graph_data as sample;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_from_file_name() {
        assert!(matches!(
            OutputFormat::from_file_name(Path::new("output.html")),
            Some(OutputFormat::Html)
        ));
        assert!(matches!(
            OutputFormat::from_file_name(Path::new("output.CSV")),
            Some(OutputFormat::Csv)
        ));
        assert!(matches!(
            OutputFormat::from_file_name(Path::new("-")),
            Some(OutputFormat::Csv)
        ));
        assert!(OutputFormat::from_file_name(Path::new("output.txt")).is_none());
        assert!(OutputFormat::from_file_name(Path::new("output")).is_none());
    }

    #[test]
    fn test_csv_output() {
        let data = sample();
        let bytes = render_report(&data, Path::new("out.csv"), &ReportOptions::default()).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        let lines = csv.lines().collect_vec();
        assert_eq!(
            lines,
            vec![
                "benchmark\tprofile\tscenario\tcommit\ttimestamp\tvalue\tinterpolated",
                "regex\topt\tincr-full\t0123456789abcdef\t1700000000\t7.0\tfalse",
                "regex\topt\tincr-full\tfedcba9876543210\t1700086400\t8.0\tfalse",
                "syn\tcheck\tfull\t0123456789abcdef\t1700000000\t100.0\tfalse",
                "syn\tcheck\tfull\tfedcba9876543210\t1700086400\t101.5\ttrue",
                "syn\tdebug\tfull\t0123456789abcdef\t1700000000\t250.0\tfalse",
                "syn\tdebug\tfull\tfedcba9876543210\t1700086400\t240.0\tfalse",
            ]
        );
    }

    #[test]
    fn test_csv_for_misaligned_series_leaves_commit_empty() {
        let mut data = GraphData::new(vec![CommitRef::new(1, "a")]);
        data.insert("b", "p", "s", Series::measured_only(vec![1.0, 2.0]));
        let csv = String::from_utf8(
            render_report(&data, Path::new("-"), &ReportOptions::default()).unwrap(),
        )
        .unwrap();
        assert!(csv.ends_with("b\tp\ts\t\t\t2.0\tfalse\n"));
    }

    #[test]
    fn test_csv_empty() {
        let data = GraphData::default();
        let bytes = render_report(&data, Path::new("-"), &ReportOptions::default()).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_html_uses_default_template() {
        let data = sample();
        let bytes =
            render_report(&data, Path::new("out.html"), &ReportOptions::default()).unwrap();
        let html = String::from_utf8_lossy(&bytes);

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<title>Performance Graphs</title>"));
        assert!(html.contains("plotly") || html.contains("Plotly"));
        assert!(html.contains("check/full (interpolated)"));
        assert!(html.contains("012345"));
        assert!(!html.contains("{{TITLE}}"));
    }

    #[test]
    fn test_html_custom_template_and_css() {
        let temp_dir = TempDir::new().unwrap();
        let template = temp_dir.path().join("template.html");
        let css = temp_dir.path().join("style.css");
        fs::write(
            &template,
            "<h1>{{TITLE}}</h1><p>{{COMMIT_RANGE}} ({{DEPTH}})</p><style>{{CUSTOM_CSS}}</style>{{PLOTLY_BODY}}",
        )
        .unwrap();
        fs::write(&css, "body { color: red; }").unwrap();

        let options = ReportOptions {
            title: Some("Nightly".to_string()),
            template_path: Some(template),
            custom_css_path: Some(css),
            y_axis_label: Some("instructions:u".to_string()),
        };
        let html = String::from_utf8(
            render_report(&sample(), Path::new("out.html"), &options).unwrap(),
        )
        .unwrap();
        assert!(html.starts_with("<h1>Nightly</h1><p>0123456..fedcba9 (2)</p>"));
        assert!(html.contains("body { color: red; }"));
        assert!(html.contains("instructions:u"));
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let options = ReportOptions {
            template_path: Some(PathBuf::from("/nonexistent/template.html")),
            ..Default::default()
        };
        let err = render_report(&sample(), Path::new("out.html"), &options).unwrap_err();
        assert!(err.to_string().contains("Template file not found"));
    }

    #[test]
    fn test_report_metadata_commit_range() {
        let single = ReportMetadata::new(None, String::new(), &[CommitRef::new(0, "abcdef123")]);
        assert_eq!(single.commit_range, "abcdef1");
        assert_eq!(single.title, "Performance Graphs");

        let none = ReportMetadata::new(Some("t".to_string()), String::new(), &[]);
        assert_eq!(none.commit_range, "No commits");
        assert_eq!(none.depth, 0);
    }

    #[test]
    fn test_report_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("report.csv");
        report(&sample(), &output, &ReportOptions::default()).unwrap();
        let csv = fs::read_to_string(&output).unwrap();
        assert_eq!(csv.lines().count(), 7);
    }

    #[test]
    fn test_report_rejects_empty_selection() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("report.html");
        assert!(report(&GraphData::default(), &output, &ReportOptions::default()).is_err());
        assert!(!output.exists());
    }
}

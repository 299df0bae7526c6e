use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use env_logger::Env;
use log::Level;

use crate::api::{Bound, GraphKind, GraphsSelector};
use crate::config::{self, Settings};
use crate::endpoints::{Endpoint, Endpoints};
use crate::input::{load_graph_data, write_output};
use crate::reporting::{report, ReportOptions};
use crate::selection::compile_filters;
use crate::stats::format_summary;
use perf_graphs_cli_types::{Cli, CliRequest, CliSeriesFilter, Commands, ConfigCommands};

pub fn handle_calls() -> Result<()> {
    let cli = Cli::parse();
    let logger_level = match cli.verbose {
        0 => Level::Warn,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(logger_level.as_str())).init();

    let settings = config::load_settings();

    match cli.command {
        Commands::Urls { origin, endpoint } => {
            let endpoints = resolve_endpoints(origin, &settings);
            match endpoint {
                Some(endpoint) => println!("{}", endpoints.url(Endpoint::from(endpoint))),
                None => {
                    for (endpoint, url) in endpoints.all() {
                        println!("{}\t{}", endpoint, url);
                    }
                }
            }
            Ok(())
        }
        Commands::RequestUrl {
            origin,
            request,
            series,
        } => {
            let endpoints = resolve_endpoints(origin, &settings);
            let selector = resolve_selector(&request, &series, &settings);
            println!("{}", endpoints.graph_request_url(&selector)?);
            Ok(())
        }
        Commands::Validate { input, strict } => validate(&input, strict),
        Commands::Select {
            input,
            output,
            pretty,
            series,
        } => {
            let selector = series_selector(&series, &settings);
            let selected = load_graph_data(&input)?.select(&selector);
            log::info!("Selected {} series", selected.series_count());
            let json = if pretty {
                selected.to_json_pretty()?
            } else {
                selected.to_json()?
            };
            write_output(&output, json.as_bytes())
        }
        Commands::Summary {
            input,
            filter,
            series,
        } => {
            let filters = compile_filters(&filter)?;
            let selector = series_selector(&series, &settings);
            let data = load_graph_data(&input)?
                .select(&selector)
                .filter_benchmarks(&filters);
            if data.is_empty() {
                bail!("No series selected");
            }
            println!("{}", format_summary(&data));
            Ok(())
        }
        Commands::Report {
            input,
            output,
            filter,
            title,
            template,
            custom_css,
            stat,
            series,
        } => {
            let filters = compile_filters(&filter)?;
            let selector = series_selector(&series, &settings);
            let data = load_graph_data(&input)?
                .select(&selector)
                .filter_benchmarks(&filters);
            let options = ReportOptions {
                title: title.or_else(|| settings.report_title.clone()),
                template_path: template.or_else(|| settings.report_template.clone()),
                custom_css_path: custom_css.or_else(|| settings.report_custom_css.clone()),
                y_axis_label: Some(stat.unwrap_or(selector.stat)),
            };
            report(&data, &output, &options)
        }
        Commands::Config { command } => match command {
            None | Some(ConfigCommands::Show {}) => {
                show_config_info(&settings);
                Ok(())
            }
            Some(ConfigCommands::SetOrigin { origin }) => {
                let path = config::set_origin(&origin)?;
                println!("Stored site origin in {}", path.display());
                Ok(())
            }
        },
    }
}

/// Origin precedence: CLI option, then configuration, then the built-in default.
fn resolve_endpoints(origin: Option<String>, settings: &Settings) -> Endpoints {
    Endpoints::new(origin.unwrap_or_else(|| settings.origin.clone()))
}

/// Build the request selector from CLI options, filling stat and kind from configuration.
fn resolve_selector(
    request: &CliRequest,
    series: &CliSeriesFilter,
    settings: &Settings,
) -> GraphsSelector {
    GraphsSelector {
        start: request.start.as_deref().map(Bound::from).unwrap_or_default(),
        end: request.end.as_deref().map(Bound::from).unwrap_or_default(),
        kind: request.kind.map(GraphKind::from).unwrap_or(settings.kind),
        stat: request.stat.clone().unwrap_or_else(|| settings.stat.clone()),
        ..series_selector(series, settings)
    }
}

/// Selector for a saved payload. Only the series filters apply, the rest is configuration.
fn series_selector(series: &CliSeriesFilter, settings: &Settings) -> GraphsSelector {
    GraphsSelector {
        kind: settings.kind,
        benchmark: series.benchmark.clone(),
        scenario: series.scenario.clone(),
        profile: series.profile.clone(),
        ..GraphsSelector::new(settings.stat.clone())
    }
}

fn validate(input: &Path, strict: bool) -> Result<()> {
    // Interpolated indices are checked while parsing
    let data = load_graph_data(input)?;

    let misaligned = data.misaligned_series();
    for m in &misaligned {
        log::warn!(
            "Series {} has {} points but there are {} commits",
            m.series,
            m.points,
            m.commits
        );
    }
    if strict {
        data.validate_alignment()?;
    }

    println!(
        "{}: {} series over {} commits, {} misaligned",
        input.display(),
        data.series_count(),
        data.commits.len(),
        misaligned.len()
    );
    Ok(())
}

/// Show configuration information including config paths and resolved values
fn show_config_info(settings: &Settings) {
    println!("perf-graphs Configuration Information");
    println!("=====================================");

    let paths = config::config_paths();
    if paths.is_empty() {
        println!("Config files: none found");
    }
    for path in &paths {
        if path.is_file() {
            println!("Config file: {} (exists)", path.display());
        } else {
            println!("Config file: {} (not found)", path.display());
        }
    }

    println!("\nResolved settings");
    println!("  site.origin: {}", settings.origin);
    println!("  graphs.stat: {}", settings.stat);
    println!("  graphs.kind: {}", settings.kind);
    if let Some(title) = &settings.report_title {
        println!("  report.title: {}", title);
    }
    if let Some(template) = &settings.report_template {
        println!("  report.template: {}", template.display());
    }
    if let Some(css) = &settings.report_custom_css {
        println!("  report.custom_css: {}", css.display());
    }
}

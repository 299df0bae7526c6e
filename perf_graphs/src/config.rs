use anyhow::{anyhow, Context, Result};
use config::{Config, ConfigError, File, FileFormat};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use toml_edit::{table, value, DocumentMut};

use crate::api::GraphKind;
use crate::defaults;

pub const LOCAL_CONFIG_FILE: &str = ".perfgraphsconfig";

/// Values resolved from configuration, with built-in defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub origin: String,
    pub stat: String,
    pub kind: GraphKind,
    pub report_title: Option<String>,
    pub report_template: Option<PathBuf>,
    pub report_custom_css: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            origin: defaults::DEFAULT_ORIGIN.to_string(),
            stat: defaults::DEFAULT_STAT.to_string(),
            kind: GraphKind::Raw,
            report_title: None,
            report_template: None,
            report_custom_css: None,
        }
    }
}

impl Settings {
    pub fn from_config(config: &Config) -> Settings {
        let mut settings = Settings::default();

        if let Ok(origin) = config.get_string("site.origin") {
            settings.origin = origin.trim_end_matches('/').to_string();
        }
        if let Ok(stat) = config.get_string("graphs.stat") {
            settings.stat = stat;
        }
        if let Ok(kind) = config.get_string("graphs.kind") {
            match kind.parse::<GraphKind>() {
                Ok(kind) => settings.kind = kind,
                Err(e) => log::warn!("Ignoring graphs.kind from config: {}", e),
            }
        }
        settings.report_title = config.get_string("report.title").ok();
        settings.report_template = config.get_string("report.template").ok().map(PathBuf::from);
        settings.report_custom_css = config
            .get_string("report.custom_css")
            .ok()
            .map(PathBuf::from);

        settings
    }
}

/// Load settings from the hierarchical configuration.
///
/// A broken or missing configuration is not fatal, the defaults are used instead.
pub fn load_settings() -> Settings {
    match read_hierarchical_config() {
        Ok(config) => Settings::from_config(&config),
        Err(e) => {
            log::debug!("Could not read hierarchical config: {}", e);
            Settings::default()
        }
    }
}

/// System-wide config path (XDG_CONFIG_HOME or ~/.config/perf-graphs/config.toml)
pub fn system_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
        Some(
            Path::new(&xdg_config_home)
                .join("perf-graphs")
                .join("config.toml"),
        )
    } else {
        dirs_next::home_dir().map(|home| home.join(".config").join("perf-graphs").join("config.toml"))
    }
}

/// Nearest local config file, searching upward from `start`.
pub fn find_local_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(LOCAL_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Build a configuration from files in increasing priority. Missing files are skipped.
pub fn read_config_files(paths: &[PathBuf]) -> Result<Config, ConfigError> {
    paths
        .iter()
        .fold(Config::builder(), |builder, path| {
            builder.add_source(
                File::from(path.clone())
                    .format(FileFormat::Toml)
                    .required(false),
            )
        })
        .build()
}

/// Config file paths in increasing priority: system, then the local file.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(system) = system_config_path() {
        paths.push(system);
    }
    if let Some(local) = env::current_dir()
        .ok()
        .and_then(|dir| find_local_config(&dir))
    {
        paths.push(local);
    }
    paths
}

/// Read hierarchical configuration (system -> local override)
pub fn read_hierarchical_config() -> Result<Config, ConfigError> {
    read_config_files(&config_paths())
}

/// Set `site.origin` in a TOML document, keeping its comments and layout.
pub fn set_origin_in_conf(origin: &str, conf_str: &mut String) -> Result<()> {
    let mut conf = conf_str
        .parse::<DocumentMut>()
        .context("failed to parse config")?;

    let site = conf
        .entry("site")
        .or_insert(table())
        .as_table_like_mut()
        .ok_or_else(|| anyhow!("`site` in config is not a table"))?;
    site.insert("origin", value(origin.trim_end_matches('/')));
    *conf_str = conf.to_string();

    Ok(())
}

/// Store the origin in the nearest local config file, or create one in the working directory.
pub fn set_origin(origin: &str) -> Result<PathBuf> {
    let cwd = env::current_dir()?;
    let path = find_local_config(&cwd).unwrap_or_else(|| cwd.join(LOCAL_CONFIG_FILE));
    set_origin_in_file(origin, &path)?;
    Ok(path)
}

pub fn set_origin_in_file(origin: &str, path: &Path) -> Result<()> {
    let mut conf_str = if path.is_file() {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?
    } else {
        String::new()
    };

    set_origin_in_conf(origin, &mut conf_str)?;
    fs::write(path, conf_str)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = read_config_files(&[temp_dir.path().join("missing.toml")]).unwrap();
        assert_eq!(Settings::from_config(&config), Settings::default());
    }

    #[test]
    fn test_local_overrides_system() {
        let temp_dir = TempDir::new().unwrap();
        let system = temp_dir.path().join("config.toml");
        let local = temp_dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(
            &system,
            r#"[site]
origin = "https://system.example.org/"

[graphs]
stat = "cycles:u"
kind = "percentrelative"
"#,
        )
        .unwrap();
        fs::write(
            &local,
            r#"[site]
# Local dashboard
origin = "https://local.example.org"

[report]
title = "Nightly"
template = "template.html"
"#,
        )
        .unwrap();

        let config = read_config_files(&[system, local]).unwrap();
        let settings = Settings::from_config(&config);
        assert_eq!(settings.origin, "https://local.example.org");
        assert_eq!(settings.stat, "cycles:u");
        assert_eq!(settings.kind, GraphKind::PercentRelative);
        assert_eq!(settings.report_title.as_deref(), Some("Nightly"));
        assert_eq!(settings.report_template, Some(PathBuf::from("template.html")));
        assert_eq!(settings.report_custom_css, None);
    }

    #[test]
    fn test_invalid_kind_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[graphs]\nkind = \"logarithmic\"\n").unwrap();
        let config = read_config_files(&[path]).unwrap();
        assert_eq!(Settings::from_config(&config).kind, GraphKind::Raw);
    }

    #[test]
    fn test_find_local_config_searches_upward() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_local_config(&nested), None);

        let config_path = temp_dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(&config_path, "").unwrap();
        assert_eq!(find_local_config(&nested), Some(config_path));
    }

    #[test]
    fn test_set_origin_in_conf_preserves_comments() {
        let mut conf = r#"# my perf config
[graphs]
stat = "wall-time" # seconds
"#
        .to_string();
        set_origin_in_conf("https://perf.example.org/", &mut conf).unwrap();
        assert!(conf.contains("# my perf config"));
        assert!(conf.contains("# seconds"));

        let doc = conf.parse::<DocumentMut>().unwrap();
        assert_eq!(
            doc["site"]["origin"].as_str(),
            Some("https://perf.example.org")
        );
        assert_eq!(doc["graphs"]["stat"].as_str(), Some("wall-time"));
    }

    #[test]
    fn test_set_origin_in_file_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(LOCAL_CONFIG_FILE);
        set_origin_in_file("http://localhost:8080", &path).unwrap();
        set_origin_in_file("http://localhost:9090", &path).unwrap();

        let config = read_config_files(&[path]).unwrap();
        assert_eq!(
            Settings::from_config(&config).origin,
            "http://localhost:9090"
        );
    }

    #[test]
    fn test_set_origin_requires_site_table() {
        let mut conf = "site = \"prod\"\n".to_string();
        let err = set_origin_in_conf("http://x", &mut conf).unwrap_err();
        assert!(err.to_string().contains("not a table"));
        assert_eq!(conf, "site = \"prod\"\n");

        let mut conf = "site = { name = \"prod\" }\n".to_string();
        set_origin_in_conf("http://x", &mut conf).unwrap();
        assert!(conf.contains("origin = \"http://x\""));
        assert!(conf.contains("name = \"prod\""));
    }

    #[test]
    fn test_set_origin_rejects_invalid_toml() {
        let mut conf = "[site\norigin = ".to_string();
        assert!(set_origin_in_conf("http://x", &mut conf).is_err());
    }
}

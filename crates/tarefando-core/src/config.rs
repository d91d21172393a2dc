use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::{
  DEFAULT_LOCALE,
  DateStyle,
  DisplayLocale,
  parse_timezone
};

pub const DEFAULT_API_URL: &str =
  "https://localhost:7222/api/tasks";

const CONFIG_ENV_VAR: &str =
  "TAREFANDO_CONFIG";
const API_URL_ENV_VAR: &str =
  "TAREFANDO_API_URL";
const LOCALE_ENV_VAR: &str =
  "TAREFANDO_LOCALE";
const TIMEZONE_ENV_VAR: &str =
  "TAREFANDO_TIMEZONE";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
  #[serde(default)]
  api:     ApiSection,
  #[serde(default)]
  display: DisplaySection,
  #[serde(default)]
  view:    ViewSection
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiSection {
  base_url:             Option<String>,
  accept_invalid_certs: Option<bool>
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DisplaySection {
  locale:   Option<String>,
  timezone: Option<String>
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ViewSection {
  grouped: Option<bool>
}

/// Values given on the command line;
/// these win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub api_url:  Option<String>,
  pub locale:   Option<String>,
  pub timezone: Option<String>,
  pub grouped:  Option<bool>
}

#[derive(Debug, Clone)]
pub struct Config {
  pub api_base_url:         String,
  pub accept_invalid_certs: bool,
  pub locale:               String,
  pub timezone:             Tz,
  pub grouped:              bool,
  pub loaded_files:         Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_base_url: DEFAULT_API_URL
        .to_string(),
      accept_invalid_certs: false,
      locale: DEFAULT_LOCALE.to_string(),
      timezone: chrono_tz::America::Sao_Paulo,
      grouped: false,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    Self::load_from(
      config_override,
      |key| std::env::var(key).ok()
    )
  }

  /// Defaults, then the config file,
  /// then the environment as seen
  /// through `env`.
  pub fn load_from<F>(
    config_override: Option<&Path>,
    env: F
  ) -> anyhow::Result<Self>
  where
    F: Fn(&str) -> Option<String>
  {
    let mut cfg = Config::default();

    let path = resolve_config_path(
      config_override,
      &env
    )?;
    if let Some(path) = path {
      info!(config = %path.display(), "loading config file");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no config file found; using \
         defaults"
      );
    }

    if let Some(url) = non_empty(
      env(API_URL_ENV_VAR)
    ) {
      debug!(url = %url, "api url from environment");
      cfg.api_base_url = url;
    }
    if let Some(locale) = non_empty(
      env(LOCALE_ENV_VAR)
    ) {
      cfg.locale = locale;
    }
    if let Some(tz) =
      non_empty(env(TIMEZONE_ENV_VAR))
    {
      cfg.timezone =
        parse_timezone(&tz, TIMEZONE_ENV_VAR)?;
    }

    Ok(cfg)
  }

  pub fn apply_overrides(
    &mut self,
    overrides: ConfigOverrides
  ) -> anyhow::Result<()> {
    if let Some(url) =
      non_empty(overrides.api_url)
    {
      debug!(url = %url, "api url override");
      self.api_base_url = url;
    }
    if let Some(locale) =
      non_empty(overrides.locale)
    {
      self.locale = locale;
    }
    if let Some(tz) =
      non_empty(overrides.timezone)
    {
      self.timezone =
        parse_timezone(&tz, "--timezone")?;
    }
    if let Some(grouped) = overrides.grouped
    {
      self.grouped = grouped;
    }
    Ok(())
  }

  pub fn date_style(&self) -> DateStyle {
    DateStyle::new(
      DisplayLocale::resolve(&self.locale),
      self.timezone
    )
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let parsed: FileConfig =
      toml::from_str(&text)
        .with_context(|| {
          format!(
            "invalid config file {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.to_path_buf());

    if let Some(url) =
      non_empty(parsed.api.base_url)
    {
      self.api_base_url = url;
    }
    if let Some(accept) =
      parsed.api.accept_invalid_certs
    {
      self.accept_invalid_certs = accept;
    }
    if let Some(locale) =
      non_empty(parsed.display.locale)
    {
      self.locale = locale;
    }
    if let Some(tz) =
      non_empty(parsed.display.timezone)
    {
      self.timezone = parse_timezone(
        &tz,
        &format!("file:{}", path.display())
      )?;
    }
    if let Some(grouped) =
      parsed.view.grouped
    {
      self.grouped = grouped;
    }

    Ok(())
  }
}

fn resolve_config_path<F>(
  config_override: Option<&Path>,
  env: &F
) -> anyhow::Result<Option<PathBuf>>
where
  F: Fn(&str) -> Option<String>
{
  if let Some(path) = config_override {
    if !path.exists() {
      return Err(anyhow!(
        "config file {} does not exist",
        path.display()
      ));
    }
    return Ok(Some(path.to_path_buf()));
  }

  if let Some(raw) =
    non_empty(env(CONFIG_ENV_VAR))
  {
    let path = PathBuf::from(raw);
    if path.exists() {
      return Ok(Some(path));
    }
    warn!(
      config = %path.display(),
      "config file from environment does not exist; skipping"
    );
    return Ok(None);
  }

  let Some(dir) = dirs::config_dir()
  else {
    return Ok(None);
  };
  let candidate =
    dir.join("tarefando").join("config.toml");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn non_empty(
  value: Option<String>
) -> Option<String> {
  value
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::upcoming::{
  DASHBOARD_WINDOW_DAYS,
  EXAM_BADGE_WINDOW_DAYS
};

const RC_ENV_VAR: &str = "CAMPUSRC";
const RC_FILE_NAME: &str = ".campusrc";
const DATA_DIR_NAME: &str = ".campus";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.location".to_string(),
      format!("~/{DATA_DIR_NAME}")
    );
    map.insert(
      "default.command".to_string(),
      "dashboard".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "upcoming.days".to_string(),
      DASHBOARD_WINDOW_DAYS.to_string()
    );
    map.insert(
      "exams.window_days".to_string(),
      EXAM_BADGE_WINDOW_DAYS.to_string()
    );
    map.insert(
      "live.poll_seconds".to_string(),
      "60".to_string()
    );

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(campusrc = %path.display(), "loading campusrc");
      cfg.load_file(
        &path,
        &mut Vec::new()
      )?;
    } else {
      warn!(
        "no campusrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn get_i64(
    &self,
    key: &str
  ) -> anyhow::Result<Option<i64>> {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<i64>().with_context(
          || {
            format!(
              "config key {key} must \
               be an integer, got {v}"
            )
          }
        )
      })
      .transpose()
  }

  pub fn get_u64(
    &self,
    key: &str
  ) -> anyhow::Result<Option<u64>> {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<u64>().with_context(
          || {
            format!(
              "config key {key} must \
               be a non-negative \
               integer, got {v}"
            )
          }
        )
      })
      .transpose()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  /// `active` holds the canonical paths of the files currently being
  /// read, outermost first; a path seen twice on it is an include cycle.
  #[tracing::instrument(skip(
    self, active
  ))]
  fn load_file(
    &mut self,
    path: &Path,
    active: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let canonical = fs::canonicalize(
      &path
    )
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;
    if active.contains(&canonical) {
      return Err(anyhow!(
        "include cycle: {}",
        path.display()
      ));
    }
    active.push(canonical);

    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self.load_file(
            &include_path,
            active
          )?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    active.pop();
    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping campusrc"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(DATA_DIR_NAME))
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

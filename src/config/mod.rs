use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

const CONFIG_DIR: &str = ".examresult";
const CONFIG_FILE: &str = "config.yml";

/// Settings read from `~/.examresult/config.yml`. Every key is optional and
/// mirrors a command-line option of the same name.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub local: Option<bool>,
    #[serde(alias = "sem")]
    pub semester: Option<String>,
    #[serde(alias = "exam_year")]
    pub year: Option<String>,
    #[serde(alias = "examHeld")]
    pub exam_held: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub discard_stale: Option<bool>,
    pub no_color: Option<bool>,
}

impl ConfigFile {
    pub fn from_yaml(contents: &str) -> Result<Self, String> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Reads `path`. A missing file yields the defaults when `allow_missing`
    /// is set and is an error otherwise.
    pub fn load(path: &Path, allow_missing: bool) -> Result<Self, String> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return if allow_missing {
                    Ok(Self::default())
                } else {
                    Err(format!("config file not found '{}'", path.display()))
                };
            }
            Err(e) => return Err(format!("cannot read config '{}': {e}", path.display())),
        };
        Self::from_yaml(&contents).map_err(|e| format!("invalid config '{}': {e}", path.display()))
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"));
    match (rest, home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).display().to_string()
}

const TEMPLATE: &str = r#"# examresult config
#
# Default location: ~/.examresult/config.yml
# Command-line options override every value below.

# Result service. base_url wins over local; /result is appended.
# base_url: https://exambeuresultbackend.onrender.com
local: false

# Query defaults
# semester: I
year: "2024"
exam_held: "July/2025"

# HTTP
# proxy: http://127.0.0.1:8080
# timeout: 30

# Ignore responses to older lookups once a newer one was submitted.
discard_stale: false

# Report file
# output: ./result.html
# output_format: html

no_color: false
"#;

/// Writes the commented template to `path` unless a file is already there.
/// Returns whether a new file was written.
pub fn write_template(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("cannot create '{}': {e}", dir.display()))?;
    }
    std::fs::write(path, TEMPLATE).map_err(|e| format!("cannot write '{}': {e}", path.display()))?;
    Ok(true)
}

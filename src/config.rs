use anyhow::Context;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::auth::{Credential, CredentialStore};
use crate::roster::{ActivityList, SignupPolicy};

pub const ACTIVITIES_FILE: &str = "activities.json";
pub const TEACHERS_FILE: &str = "teachers.json";

const CONFIG_DIR: &str = "activity-roster";
const BUILTIN_ACTIVITIES: &str = include_str!("../data/activities.json");

/// Contents of `teachers.json`. `Debug` output goes through
/// [`Credential`]'s redacting impl.
#[derive(Debug, Deserialize)]
pub struct TeachersFile {
    pub teachers: Vec<Credential>,
}

/// Startup configuration. Paths left as `None` fall back to the standard
/// search locations (see [`resolve_config_path`]).
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub activities_path: Option<PathBuf>,
    pub teachers_path: Option<PathBuf>,
    pub signup_policy: SignupPolicy,
}

/// Find a config file: explicit path, then
/// `$XDG_CONFIG_HOME/activity-roster/<file>`, then `./<file>`.
pub fn resolve_config_path(explicit: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    let xdg_home = env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    search_config_path(explicit, xdg_home.as_deref(), Path::new("."), file_name)
}

fn search_config_path(
    explicit: Option<&Path>,
    xdg_home: Option<&Path>,
    cwd: &Path,
    file_name: &str,
) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    if let Some(xdg) = xdg_home {
        let candidate = xdg.join(CONFIG_DIR).join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let candidate = cwd.join(file_name);
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

/// The catalog compiled into the binary.
pub fn builtin_activities() -> anyhow::Result<ActivityList> {
    let list: ActivityList = serde_json::from_str(BUILTIN_ACTIVITIES)
        .context("Built-in activity catalog is malformed")?;
    list.validate()
        .context("Built-in activity catalog is invalid")?;
    Ok(list)
}

pub fn load_activities(explicit: Option<&Path>) -> anyhow::Result<ActivityList> {
    let Some(path) = resolve_config_path(explicit, ACTIVITIES_FILE) else {
        info!("No {} found, using built-in catalog", ACTIVITIES_FILE);
        return builtin_activities();
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let list: ActivityList = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    list.validate()
        .with_context(|| format!("Invalid activity catalog in {}", path.display()))?;
    info!("Loaded {} activities from {}", list.len(), path.display());
    Ok(list)
}

pub fn load_credentials(explicit: Option<&Path>) -> anyhow::Result<CredentialStore> {
    let Some(path) = resolve_config_path(explicit, TEACHERS_FILE) else {
        warn!(
            "No {} found; teacher login is disabled until one is provided",
            TEACHERS_FILE
        );
        return Ok(CredentialStore::default());
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: TeachersFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let credentials = file.teachers.into_iter().map(|mut cred| {
        cred.secret = expand_env_vars(&cred.secret);
        cred
    });
    let store = CredentialStore::from_credentials(credentials)?;
    info!("Loaded {} teacher accounts from {}", store.len(), path.display());
    Ok(store)
}

/// Replace `${NAME}` with the value of environment variable `NAME`.
/// Unset variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Ok(val) = env::var(&name) {
                out.push_str(&val);
            } else {
                out.push_str("${");
                out.push_str(&name);
                out.push('}');
            }
        } else {
            out.push(ch);
        }
    }

    out
}

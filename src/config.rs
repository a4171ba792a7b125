//! Resolved configuration for the embed and deploy commands.
//!
//! CLI flags and environment overrides are folded into these types once, so
//! the core modules never look at argv or the environment themselves.
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default regex for the versioned bundle emitted by the front-end build.
pub const DEFAULT_BUNDLE_PATTERN: &str = r"^index-.+\.js$";

/// Fixed HTML entry file inside the build output directory.
pub const HTML_ENTRY: &str = "index.html";

pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_MANIFEST: &str = "dashboard.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Where the build output lives and how the bundle is picked out of it.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub project_root: PathBuf,
    pub dist_dir: PathBuf,
    pub bundle_pattern: Regex,
    /// Fail instead of warning when more than one bundle matches.
    pub strict: bool,
}

impl ProjectLayout {
    pub fn new(
        project_root: &Path,
        dist: Option<&Path>,
        bundle_pattern: Option<&str>,
        strict: bool,
    ) -> Result<Self> {
        let dist_dir = resolve_under(project_root, dist.unwrap_or(Path::new(DEFAULT_DIST_DIR)));
        let raw = bundle_pattern.unwrap_or(DEFAULT_BUNDLE_PATTERN);
        let bundle_pattern =
            Regex::new(raw).with_context(|| format!("parse bundle pattern {raw}"))?;
        Ok(Self {
            project_root: project_root.to_path_buf(),
            dist_dir,
            bundle_pattern,
            strict,
        })
    }

    pub fn html_entry_path(&self) -> PathBuf {
        self.dist_dir.join(HTML_ENTRY)
    }
}

/// Remote dashboarding service endpoint and transport options.
#[derive(Debug, Clone)]
pub struct DeployTarget {
    base_url: String,
    pub insecure: bool,
    pub timeout: Duration,
}

impl DeployTarget {
    /// Accepts a bare host (`dash.example.com`, `10.0.0.5:8443`) or a full
    /// base URL. Bare hosts are reached over https.
    pub fn new(server: &str, insecure: bool, timeout_secs: u64) -> Result<Self> {
        let server = server.trim().trim_end_matches('/');
        if server.is_empty() {
            return Err(anyhow!("server address is empty"));
        }
        let base_url = if server.contains("://") {
            server.to_string()
        } else {
            format!("https://{server}")
        };
        Ok(Self {
            base_url,
            insecure,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> String {
        format!("{}/api/v2/login", self.base_url)
    }

    pub fn dashboard_url(&self, name: &str) -> String {
        format!("{}/api/v2/dashboards/dashboard/{name}", self.base_url)
    }
}

/// Login payload for the remote service.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn resolve_under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Resolve the manifest path relative to the project root.
pub fn manifest_path(project_root: &Path, manifest: Option<&Path>) -> PathBuf {
    resolve_under(project_root, manifest.unwrap_or(Path::new(DEFAULT_MANIFEST)))
}

//! Failure taxonomy for packaging and deploying dashboards.
//!
//! Every variant is terminal for the operation that raised it. Variants carry
//! enough context (paths, captured output, HTTP status and body) to diagnose
//! a failure without re-running.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("no {wanted} found in {}", .dir.display())]
    ArtifactNotFound { dir: PathBuf, wanted: String },

    #[error("multiple bundle candidates in {}: {}", .dir.display(), .candidates.join(", "))]
    MultipleArtifactsFound {
        dir: PathBuf,
        candidates: Vec<String>,
    },

    #[error("read artifact {}: {reason}", .path.display())]
    ArtifactUnreadable { path: PathBuf, reason: String },

    #[error("load manifest {}: {reason}", .path.display())]
    ManifestLoadError { path: PathBuf, reason: String },

    #[error("write manifest {}: {source}", .path.display())]
    ManifestWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build command `{command}` failed ({}): {}", exit_label(.code), .stderr.trim())]
    BuildFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("login to {url} rejected with status {status}: {}", .body.trim())]
    AuthenticationFailed {
        url: String,
        status: u16,
        body: String,
    },

    #[error("publish to {url} rejected with status {status}: {}", .body.trim())]
    PublishFailed {
        url: String,
        status: u16,
        body: String,
    },

    #[error("{stage} request to {url} failed: {source}")]
    Transport {
        stage: &'static str,
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
}

impl DashError {
    /// Stable label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DashError::ArtifactNotFound { .. } => "artifact_not_found",
            DashError::MultipleArtifactsFound { .. } => "multiple_artifacts_found",
            DashError::ArtifactUnreadable { .. } => "artifact_unreadable",
            DashError::ManifestLoadError { .. } => "manifest_load_error",
            DashError::ManifestWriteError { .. } => "manifest_write_error",
            DashError::BuildFailed { .. } => "build_failed",
            DashError::AuthenticationFailed { .. } => "authentication_failed",
            DashError::PublishFailed { .. } => "publish_failed",
            DashError::Transport { .. } => "transport",
        }
    }

    pub(crate) fn manifest_load(path: &std::path::Path, reason: impl Into<String>) -> Self {
        DashError::ManifestLoadError {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn manifest_write(path: &std::path::Path, source: std::io::Error) -> Self {
        DashError::ManifestWriteError {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {code}"),
        None => "no exit code".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_failure_message_carries_stderr() {
        let err = DashError::BuildFailed {
            command: "npm run build".to_string(),
            code: Some(2),
            stderr: "  vite: not found\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "build command `npm run build` failed (exit 2): vite: not found"
        );
        assert_eq!(err.kind(), "build_failed");
    }

    #[test]
    fn auth_failure_message_carries_status_and_body() {
        let err = DashError::AuthenticationFailed {
            url: "https://dash.local/api/v2/login".to_string(),
            status: 401,
            body: "{\"error\":\"bad credentials\"}".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("401"));
        assert!(rendered.contains("bad credentials"));
        assert_eq!(err.kind(), "authentication_failed");
    }
}

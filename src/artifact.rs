//! Artifact locator and HTML transformer.
//!
//! Turns a build output directory into the two text blobs a dashboard
//! manifest embeds: the HTML shell, rewritten to load the canonical script
//! name, and the script bundle itself.
use crate::config::{ProjectLayout, HTML_ENTRY};
use crate::error::DashError;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Attachment name the HTML shell is embedded under.
pub const HTML_ATTACHMENT: &str = "index.html";
/// Attachment name the script bundle is embedded under.
pub const JS_ATTACHMENT: &str = "main.js";

/// HTML and script text ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedArtifact {
    html: String,
    js: String,
}

impl TransformedArtifact {
    pub fn new(html: String, js: String) -> Self {
        Self { html, js }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn js(&self) -> &str {
        &self.js
    }

    /// Attachments in embed order: HTML shell first, then the bundle.
    pub fn attachments(&self) -> [(&str, &str); 2] {
        [(HTML_ATTACHMENT, &self.html), (JS_ATTACHMENT, &self.js)]
    }
}

/// Locate and transform the build output described by `layout`.
pub fn load_artifact(layout: &ProjectLayout) -> Result<TransformedArtifact, DashError> {
    let bundle_path = locate_bundle(&layout.dist_dir, &layout.bundle_pattern, layout.strict)?;
    let html_path = locate_html(layout)?;
    tracing::info!(
        bundle = %bundle_path.display(),
        html = %html_path.display(),
        "located build artifacts"
    );

    let bundle_name = bundle_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| DashError::ArtifactUnreadable {
            path: bundle_path.clone(),
            reason: "bundle file name is not valid UTF-8".to_string(),
        })?;
    let html = read_text(&html_path)?;
    let js = read_text(&bundle_path)?;
    let html = rewrite_html(&html, bundle_name, JS_ATTACHMENT);
    Ok(TransformedArtifact::new(html, js))
}

/// Find the versioned script bundle in `dist_dir`.
///
/// Candidates are sorted by file name and the first one wins. More than one
/// candidate is logged as a warning, or rejected when `strict` is set.
pub fn locate_bundle(dist_dir: &Path, pattern: &Regex, strict: bool) -> Result<PathBuf, DashError> {
    let entries = match fs::read_dir(dist_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(DashError::ArtifactNotFound {
                dir: dist_dir.to_path_buf(),
                wanted: "build output directory".to_string(),
            });
        }
        Err(err) => {
            return Err(DashError::ArtifactUnreadable {
                path: dist_dir.to_path_buf(),
                reason: err.to_string(),
            });
        }
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| DashError::ArtifactUnreadable {
            path: dist_dir.to_path_buf(),
            reason: err.to_string(),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if pattern.is_match(name) {
            candidates.push(name.to_string());
        }
    }
    candidates.sort();

    let Some(first) = candidates.first() else {
        return Err(DashError::ArtifactNotFound {
            dir: dist_dir.to_path_buf(),
            wanted: format!("script bundle matching {}", pattern.as_str()),
        });
    };
    if candidates.len() > 1 {
        if strict {
            return Err(DashError::MultipleArtifactsFound {
                dir: dist_dir.to_path_buf(),
                candidates,
            });
        }
        tracing::warn!(
            selected = %first,
            candidates = ?candidates,
            "multiple bundle candidates found, using the first"
        );
    }
    Ok(dist_dir.join(first))
}

/// Path of the HTML entry file, which must exist.
pub fn locate_html(layout: &ProjectLayout) -> Result<PathBuf, DashError> {
    let path = layout.html_entry_path();
    if !path.is_file() {
        return Err(DashError::ArtifactNotFound {
            dir: layout.dist_dir.clone(),
            wanted: HTML_ENTRY.to_string(),
        });
    }
    Ok(path)
}

/// Point script references at `canonical` and drop stylesheet links.
///
/// A reference is the bundle name with any path prefix in front of it
/// (`/index-abc.js`, `./assets/index-abc.js`); the prefix goes too so no
/// stray separator is left behind.
pub fn rewrite_html(html: &str, bundle_name: &str, canonical: &str) -> String {
    let reference = Regex::new(&format!(
        r#"(^|["'\s=(])(?:[^"'\s=()<>]*/)?{}"#,
        regex::escape(bundle_name)
    ))
    .expect("regex for bundle reference");
    let rewritten = reference.replace_all(html, |caps: &regex::Captures<'_>| {
        format!("{}{canonical}", &caps[1])
    });

    let stylesheet =
        Regex::new(r"(?i)<link\b[^>]*\bstylesheet\b[^>]*>").expect("regex for stylesheet links");
    stylesheet.replace_all(&rewritten, "").into_owned()
}

fn read_text(path: &Path) -> Result<String, DashError> {
    let bytes = fs::read(path).map_err(|err| DashError::ArtifactUnreadable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|err| DashError::ArtifactUnreadable {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {err}"),
    })
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;

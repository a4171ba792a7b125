//! Deploy client: build, assemble, authenticate, publish.
//!
//! Stages run strictly in order and the first failure ends the run. Nothing
//! is retried and a half-finished remote publish is not rolled back.
pub mod session;
pub mod template;

use crate::artifact::{load_artifact, TransformedArtifact};
use crate::build::BuildCommand;
use crate::config::{Credentials, DeployTarget, ProjectLayout};
use crate::error::DashError;
use crate::manifest::{Manifest, ATTACHMENTS_KEY};
use serde_json::Value;
use session::Session;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStage {
    Build,
    Assemble,
    Authenticate,
    Publish,
}

impl DeployStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStage::Build => "build",
            DeployStage::Assemble => "assemble",
            DeployStage::Authenticate => "authenticate",
            DeployStage::Publish => "publish",
        }
    }
}

impl fmt::Display for DeployStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct DeployRequest {
    /// `None` skips the build stage.
    pub build: Option<BuildCommand>,
    pub layout: ProjectLayout,
    pub target: DeployTarget,
    pub credentials: Credentials,
    pub name: String,
    pub title: String,
    /// Stop after assembling; no network activity.
    pub dry_run: bool,
}

#[derive(Debug)]
pub enum DeployOutcome {
    Published { url: String, status: u16 },
    DryRun { manifest: Manifest },
}

/// Run the deploy state machine for one dashboard.
pub fn deploy(request: &DeployRequest) -> Result<DeployOutcome, DashError> {
    tracing::info!(
        server = request.target.base_url(),
        user = %request.credentials.user,
        name = %request.name,
        "starting deploy"
    );

    match &request.build {
        Some(build) => run_stage(DeployStage::Build, || build.run())?,
        None => tracing::info!(stage = %DeployStage::Build, "skipped"),
    }

    let manifest = run_stage(DeployStage::Assemble, || {
        let artifact = load_artifact(&request.layout)?;
        Ok(assemble(&request.name, &request.title, &artifact))
    })?;
    tracing::debug!(payload = %redacted_payload(&manifest), "assembled dashboard");
    eprintln!("Successfully created dashboard {}", request.name);

    if request.dry_run {
        return Ok(DeployOutcome::DryRun { manifest });
    }
    publish(&request.target, &request.credentials, &request.name, &manifest)
}

/// Dashboard template with the artifact embedded through the upsert engine.
pub fn assemble(name: &str, title: &str, artifact: &TransformedArtifact) -> Manifest {
    let mut manifest = template::dashboard_manifest(name, title);
    manifest.upsert(artifact.attachments());
    manifest
}

/// Log in and create-or-replace the dashboard.
///
/// The session lives only for the duration of this call and is released
/// whether login or upload succeeds or not.
pub fn publish(
    target: &DeployTarget,
    credentials: &Credentials,
    name: &str,
    manifest: &Manifest,
) -> Result<DeployOutcome, DashError> {
    let mut session = Session::open(target);
    eprintln!("Logging into the server {}", target.base_url());
    run_stage(DeployStage::Authenticate, || session.login(credentials))?;
    eprintln!("Uploading the dashboard...");
    let reply = run_stage(DeployStage::Publish, || session.publish(name, manifest))?;
    Ok(DeployOutcome::Published {
        url: target.dashboard_url(name),
        status: reply.status,
    })
}

fn run_stage<T>(
    stage: DeployStage,
    body: impl FnOnce() -> Result<T, DashError>,
) -> Result<T, DashError> {
    tracing::debug!(stage = %stage, "stage started");
    let result = body();
    match &result {
        Ok(_) => tracing::info!(stage = %stage, "stage complete"),
        Err(err) => tracing::error!(stage = %stage, kind = err.kind(), "stage failed"),
    }
    result
}

/// Manifest JSON with attachment bodies replaced by their sizes.
fn redacted_payload(manifest: &Manifest) -> Value {
    let mut value = manifest.clone().into_value();
    if let Some(list) = value.get_mut(ATTACHMENTS_KEY).and_then(Value::as_array_mut) {
        for entry in list.iter_mut().filter_map(Value::as_object_mut) {
            if let Some(Value::String(text)) = entry.get("value") {
                let elided = format!("<{} chars>", text.chars().count());
                entry.insert("value".to_string(), Value::String(elided));
            }
        }
    }
    value
}

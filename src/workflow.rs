//! Command drivers wiring build, transform, and persist or deploy.
use crate::artifact::{self, TransformedArtifact, HTML_ATTACHMENT, JS_ATTACHMENT};
use crate::build::BuildCommand;
use crate::cli::{BundleArgs, DeployArgs, EmbedArgs};
use crate::config::{self, Credentials, DeployTarget, ProjectLayout};
use crate::deploy::{self, DeployOutcome, DeployRequest};
use crate::manifest::Manifest;
use anyhow::{Context, Result};
use std::path::Path;

/// Build the UI, then upsert its artifacts into the manifest file.
pub fn run_embed(args: EmbedArgs) -> Result<()> {
    let layout = resolve_layout(&args.bundle)?;
    let manifest_path = config::manifest_path(&layout.project_root, args.manifest.as_deref());

    if let Some(build) = resolve_build(&args.bundle, &layout.project_root)? {
        build.run()?;
    }
    let artifact = artifact::load_artifact(&layout).context("read build output")?;
    let manifest = embed_into(&manifest_path, &artifact)?;

    let summary = manifest.summary();
    let chars = |name: &str| {
        summary
            .iter()
            .find(|entry| entry.name == name)
            .map_or(0, |entry| entry.chars)
    };
    println!("Updated {}", manifest_path.display());
    println!("  - HTML content: {} characters", chars(HTML_ATTACHMENT));
    println!("  - JS content: {} characters", chars(JS_ATTACHMENT));
    println!("  - Total attachments: {}", manifest.attachment_count());
    Ok(())
}

/// Load, upsert, and atomically rewrite the manifest at `path`.
pub fn embed_into(path: &Path, artifact: &TransformedArtifact) -> Result<Manifest> {
    let mut manifest = Manifest::load(path)?;
    manifest.upsert(artifact.attachments());
    manifest.persist(path)?;
    Ok(manifest)
}

/// Build, assemble, and publish a dashboard.
pub fn run_deploy(args: DeployArgs) -> Result<()> {
    let layout = resolve_layout(&args.bundle)?;
    let build = resolve_build(&args.bundle, &layout.project_root)?;
    let target = DeployTarget::new(&args.server, args.insecure, args.timeout_secs)?;
    let request = DeployRequest {
        build,
        layout,
        target,
        credentials: Credentials {
            user: args.user,
            password: args.password,
        },
        name: args.name,
        title: args.title,
        dry_run: args.dry_run,
    };

    match deploy::deploy(&request)? {
        DeployOutcome::Published { url, status } => {
            println!("Successfully uploaded the dashboard to {url} (status {status})");
        }
        DeployOutcome::DryRun { manifest } => {
            let text = manifest.render().context("render dashboard")?;
            print!("{text}");
        }
    }
    Ok(())
}

fn resolve_layout(args: &BundleArgs) -> Result<ProjectLayout> {
    ProjectLayout::new(
        &args.project,
        args.dist.as_deref(),
        args.js_pattern.as_deref(),
        args.strict,
    )
}

fn resolve_build(args: &BundleArgs, project_root: &Path) -> Result<Option<BuildCommand>> {
    if args.skip_build {
        tracing::info!("build skipped");
        return Ok(None);
    }
    BuildCommand::resolve(args.build_cmd.as_deref(), project_root).map(Some)
}

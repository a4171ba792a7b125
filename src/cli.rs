//! CLI argument parsing for the embed and deploy commands.
//!
//! The CLI stays thin: it only collects flags. Resolution into layouts,
//! targets, and build commands happens in `workflow`.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "dashpack",
    version,
    about = "Embed front-end bundles into dashboard manifests and publish them",
    after_help = "Commands:\n  embed                          Build and upsert index.html/main.js into dashboard.json\n  deploy -s -u -p -n -t          Build, assemble, log in, and create-or-replace a dashboard\n\nExamples:\n  dashpack embed --project ./network_topology\n  dashpack embed --skip-build --manifest ./dashboard.json\n  dashpack deploy -s 10.0.0.5 -u admin -p secret -n topology -t \"Network Topology\"",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Embed(EmbedArgs),
    Deploy(DeployArgs),
}

/// Where the front-end project lives and how its build output is read.
#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    /// Front-end project root; the build runs here
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,

    /// Build output directory, relative to the project root
    #[arg(long, value_name = "DIR")]
    pub dist: Option<PathBuf>,

    /// Build command (defaults to $DASHPACK_BUILD_COMMAND, then `npm run build`)
    #[arg(long, value_name = "CMD")]
    pub build_cmd: Option<String>,

    /// Use the existing build output without running the build
    #[arg(long)]
    pub skip_build: bool,

    /// Regex selecting the script bundle by file name
    #[arg(long, value_name = "REGEX")]
    pub js_pattern: Option<String>,

    /// Fail when more than one bundle matches instead of using the first
    #[arg(long)]
    pub strict: bool,
}

/// Embed command inputs: upsert the build output into a manifest file.
#[derive(Parser, Debug)]
#[command(about = "Build the UI and embed it into a dashboard manifest")]
pub struct EmbedArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Manifest to update, relative to the project root
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,
}

/// Deploy command inputs: publish a dashboard to a remote server.
#[derive(Parser, Debug)]
#[command(about = "Build the UI and publish it as a dashboard")]
pub struct DeployArgs {
    /// Server address (host[:port] or a full base URL)
    #[arg(short, long)]
    pub server: String,

    /// Username on the server
    #[arg(short, long)]
    pub user: String,

    /// Password on the server
    #[arg(short, long)]
    pub password: String,

    /// Dashboard name; the remote resource is keyed by it
    #[arg(short, long)]
    pub name: String,

    /// Dashboard title
    #[arg(short, long)]
    pub title: String,

    /// Skip TLS certificate verification (self-signed servers)
    #[arg(long)]
    pub insecure: bool,

    /// Overall timeout for each HTTP request, in seconds
    #[arg(long, value_name = "SECS", default_value_t = crate::config::DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Print the assembled dashboard and stop before logging in
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub bundle: BundleArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn deploy_requires_every_connection_flag() {
        let err = RootArgs::try_parse_from(["dashpack", "deploy", "-s", "host", "-u", "admin"])
            .expect_err("missing flags");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn deploy_parses_short_flags() {
        let args = RootArgs::try_parse_from([
            "dashpack", "deploy", "-s", "10.0.0.5", "-u", "admin", "-p", "pw", "-n", "net", "-t",
            "Net", "--insecure", "--skip-build",
        ])
        .expect("parse");
        let Command::Deploy(deploy) = args.command else {
            panic!("expected deploy");
        };
        assert_eq!(deploy.server, "10.0.0.5");
        assert_eq!(deploy.title, "Net");
        assert!(deploy.insecure);
        assert!(deploy.bundle.skip_build);
        assert_eq!(deploy.timeout_secs, crate::config::DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn embed_defaults_to_current_project() {
        let args = RootArgs::try_parse_from(["dashpack", "embed"]).expect("parse");
        let Command::Embed(embed) = args.command else {
            panic!("expected embed");
        };
        assert_eq!(embed.bundle.project, PathBuf::from("."));
        assert!(embed.manifest.is_none());
    }
}

//! Authenticated HTTP session against the dashboarding service.
//!
//! A `Session` owns the ureq agent (connection pool and cookie jar). Dropping
//! it releases both, so holding it in a scope guarantees release on every
//! exit path.
use crate::config::{Credentials, DeployTarget};
use crate::error::DashError;
use crate::manifest::Manifest;
use serde::Serialize;
use ureq::tls::TlsConfig;
use ureq::Agent;

#[derive(Serialize)]
struct LoginRequest<'a> {
    user: &'a str,
    password: &'a str,
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct Session {
    agent: Agent,
    target: DeployTarget,
    authenticated: bool,
}

impl Session {
    pub fn open(target: &DeployTarget) -> Self {
        if target.insecure {
            tracing::warn!(server = target.base_url(), "TLS certificate verification disabled");
        }
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(target.timeout))
            .tls_config(
                TlsConfig::builder()
                    .disable_verification(target.insecure)
                    .build(),
            )
            .build();
        tracing::debug!(server = target.base_url(), "session opened");
        Self {
            agent: Agent::new_with_config(config),
            target: target.clone(),
            authenticated: false,
        }
    }

    /// Submit credentials to the login endpoint.
    pub fn login(&mut self, credentials: &Credentials) -> Result<Reply, DashError> {
        let url = self.target.login_url();
        tracing::info!(url = %url, user = %credentials.user, "logging in");
        let payload = LoginRequest {
            user: &credentials.user,
            password: &credentials.password,
        };
        let response = self
            .agent
            .post(url.as_str())
            .header("accept", "application/json")
            .send_json(&payload)
            .map_err(|err| transport("login", &url, err))?;
        let reply = read_reply(response);
        if !reply.is_success() {
            return Err(DashError::AuthenticationFailed {
                url,
                status: reply.status,
                body: reply.body,
            });
        }
        self.authenticated = true;
        Ok(reply)
    }

    /// Create or replace the dashboard keyed by `name`.
    pub fn publish(&self, name: &str, manifest: &Manifest) -> Result<Reply, DashError> {
        let url = self.target.dashboard_url(name);
        tracing::info!(url = %url, attachments = manifest.attachment_count(), "uploading dashboard");
        let response = self
            .agent
            .put(url.as_str())
            .header("accept", "application/json")
            .send_json(manifest.as_map())
            .map_err(|err| transport("publish", &url, err))?;
        let reply = read_reply(response);
        if !reply.is_success() {
            return Err(DashError::PublishFailed {
                url,
                status: reply.status,
                body: reply.body,
            });
        }
        Ok(reply)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!(
            server = self.target.base_url(),
            authenticated = self.authenticated,
            "session closed"
        );
    }
}

fn read_reply(mut response: ureq::http::Response<ureq::Body>) -> Reply {
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .unwrap_or_else(|err| format!("<unreadable response body: {err}>"));
    Reply { status, body }
}

fn transport(stage: &'static str, url: &str, err: ureq::Error) -> DashError {
    DashError::Transport {
        stage,
        url: url.to_string(),
        source: Box::new(err),
    }
}

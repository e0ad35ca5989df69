//! HTTP transport for the oracle's agent seam.
//!
//! Each agent owns its own reqwest client bound to one host
//! (`{tenant}.{domain}` or `admin.{domain}`) and a pre-minted session
//! cookie. Requests are never retried; any transport failure is reported to
//! the oracle as is.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::multipart;
use reqwest::Client;
use url::Url;

use rankcheck_core::{
    AccountProvider, Agent, Method, Operation, RawResponse, RequestBody, Role, TransportError,
    ADMIN_TENANT,
};

use crate::token::{TokenMinter, SESSION_COOKIE};

/// Where the platform lives.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    /// Scheme and port for every request; the host is replaced per agent.
    pub base: Url,
    /// Parent domain of tenant hosts.
    pub domain: String,
    /// Pin every platform host to this address instead of resolving it.
    pub resolve: Option<SocketAddr>,
    pub timeout: Duration,
}

impl HttpTarget {
    pub fn host_for(&self, role: Role, tenant: &str) -> String {
        match role {
            Role::Admin => format!("{ADMIN_TENANT}.{}", self.domain),
            Role::Organizer | Role::Player => format!("{tenant}.{}", self.domain),
        }
    }
}

pub struct HttpProvider {
    target: HttpTarget,
    minter: Arc<TokenMinter>,
}

impl HttpProvider {
    pub fn new(target: HttpTarget, minter: TokenMinter) -> Self {
        Self {
            target,
            minter: Arc::new(minter),
        }
    }
}

#[async_trait]
impl AccountProvider for HttpProvider {
    async fn agent(&self, role: Role, tenant: &str, identity: &str) -> Result<Arc<dyn Agent>> {
        let host = self.target.host_for(role, tenant);
        let mut base = self.target.base.clone();
        base.set_host(Some(&host))
            .with_context(|| format!("invalid platform host {host}"))?;

        let mut builder = Client::builder().timeout(self.target.timeout);
        if let Some(addr) = self.target.resolve {
            builder = builder.resolve(&host, addr);
        }
        let client = builder.build().context("failed to build HTTP client")?;
        let token = self.minter.mint(role, tenant, identity)?;

        tracing::debug!(%role, host = %host, identity, "provisioned http agent");
        Ok(Arc::new(HttpAgent {
            client,
            base,
            role,
            cookie: format!("{SESSION_COOKIE}={token}"),
        }))
    }
}

/// One authenticated session against one platform host.
pub struct HttpAgent {
    client: Client,
    base: Url,
    role: Role,
    cookie: String,
}

#[async_trait]
impl Agent for HttpAgent {
    fn role(&self) -> Role {
        self.role
    }

    async fn send(&self, op: &Operation) -> Result<RawResponse, TransportError> {
        let label = op.label();
        let url = endpoint(&self.base, op)?;
        let request = match op.method() {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        }
        .header(COOKIE, &self.cookie);

        let request = match op.body() {
            RequestBody::Empty => request,
            RequestBody::Form(pairs) => request.form(&pairs),
            RequestBody::File {
                field,
                file_name,
                content,
            } => {
                let part = multipart::Part::text(content)
                    .file_name(file_name)
                    .mime_str("text/csv")
                    .map_err(|e| TransportError::new(label, e))?;
                request.multipart(multipart::Form::new().part(field, part))
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::new(label, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(label, format!("reading body: {e}")))?;
        tracing::trace!(op = label, status, bytes = body.len(), "platform response");
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

/// `base` with the operation's escaped path and query.
pub fn endpoint(base: &Url, op: &Operation) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TransportError::new(op.label(), format!("{base} cannot carry a path")))?
        .clear()
        .extend(op.path_segments());
    let query = op.query();
    url.set_query(None);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

//! PostgREST-style HTTP backend
//!
//! Filters render as query parameters (`col=eq.v`, `col=ilike.*v*`,
//! `or=(a.ilike.*x*,b.ilike.*y*)`). Requests are blocking `ureq` calls moved
//! onto tokio's blocking pool.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info};

use super::{value_text, Filter, Query, RemoteStore, Row};
use crate::config::RemoteSettings;
use crate::domain::UserIdentity;
use crate::error::{Error, Result};

/// Authenticated session returned by the auth endpoint
#[derive(Debug, Clone)]
pub struct RestSession {
    pub user: UserIdentity,
    pub access_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct RestRemote {
    base_url: String,
    anon_key: String,
    agent: ureq::Agent,
    session: Arc<Mutex<Option<RestSession>>>,
    auth: watch::Sender<Option<UserIdentity>>,
}

impl RestRemote {
    pub fn new(settings: &RemoteSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build();
        let (auth, _) = watch::channel(None);
        Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
            agent,
            session: Arc::new(Mutex::new(None)),
            auth,
        }
    }

    /// Reuse a session persisted by an earlier run
    pub fn restore_session(&self, session: RestSession) {
        let user = session.user.clone();
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session);
        self.auth.send_replace(Some(user));
    }

    pub fn session(&self) -> Option<RestSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Password sign-in against the auth endpoint
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<RestSession> {
        let url = format!("{}/auth/v1/token", self.base_url);
        let body = json!({ "email": email, "password": password });
        let request = self
            .agent
            .post(&url)
            .query("grant_type", "password")
            .set("apikey", &self.anon_key)
            .set("Content-Type", "application/json");

        let value = blocking(move || send(request, Some(body))).await?;
        let token: TokenResponse = serde_json::from_value(value)
            .map_err(|e| Error::RemoteUnavailable(format!("malformed auth response: {e}")))?;

        let session = RestSession {
            user: UserIdentity {
                id: token.user.id,
                email: token.user.email.unwrap_or_else(|| email.to_string()),
            },
            access_token: token.access_token,
        };
        info!(email = %session.user.email, "signed in");
        self.restore_session(session.clone());
        Ok(session)
    }

    /// End the session locally; the server-side logout is best effort
    pub async fn sign_out(&self) -> Result<()> {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.auth.send_replace(None);

        if let Some(session) = previous {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let request = self
                .agent
                .post(&url)
                .set("apikey", &self.anon_key)
                .set("Authorization", &format!("Bearer {}", session.access_token));
            if let Err(e) = blocking(move || send(request, None)).await {
                debug!(error = %e, "server-side logout failed");
            }
        }
        Ok(())
    }

    fn request(&self, method: &str, query: &Query) -> ureq::Request {
        let url = format!("{}/rest/v1/{}", self.base_url, query.table);
        let bearer = self
            .session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone());

        let mut request = self
            .agent
            .request(method, &url)
            .set("apikey", &self.anon_key)
            .set("Authorization", &format!("Bearer {bearer}"))
            .set("Prefer", "return=representation");
        for (key, value) in render_filters(&query.filters) {
            request = request.query(&key, &value);
        }
        if let Some(limit) = query.limit {
            request = request.query("limit", &limit.to_string());
        }
        request
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn select(&self, query: &Query) -> Result<Vec<Row>> {
        let request = self.request("GET", query).query("select", "*");
        rows(blocking(move || send(request, None)).await?)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        let request = self.request("POST", &Query::from(table));
        let body = Value::Array(vec![Value::Object(row)]);
        rows(blocking(move || send(request, Some(body))).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::RemoteUnavailable("insert returned no row".to_string()))
    }

    async fn update(&self, query: &Query, patch: Row) -> Result<Vec<Row>> {
        let request = self.request("PATCH", query);
        rows(blocking(move || send(request, Some(Value::Object(patch)))).await?)
    }

    async fn delete(&self, query: &Query) -> Result<usize> {
        let request = self.request("DELETE", query);
        Ok(rows(blocking(move || send(request, None)).await?)?.len())
    }

    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        Ok(self.session().map(|s| s.user))
    }

    fn subscribe_auth(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.auth.subscribe()
    }
}

/// Render filters as `(key, value)` query parameters
fn render_filters(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq(column, value) => (column.clone(), format!("eq.{}", value_text(value))),
            Filter::ILike(column, needle) => (column.clone(), format!("ilike.*{needle}*")),
            Filter::Or(nested) => {
                let parts: Vec<String> = nested.iter().map(render_nested).collect();
                ("or".to_string(), format!("({})", parts.join(",")))
            }
        })
        .collect()
}

/// Nested filters use `column.op.value`, with reserved characters quoted
fn render_nested(filter: &Filter) -> String {
    match filter {
        Filter::Eq(column, value) => format!("{column}.eq.{}", quote(&value_text(value))),
        Filter::ILike(column, needle) => format!("{column}.ilike.{}", quote(&format!("*{needle}*"))),
        Filter::Or(nested) => {
            let parts: Vec<String> = nested.iter().map(render_nested).collect();
            format!("or({})", parts.join(","))
        }
    }
}

fn quote(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ':']) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

fn rows(value: Value) -> Result<Vec<Row>> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::RemoteUnavailable(format!(
            "expected row array, got {other}"
        ))),
    }
}

fn send(request: ureq::Request, body: Option<Value>) -> Result<Value> {
    let response = match body {
        Some(body) => request
            .set("Content-Type", "application/json")
            .send_string(&body.to_string()),
        None => request.call(),
    };
    let response = response.map_err(|e| match e {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            Error::RemoteUnavailable(format!("HTTP {code}: {}", body.trim()))
        }
        other => Error::RemoteUnavailable(other.to_string()),
    })?;

    let body = response
        .into_string()
        .map_err(|e| Error::RemoteUnavailable(format!("failed to read body: {e}")))?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| Error::RemoteUnavailable(format!("malformed response: {e}")))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::RemoteUnavailable(format!("request task failed: {e}")))?
}

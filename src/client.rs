//! Typed HTTP client for the DNA Center intent API.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::DnacConfig;
use crate::domain::ports::DnacApi;
use crate::domain::types::{DeviceDetail, DeviceSummary, Envelope, TaskHandle, TaskStatus};
use crate::error::DnacError;

const AUTH_PATH: &str = "/dna/system/api/v1/auth/token";
const DEVICE_PATH: &str = "/dna/intent/api/v1/network-device";
const UNPROVISION_PATH: &str = "/dna/intent/api/v1/networkDevices/unprovision";
const TASK_PATH: &str = "/dna/intent/api/v1/task";
const TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Deserialize)]
struct AuthToken {
    #[serde(rename = "Token")]
    token: String,
}

/// Authenticated session. Shared read-only for the whole run.
pub struct DnacClient {
    base_url: String,
    http: Client,
    token: String,
}

impl DnacClient {
    /// Build the HTTP client and exchange credentials for a session token.
    pub async fn connect(config: &DnacConfig) -> Result<Self, DnacError> {
        let base_url = normalize_base_url(&config.host);
        let http = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|source| DnacError::Connect {
                url: base_url.clone(),
                source,
            })?;

        let url = format!("{}{}", base_url, AUTH_PATH);
        let resp = http
            .post(&url)
            .basic_auth(&config.username, Some(&config.password))
            .send()
            .await
            .map_err(|source| DnacError::Connect {
                url: url.clone(),
                source,
            })?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(DnacError::Auth(format!(
                    "{} rejected the credentials for '{}' ({})",
                    base_url,
                    config.username,
                    resp.status()
                )));
            }
            status if !status.is_success() => {
                return Err(DnacError::Status {
                    method: "POST",
                    url,
                    status,
                    body: resp.text().await.unwrap_or_default(),
                });
            }
            _ => {}
        }

        let auth: AuthToken = resp
            .json()
            .await
            .map_err(|source| DnacError::Decode {
                url: url.clone(),
                source,
            })?;
        if auth.token.is_empty() {
            return Err(DnacError::Auth(format!("{} returned an empty token", url)));
        }

        debug!(base_url = %base_url, "authenticated against DNAC");
        Ok(Self {
            base_url,
            http,
            token: auth.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Internal helpers ───────────────────────────────────

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &'static str,
        url: String,
        request: RequestBuilder,
    ) -> Result<T, DnacError> {
        debug!(method, url = %url, "DNAC request");
        let resp = request
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|source| DnacError::Connect {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DnacError::Status {
                method,
                url,
                status,
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|source| DnacError::Decode { url, source })?;
        Ok(envelope.response)
    }
}

impl DnacApi for DnacClient {
    async fn devices_by_hostname(&self, hostname: &str) -> Result<Vec<DeviceSummary>, DnacError> {
        let url = format!("{}{}", self.base_url, DEVICE_PATH);
        let request = self.http.get(&url).query(&[("hostname", hostname)]);
        self.execute("GET", url, request).await
    }

    async fn device(&self, id: &str) -> Result<DeviceDetail, DnacError> {
        let url = format!("{}{}/{}", self.base_url, DEVICE_PATH, id);
        let request = self.http.get(&url);
        self.execute("GET", url, request).await
    }

    async fn unprovision(&self, ids: &[String]) -> Result<TaskHandle, DnacError> {
        let url = format!("{}{}", self.base_url, UNPROVISION_PATH);
        let request = self
            .http
            .post(&url)
            .json(&json!({ "networkDeviceIds": ids }));
        self.execute("POST", url, request).await
    }

    async fn delete_device(&self, id: &str, clean_config: bool) -> Result<TaskHandle, DnacError> {
        let url = format!("{}{}/{}", self.base_url, DEVICE_PATH, id);
        let request = self
            .http
            .delete(&url)
            .query(&[("cleanConfig", clean_config)]);
        self.execute("DELETE", url, request).await
    }

    async fn task(&self, task_id: &str) -> Result<TaskStatus, DnacError> {
        let url = format!("{}{}/{}", self.base_url, TASK_PATH, task_id);
        let request = self.http.get(&url);
        self.execute("GET", url, request).await
    }
}

/// Bare hostnames get an `https://` scheme; trailing slashes are dropped.
fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

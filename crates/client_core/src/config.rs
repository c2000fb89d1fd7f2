use std::time::Duration;

use url::Url;

use crate::error::BackendError;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the hosted backend, built once at startup and
/// handed to [`crate::RestBackend::new`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    base_url: Url,
    anon_key: String,
    request_timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: &str, anon_key: impl Into<String>) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Validation(format!(
                "backend url '{base_url}' cannot carry paths"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(BackendError::Validation("anon key must not be empty".into()));
        }

        Ok(Self {
            base_url,
            anon_key,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn auth_url(&self, endpoint: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(&format!("auth/v1/{endpoint}"))?)
    }

    pub fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(&format!("rest/v1/{table}"))?)
    }

    pub fn rpc_url(&self, function: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(&format!("rest/v1/rpc/{function}"))?)
    }
}

use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_SUPPORT_EMAIL: &str = "support@cos.io";
pub const PRIVATE_LINK_PATH: &str = "private_link/";

/// Where the controller reads the hierarchy from and where it submits links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub source_url: Url,
    pub endpoint_url: Url,
    pub support_email: String,
}

impl ControllerConfig {
    pub fn new(source_url: &str, endpoint_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            source_url: parse_http_url("source_url", source_url)?,
            endpoint_url: parse_http_url("endpoint_url", endpoint_url)?,
            support_email: DEFAULT_SUPPORT_EMAIL.to_string(),
        })
    }

    /// Derives the submission endpoint as `<node_api_url>/private_link/`.
    pub fn for_node_api(source_url: &str, node_api_url: &str) -> Result<Self, ConfigError> {
        let mut base = parse_http_url("node_api_url", node_api_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint_url = base
            .join(PRIVATE_LINK_PATH)
            .map_err(|source| ConfigError::InvalidUrl {
                field: "node_api_url",
                value: node_api_url.to_string(),
                source,
            })?;

        Ok(Self {
            source_url: parse_http_url("source_url", source_url)?,
            endpoint_url,
            support_email: DEFAULT_SUPPORT_EMAIL.to_string(),
        })
    }

    pub fn with_support_email(mut self, support_email: impl Into<String>) -> Self {
        self.support_email = support_email.into();
        self
    }

    pub fn fetch_failed_message(&self) -> String {
        format!(
            "Could not retrieve projects. Please refresh the page or contact {} if the problem persists.",
            self.support_email
        )
    }
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme {
            field,
            scheme: scheme.to_string(),
        }),
    }
}

//! InfluxDB v2 writer.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;

/// Where and as whom to write.
#[derive(Debug, Clone)]
pub(crate) struct InfluxConfig {
    pub server: String,
    pub port: u16,
    pub org: String,
    pub bucket: String,
    pub token: String,
}

impl InfluxConfig {
    pub(crate) fn write_url(&self) -> String {
        format!("http://{}:{}/api/v2/write", self.server, self.port)
    }
}

#[derive(Debug)]
pub(crate) enum ExportError {
    /// Client construction or transport failure.
    Http(reqwest::Error),
    /// The server answered with a non-success status.
    Rejected { status: StatusCode, body: String },
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Http(e) => write!(f, "influx request failed: {}", e),
            ExportError::Rejected { status, body } => {
                write!(f, "influx rejected write ({}): {}", status, body.trim())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Http(e) => Some(e),
            ExportError::Rejected { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(e: reqwest::Error) -> Self {
        ExportError::Http(e)
    }
}

pub(crate) struct InfluxWriter {
    client: Client,
    config: InfluxConfig,
    url: String,
}

impl InfluxWriter {
    pub(crate) fn new(config: InfluxConfig) -> Result<Self, ExportError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let url = config.write_url();
        Ok(Self {
            client,
            config,
            url,
        })
    }

    /// Posts one batch of line-protocol lines with second precision.
    pub(crate) fn write(&self, lines: &[String]) -> Result<(), ExportError> {
        if lines.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(&self.url)
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "s"),
            ])
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(lines.join("\n"))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExportError::Rejected { status, body });
        }
        debug!(lines = lines.len(), "wrote to influx");
        Ok(())
    }
}

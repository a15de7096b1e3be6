//! ExportClient: downloads label exports from the print service's HTTP API.
//!
//! The print service publishes its stored labels on `api.port` of the same
//! host as the TCP print port:
//!
//! ```text
//! GET /api/export/auftrag/{order}[/pos/{position}]        → CSV
//! GET /api/export/auftrag/{order}[/pos/{position}]/json   → JSON
//! GET /api/export/range?startBarcode=..&endBarcode=..      → CSV
//! GET /api/export/range/json?startBarcode=..&endBarcode=.. → JSON
//! ```
//!
//! A `200` body is written to `export_folder/export_<yyyyMMdd_HHmmss>.<ext>`;
//! the folder is created when missing.  `404` is reported separately from
//! other failures because it means "no such data", not a broken service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::infrastructure::storage::config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export request: {0}")]
    InvalidRequest(String),

    /// The API has no data for the requested order, position or range.
    #[error("export data not found (HTTP 404)")]
    NotFound,

    #[error("export API returned HTTP {0}")]
    Status(u16),

    #[error("export API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not write export file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File format requested from the export API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// What to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRequest {
    /// All labels of one order, optionally narrowed to one position.
    Order {
        order: String,
        position: Option<String>,
    },
    /// All labels whose barcode lies between `start` and `end`.
    Range { start: String, end: String },
}

impl ExportRequest {
    /// Rejects requests with blank identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidRequest`] naming the missing field.
    pub fn validate(&self) -> Result<(), ExportError> {
        match self {
            Self::Order { order, position } => {
                if order.trim().is_empty() {
                    return Err(ExportError::InvalidRequest(
                        "order number is required".into(),
                    ));
                }
                if position.as_deref().is_some_and(|p| p.trim().is_empty()) {
                    return Err(ExportError::InvalidRequest(
                        "position must not be blank".into(),
                    ));
                }
            }
            Self::Range { start, end } => {
                if start.trim().is_empty() || end.trim().is_empty() {
                    return Err(ExportError::InvalidRequest(
                        "both start and end barcode are required".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn path_segments(&self, format: ExportFormat) -> Vec<&str> {
        let mut segments = vec!["api", "export"];
        match self {
            Self::Order { order, position } => {
                segments.extend(["auftrag", order.trim()]);
                if let Some(position) = position {
                    segments.extend(["pos", position.trim()]);
                }
            }
            Self::Range { .. } => segments.push("range"),
        }
        if format == ExportFormat::Json {
            segments.push("json");
        }
        segments
    }
}

/// HTTP client for the export API.
#[derive(Debug, Clone)]
pub struct ExportClient {
    http: Client,
    base_url: Url,
    export_folder: PathBuf,
}

impl ExportClient {
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidRequest`] when `host` does not form a
    /// valid URL, or [`ExportError::Http`] when the HTTP client cannot be built.
    pub fn new(
        host: &str,
        port: u16,
        export_folder: impl Into<PathBuf>,
    ) -> Result<Self, ExportError> {
        let base_url = Url::parse(&format!("http://{host}:{port}/")).map_err(|e| {
            ExportError::InvalidRequest(format!("bad API address {host}:{port}: {e}"))
        })?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url,
            export_folder: export_folder.into(),
        })
    }

    /// Builds a client for `[server] host`, `[api] port` and `[api] export_folder`.
    ///
    /// # Errors
    ///
    /// See [`ExportClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ExportError> {
        Self::new(&config.server.host, config.api.port, config.api.export_folder.clone())
    }

    pub fn export_folder(&self) -> &Path {
        &self.export_folder
    }

    /// The full URL requested for `request` in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidRequest`] for a request that fails
    /// [`ExportRequest::validate`].
    pub fn url_for(
        &self,
        request: &ExportRequest,
        format: ExportFormat,
    ) -> Result<Url, ExportError> {
        request.validate()?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExportError::InvalidRequest("API address cannot carry a path".into()))?
            .pop_if_empty()
            .extend(request.path_segments(format));

        if let ExportRequest::Range { start, end } = request {
            url.query_pairs_mut()
                .append_pair("startBarcode", start.trim())
                .append_pair("endBarcode", end.trim());
        }
        Ok(url)
    }

    /// Downloads one export and saves it, returning the written file's path.
    ///
    /// # Errors
    ///
    /// - [`ExportError::NotFound`] when the API answers `404`.
    /// - [`ExportError::Status`] for any other non-`200` status.
    /// - [`ExportError::Http`] for connection or body errors.
    /// - [`ExportError::Io`] when the folder or file cannot be written.
    pub async fn export(
        &self,
        request: &ExportRequest,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        let url = self.url_for(request, format)?;
        info!(%url, "requesting export");

        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                warn!("export data not found (404)");
                return Err(ExportError::NotFound);
            }
            status => {
                error!("export API error: {status}");
                return Err(ExportError::Status(status.as_u16()));
            }
        }

        let body = response.text().await?;
        let path = save_export(&self.export_folder, &body, format, Local::now().naive_local())?;
        info!(path = %path.display(), bytes = body.len(), "export saved");
        Ok(path)
    }
}

/// `export_<yyyyMMdd_HHmmss>.<ext>`
pub fn export_file_name(at: NaiveDateTime, format: ExportFormat) -> String {
    format!("export_{}.{}", at.format("%Y%m%d_%H%M%S"), format.extension())
}

/// Writes `content` into `folder`, creating the folder when missing.
///
/// # Errors
///
/// Returns [`ExportError::Io`] for file-system failures.
pub fn save_export(
    folder: &Path,
    content: &str,
    format: ExportFormat,
    at: NaiveDateTime,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(folder).map_err(|source| ExportError::Io {
        path: folder.to_path_buf(),
        source,
    })?;

    let path = folder.join(export_file_name(at, format));
    std::fs::write(&path, content).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

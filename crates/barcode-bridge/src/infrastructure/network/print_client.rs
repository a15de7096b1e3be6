//! TcpPrintClient: forwards barcodes to the print service over plain TCP.
//!
//! The wire exchange is one request per connection:
//!
//! ```text
//! client                               print service
//! ──────                               ─────────────
//! connect(host:port)
//! "<barcode>\n"            ──────►
//!                          ◄──────     "<response line>\n"
//! close
//! ```
//!
//! Connecting and waiting for the response are each bounded by a timeout.

use std::time::Duration;

use async_trait::async_trait;
use barcode_core::Barcode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::application::forward_barcodes::{BarcodeForwarder, ForwardError, PrintResponse};
use crate::infrastructure::storage::config::ServerConfig;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Print service client.
#[derive(Debug, Clone)]
pub struct TcpPrintClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl TcpPrintClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Builds a client from the `[server]` config section.
    pub fn from_config(server: &ServerConfig) -> Self {
        Self::new(server.host.clone(), server.port).with_timeouts(
            Duration::from_millis(server.connect_timeout_ms),
            Duration::from_millis(server.response_timeout_ms),
        )
    }

    pub fn with_timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self
    }

    /// The `host:port` this client connects to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl BarcodeForwarder for TcpPrintClient {
    async fn forward(&self, barcode: &Barcode) -> Result<PrintResponse, ForwardError> {
        let addr = self.address();

        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ForwardError::Timeout("connecting to print service"))?
            .map_err(|source| ForwardError::Connect {
                addr: addr.clone(),
                source,
            })?;
        debug!(%addr, "connected to print service");

        let request = format!("{barcode}\n");
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let read = timeout(self.response_timeout, reader.read_line(&mut line))
            .await
            .map_err(|_| ForwardError::Timeout("waiting for print service response"))??;

        if read == 0 {
            debug!(%addr, "print service closed the connection without a response");
        }
        Ok(PrintResponse::classify(&line))
    }
}

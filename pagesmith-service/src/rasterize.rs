//! PDF page rasterization backed by an external `pdftoppm` subprocess.
//!
//! Every conversion call gets its own [`TempSession`]: a fresh id that
//! namespaces the input document and every output page file written to the
//! shared temp directory. Concurrent calls never address the same path, so
//! no locking is needed. The session cleanup pass runs unconditionally, on
//! success and on every failure path, and its own errors are logged rather
//! than propagated so they cannot mask the primary error.

mod session;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::RasterizerSettings;
use crate::error::{ServiceError, ServiceResult};

use session::TempSession;

/// A single rasterized page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_number: u32,
    /// Encoded PNG bytes.
    pub png: Vec<u8>,
}

impl PageImage {
    /// Self-describing payload, usable directly as an `<img>` source.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

/// Converts PDF documents into per-page PNG images via the external tool.
///
/// Stateless apart from its settings; share one instance behind an `Arc`.
pub struct PageRasterizer {
    settings: RasterizerSettings,
}

impl PageRasterizer {
    pub fn new(settings: RasterizerSettings) -> Self {
        Self { settings }
    }

    pub fn default_dpi(&self) -> u32 {
        self.settings.default_dpi
    }

    /// Probe whether the external tool can be spawned at all.
    pub async fn tool_available(&self) -> bool {
        Command::new(&self.settings.tool_path)
            .arg("-v")
            .output()
            .await
            .is_ok()
    }

    /// Rasterize every page of `bytes` at `dpi`.
    ///
    /// Returns one [`PageImage`] per page the tool produced, in ascending
    /// page-number order.
    pub async fn rasterize_all(&self, bytes: &[u8], dpi: u32) -> ServiceResult<Vec<PageImage>> {
        self.validate(bytes, dpi)?;

        let session = TempSession::new(&self.settings.temp_dir);
        let result = self.convert(&session, bytes, dpi, None).await;
        session.cleanup();
        result
    }

    /// Rasterize the single 1-indexed `page_number` of `bytes` at `dpi`.
    pub async fn rasterize_page(
        &self,
        bytes: &[u8],
        page_number: u32,
        dpi: u32,
    ) -> ServiceResult<PageImage> {
        self.validate(bytes, dpi)?;
        if page_number == 0 {
            return Err(ServiceError::InvalidArgument {
                message: "page number must be positive (pages are 1-indexed)".to_string(),
            });
        }

        let session = TempSession::new(&self.settings.temp_dir);
        let result = self.convert(&session, bytes, dpi, Some(page_number)).await;
        session.cleanup();

        // Exit code 0 with no output is how the tool reports an
        // out-of-range page, so absence is a distinct failure rather than
        // an empty success.
        result?
            .into_iter()
            .next()
            .ok_or(ServiceError::PageNotFound { page: page_number })
    }

    fn validate(&self, bytes: &[u8], dpi: u32) -> ServiceResult<()> {
        if bytes.is_empty() {
            return Err(ServiceError::InvalidArgument {
                message: "document is empty".to_string(),
            });
        }
        if dpi == 0 {
            return Err(ServiceError::InvalidArgument {
                message: "dpi must be positive".to_string(),
            });
        }
        if bytes.len() as u64 > self.settings.max_document_bytes {
            return Err(ServiceError::InvalidArgument {
                message: format!(
                    "document too large: {} bytes (max {} bytes)",
                    bytes.len(),
                    self.settings.max_document_bytes
                ),
            });
        }
        Ok(())
    }

    /// Write the input, run the tool, read the outputs. Never cleans up;
    /// the caller runs the session cleanup pass whatever the outcome.
    async fn convert(
        &self,
        session: &TempSession,
        bytes: &[u8],
        dpi: u32,
        page: Option<u32>,
    ) -> ServiceResult<Vec<PageImage>> {
        let input_path = session.input_path();
        tokio::fs::write(&input_path, bytes)
            .await
            .map_err(ServiceError::Io)?;

        let mut command = Command::new(&self.settings.tool_path);
        command.arg("-png").arg("-r").arg(dpi.to_string());
        if let Some(page) = page {
            command
                .arg("-f")
                .arg(page.to_string())
                .arg("-l")
                .arg(page.to_string());
        }
        command
            .arg(&input_path)
            .arg(session.output_prefix())
            .kill_on_drop(true);

        debug!(session = session.id(), dpi, page = ?page, "Invoking rasterizer tool");

        let output = match tokio::time::timeout(self.settings.timeout(), command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ServiceError::ToolNotFound {
                    tool: self.settings.tool_path.display().to_string(),
                });
            }
            Ok(Err(e)) => return Err(ServiceError::Io(e)),
            Err(_) => {
                // Dropping the elapsed future kills the child (kill_on_drop).
                return Err(ServiceError::RasterizationTimeout {
                    seconds: self.settings.timeout_secs,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ServiceError::RasterizationFailed { detail: stderr });
        }

        // Exit code and output existence are independent signals; discovery
        // decides what the tool actually produced.
        let mut pages = Vec::new();
        for (page_number, path) in session.discover_outputs()? {
            let png = tokio::fs::read(&path).await.map_err(ServiceError::Io)?;
            // Delete each page as soon as it is read so peak disk usage
            // stays near a single page set.
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove output file after reading");
            }
            pages.push(PageImage { page_number, png });
        }

        debug!(
            session = session.id(),
            pages = pages.len(),
            "Rasterization complete"
        );
        Ok(pages)
    }
}

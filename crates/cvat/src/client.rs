//! CvatClient - download task exports from CVAT

use crate::error::{CvatError, Result};
use crate::transport::{ExportRequest, ExportTransport, ReqwestTransport, TransportError};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const NOT_FOUND: u16 = 404;
const UNAUTHORIZED: u16 = 401;

/// Export format and request timeout for a task download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// CVAT export format name, e.g. `COCO 1.0` or `LabelMe 3.0`
    pub format: String,
    pub timeout: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            format: "COCO 1.0".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Client for interacting with the CVAT API
pub struct CvatClient {
    api_url: String,
    auth: String,
    transport: Box<dyn ExportTransport>,
}

impl std::fmt::Debug for CvatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CvatClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl CvatClient {
    /// Create a client over HTTP
    ///
    /// `auth` is sent verbatim as the `Authorization` header, so include a
    /// `Bearer ` prefix if the server expects one.
    pub fn new(api_url: &str, auth: &str) -> Result<Self> {
        let transport = ReqwestTransport::new(auth)?;
        Ok(Self::with_transport(api_url, auth, transport))
    }

    /// Create a client over a custom transport
    pub fn with_transport(api_url: &str, auth: &str, transport: impl ExportTransport + 'static) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            auth: auth.to_string(),
            transport: Box::new(transport),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn auth(&self) -> &str {
        &self.auth
    }

    fn export_request(&self, task_id: u64, options: &DownloadOptions) -> ExportRequest {
        ExportRequest {
            url: format!("{}/tasks/{}/dataset", self.api_url, task_id),
            params: vec![
                ("action".to_string(), "download".to_string()),
                ("format".to_string(), options.format.clone()),
                ("filename".to_string(), format!("task_{}_dataset.zip", task_id)),
            ],
            timeout: options.timeout,
        }
    }

    /// Download a task's dataset (images and annotations) and extract it
    ///
    /// Returns `<output_dir>/task_<id>`. The intermediate `dataset.zip` is
    /// removed after a successful extraction.
    pub fn download_task(
        &self,
        task_id: u64,
        output_dir: &Path,
        options: &DownloadOptions,
    ) -> Result<PathBuf> {
        info!("Starting download for task {} in format {}", task_id, options.format);

        let request = self.export_request(task_id, options);
        let mut body = self.transport.get(&request).map_err(|e| match e {
            TransportError::Status(NOT_FOUND) => CvatError::TaskNotFound(task_id),
            TransportError::Status(UNAUTHORIZED) => CvatError::Unauthorized,
            TransportError::Status(status) => CvatError::Http { task_id, status },
            TransportError::Network(message) => CvatError::Network(message),
        })?;

        let task_output_dir = output_dir.join(format!("task_{}", task_id));
        fs::create_dir_all(&task_output_dir).map_err(|source| CvatError::CreateDir {
            path: task_output_dir.clone(),
            source,
        })?;
        let zip_path = task_output_dir.join("dataset.zip");

        info!("Downloading dataset for task {}", task_id);
        let bytes = save_stream(&mut body, &zip_path).map_err(CvatError::Save)?;
        info!("Dataset ZIP saved to {} ({} bytes)", zip_path.display(), bytes);

        extract_archive(&zip_path, &task_output_dir)?;
        info!("Dataset extracted to {}", task_output_dir.display());

        match fs::remove_file(&zip_path) {
            Ok(()) => debug!("Removed ZIP file {}", zip_path.display()),
            Err(e) => warn!("Failed to remove ZIP file {}: {}", zip_path.display(), e),
        }

        info!("Task {} downloaded successfully to {}", task_id, task_output_dir.display());
        Ok(task_output_dir)
    }
}

fn save_stream(body: &mut dyn io::Read, path: &Path) -> io::Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let bytes = io::copy(body, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}

fn zip_error(e: ZipError) -> CvatError {
    match e {
        ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
            CvatError::InvalidZip(e.to_string())
        }
        other => CvatError::Extract(other.to_string()),
    }
}

fn extract_archive(zip_path: &Path, destination: &Path) -> Result<()> {
    let file = File::open(zip_path).map_err(|e| CvatError::Extract(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(zip_error)?;
    archive.extract(destination).map_err(zip_error)
}

//! # pokedata CVAT
//!
//! Client for the CVAT REST API. Only task export download is supported:
//! the export ZIP is streamed to disk and extracted under
//! `<output_dir>/task_<id>/`.

mod client;
mod error;
mod transport;

pub use client::{CvatClient, DownloadOptions};
pub use error::{CvatError, Result};
pub use transport::{ExportRequest, ExportTransport, ReqwestTransport, TransportError};

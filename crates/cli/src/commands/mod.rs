//! CLI Commands

pub mod dataset;
pub mod download;
pub mod release;

pub use dataset::DatasetCommand;
pub use download::DownloadTaskCommand;
pub use release::ReleaseCommand;

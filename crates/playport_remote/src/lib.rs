pub mod config;
pub mod download;
mod error;
pub mod fetcher;
pub mod listing;
pub mod plan;
pub mod priority;

#[cfg(test)]
mod testing;

pub use config::RemoteConfig;
pub use download::{DownloadEvent, DownloadExecutor, DownloadReport, prepare_folders};
pub use error::{ConfigError, DownloadError, FetchError, ListingError};
pub use fetcher::{AssetFetcher, UreqFetcher, alternate_source_url};
pub use listing::{ListingClient, RemoteFolder, RemoteListing, build_folder_paths, parse_listing_page};
pub use plan::{DownloadPlan, DownloadPlanner, DownloadTask, sanitize_file_name, target_path};
pub use priority::priority;

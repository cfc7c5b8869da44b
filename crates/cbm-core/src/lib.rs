pub mod config;
pub mod logging;

pub mod backoff;
pub mod catalog;
pub mod catalog_file;
pub mod checksum;
pub mod downloader;
pub mod extractor;
pub mod ledger;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod transport;
pub mod url_model;

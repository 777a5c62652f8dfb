#![forbid(unsafe_code)]

pub mod build;
pub mod cache;
pub mod cli;
pub mod crawl;
pub mod download;
pub mod extract;
pub mod formats;
pub mod logging;
pub mod page;
pub mod record;
pub mod stats;
pub mod table;
pub mod views;

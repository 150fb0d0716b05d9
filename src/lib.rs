pub mod cli;
pub mod config;
pub mod error;
pub mod git_data;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod parsers;
pub mod paths;
pub mod ports;
pub mod publisher;
pub mod upload;

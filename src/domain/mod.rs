//! Core domain types and logic.

pub mod request;
pub mod tester_files;
pub mod data_dir;
pub mod registry;
pub mod terminal;
pub mod report;
pub mod run;
pub mod config_validation;
pub mod error;

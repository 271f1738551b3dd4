pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod observability;
pub mod types;

pub mod config;
pub mod errors;
pub mod init;
pub mod models;
pub mod monitoring;
pub mod services;
pub mod tools;
pub mod utils;

pub mod app;
pub mod capture;
pub mod config;
pub mod error;
pub mod history;
pub mod scan;
pub mod state;

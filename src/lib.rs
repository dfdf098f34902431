pub mod cache;
pub mod config;
pub mod csv_import;
pub mod dataset_fetch;
pub mod error;
pub mod expectations;
pub mod forecast;
pub mod form;
pub mod h2h;
pub mod historical_db;
pub mod http_client;
pub mod markets;
pub mod match_record;
pub mod perspective;
pub mod report;
pub mod scoreline;
pub mod store;

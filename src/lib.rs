pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod invoker;
pub mod models;
pub mod readiness;
pub mod transform;

pub use config::ServiceConfig;
pub use history::HistoryTable;
pub use ingest::IngestController;
pub use invoker::{AnalysisRunner, RscriptRunner};

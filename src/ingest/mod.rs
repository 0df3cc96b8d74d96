pub mod controller;
pub mod loop_worker;

pub use controller::IngestController;
pub use loop_worker::{ingest_loop, run_iteration, IterationOutcome};

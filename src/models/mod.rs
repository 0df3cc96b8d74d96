pub mod batch;
pub mod measurement;

pub use batch::BatchObservation;
pub use measurement::MeasurementRow;

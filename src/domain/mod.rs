// Domain layer - pure vitals normalization, classification and aggregation
pub mod classification;
pub mod timestamp;
pub mod trend;
pub mod vitals;

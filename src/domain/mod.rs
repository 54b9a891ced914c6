// Domain layer - pure evaluation logic with no I/O
pub mod chart;
pub mod checklist;
pub mod degradation;
pub mod error;
pub mod input_buffer;
pub mod record;
pub mod risk;
pub mod stress;

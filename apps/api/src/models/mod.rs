pub mod ground_truth;
pub mod resume;

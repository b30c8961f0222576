pub mod batch;
pub mod predict;

pub mod chart;
pub mod dataset_store;
pub mod excel;
pub mod upload;

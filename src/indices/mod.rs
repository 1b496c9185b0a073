pub mod index_data;
pub mod manager;

pub use index_data::{IndexComputation, IndexData, IndexVariantData};
pub use manager::{update_all_indices, IndexManager};

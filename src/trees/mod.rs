pub mod descendants;
pub mod tree;
pub mod visualization;

pub use descendants::{Descendants, RangedDescendants};
pub use tree::Tree;

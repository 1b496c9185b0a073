pub mod algorithm_node;
pub mod minimax;
pub mod traversal;
pub mod tree_node;

pub use algorithm_node::{AlgorithmNode, NodeRef, WeakNodeRef};
pub use minimax::{BranchSortValue, HowEqual, NodeEvaluation, TreeEvaluation};
pub use tree_node::{NodeId, TreeDepth, TreeNode};

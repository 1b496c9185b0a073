//! DOT export of the search DAG, level by level.

use crate::state::State;
use crate::trees::tree::Tree;

/// Renders the whole tree in graphviz DOT format. Nodes carry their
/// evaluation description; edges are labeled with the branch name.
pub fn tree_to_dot<S: State>(tree: &Tree<S>) -> String {
    let mut out = String::from("digraph search_tree {\n");
    out.push_str("  node [shape=box];\n");

    for depth in tree.descendants.depths().collect::<Vec<_>>() {
        for node in tree.descendants.nodes_at(depth) {
            let node = node.borrow();
            out.push_str(&format!(
                "  n{} [label=\"{}\"];\n",
                node.id(),
                node.dot_description().replace('"', "'").replace('\n', "\\n")
            ));
            for (branch, child) in node.tree_node().branches_children() {
                out.push_str(&format!(
                    "  n{} -> n{} [label=\"{}\"];\n",
                    node.id(),
                    child.borrow().id(),
                    node.state().branch_name(branch).replace('"', "'")
                ));
            }
        }
    }

    out.push_str("}\n");
    out
}

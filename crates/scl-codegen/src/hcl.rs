use crate::Node;

const INDENT: &str = "  ";

/// Render expanded nodes as HCL, two spaces per nesting level.
///
/// Nodes are separated by newlines; there is no trailing newline.
pub fn render(nodes: &[Node]) -> String {
    let mut lines = Vec::new();
    for node in nodes {
        render_node(node, 0, &mut lines);
    }
    lines.join("\n")
}

fn render_node(node: &Node, depth: usize, lines: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);

    match node {
        Node::Line(content) => lines.push(format!("{indent}{content}")),
        Node::Block { header, children } if children.is_empty() => {
            lines.push(format!("{indent}{header} {{}}"));
        }
        Node::Block { header, children } => {
            lines.push(format!("{indent}{header} {{"));
            for child in children {
                render_node(child, depth + 1, lines);
            }
            lines.push(format!("{indent}}}"));
        }
    }
}

//! SCL Code Generator
//!
//! Renders the tree produced by mixin expansion as HCL text. The parser
//! decides what each node is; this crate only decides how it is laid out.
//!
//! ```text
//! expanded Vec<Node> → hcl::render() → "block {\n  value = 1\n}"
//! ```

pub mod hcl;

pub use hcl::render;

/// One node of expanded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A single output line, emitted verbatim (heredocs may span lines).
    Line(String),
    /// `header { children }`
    Block { header: String, children: Vec<Node> },
}

impl Node {
    /// A childless node for `content`.
    ///
    /// Bare block headers such as `inner "label"` become empty blocks so
    /// the output stays decodable; attributes and comments stay lines.
    pub fn leaf(content: impl Into<String>) -> Self {
        let content = content.into();
        if is_block_header(&content) {
            Node::Block {
                header: content,
                children: Vec::new(),
            }
        } else {
            Node::Line(content)
        }
    }

    pub fn block(header: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Block {
            header: header.into(),
            children,
        }
    }
}

/// `name`, `name "label"`, `"name"`: no assignment, comment or heredoc.
fn is_block_header(content: &str) -> bool {
    let starts_like_key = content
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '"');

    starts_like_key && !content.contains('=') && !content.contains('\n')
}

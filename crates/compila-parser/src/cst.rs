use crate::bowstring::BowString;
use crate::token::Token;

/// A node in the concrete syntax tree produced by the parser.
///
/// A node with empty `children` is a leaf corresponding to a single
/// consumed token; an interior node carries the `kind` of the matched rule
/// and takes its `text`/`line`/`column`/`position` from the first token of
/// its span (spec §3).
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: BowString,
    pub text: BowString,
    pub line: u32,
    pub column: u32,
    pub position: u32,
    pub children: Vec<Node>,
}

impl Node {
    /// A leaf node wrapping a single consumed token.
    pub fn leaf(token: Token) -> Self {
        Self {
            kind: token.kind,
            text: token.text,
            line: token.line,
            column: token.column,
            position: token.position,
            children: Vec::new(),
        }
    }

    /// Wrap `child` under a new node named `name`, e.g. an alternation
    /// committing to one of its branches. The wrapper's coordinates are
    /// inherited from the child's first token.
    pub fn wrap(name: impl Into<String>, child: Node) -> Self {
        Self {
            kind: BowString::new(&name.into()),
            text: child.text.clone(),
            line: child.line,
            column: child.column,
            position: child.position,
            children: vec![child],
        }
    }

    /// Build an interior node named `name` spanning `children`, taking its
    /// coordinates from the first child when there is one, or from
    /// `fallback` (the cursor's position at the point the sequence was
    /// entered) when the sequence matched zero parts.
    pub fn branch(name: impl Into<String>, children: Vec<Node>, fallback: NodeCoords) -> Self {
        let (text, line, column, position) = match children.first() {
            Some(first) => (
                first.text.clone(),
                first.line,
                first.column,
                first.position,
            ),
            None => (fallback.text, fallback.line, fallback.column, fallback.position),
        };
        Self {
            kind: BowString::new(&name.into()),
            text,
            line,
            column,
            position,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The number of tokens spanned by this node and its descendants,
    /// counting a leaf as one token.
    pub fn token_span(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Node::token_span).sum()
        }
    }
}

/// The coordinates to fall back to when a sequence or alternation produces
/// no children (all parts were optional and none matched).
#[derive(Debug, Clone)]
pub struct NodeCoords {
    pub text: BowString,
    pub line: u32,
    pub column: u32,
    pub position: u32,
}

//! Node tree model for captured fill bodies.
//!
//! Nodes live in an [`Arena`] and refer to each other by [`NodeId`]. A node can
//! be listed in more than one child list at the same time (the capture rules in
//! the composition state rely on this), so children are stored as ids rather than
//! owned subtrees.

/// Index of a node inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Element attributes in source order.
///
/// Duplicate names are impossible: the first occurrence of a name wins and
/// later ones are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Create an empty attribute list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, returning `false` if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.0.push((name, value.into()));
        true
    }

    /// Get an attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(name, value)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

/// A node of a captured tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with its attributes and children.
    Element {
        tag: String,
        attributes: Attributes,
        children: Vec<NodeId>,
    },
    /// Raw text exactly as it appeared in the source.
    Text { content: String },
    /// Parentless container.
    Root { children: Vec<NodeId> },
}

impl Node {
    /// Create an element with no children.
    #[must_use]
    pub fn element(tag: impl Into<String>, attributes: Attributes) -> Self {
        Self::Element {
            tag: tag.into(),
            attributes,
            children: Vec::new(),
        }
    }

    /// Create a text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Create an empty root.
    #[must_use]
    pub fn root() -> Self {
        Self::Root {
            children: Vec::new(),
        }
    }

    /// Tag name for elements, `None` otherwise.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag),
            Self::Text { .. } | Self::Root { .. } => None,
        }
    }

    /// Attribute value for elements, `None` otherwise.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attributes, .. } => attributes.get(name),
            Self::Text { .. } | Self::Root { .. } => None,
        }
    }

    /// Children of elements and roots. Text nodes have none.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::Element { children, .. } | Self::Root { children } => children,
            Self::Text { .. } => &[],
        }
    }
}

/// Owner of every node built during one render.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Get a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was allocated by a different arena.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Append `child` to the children of `parent`.
    ///
    /// Appending to a text node is ignored.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.nodes[parent.0] {
            Node::Element { children, .. } | Node::Root { children } => children.push(child),
            Node::Text { .. } => {}
        }
    }

    /// Number of allocated nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

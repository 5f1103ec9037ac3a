/// NodeId is an index into the AssemblyOrder's node vector.
pub type NodeId = usize;

/// Identifier carried by internal (merge) nodes.
pub const INTERNAL_ID: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyNode {
    /// Chain id for leaves, [`INTERNAL_ID`] for merge nodes
    pub id: i32,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl AssemblyNode {
    pub fn leaf(id: i32) -> Self {
        Self {
            id,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Binary merge tree recording which chains were combined and in what order.
///
/// All nodes live in one vector. The root is always node 0 and every child
/// sits at a larger index than its parent, so a child link is never 0. The
/// same indices are written on the wire, where 0 stands for "no child".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssemblyOrder {
    nodes: Vec<AssemblyNode>,
}

impl AssemblyOrder {
    /// Create an empty order (no chains)
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-chain order.
    pub fn leaf(id: i32) -> Self {
        Self {
            nodes: vec![AssemblyNode::leaf(id)],
        }
    }

    /// Build an order from raw nodes, checking the layout rules.
    ///
    /// ```
    /// use psma::libs::alignment::{AssemblyNode, AssemblyOrder};
    /// let nodes = vec![
    ///     AssemblyNode { id: -1, left: Some(1), right: Some(2) },
    ///     AssemblyNode::leaf(7),
    ///     AssemblyNode::leaf(3),
    /// ];
    /// let order = AssemblyOrder::from_nodes(nodes).unwrap();
    /// assert_eq!(order.leaves(), vec![7, 3]);
    ///
    /// let cyclic = vec![AssemblyNode { id: -1, left: Some(0), right: None }];
    /// assert!(AssemblyOrder::from_nodes(cyclic).is_err());
    /// ```
    pub fn from_nodes(nodes: Vec<AssemblyNode>) -> Result<Self, String> {
        let mut seen = vec![false; nodes.len()];
        for (parent, node) in nodes.iter().enumerate() {
            for child in [node.left, node.right].into_iter().flatten() {
                if child <= parent || child >= nodes.len() {
                    return Err(format!(
                        "node {} links to {}, outside ({}, {})",
                        parent,
                        child,
                        parent,
                        nodes.len()
                    ));
                }
                if seen[child] {
                    return Err(format!("node {} has two parents", child));
                }
                seen[child] = true;
            }
        }
        // Everything except the root must hang somewhere below it
        if let Some(orphan) = seen.iter().skip(1).position(|s| !s) {
            return Err(format!("node {} is not reachable from the root", orphan + 1));
        }

        Ok(Self { nodes })
    }

    /// Merge two orders under a new root.
    ///
    /// The new root takes index 0, `left`'s nodes follow, then `right`'s,
    /// with their links shifted accordingly.
    pub fn join(left: &AssemblyOrder, right: &AssemblyOrder) -> Self {
        if left.is_empty() {
            return right.clone();
        }
        if right.is_empty() {
            return left.clone();
        }

        let left_base = 1;
        let right_base = 1 + left.len();

        let mut nodes = Vec::with_capacity(1 + left.len() + right.len());
        nodes.push(AssemblyNode {
            id: INTERNAL_ID,
            left: Some(left_base),
            right: Some(right_base),
        });
        for (base, order) in [(left_base, left), (right_base, right)] {
            nodes.extend(order.nodes.iter().map(|n| AssemblyNode {
                id: n.id,
                left: n.left.map(|c| c + base),
                right: n.right.map(|c| c + base),
            }));
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn nodes(&self) -> &[AssemblyNode] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&AssemblyNode> {
        self.nodes.get(id)
    }

    /// Node ids in pre-order (node, left subtree, right subtree).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            let node = &self.nodes[id];
            // Right first so left is visited first
            stack.extend(node.right);
            stack.extend(node.left);
        }
        out
    }

    /// Chain ids of the leaves, left to right.
    pub fn leaves(&self) -> Vec<i32> {
        self.preorder()
            .into_iter()
            .map(|id| &self.nodes[id])
            .filter(|n| n.is_leaf())
            .map(|n| n.id)
            .collect()
    }

    /// Newick representation; leaves are labelled by `label(chain_id)`.
    pub fn to_newick<F>(&self, label: F) -> String
    where
        F: Fn(i32) -> String,
    {
        fn walk<F: Fn(i32) -> String>(order: &AssemblyOrder, id: NodeId, label: &F, out: &mut String) {
            let node = &order.nodes[id];
            if node.is_leaf() {
                out.push_str(&label(node.id));
                return;
            }
            out.push('(');
            let children: Vec<NodeId> = [node.left, node.right].into_iter().flatten().collect();
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                walk(order, *child, label, out);
            }
            out.push(')');
        }

        let mut out = String::new();
        if let Some(root) = self.root() {
            walk(self, root, &label, &mut out);
        }
        out.push(';');
        out
    }
}

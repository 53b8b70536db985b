use remeasure_core::NodeId;

/// Errors returned by the tree-editing API.
///
/// Scheduling contract violations are not represented here; they panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Missing { id: NodeId },
    AlreadyAttached { id: NodeId, parent: NodeId },
    Cycle { parent: NodeId, child: NodeId },
    IndexOutOfBounds { parent: NodeId, index: usize, len: usize },
    NotAChild { parent: NodeId, child: NodeId },
}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutError::Missing { id } => write!(f, "node {id} missing"),
            LayoutError::AlreadyAttached { id, parent } => {
                write!(f, "node {id} is already a child of {parent}")
            }
            LayoutError::Cycle { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
            LayoutError::IndexOutOfBounds { parent, index, len } => {
                write!(f, "index {index} out of bounds for {len} children of {parent}")
            }
            LayoutError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of {parent}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

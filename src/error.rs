use crate::tree::NodeId;

/// Errors surfaced by the stage, its display tree and movie clip timelines.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The canvas did not yield a usable 2D rendering context.
    #[error("rendering context unavailable: {0}")]
    MissingContext(String),
    /// A handle did not resolve to a live display node.
    #[error("unknown display node: {0}")]
    UnknownNode(NodeId),
    /// Attaching `child` under `parent` would make a node its own ancestor.
    #[error("cannot attach {child} beneath its own descendant {parent}")]
    CyclicAttach { parent: NodeId, child: NodeId },
    /// No frame carries the requested label.
    #[error("unknown frame label: {0:?}")]
    UnknownLabel(String),
    /// A frame number outside the clip's `1..=total_frames` range.
    #[error("frame {0} is out of range")]
    FrameOutOfRange(usize),
    /// A JSON descriptor (config, frames, graphics) failed to parse.
    #[error("invalid descriptor: {0}")]
    Descriptor(#[from] serde_json::Error),
    /// A browser drawing or DOM call failed.
    #[error("surface call failed: {0}")]
    Surface(String),
    /// The console logger could not be installed.
    #[error("logger init failed: {0}")]
    Logger(String),
}

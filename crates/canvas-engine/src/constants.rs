//! Engine-wide constants
//!
//! Single source of truth for layout offsets, payload limits and seed content.

/// Placement of synthesized nodes
pub mod layout {
    /// Vertical distance between an anchor and the node synthesized from it
    pub const VERTICAL_GAP: f64 = 300.0;
    /// Width assigned to freshly synthesized text-editor nodes
    pub const TEXT_NODE_WIDTH: f64 = 270.0;
    /// Height assigned to freshly synthesized text-editor nodes
    pub const TEXT_NODE_HEIGHT: f64 = 170.0;
}

/// Payload limits enforced at the edit boundary
pub mod limits {
    /// Maximum characters in a text-editor, comment or instruction payload
    pub const MAX_TEXT_LENGTH: usize = 10_000;
}

/// Default values for engine configuration
pub mod defaults {
    /// Number of graph snapshots kept for undo/redo
    pub const HISTORY_DEPTH: usize = 100;
    /// zstd level used for history snapshots
    pub const COMPRESSION_LEVEL: i32 = 3;
}

/// Content of a newly created canvas
pub mod seed {
    /// Text of the single starter node
    pub const TEXT: &str = "This is a text node.";
    /// Width of the starter node
    pub const WIDTH: f64 = 280.0;
    /// Height of the starter node
    pub const HEIGHT: f64 = 180.0;
}

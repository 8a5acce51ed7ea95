//! StoryNode Engine — a deterministic interpreter for branching
//! visual-novel story graphs.
//!
//! Walks a graph of typed nodes (dialogue, choices, condition branches,
//! variable mutations, image directives) in response to player input,
//! maintaining a small persistent variable set, a bounded replay history,
//! and a layered image-display state for the presentation shell.

pub mod core;
pub mod schema;

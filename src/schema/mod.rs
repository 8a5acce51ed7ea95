//! Pure data types: the story document model and the serializable
//! game state. No behavior beyond lookup helpers.

pub mod condition;
pub mod effects;
pub mod node;
pub mod project;
pub mod state;

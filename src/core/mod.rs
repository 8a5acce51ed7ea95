//! Runtime behavior: evaluators, state machines, and timing.

pub mod condition;
pub mod effects;
pub mod engine;
pub mod history;
pub mod images;
pub mod timing;
pub mod typewriter;

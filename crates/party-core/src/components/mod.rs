//! ECS Components
//!
//! Body components and world-wide resources.

pub mod arena;
pub mod body;

pub use arena::*;
pub use body::*;

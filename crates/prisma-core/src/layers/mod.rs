//! Layer model and compositing.

pub mod blend;
pub mod composite;
pub mod mask;
pub mod stack;

pub use blend::BlendMode;
pub use composite::composite;
pub use mask::Mask;
pub use stack::{Layer, LayerId, LayerStack};

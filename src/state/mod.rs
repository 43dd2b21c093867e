pub mod ambient;
pub mod engine;
pub mod interactable;
pub mod pointer;
pub mod pool;
pub mod rng;
pub mod scene;
pub mod spring;
pub mod viewport;

pub use engine::ParticleEngine;
pub use interactable::{HoverClass, TargetNode, classify};
pub use pointer::{PointerEvent, PointerTracker};
pub use pool::Pool;
pub use rng::{JsRandom, RandomSource, SequenceRandom};
pub use scene::FxScene;
pub use spring::{Spring, Spring2};
pub use viewport::{DeviceProfile, Viewport};

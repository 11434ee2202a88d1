mod instance;
mod registry;

pub use instance::ModelInstance;
pub use registry::SceneRegistry;

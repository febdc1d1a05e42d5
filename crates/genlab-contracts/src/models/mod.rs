mod registry;
mod selectors;

pub use registry::{ModelRegistry, ModelSpec, SEEDANCE_MODEL_ID, SEEDREAM_MODEL_ID};
pub use selectors::{ModelSelection, ModelSelector};

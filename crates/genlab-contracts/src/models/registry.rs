use indexmap::IndexMap;

use crate::request::GenerationMode;

pub const SEEDREAM_MODEL_ID: &str = "seedream-4-5-251128";
pub const SEEDANCE_MODEL_ID: &str = "seedance-1-5-pro-251215";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub label: String,
    pub provider: String,
    pub modes: Vec<GenerationMode>,
}

impl ModelSpec {
    pub fn supports(&self, mode: GenerationMode) -> bool {
        self.modes.contains(&mode)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_mode(&self, mode: GenerationMode) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(mode))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, mode: GenerationMode) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(mode) {
            return Some(model.clone());
        }
        None
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, label: &str, modes: &[GenerationMode]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                label: label.to_string(),
                provider: "byteplus".to_string(),
                modes: modes.to_vec(),
            },
        );
    };

    insert(SEEDREAM_MODEL_ID, "Seedream 4.5", &[GenerationMode::Image]);
    insert(SEEDANCE_MODEL_ID, "Seedance 1.5 Pro", &[GenerationMode::Video]);

    map
}

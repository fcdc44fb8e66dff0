//! Fixtures shared by the unit tests
use std::path::PathBuf;

use crate::metabolic_model::model::Model;

/// Eight reaction model growing on glucose, with a blocked acetate route and a dead end
pub fn toy_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("test_models")
        .join("toy_model.json")
}

pub fn toy_model() -> Model {
    Model::read_json(toy_model_path()).unwrap()
}

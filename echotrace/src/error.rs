//! Error types for echotrace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchotraceError {
    #[error("Material ID {0} is reserved for built-in materials (custom IDs start at 1000)")]
    ReservedMaterialId(u32),

    #[error("Material ID {id} is already used by the '{existing}' material")]
    DuplicateMaterialId { id: u32, existing: String },

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("Missing geometry resource: {0}")]
    MissingGeometry(String),

    #[error("Geometry produced no triangles: {0}")]
    EmptyGeometry(String),

    #[error("Raytracer error: {0}")]
    Raytracer(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown emitter: {0}")]
    UnknownEmitter(u64),
}

pub type Result<T> = std::result::Result<T, EchotraceError>;

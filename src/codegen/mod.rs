pub mod expression;
pub use expression::Renderer;

pub mod generator;
pub use generator::{GeneratedVariable, Generator, ModelType};

pub mod profile;
pub use profile::GeneratorProfile;

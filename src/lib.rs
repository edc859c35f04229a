pub mod analyser;
pub mod ast;
pub mod codegen;
pub mod model;
pub mod parser;

pub use analyser::{analyse, Analysis, Issue, IssueKind, Issues};
pub use codegen::{GeneratedVariable, Generator, GeneratorProfile, ModelType};
pub use model::{parse_model, Model};

use anyhow::Result;

/// Read a CellML document and generate its implementation with `profile`.
///
/// Issues found while analysing the model are returned as an error, one
/// issue per line.
pub fn generate(text: &str, profile: GeneratorProfile) -> Result<String> {
    let model = parse_model(text)?;
    let mut generator = Generator::with_profile(profile);
    generator.process_model(&model);
    if generator.issue_count() > 0 {
        return Err(anyhow::anyhow!("{}", generator.issues()));
    }
    Ok(generator.implementation_code())
}

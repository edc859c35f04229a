pub mod mathml;
pub use mathml::{parse_math, ParsedEquation, ParsedMath, MATHML_NS};

//! Core ETL (Extract, Transform, Load) abstractions
//!
//! Tables are extracted from sources, transformed, and loaded to
//! destinations. The merge pipeline wires the CSV readers, the dataset
//! merger and the CSV sink together.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::MergePipeline;
pub use transform::Transformer;

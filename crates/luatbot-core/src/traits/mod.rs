//! Capability traits consumed by the pipeline.
//!
//! Concrete implementations live in `luatbot-providers` (embedding,
//! generation) and `luatbot-nlp` (segmentation); tests substitute fakes
//! without touching global state.

pub mod embedder;
pub mod generator;
pub mod segmenter;

pub use embedder::Embedder;
pub use generator::Generator;
pub use segmenter::Segmenter;

//! # LuatBot NLP
//!
//! The two leaf stages of the pipeline: Vietnamese-aware text
//! normalization (segmentation, stop-word and noise filtering, keyword
//! extraction) and the rule-based admission classifier that gates every
//! request before any embedding or generation cost is paid.

pub mod classify;
pub mod normalize;
pub mod segment;
pub mod stopwords;

pub use classify::{RuleClassifier, RuleTable};
pub use normalize::Normalizer;
pub use segment::LexiconSegmenter;
pub use stopwords::StopWords;

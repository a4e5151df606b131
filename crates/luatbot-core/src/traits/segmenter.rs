//! Vietnamese word-segmentation capability contract.

use crate::error::Result;

/// Splits text into Vietnamese words, joining multi-syllable compounds
/// into single tokens (`"xe máy"` → `"xe_máy"`). A naive whitespace split
/// is not a valid implementation of this trait.
///
/// Implementations may initialize a backing dictionary/model lazily on
/// first use; the loaded resource must be reused on subsequent calls, and
/// a load failure surfaces as `PreprocessingUnavailable` on every call —
/// never as a silent fallback to whitespace tokenization.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Result<Vec<String>>;
}

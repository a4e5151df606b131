//! Canned Vietnamese user-facing messages.
//!
//! The controller maps error kinds to exactly one of these; no partial
//! answer text ever leaks into them.

/// Opening line shown by interactive frontends.
pub const GREETING: &str = "Xin chào bạn! Mình là trợ lý hỗ trợ tìm kiếm thông tin về \
luật giao thông Việt Nam. Bạn cần mình giúp điều gì không?";

/// Query admitted but out of domain.
pub const DECLINE_OUT_OF_DOMAIN: &str = "Câu hỏi không liên quan đến giao thông đường bộ. \
Bạn vui lòng hỏi câu khác nha.";

/// Query not recognized as Vietnamese.
pub const DECLINE_NON_VIETNAMESE: &str = "Tôi chỉ hiểu tiếng Việt. Bạn vui lòng nhập lại nha.";

/// Accepted, but nothing relevant was found in the indexed corpus.
pub const INSUFFICIENT_CONTEXT: &str = "Rất tiếc, mình không tìm thấy căn cứ pháp lý phù hợp \
trong các văn bản hiện có để trả lời câu hỏi này.";

/// A pipeline stage failed; generic apology.
pub const UNAVAILABLE: &str = "Xin lỗi bạn, hệ thống đang gặp sự cố và chưa thể trả lời ngay \
bây giờ. Bạn vui lòng thử lại sau nha.";

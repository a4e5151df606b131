//! Grounded prompt assembly.
//!
//! Built fresh for every request, never cached across requests: the
//! prompt states the assistant's role and domain restriction, lists each
//! retrieved chunk with its legal citation, replays any short history,
//! appends the verbatim question, and instructs the model to answer only
//! from the supplied context and to say so when the context is not
//! enough.

use luatbot_core::types::{Question, RetrievalResult};

const SYSTEM_PREAMBLE: &str = "Bạn là trợ lý ảo hỗ trợ trả lời các câu hỏi về luật giao thông \
đường bộ Việt Nam. Tôi sẽ cung cấp cho bạn câu hỏi và các đoạn ngữ cảnh có chứa căn cứ pháp lý. \
Nhiệm vụ của bạn là trả lời dựa trên các đoạn ngữ cảnh đó, tuyệt đối không tự thêm thông tin \
bên ngoài. Nếu ngữ cảnh không đủ để trả lời, hãy nói rõ rằng bạn không có đủ thông tin.";

struct ContextBlock {
    chunk_id: String,
    citation: String,
    content: String,
}

/// Assembled prompt context for one request.
pub struct PromptContext {
    context_blocks: Vec<ContextBlock>,
    history: Vec<String>,
    question: String,
}

impl PromptContext {
    pub fn build(question: &Question, retrieved: &RetrievalResult) -> Self {
        let context_blocks = retrieved
            .iter()
            .map(|scored| ContextBlock {
                chunk_id: scored.chunk.id.clone(),
                citation: scored.chunk.source.citation(),
                content: scored.chunk.content.clone(),
            })
            .collect();
        Self {
            context_blocks,
            history: question.history.clone(),
            question: question.text.clone(),
        }
    }

    /// Chunk ids included in this prompt — the only ids an answer may
    /// ever cite.
    pub fn cited_chunk_ids(&self) -> Vec<String> {
        self.context_blocks
            .iter()
            .map(|block| block.chunk_id.clone())
            .collect()
    }

    /// Render the full prompt string sent to the generation capability.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(SYSTEM_PREAMBLE);
        out.push_str("\n\nThông tin ngữ cảnh được cung cấp dưới đây.\n");
        out.push_str("---------------------\n");
        for (i, block) in self.context_blocks.iter().enumerate() {
            out.push_str(&format!(
                "[{}] Tiêu đề: {}\nNội dung: {}\n\n",
                i + 1,
                block.citation,
                block.content
            ));
        }
        out.push_str("---------------------\n");
        if !self.history.is_empty() {
            out.push_str("Lịch sử hội thoại gần đây:\n");
            for turn in &self.history {
                out.push_str(&format!("- {turn}\n"));
            }
            out.push('\n');
        }
        out.push_str(
            "Dựa vào thông tin ngữ cảnh trên và không sử dụng kiến thức bên ngoài, \
             hãy trả lời câu hỏi dưới đây.\n",
        );
        out.push_str(&format!("Câu hỏi: {}\n", self.question));
        out.push_str("Câu trả lời (kèm trích dẫn từ tiêu đề):");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luatbot_core::types::{Chunk, ScoredChunk, SourceRef};

    fn retrieved() -> RetrievalResult {
        vec![ScoredChunk {
            chunk: Chunk {
                id: "d100-5-1".into(),
                content: "Phạt tiền từ 800.000 đồng đến 1.000.000 đồng...".into(),
                source: SourceRef {
                    document: "Nghị định 100/2019/NĐ-CP".into(),
                    article: Some("5".into()),
                    clause: Some("1".into()),
                },
            },
            score: 0.82,
        }]
    }

    #[test]
    fn prompt_contains_citation_question_and_instruction() {
        let question = Question::new("Xe máy chạy quá tốc độ bị phạt bao nhiêu?");
        let ctx = PromptContext::build(&question, &retrieved());
        let rendered = ctx.render();
        assert!(rendered.contains("Nghị định 100/2019/NĐ-CP, Điều 5, Khoản 1"));
        assert!(rendered.contains("Xe máy chạy quá tốc độ bị phạt bao nhiêu?"));
        assert!(rendered.contains("không sử dụng kiến thức bên ngoài"));
        assert!(rendered.contains("không có đủ thông tin"));
    }

    #[test]
    fn cited_ids_match_blocks_exactly() {
        let question = Question::new("mức phạt?");
        let ctx = PromptContext::build(&question, &retrieved());
        assert_eq!(ctx.cited_chunk_ids(), vec!["d100-5-1".to_string()]);
    }

    #[test]
    fn history_is_replayed_when_present() {
        let question =
            Question::with_history("còn ô tô thì sao?", vec!["Xe máy bị phạt 1 triệu.".into()]);
        let rendered = PromptContext::build(&question, &retrieved()).render();
        assert!(rendered.contains("Lịch sử hội thoại"));
        assert!(rendered.contains("Xe máy bị phạt 1 triệu."));
    }
}

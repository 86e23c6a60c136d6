// Grounded prompt assembly for suggested replies
use crate::rag::retrieval::RetrievedContext;

const PREAMBLE: &str = "You are a helpful and professional email assistant. Your task is to draft \
a reply to an incoming email based ONLY on the provided context and the original email.";

const INSTRUCTIONS: &str = "INSTRUCTIONS:
1. Based ONLY on the context provided above, draft a professional and helpful email reply.
2. Be concise, friendly, and address the sender's questions or concerns directly.
3. If the context contains a meeting link, include it exactly as written in your response.
4. If the context mentions pricing, features, or other details, include them exactly as written where relevant.
5. Do NOT make up information that is not in the context.
6. Use a professional tone suitable for business communication.
7. Sign off appropriately (e.g., \"Best regards,\" or \"Looking forward to hearing from you,\").";

/// Builds the single prompt sent to the generative model
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Label each snippet as `[Context <n> - <category>]:` in input order
    pub fn format_context(&self, context: &[RetrievedContext]) -> String {
        context
            .iter()
            .enumerate()
            .map(|(idx, ctx)| format!("[Context {} - {}]:\n{}", idx + 1, ctx.category, ctx.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Full prompt: preamble, labeled context, original email, instructions
    pub fn build(&self, original_email: &str, context: &[RetrievedContext]) -> String {
        format!(
            "{}\n\nCONTEXT (Product Knowledge):\n{}\n\nORIGINAL EMAIL:\n{}\n\n{}\n\nDraft the reply now:",
            PREAMBLE,
            self.format_context(context),
            original_email,
            INSTRUCTIONS
        )
    }
}

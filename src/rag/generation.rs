// Reply generation from retrieved context
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{RagError, Result};
use crate::providers::GenerativeModel;
use crate::rag::context::PromptBuilder;
use crate::rag::retrieval::RetrievedContext;
use crate::rag::timeout::with_timeout;

/// Drafts a reply grounded in retrieved snippets
pub struct ReplyGenerator {
    model: Arc<dyn GenerativeModel>,
    prompt_builder: PromptBuilder,
    timeout: Option<Duration>,
}

impl ReplyGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            prompt_builder: PromptBuilder::new(),
            timeout: None,
        }
    }

    /// Deadline for the generation call
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// One prompt, one model call. Failures are not retried here.
    pub async fn generate_reply(
        &self,
        original_email: &str,
        context: &[RetrievedContext],
    ) -> Result<String> {
        let prompt = self.prompt_builder.build(original_email, context);
        debug!(prompt_chars = prompt.len(), snippets = context.len(), "Generating reply with LLM");

        with_timeout(self.timeout, self.model.generate(&prompt))
            .await
            .map_err(RagError::ReplyGeneration)
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt_builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt, answers from a fixed outcome
    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingModel {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                prompts: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl GenerativeModel for RecordingModel {
        async fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(ProviderError::Status {
                    service: "fake".to_string(),
                    status: 429,
                    body: "quota exceeded".to_string(),
                });
            }
            Ok("Hi John,\n\nBest regards,".to_string())
        }
    }

    fn context() -> Vec<RetrievedContext> {
        vec![
            RetrievedContext {
                text: "Starter is $49/month".to_string(),
                category: "pricing".to_string(),
                score: 0.82,
            },
            RetrievedContext {
                text: "https://calendly.com/demo".to_string(),
                category: "meeting-link".to_string(),
                score: 0.77,
            },
        ]
    }

    #[tokio::test]
    async fn test_single_call_with_built_prompt() {
        let model = RecordingModel::new(false);
        let generator = ReplyGenerator::new(model.clone());
        let email = "Subject: Pricing\n\nHow much is it?";

        let reply = generator.generate_reply(email, &context()).await.unwrap();
        assert_eq!(reply, "Hi John,\n\nBest regards,");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], PromptBuilder::new().build(email, &context()));
    }

    #[tokio::test]
    async fn test_model_error_is_reply_generation() {
        let model = RecordingModel::new(true);
        let generator = ReplyGenerator::new(model.clone());

        let err = generator.generate_reply("hello", &context()).await.unwrap_err();
        match err {
            RagError::ReplyGeneration(ProviderError::Status { status, .. }) => assert_eq!(status, 429),
            other => panic!("expected ReplyGeneration, got {:?}", other),
        }
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_applies() {
        struct Stalled;

        #[async_trait]
        impl GenerativeModel for Stalled {
            async fn generate(&self, _prompt: &str) -> std::result::Result<String, ProviderError> {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(String::new())
            }
        }

        let generator =
            ReplyGenerator::new(Arc::new(Stalled)).with_timeout(Some(Duration::from_millis(10)));
        let err = generator.generate_reply("hello", &context()).await.unwrap_err();
        assert!(matches!(
            err,
            RagError::ReplyGeneration(ProviderError::Timeout { duration_ms: 10 })
        ));
    }
}

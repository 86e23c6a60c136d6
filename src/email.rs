//! Boundary between stored emails and the suggested-reply pipeline
//!
//! Formats an email into the text the pipeline embeds and answers with, and
//! shapes the JSON a route handler returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RagError;
use crate::rag::RAGResult;

/// The fields of a stored email the pipeline needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub from: String,
    pub date: String,
    pub body: String,
}

impl EmailMessage {
    /// `Subject: …\nFrom: …\nDate: …\n\n<body>`
    pub fn to_rag_text(&self) -> String {
        format!(
            "Subject: {}\nFrom: {}\nDate: {}\n\n{}",
            self.subject, self.from, self.date, self.body
        )
    }
}

/// Category and score of one grounding snippet, as exposed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    pub category: String,
    pub score: f32,
}

/// JSON body for a successful suggest-reply request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedReplyResponse {
    pub email_id: String,
    pub suggested_reply: String,
    pub confidence: u8,
    pub context: Vec<ContextSummary>,
    pub timestamp: DateTime<Utc>,
}

impl SuggestedReplyResponse {
    pub fn from_result(email_id: impl Into<String>, result: &RAGResult) -> Self {
        Self {
            email_id: email_id.into(),
            suggested_reply: result.suggested_reply.clone(),
            confidence: result.confidence,
            context: result
                .retrieved_context
                .iter()
                .map(|ctx| ContextSummary {
                    category: ctx.category.clone(),
                    score: ctx.score,
                })
                .collect(),
            timestamp: Utc::now(),
        }
    }
}

/// JSON body for a failed suggest-reply request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl From<&RagError> for ErrorResponse {
    fn from(err: &RagError) -> Self {
        Self {
            error: err.user_message().to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::RetrievedContext;

    #[test]
    fn test_to_rag_text() {
        let email = EmailMessage {
            subject: "Pricing question".to_string(),
            from: "john@example.com".to_string(),
            date: "2024-05-01T10:00:00Z".to_string(),
            body: "Can I get pricing and book a demo?".to_string(),
        };

        assert_eq!(
            email.to_rag_text(),
            "Subject: Pricing question\nFrom: john@example.com\nDate: 2024-05-01T10:00:00Z\n\nCan I get pricing and book a demo?"
        );
    }

    #[test]
    fn test_response_from_result() {
        let result = RAGResult {
            suggested_reply: "Hi John".to_string(),
            retrieved_context: vec![
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
            ],
            confidence: 80,
        };

        let response = SuggestedReplyResponse::from_result("abc", &result);
        assert_eq!(response.email_id, "abc");
        assert_eq!(response.context.len(), 2);
        assert_eq!(response.context[1].category, "meeting-link");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["emailId"], "abc");
        assert_eq!(json["suggestedReply"], "Hi John");
        assert!(json["context"][0].get("text").is_none());
    }

    #[test]
    fn test_error_response() {
        let response = ErrorResponse::from(&RagError::EmptyKnowledgeBase);
        assert!(response.error.contains("Knowledge base not initialized"));
        assert!(response.details.contains("knowledge base is seeded"));
    }
}

// Terminal rendering of pipeline results
use colored::Colorize;

use crate::rag::{RAGResult, RetrievedContext};

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Color for a confidence percentage
fn paint_confidence(confidence: u8) -> String {
    let text = format!("{}%", confidence);
    match confidence {
        70..=100 => text.green().bold().to_string(),
        40..=69 => text.yellow().bold().to_string(),
        _ => text.red().bold().to_string(),
    }
}

/// Ranked snippet list, one block per snippet
pub fn render_context(context: &[RetrievedContext]) -> String {
    if context.is_empty() {
        return "No knowledge snippets found.".dimmed().to_string();
    }

    context
        .iter()
        .enumerate()
        .map(|(idx, ctx)| {
            format!(
                "[{}] Category: {} (Score: {:.3})\n{}",
                idx + 1,
                ctx.category.cyan(),
                ctx.score,
                ctx.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Reply, grounding context and confidence
pub fn render_result(result: &RAGResult) -> String {
    format!(
        "{}\n{}\n\n{}\n{}\n\n{}\n{}\n\nConfidence: {}",
        "Retrieved Context:".bold(),
        render_context(&result.retrieved_context),
        rule(),
        "Suggested Reply:".bold(),
        result.suggested_reply,
        rule(),
        paint_confidence(result.confidence)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> RAGResult {
        RAGResult {
            suggested_reply: "Hi John,\n\nBest regards,".to_string(),
            retrieved_context: vec![RetrievedContext {
                text: "Starter is $49/month".to_string(),
                category: "pricing".to_string(),
                score: 0.8234,
            }],
            confidence: 82,
        }
    }

    #[test]
    fn test_render_result_contains_parts() {
        colored::control::set_override(false);
        let rendered = render_result(&result());

        assert!(rendered.contains("[1] Category: pricing (Score: 0.823)"));
        assert!(rendered.contains("Best regards,"));
        assert!(rendered.contains("Confidence: 82%"));
    }

    #[test]
    fn test_render_empty_context() {
        colored::control::set_override(false);
        assert_eq!(render_context(&[]), "No knowledge snippets found.");
    }
}

//! Prompts for the generation calls

use homeshield_domain::traits::ChatMessage;

/// Claim field extraction instructions
pub const EXTRACTION_INSTRUCTIONS: &str = "Extract claim fields from the user's text. \
Return a STRICT JSON object with exactly these keys: \
\"appliance\" (string), \"issue\" (string), \"failure_date\" (string or null). \
Output JSON only.";

/// Coverage adjudication instructions
pub const ADJUDICATION_INSTRUCTIONS: &str = "You are an insurance adjudicator for a HOME WARRANTY policy. \
Decide coverage STRICTLY from the provided policy context. \
If ANY exclusion applies, the outcome is NOT covered. \
If context is insufficient, respond 'uncertain'. \
Output ONLY a minified JSON object with keys: \
{\"covered\":\"yes|no|uncertain\",\"reason\":\"<short one-sentence rationale>\"}.";

/// Question answering instructions
pub const QA_INSTRUCTIONS: &str = "You are HomeShield AI. Answer ONLY using the provided context from policy documents. \
Return STRICT JSON with keys: answer: string, citations: list of {source, page, quote}.";

/// Messages for extracting claim fields from a customer message
pub fn extraction_messages(message: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(EXTRACTION_INSTRUCTIONS),
        ChatMessage::user(message),
    ]
}

/// Messages for adjudicating one issue against formatted policy context
pub fn adjudication_messages(issue: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ADJUDICATION_INSTRUCTIONS),
        ChatMessage::user(format!("Issue:\n{}\n\nPolicy context:\n{}", issue, context)),
    ]
}

/// Messages for answering a question from formatted policy context
pub fn qa_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(QA_INSTRUCTIONS),
        ChatMessage::user(format!("Question: {}\n\nContext:\n{}", question, context)),
    ]
}

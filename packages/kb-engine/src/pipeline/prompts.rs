//! LLM prompts for the synthesis pipelines.
//!
//! Every formatter returns a [`Prompt`] tagged with its [`PromptKind`] so that
//! offline and test backends can answer without inspecting the text.

use crate::traits::llm::{Prompt, PromptKind};
use crate::types::faq::AnswerMode;

/// Exact phrase strict-mode answers use when the documents are insufficient.
pub const REFUSAL_ANSWER: &str =
    "I cannot answer this question based on the provided documentation.";

/// Prompt for proposing topics from a corpus sample.
pub const TOPIC_EXTRACTION_PROMPT: &str = r#"You are analyzing a technical documentation corpus.

Based ONLY on the documentation sample below, identify exactly 3 distinct topics
that developers most often need help with. Each topic must be a short label
(2-4 words) that is clearly covered by the sample.

Output a JSON array of exactly 3 strings and nothing else:
["Topic One", "Topic Two", "Topic Three"]

Documentation sample:
{sample}"#;

/// Strict answering: documents only, explicit refusal, literal citations.
pub const STRICT_ANSWER_PROMPT: &str = r#"You are a documentation assistant. Answer the question using ONLY the documentation excerpts below.

Rules:
- Use only facts stated in the excerpts. Do not use outside knowledge.
- If the excerpts do not contain enough information, reply with exactly:
  "{refusal}"
- Cite the source identifier shown in square brackets (for example [path-params])
  for every statement you make. Only cite identifiers that appear below.

Documentation excerpts:
{context}

Question: {question}

Answer:"#;

/// Flexible answering: documents first, general knowledge may fill gaps.
pub const FLEXIBLE_ANSWER_PROMPT: &str = r#"You are a helpful developer assistant.

Answer the question, preferring the documentation excerpts below. When the
excerpts leave gaps you may supplement them with general domain knowledge.
Cite source identifiers in square brackets where the excerpts support you.

Documentation excerpts:
{context}

Question: {question}

Answer:"#;

/// Prompt for corpus-only FAQ generation for one topic.
pub const KB_FAQ_PROMPT: &str = r#"You are writing a developer FAQ about "{topic}".

Using ONLY the documentation excerpts below, write {count} frequently asked
questions with concise answers. Every answer must be supported by the excerpts.

Output a JSON array and nothing else:
[
    {"question": "...", "answer": "..."}
]

Documentation excerpts:
{context}"#;

/// Map step: summarize one chunk.
pub const EXECUTIVE_MAP_PROMPT: &str = r#"Summarize the following documentation content into a concise
executive-level overview for developers. Focus on purpose, core features,
and common use cases.

{content}"#;

/// Reduce step: merge partial summaries.
pub const EXECUTIVE_REDUCE_PROMPT: &str = r#"Combine the following partial summaries of a documentation set into
one concise executive-level overview for developers. Focus on purpose,
core features, and common use cases. Do not repeat points.

Partial summaries:
{summaries}"#;

/// Prompt for summarizing one documentation section.
pub const SECTION_SUMMARY_PROMPT: &str = r#"Summarize the following documentation section "{section}"
in 3-4 bullet points focusing on developer usage.

{content}"#;

/// Truncate to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Substitute `{name}` placeholders in a single pass over `template`.
///
/// Inserted values are never rescanned, so corpus text or user input that
/// happens to contain a placeholder is kept literally.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let found = values
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
        match found {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Format the topic extraction prompt over a corpus sample.
pub fn format_topic_prompt(sample: &str) -> Prompt {
    Prompt::new(
        PromptKind::TopicExtraction,
        fill(TOPIC_EXTRACTION_PROMPT, &[("sample", sample)]),
    )
}

/// Format the answer prompt for the given mode.
pub fn format_answer_prompt(question: &str, context: &str, mode: AnswerMode) -> Prompt {
    let template = match mode {
        AnswerMode::Strict => STRICT_ANSWER_PROMPT,
        AnswerMode::Flexible => FLEXIBLE_ANSWER_PROMPT,
    };

    Prompt::new(
        PromptKind::Answer,
        fill(
            template,
            &[("refusal", REFUSAL_ANSWER), ("context", context), ("question", question)],
        ),
    )
}

/// Format the corpus-only FAQ prompt.
pub fn format_kb_faq_prompt(topic: &str, context: &str, count: usize) -> Prompt {
    let count = count.to_string();
    Prompt::new(
        PromptKind::KbFaq,
        fill(
            KB_FAQ_PROMPT,
            &[("topic", topic), ("count", &count), ("context", context)],
        ),
    )
}

/// Format the map prompt for one chunk.
pub fn format_executive_map_prompt(content: &str) -> Prompt {
    Prompt::new(
        PromptKind::ExecutiveMap,
        fill(EXECUTIVE_MAP_PROMPT, &[("content", content)]),
    )
}

/// Format the reduce prompt over joined partial summaries.
pub fn format_executive_reduce_prompt(summaries: &str) -> Prompt {
    Prompt::new(
        PromptKind::ExecutiveReduce,
        fill(EXECUTIVE_REDUCE_PROMPT, &[("summaries", summaries)]),
    )
}

/// Format the section summary prompt.
pub fn format_section_prompt(section: &str, content: &str) -> Prompt {
    Prompt::new(
        PromptKind::SectionSummary,
        fill(SECTION_SUMMARY_PROMPT, &[("section", section), ("content", content)]),
    )
}

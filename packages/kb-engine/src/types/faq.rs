//! FAQ types - items, per-topic groups, and the persisted run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How strictly answers must stay inside the retrieved documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Answer only from the documents; refuse when they are insufficient.
    #[default]
    Strict,

    /// Prefer the documents, but general domain knowledge may fill gaps.
    Flexible,
}

impl AnswerMode {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Strict
        } else {
            Self::Flexible
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Flexible => "flexible",
        }
    }
}

/// Where an FAQ question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaqOrigin {
    /// A real question sourced from Stack Overflow, answered from the corpus.
    Stackoverflow,

    /// A question and answer generated from the corpus alone.
    KbGenerated,
}

/// One question with its grounded answer.
///
/// The answer is frozen once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,

    /// Always a subset of the retrieved citation set (possibly empty)
    pub sources: Vec<String>,

    pub topic: String,

    /// Distance of the best retrieved chunk; `None` when nothing was retrieved
    pub retrieval_distance: Option<f32>,

    pub origin: FaqOrigin,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stackoverflow_link: Option<String>,
}

impl FaqItem {
    /// Create a corpus-generated item.
    pub fn generated(
        topic: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        sources: Vec<String>,
        retrieval_distance: Option<f32>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            sources,
            topic: topic.into(),
            retrieval_distance,
            origin: FaqOrigin::KbGenerated,
            score: None,
            view_count: None,
            stackoverflow_link: None,
        }
    }

    /// Whether the item carries no grounding at all.
    pub fn is_unsupported(&self) -> bool {
        self.sources.is_empty()
    }
}

/// All FAQ items produced for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicFaqs {
    pub topic: String,
    pub faqs: Vec<FaqItem>,
}

/// Which question sources a run actually used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcingStrategy {
    /// Every topic was served by external questions.
    Stackoverflow,

    /// Every topic fell back to corpus-only generation.
    KnowledgeBase,

    /// Some topics of each kind.
    Mixed,
}

impl SourcingStrategy {
    /// Summarize per-topic outcomes (`true` = external questions used).
    pub fn from_outcomes(external: &[bool]) -> Self {
        let used = external.iter().filter(|e| **e).count();
        if used > 0 && used == external.len() {
            Self::Stackoverflow
        } else if used == 0 {
            Self::KnowledgeBase
        } else {
            Self::Mixed
        }
    }
}

/// Run-level metadata stored with the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqMetadata {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub question_source: SourcingStrategy,
    pub answer_source: String,
    pub mode: AnswerMode,
    pub total_topics: usize,
    pub total_faqs: usize,
}

/// The complete, persisted output of one FAQ run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqReport {
    pub topics: Vec<TopicFaqs>,
    pub metadata: FaqMetadata,
}

impl FaqReport {
    /// Aggregate per-topic results into a report.
    pub fn new(topics: Vec<TopicFaqs>, mode: AnswerMode, external: &[bool]) -> Self {
        let total_faqs = topics.iter().map(|t| t.faqs.len()).sum();
        let metadata = FaqMetadata {
            run_id: Uuid::now_v7(),
            generated_at: Utc::now(),
            question_source: SourcingStrategy::from_outcomes(external),
            answer_source: "knowledge_base".to_string(),
            mode,
            total_topics: topics.len(),
            total_faqs,
        };
        Self { topics, metadata }
    }

    /// Iterate over every item in topic order.
    pub fn items(&self) -> impl Iterator<Item = &FaqItem> {
        self.topics.iter().flat_map(|t| t.faqs.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sourcing_strategy() {
        assert_eq!(SourcingStrategy::from_outcomes(&[true, true]), SourcingStrategy::Stackoverflow);
        assert_eq!(SourcingStrategy::from_outcomes(&[false, false]), SourcingStrategy::KnowledgeBase);
        assert_eq!(SourcingStrategy::from_outcomes(&[true, false]), SourcingStrategy::Mixed);
        assert_eq!(SourcingStrategy::from_outcomes(&[]), SourcingStrategy::KnowledgeBase);
    }

    #[test]
    fn test_report_totals() {
        let topics = vec![
            TopicFaqs {
                topic: "A".into(),
                faqs: vec![FaqItem::generated("A", "q1", "a1", vec!["s".into()], Some(0.2))],
            },
            TopicFaqs {
                topic: "B".into(),
                faqs: vec![
                    FaqItem::generated("B", "q2", "a2", vec![], None),
                    FaqItem::generated("B", "q3", "a3", vec![], None),
                ],
            },
        ];
        let report = FaqReport::new(topics, AnswerMode::Strict, &[false, false]);

        assert_eq!(report.metadata.total_topics, 2);
        assert_eq!(report.metadata.total_faqs, 3);
        assert_eq!(report.items().count(), 3);
    }

    #[test]
    fn test_external_fields_omitted_when_absent() {
        let item = FaqItem::generated("A", "q", "a", vec![], None);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["origin"], "kb_generated");
        assert!(json.get("stackoverflow_link").is_none());
    }
}

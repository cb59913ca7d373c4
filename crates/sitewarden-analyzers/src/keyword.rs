//! Keyword extraction and density

use async_trait::async_trait;
use serde_json::json;

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

const TOP_TERMS: usize = 10;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "do", "for", "from", "get", "had", "has", "have", "he", "her",
    "his", "how", "if", "in", "into", "is", "it", "its", "just", "like", "more", "most", "my",
    "new", "no", "not", "of", "on", "one", "only", "or", "other", "our", "out", "over", "she",
    "so", "some", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "to", "up", "was", "we", "were", "what", "when", "which", "who", "will", "with",
    "would", "you", "your",
];

/// Top-term frequencies over the page's visible text
pub struct KeywordAnalyzer;

#[async_trait]
impl Capability for KeywordAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Keyword
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;
        let terms = top_terms(&page.text, TOP_TERMS);
        let total = page.word_count.max(1);

        let keywords: Vec<_> = terms
            .iter()
            .map(|(term, count)| {
                json!({
                    "term": term,
                    "count": count,
                    "density": (*count as f64 / total as f64 * 1000.0).round() / 1000.0,
                })
            })
            .collect();

        Ok(CapabilityOutput::Analysis(json!({
            "total_words": page.word_count,
            "keywords": keywords,
        })))
    }
}

/// The `limit` most frequent non-stopword terms, most frequent first;
/// ties break alphabetically for stable output
pub fn top_terms(text: &str, limit: usize) -> Vec<(String, usize)> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for raw in text.split_whitespace() {
        let term: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if term.len() < 3 || STOPWORDS.contains(&term.as_str()) {
            continue;
        }
        *counts.entry(term).or_insert(0) += 1;
    }

    let mut terms: Vec<(String, usize)> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(limit);
    terms
}

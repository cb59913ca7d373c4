//! Content quality analysis

use async_trait::async_trait;
use serde_json::json;

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

const THIN_CONTENT_WORDS: usize = 300;

/// Readability and depth signals, informed by extracted keywords
pub struct ContentAnalyzer;

#[async_trait]
impl Capability for ContentAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Content
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;
        let keywords = ctx.dependency(CapabilityId::Keyword)?;

        let sentences = count_sentences(&page.text);
        let avg_sentence_words = if sentences > 0 {
            page.word_count / sentences
        } else {
            0
        };

        let top_term = keywords["keywords"][0]["term"].as_str().unwrap_or("");
        let term_in_headings = !top_term.is_empty()
            && page.headings.iter().any(|h| {
                h.text.to_lowercase().contains(top_term)
            });

        let mut issues: Vec<String> = Vec::new();
        if page.word_count < THIN_CONTENT_WORDS {
            issues.push(format!(
                "thin content: {} words, aim for at least {THIN_CONTENT_WORDS}",
                page.word_count
            ));
        }
        if avg_sentence_words > 25 {
            issues.push(format!(
                "long sentences: averaging {avg_sentence_words} words"
            ));
        }
        if !top_term.is_empty() && !term_in_headings {
            issues.push(format!("top keyword \"{top_term}\" absent from headings"));
        }

        Ok(CapabilityOutput::Analysis(json!({
            "word_count": page.word_count,
            "sentences": sentences,
            "avg_sentence_words": avg_sentence_words,
            "top_term_in_headings": term_in_headings,
            "issues": issues,
        })))
    }
}

fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sitewarden_core::{Heading, PageData};

    fn ctx_with(page: PageData, keywords: serde_json::Value) -> CapabilityContext {
        let prior = std::collections::BTreeMap::from([(CapabilityId::Keyword, keywords)]);
        CapabilityContext::new("https://example.com".parse().unwrap())
            .with_page(Arc::new(page))
            .with_prior(prior)
    }

    #[test]
    fn test_count_sentences() {
        assert_eq!(count_sentences("One. Two! Three?"), 3);
        assert_eq!(count_sentences(""), 0);
    }

    #[tokio::test]
    async fn test_flags_thin_content_and_missing_keyword() {
        let mut page = PageData::new("https://example.com", 200);
        page.text = "Short body about nothing.".to_string();
        page.word_count = 4;
        page.headings.push(Heading {
            level: 1,
            text: "Unrelated".to_string(),
        });

        let keywords = json!({ "keywords": [{ "term": "rust", "count": 9 }] });
        let output = ContentAnalyzer.compute(ctx_with(page, keywords)).await.unwrap();
        let value = output.summary();

        assert_eq!(value["top_term_in_headings"], false);
        let issues = value["issues"].as_array().unwrap();
        assert!(issues.iter().any(|i| i.as_str().unwrap().contains("thin content")));
        assert!(issues.iter().any(|i| i.as_str().unwrap().contains("rust")));
    }

    #[tokio::test]
    async fn test_keyword_in_heading_passes() {
        let mut page = PageData::new("https://example.com", 200);
        page.text = "Rust guide. ".repeat(200);
        page.word_count = 400;
        page.headings.push(Heading {
            level: 1,
            text: "The Rust Guide".to_string(),
        });

        let keywords = json!({ "keywords": [{ "term": "rust", "count": 200 }] });
        let output = ContentAnalyzer.compute(ctx_with(page, keywords)).await.unwrap();

        assert_eq!(output.summary()["top_term_in_headings"], true);
        assert!(output.summary()["issues"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_keyword_dependency_is_an_error() {
        let ctx = CapabilityContext::new("https://example.com".parse().unwrap())
            .with_page(Arc::new(PageData::new("https://example.com", 200)));
        let err = ContentAnalyzer.compute(ctx).await.unwrap_err();
        assert!(matches!(err, CapabilityError::MissingDependency(CapabilityId::Keyword)));
    }
}

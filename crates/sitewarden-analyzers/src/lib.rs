//! Built-in capability implementations for sitewarden.
//!
//! Each analyzer implements the engine's [`Capability`] trait. The
//! [`HttpCrawler`] is foundational; everything else works from the
//! crawled [`PageData`](sitewarden_core::PageData) and, for the
//! higher-level analyzers, from the JSON outputs of earlier
//! capabilities.

mod content;
mod fetcher;
mod image;
mod keyword;
mod learning;
mod meta;
mod page;
mod report;
mod schema;
mod sitemap;
mod technical;
mod validation;

pub use content::ContentAnalyzer;
pub use fetcher::HttpCrawler;
pub use image::ImageAnalyzer;
pub use keyword::KeywordAnalyzer;
pub use learning::LearningAnalyzer;
pub use meta::MetaAnalyzer;
pub use page::parse_page;
pub use report::ReportAnalyzer;
pub use schema::SchemaAnalyzer;
pub use sitemap::SitemapExpander;
pub use technical::TechnicalAnalyzer;
pub use validation::ValidationAnalyzer;

use std::sync::Arc;

use sitewarden_core::{Config, Result};
use sitewarden_engine::Capability;

/// One instance of every built-in capability, ready to bind into a
/// `CapabilityExecutor`
pub fn default_bindings(config: &Config) -> Result<Vec<Arc<dyn Capability>>> {
    Ok(vec![
        Arc::new(HttpCrawler::new(&config.crawler)?),
        Arc::new(KeywordAnalyzer),
        Arc::new(TechnicalAnalyzer),
        Arc::new(SchemaAnalyzer),
        Arc::new(ImageAnalyzer),
        Arc::new(ContentAnalyzer),
        Arc::new(MetaAnalyzer),
        Arc::new(ValidationAnalyzer),
        Arc::new(ReportAnalyzer),
        Arc::new(LearningAnalyzer),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_cover_every_capability() {
        let bindings = default_bindings(&Config::default()).unwrap();
        let mut ids: Vec<_> = bindings.iter().map(|c| c.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), sitewarden_core::CapabilityId::ALL.len());
    }
}

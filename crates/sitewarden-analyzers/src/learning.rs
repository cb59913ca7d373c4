//! Learning plan: turns report recommendations into study themes

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

/// Groups the report's recommendations into per-area learning themes
pub struct LearningAnalyzer;

#[async_trait]
impl Capability for LearningAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Learning
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let report = ctx.dependency(CapabilityId::Report)?;

        let mut by_area: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for rec in report["recommendations"].as_array().into_iter().flatten() {
            let area = rec["capability"].as_str().unwrap_or("general").to_string();
            let message = rec["message"].as_str().unwrap_or("").to_string();
            by_area.entry(area).or_default().push(message);
        }

        let themes: Vec<Value> = by_area
            .iter()
            .map(|(area, items)| {
                json!({
                    "area": area,
                    "items": items,
                })
            })
            .collect();

        // The area with the most open items is the suggested starting point
        let focus = by_area
            .iter()
            .max_by_key(|(_, items)| items.len())
            .map(|(area, _)| area.clone());

        Ok(CapabilityOutput::Analysis(json!({
            "score": report["score"],
            "themes": themes,
            "focus": focus,
        })))
    }
}

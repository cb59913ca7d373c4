//! Structured data (JSON-LD) analysis

use async_trait::async_trait;
use serde_json::{json, Value};

use sitewarden_core::{CapabilityError, CapabilityId};
use sitewarden_engine::{Capability, CapabilityContext, CapabilityOutput};

/// Parses the page's JSON-LD blocks and collects declared types
pub struct SchemaAnalyzer;

#[async_trait]
impl Capability for SchemaAnalyzer {
    fn id(&self) -> CapabilityId {
        CapabilityId::Schema
    }

    async fn compute(
        &self,
        ctx: CapabilityContext,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let page = ctx.page()?;

        let mut types: Vec<String> = Vec::new();
        let mut invalid = 0usize;
        for block in &page.json_ld {
            match serde_json::from_str::<Value>(block) {
                Ok(value) => collect_types(&value, &mut types),
                Err(_) => invalid += 1,
            }
        }
        types.sort();
        types.dedup();

        Ok(CapabilityOutput::Analysis(json!({
            "blocks": page.json_ld.len(),
            "invalid_blocks": invalid,
            "types": types,
            "has_structured_data": !types.is_empty(),
        })))
    }
}

/// Recursively collect `@type` declarations
fn collect_types(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => out.push(t.clone()),
                Some(Value::Array(items)) => {
                    out.extend(items.iter().filter_map(|i| i.as_str().map(String::from)));
                }
                _ => {}
            }
            for nested in map.values() {
                collect_types(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_types(item, out);
            }
        }
        _ => {}
    }
}

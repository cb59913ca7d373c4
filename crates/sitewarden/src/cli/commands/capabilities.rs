//! Capabilities command

use clap::Args;
use console::style;
use tracing::info;

use sitewarden_engine::CapabilityRegistry;

use crate::cli::{Cli, OutputFormat};

/// List registered capabilities and their dependencies
#[derive(Debug, Args)]
pub struct CapabilitiesCommand {}

impl CapabilitiesCommand {
    /// Execute the capabilities command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing capabilities command");

        let registry = CapabilityRegistry::standard();

        match cli.format {
            OutputFormat::Json => {
                let entries: Vec<_> = registry
                    .all_ids()
                    .into_iter()
                    .filter_map(|id| registry.get(id).ok())
                    .map(|descriptor| {
                        serde_json::json!({
                            "id": descriptor.id,
                            "foundational": descriptor.foundational,
                            "depends_on": descriptor.hard_dependencies,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Text => {
                println!("{}", style("Capabilities").bold());
                for id in registry.all_ids() {
                    let Ok(descriptor) = registry.get(id) else {
                        continue;
                    };
                    let deps: Vec<&str> = descriptor
                        .hard_dependencies
                        .iter()
                        .map(|d| d.as_str())
                        .collect();
                    let marker = if descriptor.foundational {
                        style("foundational").yellow().to_string()
                    } else if deps.is_empty() {
                        style("independent").dim().to_string()
                    } else {
                        format!("after: {}", deps.join(", "))
                    };
                    println!("  {} ({})", style(id.as_str()).cyan(), marker);
                }
            }
        }

        Ok(())
    }
}

//! Plan command

use std::collections::BTreeSet;

use clap::Args;
use console::style;
use tracing::info;

use sitewarden_core::CapabilityId;
use sitewarden_engine::{CapabilityRegistry, ExecutionPlan};

use crate::cli::{Cli, OutputFormat};

/// Show the execution plan for a capability set
#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Capabilities to plan for (defaults to all registered)
    #[arg(short, long, value_delimiter = ',')]
    pub capabilities: Vec<String>,
}

impl PlanCommand {
    /// Execute the plan command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(capabilities = ?self.capabilities, "executing plan command");

        let registry = CapabilityRegistry::standard();
        registry.validate()?;

        let requested: BTreeSet<CapabilityId> = if self.capabilities.is_empty() {
            CapabilityId::ALL.iter().copied().collect()
        } else {
            self.capabilities
                .iter()
                .map(|name| name.parse::<CapabilityId>())
                .collect::<Result<_, _>>()?
        };

        let plan = ExecutionPlan::resolve(&registry, &requested)?;

        match cli.format {
            OutputFormat::Json => {
                let stages: Vec<Vec<&str>> = plan
                    .stages()
                    .iter()
                    .map(|stage| stage.iter().map(CapabilityId::as_str).collect())
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "capabilities": plan.total(),
                        "stages": stages,
                    }))?
                );
            }
            OutputFormat::Text => {
                println!(
                    "{} ({} capabilities, {} stages)",
                    style("Execution plan").bold(),
                    plan.total(),
                    plan.stages().len()
                );
                print!("{}", plan.describe(&registry));
            }
        }

        Ok(())
    }
}

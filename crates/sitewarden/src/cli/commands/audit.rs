//! Audit command

use std::collections::BTreeSet;
use std::sync::Arc;

use clap::Args;
use console::style;
use tracing::info;
use url::Url;

use sitewarden_analyzers::{default_bindings, SitemapExpander};
use sitewarden_core::config::load_config;
use sitewarden_core::{load_config_or_default, validate_config, CapabilityId, Task};
use sitewarden_engine::{
    AuditOutcome, CapabilityExecutor, CapabilityRegistry, ChannelEmitter, MultiTargetDriver,
    ProgressSink, ResultAggregator,
};

use crate::cli::output::{self, ProgressRenderer};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Audit one or more targets
#[derive(Debug, Args)]
pub struct AuditCommand {
    /// Target URLs to audit
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Capabilities to run (defaults to all registered)
    #[arg(short, long, value_delimiter = ',')]
    pub capabilities: Vec<String>,

    /// Expand each target through its sitemap.xml before auditing
    #[arg(long)]
    pub sitemap: bool,

    /// Cap on targets after sitemap expansion (overrides config)
    #[arg(long)]
    pub max_targets: Option<usize>,

    /// Per-capability timeout in seconds (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl AuditCommand {
    /// Execute the audit command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            targets = self.targets.len(),
            capabilities = ?self.capabilities,
            sitemap = self.sitemap,
            "executing audit command"
        );
        let cwd = std::env::current_dir()?;
        let (mut config, config_path) = match &cli.config {
            Some(path) => (load_config(path)?, Some(path.clone())),
            None => load_config_or_default(&cwd),
        };
        if let Some(max_targets) = self.max_targets {
            config.engine.max_targets = max_targets;
        }
        if let Some(timeout) = self.timeout {
            config.engine.capability_timeout_secs = timeout;
        }
        validate_config(&config)?;

        if config_path.is_none() && !cli.quiet {
            output::info("no configuration found, using defaults");
        }

        let requested = parse_capabilities(&self.capabilities)?;
        let targets: Vec<Url> = self
            .targets
            .iter()
            .map(|raw| {
                raw.parse::<Url>()
                    .map_err(|e| anyhow::anyhow!("invalid target URL '{raw}': {e}"))
            })
            .collect::<anyhow::Result<_>>()?;

        let registry = Arc::new(CapabilityRegistry::standard());
        registry.validate()?;

        let mut executor =
            CapabilityExecutor::new(Arc::clone(&registry), config.engine.capability_timeout());
        executor.bind_all(default_bindings(&config)?);
        let executor = Arc::new(executor);

        let runtime = tokio::runtime::Runtime::new()?;
        let (outcome, dropped) = runtime.block_on(async {
            let targets = if self.sitemap {
                expand_targets(&config, &targets).await?
            } else {
                targets
            };

            let (emitter, rx) = ChannelEmitter::channel(config.engine.channel_capacity);
            let renderer = tokio::spawn(ProgressRenderer::new(cli.quiet).run(rx));

            let sink: Arc<dyn ProgressSink> = emitter.clone();
            let driver = MultiTargetDriver::new(registry.clone(), executor, sink);
            let result = driver.run(&targets, &requested).await;

            let dropped = emitter.dropped_count();
            drop(driver);
            drop(emitter);
            let _ = renderer.await;

            Ok::<_, anyhow::Error>((result?, dropped))
        })?;

        if dropped > 0 {
            info!(dropped, "progress events dropped by slow observer");
        }

        self.render(cli, &registry, &outcome)?;

        if outcome.failed_targets() > 0 {
            std::process::exit(exit_codes::TARGET_FAILURES);
        }
        if outcome.failed_capabilities() > 0 {
            std::process::exit(exit_codes::CAPABILITY_FAILURES);
        }
        Ok(())
    }

    fn render(
        &self,
        cli: &Cli,
        registry: &CapabilityRegistry,
        outcome: &AuditOutcome,
    ) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                let report: Vec<_> = outcome
                    .tasks
                    .values()
                    .map(|task| {
                        serde_json::json!({
                            "summary": ResultAggregator::summarize(registry, task),
                            "results": ResultAggregator::merge(task),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                for task in outcome.tasks.values() {
                    render_task(cli, registry, task);
                }
                let failed = outcome.failed_targets();
                if failed == 0 {
                    output::success(&format!("{} targets audited", outcome.tasks.len()));
                } else {
                    output::error(&format!(
                        "{failed} of {} targets failed",
                        outcome.tasks.len()
                    ));
                }
            }
        }
        Ok(())
    }
}

fn render_task(cli: &Cli, registry: &CapabilityRegistry, task: &Task) {
    let summary = ResultAggregator::summarize(registry, task);

    println!();
    println!(
        "{}",
        output::header(&output::target_style().apply_to(&summary.target).to_string())
    );

    if let Some(score) = report_score(task) {
        println!(
            "{}",
            output::key_value("score", &output::score_style().apply_to(score).to_string())
        );
    }
    println!(
        "{}",
        output::key_value("succeeded", &join_ids(&summary.succeeded))
    );
    if !summary.failed.is_empty() {
        println!("{}", output::key_value("failed", &join_ids(&summary.failed)));
    }
    if !summary.unmet.is_empty() {
        println!("{}", output::key_value("unmet", &join_ids(&summary.unmet)));
    }

    for (id, record) in &task.results {
        if let Some(failure) = record.as_failure() {
            println!(
                "  {} {}: {}",
                style("✗").red(),
                id,
                failure.message
            );
        } else if cli.verbose {
            if let Some(value) = record.output() {
                println!("  {} {}: {}", style("✓").green(), id, value);
            }
        }
    }
}

fn report_score(task: &Task) -> Option<u64> {
    task.results
        .get(&CapabilityId::Report)?
        .output()?
        .get("score")?
        .as_u64()
}

fn join_ids(ids: &[CapabilityId]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(CapabilityId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse capability names; empty input means every registered capability
fn parse_capabilities(raw: &[String]) -> anyhow::Result<BTreeSet<CapabilityId>> {
    if raw.is_empty() {
        return Ok(CapabilityId::ALL.iter().copied().collect());
    }
    raw.iter()
        .map(|name| name.parse::<CapabilityId>().map_err(Into::into))
        .collect()
}

async fn expand_targets(
    config: &sitewarden_core::Config,
    targets: &[Url],
) -> anyhow::Result<Vec<Url>> {
    let expander = SitemapExpander::new(&config.crawler, config.engine.max_targets)?;
    let mut expanded = Vec::new();
    for target in targets {
        expanded.extend(expander.expand(target).await);
    }
    expanded.truncate(config.engine.max_targets);
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capabilities_defaults_to_all() {
        let parsed = parse_capabilities(&[]).unwrap();
        assert_eq!(parsed.len(), CapabilityId::ALL.len());
    }

    #[test]
    fn test_parse_capabilities_rejects_unknown() {
        let err = parse_capabilities(&["keyword".to_string(), "bogus".to_string()]);
        assert!(err.is_err());
    }

    #[test]
    fn test_join_ids() {
        assert_eq!(join_ids(&[]), "none");
        assert_eq!(
            join_ids(&[CapabilityId::Crawl, CapabilityId::Keyword]),
            "crawl, keyword"
        );
    }
}

//! Output formatting utilities

use console::{style, Style};
use indicatif::{ProgressBar, ProgressStyle};

use sitewarden_engine::{ProgressEvent, ProgressKind};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Style for target URLs
pub fn target_style() -> Style {
    Style::new().cyan()
}

/// Style for scores
pub fn score_style() -> Style {
    Style::new().green().bold()
}

/// Renders engine progress events onto an indicatif bar.
///
/// Consumes events from the channel until the emitter closes; meant to
/// run as its own task alongside the driver.
pub struct ProgressRenderer {
    bar: ProgressBar,
    quiet: bool,
}

impl ProgressRenderer {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(100);
            bar.set_style(
                ProgressStyle::with_template("{bar:30.cyan/dim} {pos:>3}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        };
        Self { bar, quiet }
    }

    /// Drain events until the sender side closes
    pub async fn run(self, mut rx: tokio::sync::mpsc::Receiver<ProgressEvent>) {
        while let Some(event) = rx.recv().await {
            self.render(&event);
        }
        self.bar.finish_and_clear();
    }

    fn render(&self, event: &ProgressEvent) {
        self.bar.set_position(event.percent as u64);
        match event.kind {
            ProgressKind::TargetStart => {
                self.bar.set_message(event.message.clone());
            }
            ProgressKind::CapabilityStart | ProgressKind::Progress => {
                self.bar.set_message(event.message.clone());
            }
            ProgressKind::CapabilityComplete => {
                if let Some(capability) = event.capability {
                    self.bar.set_message(format!("{capability} done"));
                }
            }
            ProgressKind::CapabilityError | ProgressKind::Error => {
                if !self.quiet {
                    self.bar
                        .println(format!("{} {}", style("✗").red().bold(), event.message));
                }
            }
            _ => {}
        }
    }
}

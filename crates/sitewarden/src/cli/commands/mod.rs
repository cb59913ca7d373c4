//! CLI commands

mod audit;
mod capabilities;
mod plan;

pub use audit::AuditCommand;
pub use capabilities::CapabilitiesCommand;
pub use plan::PlanCommand;

//! Controller command abstraction layer
//!
//! Each command module (custom roles, virtual AC cycle) implements
//! `ControllerCommand`. A command first probes the controller for support and
//! only then runs the single action it was built with.

pub mod power;
pub mod roles;

pub use power::PowerCommand;
pub use roles::RoleCommand;

use crate::error::Result;
use crate::http::HttpClient;
use crate::models::FinalPowerState;
use async_trait::async_trait;
use std::fmt;

/// Trait defining the interface for controller commands
#[async_trait]
pub trait ControllerCommand: Send + Sync {
    /// Returns the human-readable name of this command
    fn name(&self) -> &str;

    /// Check that the controller generation supports this command.
    /// Must succeed before anything is executed.
    async fn probe(&self, client: &HttpClient) -> Result<()>;

    /// Run the selected action
    async fn execute(&self, client: &HttpClient) -> Result<Outcome>;

    /// Probe, then execute
    async fn run(&self, client: &HttpClient) -> Result<Outcome> {
        self.probe(client).await?;
        tracing::debug!("[{}] controller supports this command", self.name());
        self.execute(client).await
    }
}

/// Successful result of a command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    CustomRoles(Vec<serde_json::Value>),
    NoCustomRoles,
    RoleCreated(String),
    RoleDeleted(String),
    PowerState(String),
    PowerCycleRequested,
    ExtendedResetRequested(Option<FinalPowerState>),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::CustomRoles(roles) => {
                writeln!(f, "{} custom role(s) found", roles.len())?;
                for role in roles {
                    let pretty =
                        serde_json::to_string_pretty(role).map_err(|_| fmt::Error)?;
                    writeln!(f, "{}", pretty)?;
                }
                Ok(())
            }
            Outcome::NoCustomRoles => write!(f, "no custom roles detected"),
            Outcome::RoleCreated(name) => write!(f, "custom role '{}' created", name),
            Outcome::RoleDeleted(path) => write!(f, "custom role '{}' deleted", path),
            Outcome::PowerState(state) => write!(f, "current server power state: {}", state),
            Outcome::PowerCycleRequested => {
                write!(f, "DMTF power cycle requested, virtual AC cycle in progress")
            }
            Outcome::ExtendedResetRequested(Some(state)) => write!(
                f,
                "OEM extended reset requested, server will end in power state {:?}",
                state
            ),
            Outcome::ExtendedResetRequested(None) => {
                write!(f, "OEM extended reset requested")
            }
        }
    }
}

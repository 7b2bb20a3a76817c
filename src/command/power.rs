//! Virtual AC power cycle
//!
//! Supports reading the server power state, the DMTF chassis power cycle and
//! the Dell OEM extended reset. The OEM variant also drains residual (flea)
//! power and can optionally force the server off first.

use crate::command::{ControllerCommand, Outcome};
use crate::error::{RedfishError, Result};
use crate::http::HttpClient;
use crate::models::{FinalPowerState, ResetRequest, ResetType, SystemPower};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

pub const CHASSIS_PATH: &str = "/redfish/v1/Chassis/System.Embedded.1";
pub const SYSTEM_PATH: &str = "/redfish/v1/Systems/System.Embedded.1/";
pub const CHASSIS_RESET_PATH: &str =
    "/redfish/v1/Chassis/System.Embedded.1/Actions/Chassis.Reset";
pub const SYSTEM_RESET_PATH: &str =
    "/redfish/v1/Systems/System.Embedded.1/Actions/ComputerSystem.Reset";
pub const EXTENDED_RESET_PATH: &str =
    "/redfish/v1/Chassis/System.Embedded.1/Actions/Oem/DellOemChassis.ExtendedReset";

/// Fixed wait between a forced power off and the extended reset
pub const POWER_OFF_SETTLE: Duration = Duration::from_secs(10);
pub const POWER_OFF_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const POWER_OFF_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// How to wait for a forced power off to take effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Sleep unconditionally
    Fixed(Duration),
    /// Re-read PowerState until it reports Off
    Poll { interval: Duration, timeout: Duration },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        SettleStrategy::Fixed(POWER_OFF_SETTLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OemCycleOptions {
    /// Force the server off before the extended reset
    pub power_off: bool,
    pub final_power_state: Option<FinalPowerState>,
    pub settle: SettleStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerAction {
    GetState,
    DmtfCycle,
    OemCycle(OemCycleOptions),
}

pub struct PowerCommand {
    action: PowerAction,
}

impl PowerCommand {
    pub fn new(action: PowerAction) -> Self {
        Self { action }
    }
}

#[async_trait]
impl ControllerCommand for PowerCommand {
    fn name(&self) -> &str {
        "virtual-ac-cycle"
    }

    async fn probe(&self, client: &HttpClient) -> Result<()> {
        check_support(client).await
    }

    async fn execute(&self, client: &HttpClient) -> Result<Outcome> {
        match &self.action {
            PowerAction::GetState => Ok(Outcome::PowerState(get_power_state(client).await?)),
            PowerAction::DmtfCycle => {
                dmtf_power_cycle(client).await?;
                Ok(Outcome::PowerCycleRequested)
            }
            PowerAction::OemCycle(options) => {
                oem_power_cycle(client, options).await?;
                Ok(Outcome::ExtendedResetRequested(options.final_power_state))
            }
        }
    }
}

/// The chassis resource answers 200 or 202 on controllers that support this
pub async fn check_support(client: &HttpClient) -> Result<()> {
    let resp = client.get(CHASSIS_PATH).await?;

    match resp.status {
        200 | 202 => Ok(()),
        401 => Err(RedfishError::Unauthorized),
        status => {
            tracing::warn!("Chassis query returned {}, virtual AC cycle not supported", status);
            Err(RedfishError::UnsupportedVersion(format!(
                "chassis query returned HTTP {}",
                status
            )))
        }
    }
}

/// Current `PowerState`, verbatim
pub async fn get_power_state(client: &HttpClient) -> Result<String> {
    let system: SystemPower = client.get(SYSTEM_PATH).await?.expect_status(&[200])?.json()?;
    Ok(system.power_state)
}

/// Standard chassis power cycle. Some generations need the server off first;
/// that is left to the caller.
pub async fn dmtf_power_cycle(client: &HttpClient) -> Result<()> {
    tracing::info!("Requesting DMTF chassis power cycle...");
    client
        .post_json(CHASSIS_RESET_PATH, &ResetRequest::new(ResetType::PowerCycle))
        .await?
        .expect_status(&[204])?;
    Ok(())
}

/// OEM extended reset, optionally preceded by a forced power off.
///
/// A failed power off stops here and the extended reset is never sent. If the
/// extended reset fails after a successful power off, the server stays off.
pub async fn oem_power_cycle(client: &HttpClient, options: &OemCycleOptions) -> Result<()> {
    if options.power_off {
        force_off(client).await?;
        wait_for_power_off(client, options.settle).await?;
    }

    let body = extended_reset_body(options.final_power_state);
    tracing::info!("Requesting OEM extended reset...");
    client
        .post_json(EXTENDED_RESET_PATH, &body)
        .await?
        .expect_status(&[204])?;
    Ok(())
}

pub fn extended_reset_body(final_power_state: Option<FinalPowerState>) -> ResetRequest {
    ResetRequest {
        reset_type: ResetType::PowerCycle,
        final_power_state,
    }
}

async fn force_off(client: &HttpClient) -> Result<()> {
    tracing::info!("Forcing server power off...");
    client
        .post_json(SYSTEM_RESET_PATH, &ResetRequest::new(ResetType::ForceOff))
        .await?
        .expect_status(&[204])?;
    Ok(())
}

async fn wait_for_power_off(client: &HttpClient, settle: SettleStrategy) -> Result<()> {
    match settle {
        SettleStrategy::Fixed(delay) => {
            tracing::info!("Waiting {:?} for power off to settle", delay);
            tokio::time::sleep(delay).await;
            Ok(())
        }
        SettleStrategy::Poll { interval, timeout } => {
            let started = Instant::now();
            loop {
                let state = get_power_state(client).await?;
                if state == "Off" {
                    tracing::info!("Server reports PowerState Off");
                    return Ok(());
                }
                if started.elapsed() >= timeout {
                    return Err(RedfishError::PowerOffTimeout(timeout.as_secs()));
                }
                tracing::debug!("PowerState is {}, checking again in {:?}", state, interval);
                tokio::time::sleep(interval).await;
            }
        }
    }
}

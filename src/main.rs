//! idrac-oob - Out-of-band iDRAC management over Redfish
//!
//! Two independent commands, each probing the controller before acting:
//! custom user roles and virtual AC power cycling.

mod command;
mod config;
mod error;
mod http;
mod models;
mod parser;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use command::power::{OemCycleOptions, PowerAction, SettleStrategy};
use command::roles::RoleAction;
use command::{ControllerCommand, Outcome, PowerCommand, RoleCommand};
use error::RedfishError;
use http::{Credentials, HttpClient};
use models::{CreateRoleRequest, FinalPowerState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const ROLE_EXAMPLES: &str = "\
Examples:
  idrac-oob --ip 192.168.0.120 -u root -p calvin roles --get-custom-roles
  idrac-oob --ip 192.168.0.120 -x <token> roles --create Auditor --dmtf-privileges Login,ConfigureSelf --oem-privileges ClearLogs
  idrac-oob --ip 192.168.0.120 -u root -p calvin roles --delete /redfish/v1/AccountService/Roles/Auditor";

const POWER_EXAMPLES: &str = "\
Examples:
  idrac-oob --ip 192.168.0.120 -u root -p calvin power --get-power-state
  idrac-oob --ip 192.168.0.120 -u root -p calvin power --dmtf-power-cycle
  idrac-oob --ip 192.168.0.120 -u root -p calvin power --oem-power-cycle --power-off --final-power-state On";

#[derive(Parser, Debug)]
#[command(name = "idrac-oob")]
#[command(about = "iDRAC custom roles and virtual AC power cycle over Redfish", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// iDRAC IP address (or host[:port])
    #[arg(long, global = true)]
    ip: Option<String>,

    /// iDRAC username
    #[arg(short, long, global = true, conflicts_with = "token")]
    username: Option<String>,

    /// iDRAC password
    #[arg(short, long, global = true, conflicts_with = "token")]
    password: Option<String>,

    /// X-Auth-Token session token, used instead of username/password
    #[arg(short = 'x', long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
enum Cmd {
    /// Create, list or delete custom user roles (iDRAC10 and newer)
    #[command(after_help = ROLE_EXAMPLES)]
    Roles(RoleArgs),

    /// Read power state or perform a virtual AC power cycle
    #[command(after_help = POWER_EXAMPLES)]
    Power(PowerArgs),
}

#[derive(clap::Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["get_custom_roles", "create", "delete"])
))]
#[command(group(
    ArgGroup::new("privileges")
        .multiple(true)
        .args(["dmtf_privileges", "oem_privileges"])
))]
struct RoleArgs {
    /// List custom roles
    #[arg(long)]
    get_custom_roles: bool,

    /// Create a custom role with this name
    #[arg(long, value_name = "NAME", requires = "privileges")]
    create: Option<String>,

    /// Delete the custom role at this URI, e.g. /redfish/v1/AccountService/Roles/Auditor
    #[arg(long, value_name = "ROLE_URI")]
    delete: Option<String>,

    /// Comma-separated DMTF privileges for --create: Login, ConfigureManager,
    /// ConfigureUsers, ConfigureSelf, ConfigureComponents,
    /// ConfigureCompositionInfrastructure, AdministrateSystems, OperateSystems,
    /// AdministrateStorage, OperateStorageBackup
    #[arg(long, value_name = "LIST", requires = "create")]
    dmtf_privileges: Option<String>,

    /// Comma-separated OEM privileges for --create: ClearLogs,
    /// AccessVirtualConsole, AccessVirtualMedia, TestAlerts, ExecuteDebugCommands
    #[arg(long, value_name = "LIST", requires = "create")]
    oem_privileges: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["get_power_state", "dmtf_power_cycle", "oem_power_cycle"])
))]
struct PowerArgs {
    /// Get current server power state
    #[arg(long)]
    get_power_state: bool,

    /// DMTF chassis power cycle. On some generations the server must be off first
    #[arg(long)]
    dmtf_power_cycle: bool,

    /// Dell OEM extended reset, also drains flea power
    #[arg(long)]
    oem_power_cycle: bool,

    /// Force the server off before the OEM power cycle
    #[arg(long, requires = "oem_power_cycle")]
    power_off: bool,

    /// Power state to leave the server in after the OEM power cycle
    #[arg(long, value_enum, requires = "oem_power_cycle")]
    final_power_state: Option<FinalPowerState>,

    /// Poll PowerState until Off instead of waiting a fixed 10 seconds
    #[arg(long, requires = "power_off")]
    poll_power_off: bool,
}

impl TryFrom<RoleArgs> for RoleAction {
    type Error = RedfishError;

    fn try_from(args: RoleArgs) -> Result<Self, Self::Error> {
        let has_privileges = args.dmtf_privileges.is_some() || args.oem_privileges.is_some();

        match (args.get_custom_roles, args.create, args.delete) {
            (true, None, None) if !has_privileges => Ok(RoleAction::List),
            (false, Some(name), None) => {
                if !has_privileges {
                    return Err(RedfishError::InvalidInvocation(
                        "--create needs --dmtf-privileges and/or --oem-privileges".to_string(),
                    ));
                }
                if !parser::is_valid_role_name(&name) {
                    return Err(RedfishError::InvalidInvocation(format!(
                        "role name '{}' may only contain letters, digits, '-' and '_'",
                        name
                    )));
                }

                let assigned_privileges = args
                    .dmtf_privileges
                    .as_deref()
                    .map(parser::parse_privileges)
                    .transpose()?
                    .unwrap_or_default();
                let oem_privileges = args
                    .oem_privileges
                    .as_deref()
                    .map(parser::parse_privileges)
                    .transpose()?
                    .unwrap_or_default();

                Ok(RoleAction::Create(CreateRoleRequest {
                    role_id: name,
                    assigned_privileges,
                    oem_privileges,
                }))
            }
            (false, None, Some(path)) if !has_privileges => {
                if !path.starts_with('/') {
                    return Err(RedfishError::InvalidInvocation(format!(
                        "role URI '{}' must be an absolute resource path starting with '/'",
                        path
                    )));
                }
                Ok(RoleAction::Delete { path })
            }
            _ => Err(RedfishError::InvalidInvocation(
                "pass exactly one of --get-custom-roles, --create, --delete; privilege lists only apply to --create"
                    .to_string(),
            )),
        }
    }
}

impl TryFrom<PowerArgs> for PowerAction {
    type Error = RedfishError;

    fn try_from(args: PowerArgs) -> Result<Self, Self::Error> {
        let has_oem_options =
            args.power_off || args.final_power_state.is_some() || args.poll_power_off;

        match (args.get_power_state, args.dmtf_power_cycle, args.oem_power_cycle) {
            (true, false, false) if !has_oem_options => Ok(PowerAction::GetState),
            (false, true, false) if !has_oem_options => Ok(PowerAction::DmtfCycle),
            (false, false, true) => {
                if args.poll_power_off && !args.power_off {
                    return Err(RedfishError::InvalidInvocation(
                        "--poll-power-off only applies with --power-off".to_string(),
                    ));
                }
                let settle = if args.poll_power_off {
                    SettleStrategy::Poll {
                        interval: command::power::POWER_OFF_POLL_INTERVAL,
                        timeout: command::power::POWER_OFF_POLL_TIMEOUT,
                    }
                } else {
                    SettleStrategy::default()
                };

                Ok(PowerAction::OemCycle(OemCycleOptions {
                    power_off: args.power_off,
                    final_power_state: args.final_power_state,
                    settle,
                }))
            }
            _ => Err(RedfishError::InvalidInvocation(
                "pass exactly one of --get-power-state, --dmtf-power-cycle, --oem-power-cycle; \
                 --power-off and --final-power-state only apply to --oem-power-cycle"
                    .to_string(),
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let cfg = config::Config::load(args.config.as_deref())?;

    // Initialize logging, stdout is kept for results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args, &cfg).await {
        Ok(outcome) => {
            println!("PASS: {}", outcome);
            Ok(())
        }
        Err(e) => {
            eprintln!("FAIL: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args, cfg: &config::Config) -> Result<Outcome, RedfishError> {
    // Validate the action before touching the network
    let command = build_command(args.command.clone())?;

    let ip = args
        .ip
        .clone()
        .or_else(|| cfg.controller.ip.clone())
        .ok_or_else(|| RedfishError::InvalidInvocation("--ip is required".to_string()))?;
    let credentials = resolve_credentials(args, &cfg.controller)?;
    let client = HttpClient::for_controller(&ip, credentials, &cfg.http)?;

    tracing::info!("[{}] Target controller: {}", command.name(), ip);
    command.run(&client).await
}

/// Turn the parsed subcommand into exactly one command
fn build_command(cmd: Cmd) -> Result<Box<dyn ControllerCommand>, RedfishError> {
    Ok(match cmd {
        Cmd::Roles(role_args) => Box::new(RoleCommand::new(role_args.try_into()?)),
        Cmd::Power(power_args) => Box::new(PowerCommand::new(power_args.try_into()?)),
    })
}

/// Command-line credentials win over the config file; a token wins over
/// basic credentials from the same source
fn resolve_credentials(
    args: &Args,
    defaults: &config::ControllerConfig,
) -> Result<Credentials, RedfishError> {
    if let Some(token) = &args.token {
        return Ok(Credentials::Token(token.clone()));
    }

    if args.username.is_none() && args.password.is_none() {
        if let Some(token) = &defaults.token {
            return Ok(Credentials::Token(token.clone()));
        }
    }

    let username = args.username.clone().or_else(|| defaults.username.clone());
    let password = args.password.clone().or_else(|| defaults.password.clone());

    match (username, password) {
        (Some(username), Some(password)) => Ok(Credentials::Basic { username, password }),
        _ => Err(RedfishError::InvalidInvocation(
            "either -u/--username with -p/--password, or -x/--token is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DmtfPrivilege, OemPrivilege};
    use clap::CommandFactory;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv.iter().copied()).expect("should parse")
    }

    fn role_action(argv: &[&str]) -> Result<RoleAction, RedfishError> {
        match parse(argv).command {
            Cmd::Roles(role_args) => role_args.try_into(),
            other => panic!("expected roles, got {other:?}"),
        }
    }

    fn power_action(argv: &[&str]) -> Result<PowerAction, RedfishError> {
        match parse(argv).command {
            Cmd::Power(power_args) => power_args.try_into(),
            other => panic!("expected power, got {other:?}"),
        }
    }

    #[test]
    fn verify_cmd_structure() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_list_roles() {
        let action = role_action(&["idrac-oob", "roles", "--get-custom-roles"]).unwrap();
        assert!(matches!(action, RoleAction::List));
    }

    #[test]
    fn test_create_role_splits_privileges() {
        let action = role_action(&[
            "idrac-oob",
            "roles",
            "--create",
            "Auditor",
            "--dmtf-privileges",
            "Login,ConfigureManager",
        ])
        .unwrap();

        let RoleAction::Create(request) = action else {
            panic!("expected create");
        };
        assert_eq!(request.role_id, "Auditor");
        assert_eq!(
            request.assigned_privileges,
            vec![DmtfPrivilege::Login, DmtfPrivilege::ConfigureManager]
        );
        assert!(request.oem_privileges.is_empty());

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body["AssignedPrivileges"],
            serde_json::json!(["Login", "ConfigureManager"])
        );
    }

    #[test]
    fn test_create_role_single_oem_privilege() {
        let action = role_action(&[
            "idrac-oob",
            "roles",
            "--create",
            "ConsoleOnly",
            "--oem-privileges",
            "AccessVirtualConsole",
        ])
        .unwrap();

        let RoleAction::Create(request) = action else {
            panic!("expected create");
        };
        assert_eq!(request.oem_privileges, vec![OemPrivilege::AccessVirtualConsole]);
    }

    #[test]
    fn test_create_without_privileges_is_rejected() {
        assert!(Args::try_parse_from(["idrac-oob", "roles", "--create", "Auditor"]).is_err());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        assert!(matches!(
            role_action(&["idrac-oob", "roles", "--create", "bad name", "--dmtf-privileges", "Login"]),
            Err(RedfishError::InvalidInvocation(_))
        ));
        assert!(matches!(
            role_action(&["idrac-oob", "roles", "--create", "Auditor", "--dmtf-privileges", "Root"]),
            Err(RedfishError::InvalidInvocation(_))
        ));
    }

    #[test]
    fn test_role_actions_are_exclusive() {
        assert!(Args::try_parse_from([
            "idrac-oob",
            "roles",
            "--get-custom-roles",
            "--delete",
            "/redfish/v1/AccountService/Roles/Auditor"
        ])
        .is_err());
        assert!(Args::try_parse_from(["idrac-oob", "roles"]).is_err());
        assert!(Args::try_parse_from([
            "idrac-oob",
            "roles",
            "--get-custom-roles",
            "--dmtf-privileges",
            "Login"
        ])
        .is_err());
    }

    #[test]
    fn test_delete_role() {
        let action = role_action(&[
            "idrac-oob",
            "roles",
            "--delete",
            "/redfish/v1/AccountService/Roles/Auditor",
        ])
        .unwrap();
        assert!(
            matches!(action, RoleAction::Delete { path } if path == "/redfish/v1/AccountService/Roles/Auditor")
        );
    }

    #[test]
    fn test_delete_role_requires_absolute_path() {
        for uri in [
            "redfish/v1/AccountService/Roles/Auditor",
            "https://10.0.0.1/redfish/v1/AccountService/Roles/Auditor",
        ] {
            assert!(matches!(
                role_action(&["idrac-oob", "roles", "--delete", uri]),
                Err(RedfishError::InvalidInvocation(_))
            ));
        }
    }

    #[test]
    fn test_power_actions() {
        assert_eq!(
            power_action(&["idrac-oob", "power", "--get-power-state"]).unwrap(),
            PowerAction::GetState
        );
        assert_eq!(
            power_action(&["idrac-oob", "power", "--dmtf-power-cycle"]).unwrap(),
            PowerAction::DmtfCycle
        );
        assert_eq!(
            power_action(&["idrac-oob", "power", "--oem-power-cycle"]).unwrap(),
            PowerAction::OemCycle(OemCycleOptions::default())
        );
    }

    #[test]
    fn test_oem_cycle_options() {
        let action = power_action(&[
            "idrac-oob",
            "power",
            "--oem-power-cycle",
            "--power-off",
            "--final-power-state",
            "On",
            "--poll-power-off",
        ])
        .unwrap();

        let PowerAction::OemCycle(options) = action else {
            panic!("expected OEM cycle");
        };
        assert!(options.power_off);
        assert_eq!(options.final_power_state, Some(FinalPowerState::On));
        assert!(matches!(options.settle, SettleStrategy::Poll { .. }));
    }

    #[test]
    fn test_final_power_state_values() {
        assert!(Args::try_parse_from([
            "idrac-oob",
            "power",
            "--oem-power-cycle",
            "--final-power-state",
            "Reboot"
        ])
        .is_err());
        assert!(Args::try_parse_from([
            "idrac-oob",
            "power",
            "--dmtf-power-cycle",
            "--power-off"
        ])
        .is_err());
    }

    #[test]
    fn test_token_conflicts_with_basic() {
        assert!(Args::try_parse_from([
            "idrac-oob",
            "-x",
            "abc",
            "-u",
            "root",
            "power",
            "--get-power-state"
        ])
        .is_err());
    }

    #[test]
    fn test_resolve_credentials() {
        let defaults = config::ControllerConfig {
            ip: None,
            username: Some("root".to_string()),
            password: Some("calvin".to_string()),
            token: None,
        };

        let args = parse(&["idrac-oob", "-x", "abc", "power", "--get-power-state"]);
        assert_eq!(
            resolve_credentials(&args, &defaults).unwrap(),
            Credentials::Token("abc".to_string())
        );

        let args = parse(&["idrac-oob", "-p", "other", "power", "--get-power-state"]);
        assert_eq!(
            resolve_credentials(&args, &defaults).unwrap(),
            Credentials::Basic {
                username: "root".to_string(),
                password: "other".to_string()
            }
        );

        let args = parse(&["idrac-oob", "power", "--get-power-state"]);
        assert!(matches!(
            resolve_credentials(&args, &config::ControllerConfig::default()),
            Err(RedfishError::InvalidInvocation(_))
        ));
    }

    #[tokio::test]
    async fn test_run_without_ip_makes_no_request() {
        let args = parse(&["idrac-oob", "-u", "root", "-p", "calvin", "power", "--get-power-state"]);
        let err = run(&args, &config::Config::default()).await.unwrap_err();
        assert!(matches!(err, RedfishError::InvalidInvocation(_)));
    }
}

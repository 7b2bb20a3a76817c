//! Redfish data models for custom roles and reset actions

use crate::error::RedfishError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// `{"@odata.id": "..."}` reference inside a collection
#[derive(Debug, Clone, Deserialize)]
pub struct ODataLink {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

/// Any Redfish collection; only the member links are needed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Collection {
    #[serde(default)]
    pub members: Vec<ODataLink>,
}

/// Response to `GET Managers/iDRAC.Embedded.1?$select=Model`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagerModel {
    #[serde(default)]
    pub model: String,
}

/// The part of the System resource this tool reads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemPower {
    pub power_state: String,
}

/// Body of `POST AccountService/Roles`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRoleRequest {
    pub role_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assigned_privileges: Vec<DmtfPrivilege>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub oem_privileges: Vec<OemPrivilege>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResetType {
    PowerCycle,
    ForceOff,
}

/// Power state the server is left in after an OEM extended reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum FinalPowerState {
    #[value(name = "On")]
    On,
    #[value(name = "Off")]
    Off,
}

/// Body of the Chassis, ComputerSystem and DellOemChassis reset actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResetRequest {
    pub reset_type: ResetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_power_state: Option<FinalPowerState>,
}

impl ResetRequest {
    pub fn new(reset_type: ResetType) -> Self {
        Self {
            reset_type,
            final_power_state: None,
        }
    }
}

/// Standard privilege vocabulary accepted in `AssignedPrivileges`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DmtfPrivilege {
    Login,
    ConfigureManager,
    ConfigureUsers,
    ConfigureSelf,
    ConfigureComponents,
    ConfigureCompositionInfrastructure,
    AdministrateSystems,
    OperateSystems,
    AdministrateStorage,
    OperateStorageBackup,
}

impl DmtfPrivilege {
    pub const ALL: [DmtfPrivilege; 10] = [
        DmtfPrivilege::Login,
        DmtfPrivilege::ConfigureManager,
        DmtfPrivilege::ConfigureUsers,
        DmtfPrivilege::ConfigureSelf,
        DmtfPrivilege::ConfigureComponents,
        DmtfPrivilege::ConfigureCompositionInfrastructure,
        DmtfPrivilege::AdministrateSystems,
        DmtfPrivilege::OperateSystems,
        DmtfPrivilege::AdministrateStorage,
        DmtfPrivilege::OperateStorageBackup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DmtfPrivilege::Login => "Login",
            DmtfPrivilege::ConfigureManager => "ConfigureManager",
            DmtfPrivilege::ConfigureUsers => "ConfigureUsers",
            DmtfPrivilege::ConfigureSelf => "ConfigureSelf",
            DmtfPrivilege::ConfigureComponents => "ConfigureComponents",
            DmtfPrivilege::ConfigureCompositionInfrastructure => {
                "ConfigureCompositionInfrastructure"
            }
            DmtfPrivilege::AdministrateSystems => "AdministrateSystems",
            DmtfPrivilege::OperateSystems => "OperateSystems",
            DmtfPrivilege::AdministrateStorage => "AdministrateStorage",
            DmtfPrivilege::OperateStorageBackup => "OperateStorageBackup",
        }
    }
}

/// Dell vendor privileges accepted in `OemPrivileges`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OemPrivilege {
    ClearLogs,
    AccessVirtualConsole,
    AccessVirtualMedia,
    TestAlerts,
    ExecuteDebugCommands,
}

impl OemPrivilege {
    pub const ALL: [OemPrivilege; 5] = [
        OemPrivilege::ClearLogs,
        OemPrivilege::AccessVirtualConsole,
        OemPrivilege::AccessVirtualMedia,
        OemPrivilege::TestAlerts,
        OemPrivilege::ExecuteDebugCommands,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OemPrivilege::ClearLogs => "ClearLogs",
            OemPrivilege::AccessVirtualConsole => "AccessVirtualConsole",
            OemPrivilege::AccessVirtualMedia => "AccessVirtualMedia",
            OemPrivilege::TestAlerts => "TestAlerts",
            OemPrivilege::ExecuteDebugCommands => "ExecuteDebugCommands",
        }
    }
}

impl FromStr for DmtfPrivilege {
    type Err = RedfishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| unknown_privilege(s, Self::ALL.iter().map(|p| p.as_str())))
    }
}

impl FromStr for OemPrivilege {
    type Err = RedfishError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| unknown_privilege(s, Self::ALL.iter().map(|p| p.as_str())))
    }
}

fn unknown_privilege<'a>(token: &str, known: impl Iterator<Item = &'a str>) -> RedfishError {
    RedfishError::InvalidInvocation(format!(
        "unknown privilege '{}', supported values: {}",
        token,
        known.collect::<Vec<_>>().join(", ")
    ))
}

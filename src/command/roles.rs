//! Custom user role management
//!
//! Lists, creates and deletes custom roles under `AccountService/Roles`.
//! Only controllers newer than 16G support custom roles.

use crate::command::{ControllerCommand, Outcome};
use crate::error::{RedfishError, Result};
use crate::http::HttpClient;
use crate::models::{Collection, CreateRoleRequest, ManagerModel};
use crate::parser;
use async_trait::async_trait;

pub const MANAGER_MODEL_PATH: &str = "/redfish/v1/Managers/iDRAC.Embedded.1?$select=Model";
pub const ROLES_PATH: &str = "/redfish/v1/AccountService/Roles";

/// Role ids that ship with every controller
pub const BUILT_IN_ROLES: [&str; 3] = ["Administrator", "Operator", "ReadOnly"];

#[derive(Debug, Clone)]
pub enum RoleAction {
    List,
    Create(CreateRoleRequest),
    Delete { path: String },
}

pub struct RoleCommand {
    action: RoleAction,
}

impl RoleCommand {
    pub fn new(action: RoleAction) -> Self {
        Self { action }
    }
}

#[async_trait]
impl ControllerCommand for RoleCommand {
    fn name(&self) -> &str {
        "custom-roles"
    }

    async fn probe(&self, client: &HttpClient) -> Result<()> {
        check_support(client).await
    }

    async fn execute(&self, client: &HttpClient) -> Result<Outcome> {
        match &self.action {
            RoleAction::List => {
                let roles = list_custom_roles(client).await?;
                if roles.is_empty() {
                    Ok(Outcome::NoCustomRoles)
                } else {
                    Ok(Outcome::CustomRoles(roles))
                }
            }
            RoleAction::Create(request) => {
                create_role(client, request).await?;
                Ok(Outcome::RoleCreated(request.role_id.clone()))
            }
            RoleAction::Delete { path } => {
                delete_role(client, path).await?;
                Ok(Outcome::RoleDeleted(path.clone()))
            }
        }
    }
}

/// Read the manager model and refuse legacy generations
pub async fn check_support(client: &HttpClient) -> Result<()> {
    let resp = client.get(MANAGER_MODEL_PATH).await?;

    match resp.status {
        200 => {}
        401 => return Err(RedfishError::Unauthorized),
        status => {
            tracing::warn!("Manager model query returned {}", status);
            return Err(RedfishError::UnsupportedVersion(format!(
                "manager model query returned HTTP {}",
                status
            )));
        }
    }

    let manager: ManagerModel = resp.json()?;
    tracing::debug!("Controller model: {}", manager.model);

    if let Some(generation) = parser::legacy_generation(&manager.model) {
        tracing::warn!("{} controllers do not support custom roles", generation);
        return Err(RedfishError::UnsupportedVersion(format!(
            "custom roles are not available on {} controllers (model '{}')",
            generation, manager.model
        )));
    }

    Ok(())
}

/// True if the resource path points at one of the built-in roles.
///
/// Compares the last path segment for equality rather than searching the
/// whole path for a built-in name, so a custom role such as `NetOperator`
/// is listed instead of being mistaken for `Operator`.
pub fn is_built_in_role(path: &str) -> bool {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|id| BUILT_IN_ROLES.contains(&id))
}

/// Fetch every custom role document, in collection order
pub async fn list_custom_roles(client: &HttpClient) -> Result<Vec<serde_json::Value>> {
    tracing::info!("Fetching role collection...");
    let collection: Collection = client.get(ROLES_PATH).await?.expect_status(&[200])?.json()?;

    let mut roles = Vec::new();
    for member in collection
        .members
        .iter()
        .filter(|m| !is_built_in_role(&m.odata_id))
    {
        tracing::debug!("Fetching role {}", member.odata_id);
        let role: serde_json::Value = client
            .get(&member.odata_id)
            .await?
            .expect_status(&[200])?
            .json()?;
        roles.push(role);
    }

    Ok(roles)
}

/// Create a custom role; the controller answers 201 on success
pub async fn create_role(client: &HttpClient, request: &CreateRoleRequest) -> Result<()> {
    tracing::info!("Creating custom role '{}'...", request.role_id);
    client
        .post_json(ROLES_PATH, request)
        .await?
        .expect_status(&[201])?;
    Ok(())
}

/// Delete the role at `path`; the controller answers 204 on success
pub async fn delete_role(client: &HttpClient, path: &str) -> Result<()> {
    tracing::info!("Deleting custom role {}...", path);
    client.delete(path).await?.expect_status(&[204])?;
    Ok(())
}

//! Role and permission domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// 系统内置记录（不可修改、不可删除）
pub trait SystemGuarded {
    fn is_system(&self) -> bool;

    /// 系统记录拒绝一切修改
    fn ensure_mutable(&self) -> Result<(), AppError> {
        if self.is_system() {
            return Err(AppError::Forbidden);
        }
        Ok(())
    }
}

/// Role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SystemGuarded for Role {
    fn is_system(&self) -> bool {
        self.is_system
    }
}

/// Permission
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub resource: String,
    pub action: String,
    pub is_active: bool,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SystemGuarded for Permission {
    fn is_system(&self) -> bool {
        self.is_system
    }
}

/// 创建角色请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub display_name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl CreateRoleRequest {
    pub fn into_role(self) -> Role {
        let now = Utc::now();
        Role {
            id: Uuid::new_v4(),
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            is_active: self.is_active.unwrap_or(true),
            is_system: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// 更新角色请求（缺省字段保持不变）
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub display_name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateRoleRequest {
    pub fn apply(&self, role: &mut Role) {
        if let Some(name) = &self.name {
            role.name = name.clone();
        }
        if let Some(display_name) = &self.display_name {
            role.display_name = display_name.clone();
        }
        if let Some(description) = &self.description {
            role.description = Some(description.clone());
        }
        if let Some(is_active) = self.is_active {
            role.is_active = is_active;
        }
    }
}

/// 角色列表过滤条件
#[derive(Debug, Default, Deserialize)]
pub struct ListRoleRequest {
    pub name: Option<String>,
    /// 不区分大小写的子串匹配
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_system: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// 创建权限请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub display_name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub resource: String,
    #[validate(length(min = 1, max = 100))]
    pub action: String,
    pub is_active: Option<bool>,
}

impl CreatePermissionRequest {
    pub fn into_permission(self) -> Permission {
        let now = Utc::now();
        Permission {
            id: Uuid::new_v4(),
            name: self.name,
            display_name: self.display_name,
            description: self.description,
            resource: self.resource,
            action: self.action,
            is_active: self.is_active.unwrap_or(true),
            is_system: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// 更新权限请求（缺省字段保持不变）
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePermissionRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub display_name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub resource: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub action: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdatePermissionRequest {
    pub fn apply(&self, permission: &mut Permission) {
        if let Some(name) = &self.name {
            permission.name = name.clone();
        }
        if let Some(display_name) = &self.display_name {
            permission.display_name = display_name.clone();
        }
        if let Some(description) = &self.description {
            permission.description = Some(description.clone());
        }
        if let Some(resource) = &self.resource {
            permission.resource = resource.clone();
        }
        if let Some(action) = &self.action {
            permission.action = action.clone();
        }
        if let Some(is_active) = self.is_active {
            permission.is_active = is_active;
        }
    }
}

/// 权限列表过滤条件
#[derive(Debug, Default, Deserialize)]
pub struct ListPermissionRequest {
    pub name: Option<String>,
    /// 不区分大小写的子串匹配
    pub display_name: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
    pub is_active: Option<bool>,
    pub is_system: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// 角色↔权限关联请求
#[derive(Debug, Deserialize, Validate)]
pub struct RolePermissionsRequest {
    #[validate(length(min = 1, max = 100))]
    pub permission_ids: Vec<Uuid>,
}

/// 角色↔港口关联请求
#[derive(Debug, Deserialize, Validate)]
pub struct RoleHarborsRequest {
    #[validate(length(min = 1, max = 100))]
    pub harbor_ids: Vec<Uuid>,
}

/// 角色详情：权限列表与可见港口
#[derive(Debug, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub harbor_ids: Vec<Uuid>,
}

/// 去重并保持顺序，避免重复 ID 影响存在性校验计数
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(is_system: bool) -> Role {
        let mut role = CreateRoleRequest {
            name: "harbor-master".to_string(),
            display_name: "Harbor Master".to_string(),
            description: Some("Runs the harbor".to_string()),
            is_active: None,
        }
        .into_role();
        role.is_system = is_system;
        role
    }

    #[test]
    fn test_create_defaults() {
        let role = role(false);
        assert!(role.is_active);
        assert!(!role.is_system);

        let permission = CreatePermissionRequest {
            name: "ship.inspect".to_string(),
            display_name: "Inspect ships".to_string(),
            description: None,
            resource: "ship".to_string(),
            action: "inspect".to_string(),
            is_active: Some(false),
        }
        .into_permission();
        assert!(!permission.is_active);
        assert!(!permission.is_system);
    }

    #[test]
    fn test_system_rows_reject_mutation() {
        assert!(matches!(role(true).ensure_mutable(), Err(AppError::Forbidden)));
        assert!(role(false).ensure_mutable().is_ok());
    }

    #[test]
    fn test_role_partial_update() {
        let mut target = role(false);
        UpdateRoleRequest {
            display_name: Some("Port Captain".to_string()),
            ..Default::default()
        }
        .apply(&mut target);

        assert_eq!(target.display_name, "Port Captain");
        assert_eq!(target.name, "harbor-master");
        assert_eq!(target.description.as_deref(), Some("Runs the harbor"));
        assert!(target.is_active);
    }

    #[test]
    fn test_empty_id_list_rejected() {
        let req = RolePermissionsRequest {
            permission_ids: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_dedup_ids_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids(&[a, b, a, b]), vec![a, b]);
    }
}

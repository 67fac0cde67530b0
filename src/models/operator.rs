//! 船舶运营商模型

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{patch, patch_some};

static OPERATOR_STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(active|inactive|suspended)$").expect("valid status regex"));

/// Operator
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Operator {
    pub id: Uuid,
    pub user_id: Uuid,
    pub operator_code: String,
    pub company_name: String,
    pub license_number: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub contact_email: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub postal_code: String,
    pub website: Option<String>,
    pub operator_type: String,
    pub status: String,
    pub established_at: Option<DateTime<Utc>>,
    pub license_expiry: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 创建运营商请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOperatorRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 20))]
    pub operator_code: String,
    #[validate(length(min = 1, max = 255))]
    pub company_name: String,
    #[validate(length(min = 1, max = 100))]
    pub license_number: String,
    #[validate(length(min = 1, max = 255))]
    pub contact_person: String,
    #[validate(length(min = 1, max = 20))]
    pub contact_phone: String,
    #[validate(email, length(max = 255))]
    pub contact_email: String,
    #[validate(length(min = 1, max = 1000))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub province: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(url, length(max = 500))]
    pub website: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub operator_type: String,
    pub established_at: Option<DateTime<Utc>>,
    pub license_expiry: Option<DateTime<Utc>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateOperatorRequest {
    pub fn into_operator(self) -> Operator {
        let now = Utc::now();
        Operator {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            operator_code: self.operator_code,
            company_name: self.company_name,
            license_number: self.license_number,
            contact_person: self.contact_person,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            address: self.address,
            city: self.city,
            province: self.province,
            country: self.country,
            postal_code: self.postal_code,
            website: self.website,
            operator_type: self.operator_type,
            status: "active".to_string(),
            established_at: self.established_at,
            license_expiry: self.license_expiry,
            is_active: true,
            notes: self.notes,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// 更新运营商请求（缺省字段保持不变）
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOperatorRequest {
    #[validate(length(min = 1, max = 20))]
    pub operator_code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub company_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub license_number: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub contact_person: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub contact_phone: Option<String>,
    #[validate(email, length(max = 255))]
    pub contact_email: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub province: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: Option<String>,
    #[validate(url, length(max = 500))]
    pub website: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub operator_type: Option<String>,
    #[validate(regex(path = *OPERATOR_STATUS_RE))]
    pub status: Option<String>,
    pub established_at: Option<DateTime<Utc>>,
    pub license_expiry: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl UpdateOperatorRequest {
    pub fn apply(&self, operator: &mut Operator) {
        patch!(self => operator;
            operator_code, company_name, license_number, contact_person, contact_phone,
            contact_email, address, city, province, country, postal_code, operator_type,
            status, is_active,
        );
        patch_some!(self => operator; website, established_at, license_expiry, notes);
    }
}

/// 运营商列表过滤条件
#[derive(Debug, Default, Deserialize)]
pub struct ListOperatorRequest {
    /// 公司名称，不区分大小写的子串匹配
    pub company_name: Option<String>,
    pub operator_type: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub province: Option<String>,
    pub city: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateOperatorRequest {
        serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "operator_code": "MSK",
            "company_name": "Maersk Line",
            "license_number": "DK-0042",
            "contact_person": "Ops Desk",
            "contact_phone": "+45 3363 3363",
            "contact_email": "ops@example.com",
            "address": "Esplanaden 50",
            "city": "Copenhagen",
            "province": "Capital Region",
            "country": "Denmark",
            "postal_code": "1098",
            "operator_type": "container",
            "established_at": "1904-04-16T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_create_request() {
        let req = create_request();
        assert!(req.validate().is_ok());

        let operator = req.into_operator();
        assert_eq!(operator.status, "active");
        assert!(operator.is_active);
        assert!(operator.established_at.is_some());
    }

    #[test]
    fn test_rejects_bad_email() {
        let mut req = create_request();
        req.contact_email = "ops-at-example".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_partial_update() {
        let mut operator = create_request().into_operator();
        let req = UpdateOperatorRequest {
            status: Some("suspended".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        req.apply(&mut operator);
        assert_eq!(operator.status, "suspended");
        assert_eq!(operator.company_name, "Maersk Line");
    }
}

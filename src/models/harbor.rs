//! 港口模型

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{patch, patch_some};

/// UN/LOCODE：两位国家码 + 三位地点码
pub static UN_LOCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[A-Z2-9]{3}$").expect("valid UN/LOCODE regex"));

static HARBOR_STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(active|inactive|maintenance)$").expect("valid status regex"));

/// Harbor
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Harbor {
    pub id: Uuid,
    pub harbor_code: String,
    pub harbor_name: String,
    pub un_locode: Option<String>,
    pub country: String,
    pub province: String,
    pub city: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub harbor_type: Option<String>,
    pub status: String,
    pub max_ship_length: Option<f64>,
    pub max_ship_beam: Option<f64>,
    pub max_ship_draft: Option<f64>,
    pub berth_count: i32,
    pub storage_capacity: Option<f64>,
    pub water_depth: Option<f64>,
    pub timezone: Option<String>,
    pub working_hours: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub website: Option<String>,
    pub has_customs: bool,
    pub has_quarantine: bool,
    pub has_pilotage: bool,
    pub has_tug_service: bool,
    pub has_repair_service: bool,
    pub has_waste: bool,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 创建港口请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateHarborRequest {
    #[validate(length(min = 1, max = 20))]
    pub harbor_code: String,
    #[validate(length(min = 1, max = 255))]
    pub harbor_name: String,
    #[validate(regex(path = *UN_LOCODE_RE))]
    pub un_locode: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 100))]
    pub province: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(max = 1000))]
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 100))]
    pub harbor_type: Option<String>,
    #[validate(range(min = 0.0))]
    pub max_ship_length: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_ship_beam: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_ship_draft: Option<f64>,
    #[validate(range(min = 0))]
    pub berth_count: Option<i32>,
    #[validate(range(min = 0.0))]
    pub storage_capacity: Option<f64>,
    #[validate(range(min = 0.0))]
    pub water_depth: Option<f64>,
    #[validate(length(max = 50))]
    pub timezone: Option<String>,
    #[validate(length(max = 255))]
    pub working_hours: Option<String>,
    #[validate(length(max = 255))]
    pub contact_person: Option<String>,
    #[validate(length(max = 20))]
    pub contact_phone: Option<String>,
    #[validate(email, length(max = 255))]
    pub contact_email: Option<String>,
    #[validate(url, length(max = 500))]
    pub website: Option<String>,
    pub has_customs: Option<bool>,
    pub has_quarantine: Option<bool>,
    pub has_pilotage: Option<bool>,
    pub has_tug_service: Option<bool>,
    pub has_repair_service: Option<bool>,
    pub has_waste: Option<bool>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateHarborRequest {
    pub fn into_harbor(self) -> Harbor {
        let now = Utc::now();
        Harbor {
            id: Uuid::new_v4(),
            harbor_code: self.harbor_code,
            harbor_name: self.harbor_name,
            un_locode: self.un_locode,
            country: self.country,
            province: self.province,
            city: self.city,
            address: self.address,
            postal_code: self.postal_code,
            latitude: self.latitude,
            longitude: self.longitude,
            harbor_type: self.harbor_type,
            status: "active".to_string(),
            max_ship_length: self.max_ship_length,
            max_ship_beam: self.max_ship_beam,
            max_ship_draft: self.max_ship_draft,
            berth_count: self.berth_count.unwrap_or(0),
            storage_capacity: self.storage_capacity,
            water_depth: self.water_depth,
            timezone: self.timezone,
            working_hours: self.working_hours,
            contact_person: self.contact_person,
            contact_phone: self.contact_phone,
            contact_email: self.contact_email,
            website: self.website,
            has_customs: self.has_customs.unwrap_or(false),
            has_quarantine: self.has_quarantine.unwrap_or(false),
            has_pilotage: self.has_pilotage.unwrap_or(false),
            has_tug_service: self.has_tug_service.unwrap_or(false),
            has_repair_service: self.has_repair_service.unwrap_or(false),
            has_waste: self.has_waste.unwrap_or(false),
            is_active: true,
            notes: self.notes,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// 更新港口请求（缺省字段保持不变）
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateHarborRequest {
    #[validate(length(min = 1, max = 20))]
    pub harbor_code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub harbor_name: Option<String>,
    #[validate(regex(path = *UN_LOCODE_RE))]
    pub un_locode: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub province: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 1000))]
    pub address: Option<String>,
    #[validate(length(max = 20))]
    pub postal_code: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(length(max = 100))]
    pub harbor_type: Option<String>,
    #[validate(regex(path = *HARBOR_STATUS_RE))]
    pub status: Option<String>,
    #[validate(range(min = 0.0))]
    pub max_ship_length: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_ship_beam: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_ship_draft: Option<f64>,
    #[validate(range(min = 0))]
    pub berth_count: Option<i32>,
    #[validate(range(min = 0.0))]
    pub storage_capacity: Option<f64>,
    #[validate(range(min = 0.0))]
    pub water_depth: Option<f64>,
    #[validate(length(max = 50))]
    pub timezone: Option<String>,
    #[validate(length(max = 255))]
    pub working_hours: Option<String>,
    #[validate(length(max = 255))]
    pub contact_person: Option<String>,
    #[validate(length(max = 20))]
    pub contact_phone: Option<String>,
    #[validate(email, length(max = 255))]
    pub contact_email: Option<String>,
    #[validate(url, length(max = 500))]
    pub website: Option<String>,
    pub has_customs: Option<bool>,
    pub has_quarantine: Option<bool>,
    pub has_pilotage: Option<bool>,
    pub has_tug_service: Option<bool>,
    pub has_repair_service: Option<bool>,
    pub has_waste: Option<bool>,
    pub is_active: Option<bool>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl UpdateHarborRequest {
    pub fn apply(&self, harbor: &mut Harbor) {
        patch!(self => harbor;
            harbor_code, harbor_name, country, province, city, status, berth_count,
            has_customs, has_quarantine, has_pilotage, has_tug_service,
            has_repair_service, has_waste, is_active,
        );
        patch_some!(self => harbor;
            un_locode, address, postal_code, latitude, longitude, harbor_type,
            max_ship_length, max_ship_beam, max_ship_draft, storage_capacity,
            water_depth, timezone, working_hours, contact_person, contact_phone,
            contact_email, website, notes,
        );
    }
}

/// 港口列表过滤条件
#[derive(Debug, Default, Deserialize)]
pub struct ListHarborRequest {
    /// 港口名称，不区分大小写的子串匹配
    pub name: Option<String>,
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

    fn create_request() -> CreateHarborRequest {
        serde_json::from_value(serde_json::json!({
            "harbor_code": "RTM",
            "harbor_name": "Port of Rotterdam",
            "un_locode": "NLRTM",
            "country": "Netherlands",
            "province": "South Holland",
            "city": "Rotterdam",
            "latitude": 51.95,
            "longitude": 4.14,
            "berth_count": 120,
            "has_customs": true
        }))
        .unwrap()
    }

    #[test]
    fn test_create_request_is_valid() {
        let req = create_request();
        assert!(req.validate().is_ok());

        let harbor = req.into_harbor();
        assert_eq!(harbor.status, "active");
        assert!(harbor.is_active);
        assert!(harbor.has_customs);
        assert!(!harbor.has_pilotage);
        assert_eq!(harbor.berth_count, 120);
    }

    #[test]
    fn test_rejects_bad_locode_and_coordinates() {
        let mut req = create_request();
        req.un_locode = Some("rotterdam".to_string());
        req.latitude = Some(91.0);

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("un_locode"));
        assert!(fields.contains_key("latitude"));
    }

    #[test]
    fn test_partial_update() {
        let mut harbor = create_request().into_harbor();
        let req = UpdateHarborRequest {
            harbor_name: Some("Rotterdam Europoort".to_string()),
            water_depth: Some(24.0),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        req.apply(&mut harbor);

        assert_eq!(harbor.harbor_name, "Rotterdam Europoort");
        assert_eq!(harbor.water_depth, Some(24.0));
        assert_eq!(harbor.harbor_code, "RTM");
        assert_eq!(harbor.un_locode.as_deref(), Some("NLRTM"));
        assert!(harbor.has_customs);
    }

    #[test]
    fn test_update_rejects_unknown_status() {
        let req = UpdateHarborRequest {
            status: Some("sunk".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}

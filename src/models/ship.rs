//! 船舶模型

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{patch, patch_some};

/// IMO 船舶识别号：七位数字，可带 "IMO" 前缀
pub static IMO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(IMO ?)?[0-9]{7}$").expect("valid IMO regex"));

/// MMSI：九位数字
pub static MMSI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{9}$").expect("valid MMSI regex"));

static SHIP_STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(active|inactive|maintenance)$").expect("valid status regex"));

/// Ship
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Ship {
    pub id: Uuid,
    pub operator_id: Uuid,
    pub ship_name: String,
    pub imo_number: Option<String>,
    pub call_sign: Option<String>,
    pub mmsi: Option<String>,
    pub ship_type: String,
    pub flag_state: String,
    pub port_of_registry: String,
    pub build_year: Option<i32>,
    pub builder: Option<String>,
    pub length: Option<f64>,
    pub beam: Option<f64>,
    pub draft: Option<f64>,
    pub gross_tonnage: Option<f64>,
    pub net_tonnage: Option<f64>,
    pub deadweight_tonnage: Option<f64>,
    pub max_speed: Option<f64>,
    pub passenger_capacity: Option<i32>,
    pub crew_capacity: Option<i32>,
    pub classification_society: Option<String>,
    pub status: String,
    pub is_active: bool,
    pub last_inspection: Option<DateTime<Utc>>,
    pub next_inspection: Option<DateTime<Utc>>,
    pub insurance_expiry: Option<DateTime<Utc>>,
    pub certificate_expiry: Option<DateTime<Utc>>,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 创建船舶请求
#[derive(Debug, Deserialize, Validate)]
pub struct CreateShipRequest {
    pub operator_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub ship_name: String,
    #[validate(regex(path = *IMO_RE))]
    pub imo_number: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub call_sign: Option<String>,
    #[validate(regex(path = *MMSI_RE))]
    pub mmsi: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub ship_type: String,
    #[validate(length(min = 1, max = 100))]
    pub flag_state: String,
    #[validate(length(min = 1, max = 255))]
    pub port_of_registry: String,
    #[validate(range(min = 1800, max = 2100))]
    pub build_year: Option<i32>,
    #[validate(length(max = 255))]
    pub builder: Option<String>,
    #[validate(range(min = 0.0))]
    pub length: Option<f64>,
    #[validate(range(min = 0.0))]
    pub beam: Option<f64>,
    #[validate(range(min = 0.0))]
    pub draft: Option<f64>,
    #[validate(range(min = 0.0))]
    pub gross_tonnage: Option<f64>,
    #[validate(range(min = 0.0))]
    pub net_tonnage: Option<f64>,
    #[validate(range(min = 0.0))]
    pub deadweight_tonnage: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_speed: Option<f64>,
    #[validate(range(min = 0))]
    pub passenger_capacity: Option<i32>,
    #[validate(range(min = 0))]
    pub crew_capacity: Option<i32>,
    #[validate(length(max = 255))]
    pub classification_society: Option<String>,
    pub last_inspection: Option<DateTime<Utc>>,
    pub next_inspection: Option<DateTime<Utc>>,
    pub insurance_expiry: Option<DateTime<Utc>>,
    pub certificate_expiry: Option<DateTime<Utc>>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub current_latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub current_longitude: Option<f64>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateShipRequest {
    pub fn into_ship(self) -> Ship {
        let now = Utc::now();
        Ship {
            id: Uuid::new_v4(),
            operator_id: self.operator_id,
            ship_name: self.ship_name,
            imo_number: self.imo_number,
            call_sign: self.call_sign,
            mmsi: self.mmsi,
            ship_type: self.ship_type,
            flag_state: self.flag_state,
            port_of_registry: self.port_of_registry,
            build_year: self.build_year,
            builder: self.builder,
            length: self.length,
            beam: self.beam,
            draft: self.draft,
            gross_tonnage: self.gross_tonnage,
            net_tonnage: self.net_tonnage,
            deadweight_tonnage: self.deadweight_tonnage,
            max_speed: self.max_speed,
            passenger_capacity: self.passenger_capacity,
            crew_capacity: self.crew_capacity,
            classification_society: self.classification_society,
            status: "active".to_string(),
            is_active: true,
            last_inspection: self.last_inspection,
            next_inspection: self.next_inspection,
            insurance_expiry: self.insurance_expiry,
            certificate_expiry: self.certificate_expiry,
            current_latitude: self.current_latitude,
            current_longitude: self.current_longitude,
            notes: self.notes,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// 更新船舶请求（缺省字段保持不变；运营商归属不可修改）
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateShipRequest {
    #[validate(length(min = 1, max = 255))]
    pub ship_name: Option<String>,
    #[validate(regex(path = *IMO_RE))]
    pub imo_number: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub call_sign: Option<String>,
    #[validate(regex(path = *MMSI_RE))]
    pub mmsi: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub ship_type: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub flag_state: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub port_of_registry: Option<String>,
    #[validate(range(min = 1800, max = 2100))]
    pub build_year: Option<i32>,
    #[validate(length(max = 255))]
    pub builder: Option<String>,
    #[validate(range(min = 0.0))]
    pub length: Option<f64>,
    #[validate(range(min = 0.0))]
    pub beam: Option<f64>,
    #[validate(range(min = 0.0))]
    pub draft: Option<f64>,
    #[validate(range(min = 0.0))]
    pub gross_tonnage: Option<f64>,
    #[validate(range(min = 0.0))]
    pub net_tonnage: Option<f64>,
    #[validate(range(min = 0.0))]
    pub deadweight_tonnage: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_speed: Option<f64>,
    #[validate(range(min = 0))]
    pub passenger_capacity: Option<i32>,
    #[validate(range(min = 0))]
    pub crew_capacity: Option<i32>,
    #[validate(length(max = 255))]
    pub classification_society: Option<String>,
    #[validate(regex(path = *SHIP_STATUS_RE))]
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub last_inspection: Option<DateTime<Utc>>,
    pub next_inspection: Option<DateTime<Utc>>,
    pub insurance_expiry: Option<DateTime<Utc>>,
    pub certificate_expiry: Option<DateTime<Utc>>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub current_latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub current_longitude: Option<f64>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl UpdateShipRequest {
    pub fn apply(&self, ship: &mut Ship) {
        patch!(self => ship;
            ship_name, ship_type, flag_state, port_of_registry, status, is_active,
        );
        patch_some!(self => ship;
            imo_number, call_sign, mmsi, build_year, builder, length, beam, draft,
            gross_tonnage, net_tonnage, deadweight_tonnage, max_speed,
            passenger_capacity, crew_capacity, classification_society,
            last_inspection, next_inspection, insurance_expiry, certificate_expiry,
            current_latitude, current_longitude, notes,
        );
    }
}

/// 船舶列表过滤条件
#[derive(Debug, Default, Deserialize)]
pub struct ListShipRequest {
    /// 船名，不区分大小写的子串匹配
    pub ship_name: Option<String>,
    pub operator_id: Option<Uuid>,
    pub ship_type: Option<String>,
    pub flag_state: Option<String>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateShipRequest {
        serde_json::from_value(serde_json::json!({
            "operator_id": Uuid::new_v4(),
            "ship_name": "Emma Maersk",
            "imo_number": "IMO 9321483",
            "mmsi": "220417000",
            "ship_type": "container",
            "flag_state": "Denmark",
            "port_of_registry": "Aarhus",
            "build_year": 2006,
            "length": 397.7
        }))
        .unwrap()
    }

    #[test]
    fn test_create_request_is_valid() {
        let req = create_request();
        assert!(req.validate().is_ok());

        let ship = req.into_ship();
        assert_eq!(ship.status, "active");
        assert_eq!(ship.imo_number.as_deref(), Some("IMO 9321483"));
    }

    #[test]
    fn test_identifier_formats() {
        assert!(IMO_RE.is_match("9321483"));
        assert!(IMO_RE.is_match("IMO9321483"));
        assert!(!IMO_RE.is_match("932148"));
        assert!(MMSI_RE.is_match("220417000"));
        assert!(!MMSI_RE.is_match("22041700A"));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut req = create_request();
        req.build_year = Some(1700);
        req.current_longitude = Some(200.0);
        req.mmsi = Some("12".to_string());

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("build_year"));
        assert!(fields.contains_key("current_longitude"));
        assert!(fields.contains_key("mmsi"));
    }

    #[test]
    fn test_partial_update_keeps_operator() {
        let mut ship = create_request().into_ship();
        let operator_id = ship.operator_id;

        UpdateShipRequest {
            draft: Some(16.0),
            ..Default::default()
        }
        .apply(&mut ship);

        assert_eq!(ship.draft, Some(16.0));
        assert_eq!(ship.operator_id, operator_id);
        assert_eq!(ship.ship_name, "Emma Maersk");
    }
}

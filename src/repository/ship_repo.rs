//! Ship repository (船舶数据访问)

use super::{contains_pattern, non_empty, push_page};
use crate::{
    error::AppError,
    models::{pagination::PageQuery, ship::*},
};
use sqlx::{postgres::PgArguments, query::QueryAs, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

pub struct ShipRepository;

/// 绑定 $2..$30（$1 为 id）
fn bind_fields<'q>(
    query: QueryAs<'q, Postgres, Ship, PgArguments>,
    s: &'q Ship,
) -> QueryAs<'q, Postgres, Ship, PgArguments> {
    query
        .bind(s.operator_id)
        .bind(&s.ship_name)
        .bind(&s.imo_number)
        .bind(&s.call_sign)
        .bind(&s.mmsi)
        .bind(&s.ship_type)
        .bind(&s.flag_state)
        .bind(&s.port_of_registry)
        .bind(s.build_year)
        .bind(&s.builder)
        .bind(s.length)
        .bind(s.beam)
        .bind(s.draft)
        .bind(s.gross_tonnage)
        .bind(s.net_tonnage)
        .bind(s.deadweight_tonnage)
        .bind(s.max_speed)
        .bind(s.passenger_capacity)
        .bind(s.crew_capacity)
        .bind(&s.classification_society)
        .bind(&s.status)
        .bind(s.is_active)
        .bind(s.last_inspection)
        .bind(s.next_inspection)
        .bind(s.insurance_expiry)
        .bind(s.certificate_expiry)
        .bind(s.current_latitude)
        .bind(s.current_longitude)
        .bind(&s.notes)
}

impl ShipRepository {
    /// 创建船舶；运营商不存在时外键冲突映射为 NotFound
    pub async fn insert(conn: &mut PgConnection, ship: &Ship) -> Result<Ship, AppError> {
        let query = sqlx::query_as::<_, Ship>(
            r#"
            INSERT INTO ships (
                id, operator_id, ship_name, imo_number, call_sign, mmsi, ship_type,
                flag_state, port_of_registry, build_year, builder, length, beam, draft,
                gross_tonnage, net_tonnage, deadweight_tonnage, max_speed,
                passenger_capacity, crew_capacity, classification_society, status,
                is_active, last_inspection, next_inspection, insurance_expiry,
                certificate_expiry, current_latitude, current_longitude, notes
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30
            )
            RETURNING *
            "#,
        )
        .bind(ship.id);

        let ship = bind_fields(query, ship).fetch_one(&mut *conn).await?;
        Ok(ship)
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Ship>, AppError> {
        let ship = sqlx::query_as::<_, Ship>(
            "SELECT * FROM ships WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(ship)
    }

    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Ship>, AppError> {
        let ship = sqlx::query_as::<_, Ship>(
            "SELECT * FROM ships WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(ship)
    }

    pub async fn update(conn: &mut PgConnection, ship: &Ship) -> Result<Ship, AppError> {
        let query = sqlx::query_as::<_, Ship>(
            r#"
            UPDATE ships
            SET
                operator_id = $2, ship_name = $3, imo_number = $4, call_sign = $5,
                mmsi = $6, ship_type = $7, flag_state = $8, port_of_registry = $9,
                build_year = $10, builder = $11, length = $12, beam = $13, draft = $14,
                gross_tonnage = $15, net_tonnage = $16, deadweight_tonnage = $17,
                max_speed = $18, passenger_capacity = $19, crew_capacity = $20,
                classification_society = $21, status = $22, is_active = $23,
                last_inspection = $24, next_inspection = $25, insurance_expiry = $26,
                certificate_expiry = $27, current_latitude = $28,
                current_longitude = $29, notes = $30,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(ship.id);

        let ship = bind_fields(query, ship).fetch_one(&mut *conn).await?;
        Ok(ship)
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE ships SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListShipRequest) {
        if let Some(ship_name) = non_empty(&filter.ship_name) {
            qb.push(" AND ship_name ILIKE ")
                .push_bind(contains_pattern(&ship_name));
        }
        if let Some(operator_id) = filter.operator_id {
            qb.push(" AND operator_id = ").push_bind(operator_id);
        }
        if let Some(ship_type) = non_empty(&filter.ship_type) {
            qb.push(" AND ship_type = ").push_bind(ship_type);
        }
        if let Some(flag_state) = non_empty(&filter.flag_state) {
            qb.push(" AND flag_state = ").push_bind(flag_state);
        }
        if let Some(status) = non_empty(&filter.status) {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
    }

    pub async fn list(
        conn: &mut PgConnection,
        filter: &ListShipRequest,
        page: PageQuery,
    ) -> Result<(Vec<Ship>, i64), AppError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM ships WHERE deleted_at IS NULL");
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut query = QueryBuilder::new("SELECT * FROM ships WHERE deleted_at IS NULL");
        Self::push_filters(&mut query, filter);
        push_page(&mut query, "ship_name, id", page);
        let ships = query.build_query_as::<Ship>().fetch_all(&mut *conn).await?;

        Ok((ships, total))
    }
}

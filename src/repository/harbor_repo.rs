//! Harbor repository (港口数据访问)
//!
//! 列表与详情查询按调用者的角色→港口授权收窄。

use super::{contains_pattern, non_empty, push_page};
use crate::{
    error::AppError,
    models::{harbor::*, pagination::PageQuery},
};
use sqlx::{
    postgres::PgArguments, query::QueryAs, PgConnection, Postgres, QueryBuilder,
};
use uuid::Uuid;

pub struct HarborRepository;

/// 绑定 $2..$33（$1 为 id）
fn bind_fields<'q>(
    query: QueryAs<'q, Postgres, Harbor, PgArguments>,
    h: &'q Harbor,
) -> QueryAs<'q, Postgres, Harbor, PgArguments> {
    query
        .bind(&h.harbor_code)
        .bind(&h.harbor_name)
        .bind(&h.un_locode)
        .bind(&h.country)
        .bind(&h.province)
        .bind(&h.city)
        .bind(&h.address)
        .bind(&h.postal_code)
        .bind(h.latitude)
        .bind(h.longitude)
        .bind(&h.harbor_type)
        .bind(&h.status)
        .bind(h.max_ship_length)
        .bind(h.max_ship_beam)
        .bind(h.max_ship_draft)
        .bind(h.berth_count)
        .bind(h.storage_capacity)
        .bind(h.water_depth)
        .bind(&h.timezone)
        .bind(&h.working_hours)
        .bind(&h.contact_person)
        .bind(&h.contact_phone)
        .bind(&h.contact_email)
        .bind(&h.website)
        .bind(h.has_customs)
        .bind(h.has_quarantine)
        .bind(h.has_pilotage)
        .bind(h.has_tug_service)
        .bind(h.has_repair_service)
        .bind(h.has_waste)
        .bind(h.is_active)
        .bind(&h.notes)
}

/// 调用者通过任一有效角色可见的港口
fn push_visible_to(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid) {
    qb.push(
        " AND h.id IN (SELECT rh.harbor_id FROM role_harbors rh \
         JOIN roles r ON r.id = rh.role_id \
         JOIN user_roles ur ON ur.role_id = r.id \
         WHERE r.is_active AND r.deleted_at IS NULL AND ur.user_id = ",
    )
    .push_bind(user_id)
    .push(")");
}

impl HarborRepository {
    /// 创建港口
    pub async fn insert(conn: &mut PgConnection, harbor: &Harbor) -> Result<Harbor, AppError> {
        let query = sqlx::query_as::<_, Harbor>(
            r#"
            INSERT INTO harbors (
                id, harbor_code, harbor_name, un_locode, country, province, city,
                address, postal_code, latitude, longitude, harbor_type, status,
                max_ship_length, max_ship_beam, max_ship_draft, berth_count,
                storage_capacity, water_depth, timezone, working_hours,
                contact_person, contact_phone, contact_email, website,
                has_customs, has_quarantine, has_pilotage, has_tug_service,
                has_repair_service, has_waste, is_active, notes
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                $31, $32, $33
            )
            RETURNING *
            "#,
        )
        .bind(harbor.id);

        let harbor = bind_fields(query, harbor).fetch_one(&mut *conn).await?;
        Ok(harbor)
    }

    /// 根据 ID 查找港口（不做范围收窄，供写操作使用）
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Harbor>, AppError> {
        let harbor = sqlx::query_as::<_, Harbor>(
            "SELECT * FROM harbors WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(harbor)
    }

    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Harbor>, AppError> {
        let harbor = sqlx::query_as::<_, Harbor>(
            "SELECT * FROM harbors WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(harbor)
    }

    /// 根据 ID 查找调用者可见的港口
    pub async fn find_visible(
        conn: &mut PgConnection,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Harbor>, AppError> {
        let mut query = QueryBuilder::new("SELECT h.* FROM harbors h WHERE h.deleted_at IS NULL");
        query.push(" AND h.id = ").push_bind(id);
        push_visible_to(&mut query, user_id);

        let harbor = query
            .build_query_as::<Harbor>()
            .fetch_optional(&mut *conn)
            .await?;

        Ok(harbor)
    }

    /// 写回港口的可变字段
    pub async fn update(conn: &mut PgConnection, harbor: &Harbor) -> Result<Harbor, AppError> {
        let query = sqlx::query_as::<_, Harbor>(
            r#"
            UPDATE harbors
            SET
                harbor_code = $2, harbor_name = $3, un_locode = $4, country = $5,
                province = $6, city = $7, address = $8, postal_code = $9,
                latitude = $10, longitude = $11, harbor_type = $12, status = $13,
                max_ship_length = $14, max_ship_beam = $15, max_ship_draft = $16,
                berth_count = $17, storage_capacity = $18, water_depth = $19,
                timezone = $20, working_hours = $21, contact_person = $22,
                contact_phone = $23, contact_email = $24, website = $25,
                has_customs = $26, has_quarantine = $27, has_pilotage = $28,
                has_tug_service = $29, has_repair_service = $30, has_waste = $31,
                is_active = $32, notes = $33,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(harbor.id);

        let harbor = bind_fields(query, harbor).fetch_one(&mut *conn).await?;
        Ok(harbor)
    }

    /// 软删除港口，并移除所有角色授权
    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        sqlx::query("DELETE FROM role_harbors WHERE harbor_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query(
            "UPDATE harbors SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListHarborRequest) {
        if let Some(name) = non_empty(&filter.name) {
            qb.push(" AND h.harbor_name ILIKE ")
                .push_bind(contains_pattern(&name));
        }
        if let Some(country) = non_empty(&filter.country) {
            qb.push(" AND h.country = ").push_bind(country);
        }
        if let Some(province) = non_empty(&filter.province) {
            qb.push(" AND h.province = ").push_bind(province);
        }
        if let Some(city) = non_empty(&filter.city) {
            qb.push(" AND h.city = ").push_bind(city);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND h.is_active = ").push_bind(is_active);
        }
    }

    /// 列出调用者可见的港口；总数与分页使用同一谓词
    pub async fn list_visible(
        conn: &mut PgConnection,
        user_id: Uuid,
        filter: &ListHarborRequest,
        page: PageQuery,
    ) -> Result<(Vec<Harbor>, i64), AppError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM harbors h WHERE h.deleted_at IS NULL");
        push_visible_to(&mut count, user_id);
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut query = QueryBuilder::new("SELECT h.* FROM harbors h WHERE h.deleted_at IS NULL");
        push_visible_to(&mut query, user_id);
        Self::push_filters(&mut query, filter);
        push_page(&mut query, "h.harbor_name, h.id", page);
        let harbors = query.build_query_as::<Harbor>().fetch_all(&mut *conn).await?;

        Ok((harbors, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_predicate_binds_user() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT h.* FROM harbors h WHERE h.deleted_at IS NULL");
        push_visible_to(&mut qb, Uuid::new_v4());
        HarborRepository::push_filters(
            &mut qb,
            &ListHarborRequest {
                name: Some("rotter".to_string()),
                country: Some(String::new()),
                ..Default::default()
            },
        );

        let sql = qb.sql();
        assert!(sql.contains("ur.user_id = $1"));
        assert!(sql.contains("h.harbor_name ILIKE $2"));
        assert!(!sql.contains("h.country"));
    }
}

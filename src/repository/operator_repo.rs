//! Operator repository (运营商数据访问)

use super::{contains_pattern, non_empty, push_page};
use crate::{
    error::AppError,
    models::{operator::*, pagination::PageQuery},
};
use sqlx::{postgres::PgArguments, query::QueryAs, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

pub struct OperatorRepository;

/// 绑定 $2..$20（$1 为 id）
fn bind_fields<'q>(
    query: QueryAs<'q, Postgres, Operator, PgArguments>,
    o: &'q Operator,
) -> QueryAs<'q, Postgres, Operator, PgArguments> {
    query
        .bind(o.user_id)
        .bind(&o.operator_code)
        .bind(&o.company_name)
        .bind(&o.license_number)
        .bind(&o.contact_person)
        .bind(&o.contact_phone)
        .bind(&o.contact_email)
        .bind(&o.address)
        .bind(&o.city)
        .bind(&o.province)
        .bind(&o.country)
        .bind(&o.postal_code)
        .bind(&o.website)
        .bind(&o.operator_type)
        .bind(&o.status)
        .bind(o.established_at)
        .bind(o.license_expiry)
        .bind(o.is_active)
        .bind(&o.notes)
}

impl OperatorRepository {
    /// 创建运营商；用户不存在时外键冲突映射为 NotFound
    pub async fn insert(conn: &mut PgConnection, operator: &Operator) -> Result<Operator, AppError> {
        let query = sqlx::query_as::<_, Operator>(
            r#"
            INSERT INTO operators (
                id, user_id, operator_code, company_name, license_number,
                contact_person, contact_phone, contact_email, address, city,
                province, country, postal_code, website, operator_type, status,
                established_at, license_expiry, is_active, notes
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            RETURNING *
            "#,
        )
        .bind(operator.id);

        let operator = bind_fields(query, operator).fetch_one(&mut *conn).await?;
        Ok(operator)
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Operator>, AppError> {
        let operator = sqlx::query_as::<_, Operator>(
            "SELECT * FROM operators WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(operator)
    }

    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<Option<Operator>, AppError> {
        let operator = sqlx::query_as::<_, Operator>(
            "SELECT * FROM operators WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(operator)
    }

    /// 根据所属用户查找运营商
    pub async fn find_by_user_id(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<Operator>, AppError> {
        let operator = sqlx::query_as::<_, Operator>(
            "SELECT * FROM operators WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(operator)
    }

    pub async fn update(conn: &mut PgConnection, operator: &Operator) -> Result<Operator, AppError> {
        let query = sqlx::query_as::<_, Operator>(
            r#"
            UPDATE operators
            SET
                user_id = $2, operator_code = $3, company_name = $4,
                license_number = $5, contact_person = $6, contact_phone = $7,
                contact_email = $8, address = $9, city = $10, province = $11,
                country = $12, postal_code = $13, website = $14, operator_type = $15,
                status = $16, established_at = $17, license_expiry = $18,
                is_active = $19, notes = $20,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(operator.id);

        let operator = bind_fields(query, operator).fetch_one(&mut *conn).await?;
        Ok(operator)
    }

    /// 仍有在册船舶的运营商数量
    pub async fn count_live_ships(conn: &mut PgConnection, id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ships WHERE operator_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE operators SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListOperatorRequest) {
        if let Some(company_name) = non_empty(&filter.company_name) {
            qb.push(" AND company_name ILIKE ")
                .push_bind(contains_pattern(&company_name));
        }
        if let Some(operator_type) = non_empty(&filter.operator_type) {
            qb.push(" AND operator_type = ").push_bind(operator_type);
        }
        if let Some(status) = non_empty(&filter.status) {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(country) = non_empty(&filter.country) {
            qb.push(" AND country = ").push_bind(country);
        }
        if let Some(province) = non_empty(&filter.province) {
            qb.push(" AND province = ").push_bind(province);
        }
        if let Some(city) = non_empty(&filter.city) {
            qb.push(" AND city = ").push_bind(city);
        }
        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
    }

    pub async fn list(
        conn: &mut PgConnection,
        filter: &ListOperatorRequest,
        page: PageQuery,
    ) -> Result<(Vec<Operator>, i64), AppError> {
        let mut count =
            QueryBuilder::new("SELECT COUNT(*) FROM operators WHERE deleted_at IS NULL");
        Self::push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut query = QueryBuilder::new("SELECT * FROM operators WHERE deleted_at IS NULL");
        Self::push_filters(&mut query, filter);
        push_page(&mut query, "company_name, id", page);
        let operators = query
            .build_query_as::<Operator>()
            .fetch_all(&mut *conn)
            .await?;

        Ok((operators, total))
    }
}

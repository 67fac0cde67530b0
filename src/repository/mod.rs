//! Database repository layer
//!
//! Repositories take `&mut PgConnection`, so the same query runs on a pooled
//! connection or inside the caller's transaction.

pub mod harbor_repo;
pub mod operator_repo;
pub mod permission_repo;
pub mod role_repo;
pub mod ship_repo;
pub mod user_repo;

pub use harbor_repo::HarborRepository;
pub use operator_repo::OperatorRepository;
pub use permission_repo::PermissionRepository;
pub use role_repo::RoleRepository;
pub use ship_repo::ShipRepository;
pub use user_repo::UserRepository;

use crate::{error::AppError, models::pagination::PageQuery};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

/// 非空过滤值；空字符串等同于未提供
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

/// ILIKE 子串模式，转义通配符
pub(crate) fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// 追加排序与分页
pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, order_by: &str, page: PageQuery) {
    qb.push(" ORDER BY ")
        .push(order_by)
        .push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
}

/// 全有或全无的存在性校验：返回第一个不存在的 ID 对应的 NotFound
///
/// `table` 为内部常量表名。匹配行以 `FOR SHARE` 锁定至事务结束，
/// 并发删除须等待本事务提交。
pub(crate) async fn ensure_all_live(
    conn: &mut PgConnection,
    table: &'static str,
    entity: &str,
    ids: &[Uuid],
) -> Result<(), AppError> {
    let sql = format!(
        "SELECT id FROM {} WHERE id = ANY($1) AND deleted_at IS NULL FOR SHARE",
        table
    );
    let found: Vec<Uuid> = sqlx::query_scalar(&sql)
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;

    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(AppError::NotFound(format!("{} {}", entity, missing))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("port"), "%port%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("x".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[test]
    fn test_push_page() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM roles");
        push_page(&mut qb, "name", PageQuery::new(Some(2), Some(20)).unwrap());
        assert_eq!(qb.sql(), "SELECT * FROM roles ORDER BY name LIMIT $1 OFFSET $2");
    }
}

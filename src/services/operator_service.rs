//! 运营商服务

use crate::{
    error::AppError,
    models::{
        operator::*,
        pagination::{Page, PageMetadata, PageQuery},
    },
    repository::{ensure_all_live, OperatorRepository},
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

pub struct OperatorService {
    db: PgPool,
}

impl OperatorService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建运营商；关联用户必须存在
    #[instrument(skip(self, req), fields(user_id = %req.user_id))]
    pub async fn create(&self, req: CreateOperatorRequest) -> Result<Operator, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        ensure_all_live(&mut tx, "users", "user", &[req.user_id]).await?;
        let operator = OperatorRepository::insert(&mut tx, &req.into_operator()).await?;
        tx.commit().await?;

        info!(operator_id = %operator.id, "Operator created");
        Ok(operator)
    }

    #[instrument(skip(self, req))]
    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateOperatorRequest,
    ) -> Result<Operator, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let mut operator = OperatorRepository::find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("operator"))?;

        req.apply(&mut operator);
        let operator = OperatorRepository::update(&mut tx, &operator).await?;
        tx.commit().await?;

        info!(operator_id = %id, "Operator updated");
        Ok(operator)
    }

    /// 仍有在册船舶时拒绝删除
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        OperatorRepository::find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("operator"))?;

        let ships = OperatorRepository::count_live_ships(&mut tx, id).await?;
        if ships > 0 {
            return Err(AppError::Conflict(format!(
                "operator still owns {} ship(s)",
                ships
            )));
        }

        OperatorRepository::soft_delete(&mut tx, id).await?;
        tx.commit().await?;

        info!(operator_id = %id, "Operator deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Operator, AppError> {
        let mut conn = self.db.acquire().await?;
        OperatorRepository::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("operator"))
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Operator, AppError> {
        let mut conn = self.db.acquire().await?;
        OperatorRepository::find_by_user_id(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("operator"))
    }

    pub async fn list(&self, filter: ListOperatorRequest) -> Result<Page<Operator>, AppError> {
        let page = PageQuery::new(filter.page, filter.size)?;

        let mut conn = self.db.acquire().await?;
        let (items, total) = OperatorRepository::list(&mut conn, &filter, page).await?;

        Ok(Page {
            items,
            meta: PageMetadata::new(page, total),
        })
    }
}

//! 港口服务：CRUD 与按角色授权范围的可见性

use crate::{
    error::AppError,
    models::{
        harbor::*,
        pagination::{Page, PageMetadata, PageQuery},
    },
    repository::{HarborRepository, RoleRepository},
};
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

pub struct HarborService {
    db: PgPool,
}

impl HarborService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    #[instrument(skip(self, req), fields(code = %req.harbor_code))]
    pub async fn create(&self, req: CreateHarborRequest) -> Result<Harbor, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let harbor = HarborRepository::insert(&mut tx, &req.into_harbor()).await?;
        tx.commit().await?;

        info!(harbor_id = %harbor.id, "Harbor created");
        Ok(harbor)
    }

    #[instrument(skip(self, req))]
    pub async fn update(&self, id: Uuid, req: UpdateHarborRequest) -> Result<Harbor, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let mut harbor = HarborRepository::find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("harbor"))?;

        req.apply(&mut harbor);
        let harbor = HarborRepository::update(&mut tx, &harbor).await?;
        tx.commit().await?;

        info!(harbor_id = %id, "Harbor updated");
        Ok(harbor)
    }

    /// 软删除港口，同时撤销所有角色授权
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !HarborRepository::soft_delete(&mut tx, id).await? {
            return Err(AppError::not_found("harbor"));
        }
        tx.commit().await?;

        info!(harbor_id = %id, "Harbor deleted");
        Ok(())
    }

    /// 授权范围外的港口与不存在的港口同样返回 NotFound
    pub async fn get_visible(&self, user_id: Uuid, id: Uuid) -> Result<Harbor, AppError> {
        let mut conn = self.db.acquire().await?;
        HarborRepository::find_visible(&mut conn, user_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("harbor"))
    }

    /// 可见港口 = 调用者所有有效角色授权港口的并集
    #[instrument(skip(self, filter))]
    pub async fn list_visible(
        &self,
        user_id: Uuid,
        filter: ListHarborRequest,
    ) -> Result<Page<Harbor>, AppError> {
        let page = PageQuery::new(filter.page, filter.size)?;

        let mut conn = self.db.acquire().await?;
        if RoleRepository::count_active_roles_of_user(&mut conn, user_id).await? == 0 {
            debug!(user_id = %user_id, "No active role, harbor listing refused");
            return Err(AppError::Forbidden);
        }

        let (items, total) =
            HarborRepository::list_visible(&mut conn, user_id, &filter, page).await?;

        Ok(Page {
            items,
            meta: PageMetadata::new(page, total),
        })
    }
}

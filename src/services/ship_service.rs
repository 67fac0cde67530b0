//! 船舶服务

use crate::{
    error::AppError,
    models::{
        pagination::{Page, PageMetadata, PageQuery},
        ship::*,
    },
    repository::{ensure_all_live, ShipRepository},
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

pub struct ShipService {
    db: PgPool,
}

impl ShipService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建船舶；所属运营商必须存在且未删除
    #[instrument(skip(self, req), fields(operator_id = %req.operator_id))]
    pub async fn create(&self, req: CreateShipRequest) -> Result<Ship, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        ensure_all_live(&mut tx, "operators", "operator", &[req.operator_id]).await?;
        let ship = ShipRepository::insert(&mut tx, &req.into_ship()).await?;
        tx.commit().await?;

        info!(ship_id = %ship.id, "Ship created");
        Ok(ship)
    }

    #[instrument(skip(self, req))]
    pub async fn update(&self, id: Uuid, req: UpdateShipRequest) -> Result<Ship, AppError> {
        req.validate()?;

        let mut tx = self.db.begin().await?;
        let mut ship = ShipRepository::find_by_id_for_update(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("ship"))?;

        req.apply(&mut ship);
        let ship = ShipRepository::update(&mut tx, &ship).await?;
        tx.commit().await?;

        info!(ship_id = %id, "Ship updated");
        Ok(ship)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.db.begin().await?;
        if !ShipRepository::soft_delete(&mut tx, id).await? {
            return Err(AppError::not_found("ship"));
        }
        tx.commit().await?;

        info!(ship_id = %id, "Ship deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Ship, AppError> {
        let mut conn = self.db.acquire().await?;
        ShipRepository::find_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("ship"))
    }

    pub async fn list(&self, filter: ListShipRequest) -> Result<Page<Ship>, AppError> {
        let page = PageQuery::new(filter.page, filter.size)?;

        let mut conn = self.db.acquire().await?;
        let (items, total) = ShipRepository::list(&mut conn, &filter, page).await?;

        Ok(Page {
            items,
            meta: PageMetadata::new(page, total),
        })
    }
}

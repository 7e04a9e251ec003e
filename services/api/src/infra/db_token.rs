use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel as _, QueryFilter, QuerySelect, TransactionTrait,
};

use potluck_api_schema::refresh_tokens;

use crate::domain::repository::RefreshTokenRepository;
use crate::domain::types::RefreshTokenRecord;
use crate::error::{ApiError, from_txn};

// ── Refresh token repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRefreshTokenRepository {
    pub db: DatabaseConnection,
}

impl RefreshTokenRepository for DbRefreshTokenRepository {
    async fn store(&self, record: &RefreshTokenRecord) -> Result<(), ApiError> {
        record_active_model(record)
            .insert(&self.db)
            .await
            .context("store refresh token")?;
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, ApiError> {
        let model = refresh_tokens::Entity::find()
            .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await
            .context("find refresh token")?;
        Ok(model.map(record_from_model))
    }

    async fn rotate(&self, old_hash: &str, next: &RefreshTokenRecord) -> Result<bool, ApiError> {
        self.db
            .transaction::<_, bool, ApiError>(|txn| {
                let old_hash = old_hash.to_owned();
                let next = next.clone();
                Box::pin(async move {
                    let current = refresh_tokens::Entity::find()
                        .filter(refresh_tokens::Column::TokenHash.eq(old_hash.as_str()))
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock refresh token for rotation")?;
                    let Some(current) = current.filter(|m| m.revoked_at.is_none()) else {
                        return Ok(false);
                    };
                    let mut am = current.into_active_model();
                    am.revoked_at = Set(Some(Utc::now()));
                    am.update(txn).await.context("revoke rotated refresh token")?;
                    record_active_model(&next)
                        .insert(txn)
                        .await
                        .context("store rotated refresh token")?;
                    Ok(true)
                })
            })
            .await
            .map_err(from_txn)
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, ApiError> {
        let result = refresh_tokens::Entity::update_many()
            .col_expr(refresh_tokens::Column::RevokedAt, Expr::value(Utc::now()))
            .filter(refresh_tokens::Column::TokenHash.eq(token_hash))
            .filter(refresh_tokens::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await
            .context("revoke refresh token")?;
        Ok(result.rows_affected > 0)
    }
}

fn record_active_model(record: &RefreshTokenRecord) -> refresh_tokens::ActiveModel {
    refresh_tokens::ActiveModel {
        id: Set(record.id),
        user_id: Set(record.user_id),
        token_hash: Set(record.token_hash.clone()),
        expires_at: Set(record.expires_at),
        revoked_at: Set(record.revoked_at),
        created_at: Set(record.created_at),
    }
}

fn record_from_model(model: refresh_tokens::Model) -> RefreshTokenRecord {
    RefreshTokenRecord {
        id: model.id,
        user_id: model.user_id,
        token_hash: model.token_hash,
        expires_at: model.expires_at,
        revoked_at: model.revoked_at,
        created_at: model.created_at,
    }
}

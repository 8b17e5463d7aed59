use crate::{
    db::DbPool,
    entities::config_value::{self, ConfigCategory},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Vocabulary store for configurable dropdown values
#[derive(Clone)]
pub struct ConfigValueService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl ConfigValueService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category: ConfigCategory,
    ) -> Result<Vec<config_value::Model>, ServiceError> {
        config_value::Entity::find()
            .filter(config_value::Column::Category.eq(category))
            .order_by_asc(config_value::Column::Value)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Adds a vocabulary entry; `(category, value)` must be unique
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        category: ConfigCategory,
        value: String,
    ) -> Result<config_value::Model, ServiceError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(ServiceError::ValidationError(
                "Value must not be empty".to_string(),
            ));
        }

        let existing = config_value::Entity::find()
            .filter(config_value::Column::Category.eq(category))
            .filter(config_value::Column::Value.eq(value.clone()))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Value '{}' already exists in this category",
                value
            )));
        }

        let saved = config_value::ActiveModel {
            id: Set(Uuid::new_v4()),
            category: Set(category),
            value: Set(value),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            // The unique index backs up the pre-check under concurrency
            if matches!(&e, sea_orm::DbErr::Exec(_) | sea_orm::DbErr::Query(_)) {
                ServiceError::Conflict("Value already exists in this category".to_string())
            } else {
                ServiceError::db_error(e)
            }
        })?;

        slog::info!(self.logger, "Config value created";
            "category" => format!("{:?}", saved.category), "value" => &saved.value);
        self.event_sender
            .send(Event::ConfigValueCreated {
                category: format!("{:?}", saved.category),
                value: saved.value.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(saved)
    }
}

use super::{FeedbackRow, MessageQuery, NewMessage, Store, StoreError};
use crate::entity::{conversations, feedback};
use crate::models::{Feedback, FeedbackKey, Message};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, Database, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::OnConflict,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const DB_FILE: &str = "lumi.db";

impl From<DbErr> for StoreError {
    fn from(e: DbErr) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Task(e.to_string())
    }
}

fn timestamp(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Database(format!("Invalid timestamp: {}", micros)))
}

impl TryFrom<conversations::Model> for Message {
    type Error = StoreError;

    fn try_from(r: conversations::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: r.role.parse().map_err(StoreError::Database)?,
            created_at: timestamp(r.created_at_us)?,
            id: r.id,
            user_id: r.user_id,
            baby_id: r.baby_id,
            content: r.content,
        })
    }
}

impl TryFrom<feedback::Model> for Feedback {
    type Error = StoreError;

    fn try_from(r: feedback::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            rating: r.rating.parse().map_err(StoreError::Database)?,
            updated_at: timestamp(r.updated_at_us)?,
            conversation_message_id: r.conversation_message_id,
            user_id: r.user_id,
            comment: r.comment,
        })
    }
}

/// SQLite-backed store. Every operation opens its own connection on the
/// blocking pool.
pub struct SqliteStore {
    db_url: String,
}

impl SqliteStore {
    pub async fn open(data_dir: &Path) -> Result<Arc<Self>, StoreError> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| StoreError::Database(format!("Failed to create data dir: {}", e)))?;
        let db_path = data_dir.join(DB_FILE);
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        tokio::task::spawn_blocking({
            let db_url = db_url.clone();
            move || -> Result<(), StoreError> {
                let db = Database::connect(&db_url)?;

                db.get_schema_builder()
                    .register(conversations::Entity)
                    .register(feedback::Entity)
                    .sync(&db)?;

                Ok(())
            }
        })
        .await??;

        info!("SQLite store ready at {}", db_path.display());
        Ok(Arc::new(Self { db_url }))
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_message(&self, row: NewMessage) -> Result<Message, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = conversations::ActiveModel {
            rowid: NotSet,
            id: Set(id.clone()),
            user_id: Set(row.user_id),
            baby_id: Set(row.baby_id),
            content: Set(row.content),
            role: Set(row.role.as_str().to_string()),
            created_at_us: Set(Utc::now().timestamp_micros()),
        };

        let db_url = self.db_url.clone();
        tokio::task::spawn_blocking(move || -> Result<Message, StoreError> {
            let db = Database::connect(&db_url)?;
            conversations::Entity::insert(record).exec(&db)?;

            conversations::Entity::find()
                .filter(conversations::Column::Id.eq(&id))
                .one(&db)?
                .ok_or(StoreError::NoRows)?
                .try_into()
        })
        .await?
    }

    async fn select_messages(&self, query: MessageQuery) -> Result<Vec<Message>, StoreError> {
        let db_url = self.db_url.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<Message>, StoreError> {
            let db = Database::connect(&db_url)?;
            let mut select = conversations::Entity::find();
            if let Some(baby_id) = &query.baby_id {
                select = select.filter(conversations::Column::BabyId.eq(baby_id));
            }

            let rows = select
                .order_by_desc(conversations::Column::CreatedAtUs)
                .order_by_desc(conversations::Column::Rowid)
                .limit(query.limit)
                .all(&db)?;

            rows.into_iter().map(Message::try_from).collect()
        })
        .await?
    }

    async fn upsert_feedback(&self, row: FeedbackRow) -> Result<Feedback, StoreError> {
        let key = FeedbackKey::new(&row.conversation_message_id, &row.user_id);
        let record = feedback::ActiveModel {
            conversation_message_id: Set(row.conversation_message_id),
            user_id: Set(row.user_id),
            rating: Set(row.rating.as_str().to_string()),
            comment: Set(row.comment),
            updated_at_us: Set(row.updated_at.timestamp_micros()),
        };

        let db_url = self.db_url.clone();
        tokio::task::spawn_blocking(move || -> Result<Feedback, StoreError> {
            let db = Database::connect(&db_url)?;

            let message = conversations::Entity::find()
                .filter(conversations::Column::Id.eq(&key.conversation_message_id))
                .one(&db)?;
            if message.is_none() {
                return Err(StoreError::ForeignKey(format!(
                    "conversation message {} does not exist",
                    key.conversation_message_id
                )));
            }

            feedback::Entity::insert(record)
                .on_conflict(
                    OnConflict::columns([
                        feedback::Column::ConversationMessageId,
                        feedback::Column::UserId,
                    ])
                    .update_columns([
                        feedback::Column::Rating,
                        feedback::Column::Comment,
                        feedback::Column::UpdatedAtUs,
                    ])
                    .to_owned(),
                )
                .exec(&db)?;

            feedback::Entity::find_by_id((key.conversation_message_id, key.user_id))
                .one(&db)?
                .ok_or(StoreError::NoRows)?
                .try_into()
        })
        .await?
    }

    async fn select_feedback(&self, key: &FeedbackKey) -> Result<Feedback, StoreError> {
        let db_url = self.db_url.clone();
        let key = key.clone();

        tokio::task::spawn_blocking(move || -> Result<Feedback, StoreError> {
            let db = Database::connect(&db_url)?;
            feedback::Entity::find_by_id((key.conversation_message_id, key.user_id))
                .one(&db)?
                .ok_or(StoreError::NoRows)?
                .try_into()
        })
        .await?
    }

    async fn delete_feedback(&self, key: &FeedbackKey) -> Result<(), StoreError> {
        let db_url = self.db_url.clone();
        let key = key.clone();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let db = Database::connect(&db_url)?;
            feedback::Entity::delete_many()
                .filter(feedback::Column::ConversationMessageId.eq(&key.conversation_message_id))
                .filter(feedback::Column::UserId.eq(&key.user_id))
                .exec(&db)?;
            Ok(())
        })
        .await?
    }
}

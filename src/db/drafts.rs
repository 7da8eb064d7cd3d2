//! Database operations for drafts.

use async_trait::async_trait;
use sea_orm::*;
use uuid::Uuid;

use super::DbPool;
use crate::entity::draft;
use crate::error::{AppError, AppResult};
use crate::models::{Blob, DraftRecord, DraftStatus, TestType};
use crate::services::DraftRepository;

#[async_trait]
impl DraftRepository for DbPool {
    async fn select_all_desc(&self) -> AppResult<Vec<DraftRecord>> {
        let models = draft::Entity::find()
            .order_by_desc(draft::Column::UploadedAt)
            .order_by_desc(draft::Column::Id)
            .all(self.connection())
            .await?;

        models.into_iter().map(model_to_draft).collect()
    }

    async fn insert_returning(&self, record: DraftRecord) -> AppResult<DraftRecord> {
        let inserted = draft_to_active_model(record)
            .insert(self.connection())
            .await?;
        model_to_draft(inserted)
    }

    async fn update_returning(&self, record: DraftRecord) -> AppResult<DraftRecord> {
        let id = record.id;
        match draft_to_active_model(record).update(self.connection()).await {
            Ok(updated) => model_to_draft(updated),
            Err(DbErr::RecordNotUpdated) => Err(AppError::NotFound(format!("Draft {}", id))),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        let result = draft::Entity::delete_by_id(id)
            .exec(self.connection())
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Draft {}", id)));
        }
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        self.connection().ping().await?;
        Ok(())
    }
}

fn draft_to_active_model(record: DraftRecord) -> draft::ActiveModel {
    let (excel_name, excel_content_type, excel_data) = match record.excel_file {
        Some(excel) => (Some(excel.name), Some(excel.content_type), Some(excel.data)),
        None => (None, None, None),
    };

    draft::ActiveModel {
        id: Set(record.id),
        sample_id: Set(record.sample_id),
        test_type: Set(record.test_type.as_str().to_string()),
        image_name: Set(record.image.name),
        image_content_type: Set(record.image.content_type),
        image_data: Set(record.image.data),
        excel_name: Set(excel_name),
        excel_content_type: Set(excel_content_type),
        excel_data: Set(excel_data),
        uploaded_by: Set(record.uploaded_by),
        uploaded_at: Set(record.uploaded_at),
        status: Set(record.status.as_str().to_string()),
        notes: Set(record.notes),
        engineer_notes: Set(record.engineer_notes),
        reviewed_by: Set(record.reviewed_by),
        updated_at: Set(record.updated_at),
    }
}

fn model_to_draft(m: draft::Model) -> AppResult<DraftRecord> {
    let test_type = TestType::parse(&m.test_type).ok_or_else(|| {
        AppError::Database(format!("Draft {} has unknown test_type '{}'", m.id, m.test_type))
    })?;
    let status = DraftStatus::parse(&m.status).ok_or_else(|| {
        AppError::Database(format!("Draft {} has unknown status '{}'", m.id, m.status))
    })?;

    let excel_file = match (m.excel_name, m.excel_data) {
        (Some(name), Some(data)) => Some(Blob {
            name,
            content_type: m.excel_content_type.unwrap_or_default(),
            data,
        }),
        _ => None,
    };

    Ok(DraftRecord {
        id: m.id,
        sample_id: m.sample_id,
        test_type,
        image: Blob {
            name: m.image_name,
            content_type: m.image_content_type,
            data: m.image_data,
        },
        uploaded_by: m.uploaded_by,
        uploaded_at: m.uploaded_at,
        status,
        notes: m.notes,
        engineer_notes: m.engineer_notes,
        excel_file,
        reviewed_by: m.reviewed_by,
        updated_at: m.updated_at,
    })
}

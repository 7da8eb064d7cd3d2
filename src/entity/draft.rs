//! Draft entity. Blobs are stored inline as BYTEA columns.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drafts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sample_id: String,
    pub test_type: String,
    pub image_name: String,
    pub image_content_type: String,
    pub image_data: Vec<u8>,
    pub excel_name: Option<String>,
    pub excel_content_type: Option<String>,
    pub excel_data: Option<Vec<u8>>,
    pub uploaded_by: String,
    pub uploaded_at: DateTimeUtc,
    pub status: String,
    pub notes: Option<String>,
    pub engineer_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

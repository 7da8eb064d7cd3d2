//! Migration: Create drafts table.
//!
//! One row per lab draft, with the sample image and optional spreadsheet
//! stored inline.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE drafts (
                    id UUID PRIMARY KEY,
                    sample_id VARCHAR(100) NOT NULL CHECK (btrim(sample_id) <> ''),
                    test_type VARCHAR(20) NOT NULL
                        CHECK (test_type IN ('concrete', 'asphalt', 'soil')),

                    image_name VARCHAR(255) NOT NULL,
                    image_content_type VARCHAR(100) NOT NULL,
                    image_data BYTEA NOT NULL,

                    excel_name VARCHAR(255),
                    excel_content_type VARCHAR(100),
                    excel_data BYTEA,

                    uploaded_by VARCHAR(100) NOT NULL,
                    uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    status VARCHAR(20) NOT NULL DEFAULT 'under_review'
                        CHECK (status IN ('under_review', 'approved', 'rejected')),
                    notes TEXT,
                    engineer_notes TEXT,
                    reviewed_by VARCHAR(100),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                    CHECK ((excel_data IS NULL) = (excel_name IS NULL))
                );

                -- Dashboard listing is newest first
                CREATE INDEX idx_drafts_uploaded_at ON drafts(uploaded_at DESC);

                -- Archive and pending-review counts
                CREATE INDEX idx_drafts_status ON drafts(status);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS drafts CASCADE;")
            .await?;

        Ok(())
    }
}

//! SeaORM entity definitions for PostgreSQL database.

pub mod draft;

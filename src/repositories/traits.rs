//! CRUD traits shared by the repositories
//!
//! Only the tables that need them implement each trait: auth codes are never
//! updated in full or deleted, friend requests are never deleted.

/// Inserts a row built from `Dto` and returns it as stored (id, uid and
/// dates filled in by the repository or the database)
pub trait Create<Entity, Dto> {
    async fn create(&self, data: &Dto) -> Result<Entity, sqlx::Error>;
}

/// Row by primary key; `Ok(None)` when it does not exist
pub trait Read<Entity, Id> {
    async fn read(&self, id: &Id) -> Result<Option<Entity>, sqlx::Error>;
}

/// Partial update: only the `Some` fields of `Dto` are written.
/// Fails with `RowNotFound` when the row does not exist.
pub trait Update<Entity, Dto, Id> {
    async fn update(&self, id: &Id, data: &Dto) -> Result<Entity, sqlx::Error>;
}

/// Hard delete; dependent rows follow the `ON DELETE` rules of the schema
pub trait Delete<Id> {
    async fn delete(&self, id: &Id) -> Result<(), sqlx::Error>;
}

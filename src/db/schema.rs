//! Table bootstrap from the entity definitions.
//!
//! Creates any missing table on startup. Existing tables are left untouched;
//! this is not a migration system.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::debug;

use crate::db::entities::{auth_token, ingredient, tag, user};

pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Referenced tables first so foreign keys resolve.
    create_table(db, user::Entity).await?;
    create_table(db, auth_token::Entity).await?;
    create_table(db, tag::Entity).await?;
    create_table(db, ingredient::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    debug!(table = %entity.table_name(), "Ensured table exists.");
    Ok(())
}

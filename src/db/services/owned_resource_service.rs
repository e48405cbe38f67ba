//! Storage for records that belong to exactly one user.
//!
//! [`ScopedStore`] is generic over any entity implementing [`OwnedResource`];
//! it only ever reads or writes rows owned by the identity passed to each
//! call. Listing and creation are separate capabilities ([`Listable`],
//! [`Creatable`]) so a route can depend on only what it uses.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    Order, QueryFilter, QueryOrder, Set,
};
use std::marker::PhantomData;
use tracing::info;

use crate::db::entities::{ingredient, tag};
use crate::db::services::validation::required_text;
use crate::web::models::AuthenticatedUser;

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),
}

/// Storage-independent view of an owned row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRecord {
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
}

/// An entity with an owner column and a name, listed in a fixed order.
pub trait OwnedResource: EntityTrait {
    const LABEL: &'static str;

    fn id_column() -> Self::Column;
    fn owner_column() -> Self::Column;
    fn name_column() -> Self::Column;
    /// Direction applied to `name`, then `id` as a tie-breaker.
    fn listing_order() -> Order;
    fn new_active_model(owner_id: i32, name: String) -> Self::ActiveModel;
    fn into_record(model: Self::Model) -> OwnedRecord;
}

impl OwnedResource for tag::Entity {
    const LABEL: &'static str = "tag";

    fn id_column() -> tag::Column {
        tag::Column::Id
    }

    fn owner_column() -> tag::Column {
        tag::Column::UserId
    }

    fn name_column() -> tag::Column {
        tag::Column::Name
    }

    fn listing_order() -> Order {
        Order::Asc
    }

    fn new_active_model(owner_id: i32, name: String) -> tag::ActiveModel {
        tag::ActiveModel {
            user_id: Set(owner_id),
            name: Set(name),
            ..Default::default()
        }
    }

    fn into_record(model: tag::Model) -> OwnedRecord {
        OwnedRecord {
            id: model.id,
            name: model.name,
            owner_id: model.user_id,
        }
    }
}

impl OwnedResource for ingredient::Entity {
    const LABEL: &'static str = "ingredient";

    fn id_column() -> ingredient::Column {
        ingredient::Column::Id
    }

    fn owner_column() -> ingredient::Column {
        ingredient::Column::UserId
    }

    fn name_column() -> ingredient::Column {
        ingredient::Column::Name
    }

    // Ingredients list Z->A while tags list A->Z. Kept for client compatibility,
    // though it looks accidental.
    fn listing_order() -> Order {
        Order::Desc
    }

    fn new_active_model(owner_id: i32, name: String) -> ingredient::ActiveModel {
        ingredient::ActiveModel {
            user_id: Set(owner_id),
            name: Set(name),
            ..Default::default()
        }
    }

    fn into_record(model: ingredient::Model) -> OwnedRecord {
        OwnedRecord {
            id: model.id,
            name: model.name,
            owner_id: model.user_id,
        }
    }
}

#[async_trait]
pub trait Listable {
    /// Records owned by `owner`, in the resource's listing order.
    async fn list(&self, owner: &AuthenticatedUser) -> Result<Vec<OwnedRecord>, ResourceError>;
}

#[async_trait]
pub trait Creatable {
    /// Creates a record owned by `owner`. Ownership is never taken from input.
    async fn create(
        &self,
        owner: &AuthenticatedUser,
        name: &str,
    ) -> Result<OwnedRecord, ResourceError>;
}

pub struct ScopedStore<E> {
    db: DatabaseConnection,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for ScopedStore<E> {
    fn clone(&self) -> Self {
        ScopedStore {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: OwnedResource> ScopedStore<E> {
    pub fn new(db: DatabaseConnection) -> Self {
        ScopedStore {
            db,
            _entity: PhantomData,
        }
    }
}

pub type TagStore = ScopedStore<tag::Entity>;
pub type IngredientStore = ScopedStore<ingredient::Entity>;

#[async_trait]
impl<E> Listable for ScopedStore<E>
where
    E: OwnedResource + Send + Sync,
    E::Model: Send + Sync,
{
    async fn list(&self, owner: &AuthenticatedUser) -> Result<Vec<OwnedRecord>, ResourceError> {
        let order = E::listing_order();
        let models = E::find()
            .filter(E::owner_column().eq(owner.id))
            .order_by(E::name_column(), order.clone())
            .order_by(E::id_column(), order)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(E::into_record).collect())
    }
}

#[async_trait]
impl<E> Creatable for ScopedStore<E>
where
    E: OwnedResource + Send + Sync,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: Send,
{
    async fn create(
        &self,
        owner: &AuthenticatedUser,
        name: &str,
    ) -> Result<OwnedRecord, ResourceError> {
        let name = required_text("name", name).map_err(ResourceError::Validation)?;
        let model = E::new_active_model(owner.id, name).insert(&self.db).await?;
        let record = E::into_record(model);
        info!(resource = E::LABEL, id = record.id, owner_id = owner.id, "Created owned resource.");
        Ok(record)
    }
}

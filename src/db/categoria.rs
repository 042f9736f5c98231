//! Category lookups.

use crate::entities::{categorias, prelude::*};
use sea_orm::*;

/// List all categories ordered by name.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<categorias::Model>, DbErr> {
    Categorias::find().order_by_asc(categorias::Column::Nombre).all(db).await
}

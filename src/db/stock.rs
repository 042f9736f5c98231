//! Stock repository. One row per product.

use crate::entities::{prelude::*, stock};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

/// Stock row of one product, if it has one.
pub async fn get_for_producto<C: ConnectionTrait>(db: &C, producto_id: i32) -> Result<Option<stock::Model>, DbErr> {
    for_producto(producto_id).one(db).await
}

fn for_producto(producto_id: i32) -> Select<stock::Entity> {
    Stock::find().filter(stock::Column::ProductoId.eq(producto_id))
}

/// Set the quantity of a product, creating the row when missing.
pub async fn set_cantidad<C: ConnectionTrait>(db: &C, producto_id: i32, cantidad: i32) -> Result<(), DbErr> {
    let model = stock::ActiveModel {
        producto_id: Set(producto_id),
        cantidad: Set(cantidad),
        ultima_actualizacion: Set(Some(Utc::now().into())),
        ..Default::default()
    };

    Stock::insert(model)
        .on_conflict(
            OnConflict::column(stock::Column::ProductoId)
                .update_columns([stock::Column::Cantidad, stock::Column::UltimaActualizacion])
                .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_producto_filters_by_product() {
        let sql = for_producto(42).build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#""stock"."producto_id" = 42"#), "{sql}");
    }
}

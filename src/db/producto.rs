//! Product repository with stock-joined reads and barcode upsert.

use crate::entities::{categorias, prelude::*, productos, stock};
use crate::models::{ProductoConStock, ProductoForm, UpdateProducto};
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, OnConflict};
use sea_orm::*;

fn join_rows(
    rows: Vec<(productos::Model, Option<stock::Model>)>,
    categorias: &[categorias::Model],
) -> Vec<ProductoConStock> {
    rows.into_iter()
        .map(|(producto, stock)| ProductoConStock::from_models(producto, stock, categorias))
        .collect()
}

/// List active products with their stock, newest first.
pub async fn list_with_stock(db: &DatabaseConnection) -> Result<Vec<ProductoConStock>, DbErr> {
    let categorias = super::categoria::list_all(db).await?;
    let rows = Productos::find()
        .find_also_related(Stock)
        .filter(productos::Column::Activo.eq(true))
        .order_by_desc(productos::Column::Id)
        .all(db)
        .await?;

    Ok(join_rows(rows, &categorias))
}

/// Active products whose name contains `term`, ignoring case, by name.
pub async fn search_by_name(db: &DatabaseConnection, term: &str) -> Result<Vec<ProductoConStock>, DbErr> {
    let categorias = super::categoria::list_all(db).await?;
    let rows = name_search(term).all(db).await?;
    Ok(join_rows(rows, &categorias))
}

fn name_search(term: &str) -> SelectTwo<productos::Entity, stock::Entity> {
    let pattern = format!("%{}%", term.trim().to_lowercase());
    Productos::find()
        .find_also_related(Stock)
        .filter(productos::Column::Activo.eq(true))
        .filter(Expr::expr(Func::lower(Expr::col((productos::Entity, productos::Column::Nombre)))).like(pattern))
        .order_by_asc(productos::Column::Nombre)
}

/// Get a product with its stock by ID.
pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<ProductoConStock>, DbErr> {
    let row = Productos::find_by_id(id).find_also_related(Stock).one(db).await?;

    match row {
        Some((producto, stock)) => {
            let categorias = super::categoria::list_all(db).await?;
            Ok(Some(ProductoConStock::from_models(producto, stock, &categorias)))
        }
        None => Ok(None),
    }
}

/// Find a product by its barcode.
pub async fn find_by_barcode(db: &DatabaseConnection, codigo: &str) -> Result<Option<ProductoConStock>, DbErr> {
    let row = Productos::find()
        .find_also_related(Stock)
        .filter(productos::Column::CodigoBarras.eq(codigo.trim()))
        .one(db)
        .await?;

    match row {
        Some((producto, stock)) => {
            let categorias = super::categoria::list_all(db).await?;
            Ok(Some(ProductoConStock::from_models(producto, stock, &categorias)))
        }
        None => Ok(None),
    }
}

/// Active products registered between two dates, both inclusive.
pub async fn list_created_between(
    db: &DatabaseConnection,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<ProductoConStock>, DbErr> {
    let categorias = super::categoria::list_all(db).await?;
    let rows = created_between(start_date, end_date).all(db).await?;
    Ok(join_rows(rows, &categorias))
}

fn created_between(start_date: NaiveDate, end_date: NaiveDate) -> SelectTwo<productos::Entity, stock::Entity> {
    let start = start_date.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = end_date
        .succ_opt()
        .unwrap_or(end_date)
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();

    Productos::find()
        .find_also_related(Stock)
        .filter(productos::Column::Activo.eq(true))
        .filter(productos::Column::CreatedAt.gte(start))
        .filter(productos::Column::CreatedAt.lt(end))
        .order_by_asc(productos::Column::CreatedAt)
}

/// Insert the product, or update the one sharing its barcode, then set its stock.
pub async fn upsert_by_barcode(db: &DatabaseConnection, form: &ProductoForm) -> Result<productos::Model, DbErr> {
    let model = productos::ActiveModel {
        codigo_barras: Set(Some(form.codigo.trim().to_string())),
        nombre: Set(form.nombre.trim().to_string()),
        marca: Set(non_blank(&form.marca)),
        modelo: Set(non_blank(&form.modelo)),
        categoria_id: Set(form.categoria_id),
        compatibilidad: Set(non_blank(&form.compatibilidad)),
        observaciones: Set(non_blank(&form.observaciones)),
        estado: Set(form.estado.map(|e| e.as_str().to_string())),
        imagen_url: Set(form.imagen_url.clone()),
        activo: Set(true),
        ..Default::default()
    };

    let txn = db.begin().await?;

    let saved = Productos::insert(model)
        .on_conflict(
            OnConflict::column(productos::Column::CodigoBarras)
                .update_columns([
                    productos::Column::Nombre,
                    productos::Column::Marca,
                    productos::Column::Modelo,
                    productos::Column::CategoriaId,
                    productos::Column::Compatibilidad,
                    productos::Column::Observaciones,
                    productos::Column::Estado,
                    productos::Column::ImagenUrl,
                    productos::Column::Activo,
                ])
                .to_owned(),
        )
        .exec_with_returning(&txn)
        .await?;

    super::stock::set_cantidad(&txn, saved.id, form.stock).await?;
    txn.commit().await?;

    Ok(saved)
}

/// Update the editable fields of a product. Unset fields stay unchanged.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    data: UpdateProducto,
) -> Result<Option<productos::Model>, DbErr> {
    let existing = Productos::find_by_id(id).one(db).await?;

    match existing {
        Some(model) => {
            let mut active: productos::ActiveModel = model.into();

            if let Some(nombre) = data.nombre {
                active.nombre = Set(nombre.trim().to_string());
            }
            if let Some(marca) = data.marca {
                active.marca = Set(non_blank(&marca));
            }
            if let Some(modelo) = data.modelo {
                active.modelo = Set(non_blank(&modelo));
            }
            if let Some(compatibilidad) = data.compatibilidad {
                active.compatibilidad = Set(non_blank(&compatibilidad));
            }
            if let Some(observaciones) = data.observaciones {
                active.observaciones = Set(non_blank(&observaciones));
            }

            let updated = active.update(db).await?;
            Ok(Some(updated))
        }
        None => Ok(None),
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" HP "), Some("HP".to_string()));
    }

    #[test]
    fn test_name_search_is_case_insensitive_like() {
        let sql = name_search("  Toner HP ").build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#"LOWER("productos"."nombre") LIKE '%toner hp%'"#), "{sql}");
        assert!(sql.contains(r#""productos"."activo" = TRUE"#), "{sql}");
    }

    #[test]
    fn test_created_between_keeps_only_active() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let sql = created_between(start, end).build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#""productos"."activo" = TRUE"#), "{sql}");
        assert!(sql.contains("2026-10-12"), "{sql}");
        assert!(sql.contains("2026-10-19"), "{sql}");
    }
}

//! Registration and editing workflows behind the product screens.

use sea_orm::DatabaseConnection;
use tracing::{debug, info};

use crate::auth::Session;
use crate::db;
use crate::entities::productos;
use crate::error::{AppError, Result};
use crate::models::{ProductoConStock, ProductoForm, UpdateProducto};
use crate::permissions::{Capability, CapabilityBridge, ensure};
use crate::storage::{StorageClient, image_content_type, product_image_path};

/// Typed codes shorter than this are not looked up.
pub const LOOKUP_MIN_LEN: usize = 4;
/// Scanner guns emit at least this many characters.
pub const SCANNER_MIN_LEN: usize = 8;

/// Outcome of a barcode lookup on the registration form.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Code already registered; the form is pre-filled.
    Existing { id: i32, form: ProductoForm },
    /// Unknown code; blank form with zero stock.
    New(ProductoForm),
}

impl Lookup {
    pub fn form(&self) -> &ProductoForm {
        match self {
            Self::Existing { form, .. } | Self::New(form) => form,
        }
    }
}

pub fn should_lookup(codigo: &str) -> bool {
    codigo.trim().chars().count() >= LOOKUP_MIN_LEN
}

pub fn is_scanner_code(codigo: &str) -> bool {
    codigo.trim().chars().count() >= SCANNER_MIN_LEN
}

/// Look a typed barcode up. `None` while the code is too short.
pub async fn lookup_barcode(db: &DatabaseConnection, codigo: &str) -> Result<Option<Lookup>> {
    if !should_lookup(codigo) {
        return Ok(None);
    }

    let lookup = match db::producto::find_by_barcode(db, codigo).await? {
        Some(producto) => Lookup::Existing {
            id: producto.id,
            form: ProductoForm::from_producto(&producto),
        },
        None => Lookup::New(ProductoForm::blank(codigo)),
    };
    debug!("Lookup {}: {:?}", codigo.trim(), matches!(lookup, Lookup::Existing { .. }));
    Ok(Some(lookup))
}

/// Scanner-gun lookup. `None` while the code is too short.
pub async fn scan(db: &DatabaseConnection, codigo: &str) -> Result<Option<ScanResult>> {
    if !is_scanner_code(codigo) {
        return Ok(None);
    }

    Ok(Some(match db::producto::find_by_barcode(db, codigo).await? {
        Some(producto) => ScanResult::Found(producto),
        None => ScanResult::Missing(codigo.trim().to_string()),
    }))
}

/// Scanner lookup result.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanResult {
    Found(ProductoConStock),
    Missing(String),
}

impl ScanResult {
    pub fn message(&self) -> String {
        match self {
            Self::Found(p) => format!(
                "Producto encontrado: {} ({})",
                p.nombre,
                p.marca.as_deref().unwrap_or("sin marca")
            ),
            Self::Missing(_) => "No se encontró el producto en la base de datos.".to_string(),
        }
    }
}

/// A registered product and the quantity now stored for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedProducto {
    pub producto: productos::Model,
    pub cantidad: i32,
}

/// Validate and upsert the form by barcode, then set its stock.
pub async fn save_producto(db: &DatabaseConnection, form: &ProductoForm) -> Result<SavedProducto> {
    form.validate()?;
    let producto = db::producto::upsert_by_barcode(db, form).await?;
    let cantidad = db::stock::get_for_producto(db, producto.id)
        .await?
        .map_or(0, |row| row.cantidad);
    info!(
        "Saved product {} ({}) with stock {}",
        producto.id,
        form.codigo.trim(),
        cantidad
    );
    Ok(SavedProducto { producto, cantidad })
}

/// Upload a product photo and register one more unit on the form.
pub async fn attach_image(
    storage: &StorageClient,
    capabilities: &dyn CapabilityBridge,
    session: Option<&Session>,
    form: &mut ProductoForm,
    bytes: Vec<u8>,
    extension: &str,
) -> Result<String> {
    if form.codigo.trim().is_empty() {
        return Err(AppError::validation(
            "Se necesita una foto y un código de producto para continuar.",
        ));
    }
    ensure(capabilities, Capability::Camera)?;

    let path = product_image_path(&form.codigo, extension);
    let url = storage
        .upload(session, &path, bytes, image_content_type(extension))
        .await?;

    form.imagen_url = Some(url.clone());
    form.stock = form.stock.saturating_add(1);
    Ok(url)
}

/// Fields of `draft` that differ from `original`, limited to the editable ones.
pub fn diff_update(original: &ProductoConStock, draft: &ProductoForm) -> UpdateProducto {
    fn changed(before: Option<&str>, after: &str) -> Option<String> {
        let after = after.trim();
        (before.unwrap_or("").trim() != after).then(|| after.to_string())
    }

    UpdateProducto {
        nombre: changed(Some(&original.nombre), &draft.nombre),
        marca: changed(original.marca.as_deref(), &draft.marca),
        modelo: changed(original.modelo.as_deref(), &draft.modelo),
        compatibilidad: changed(original.compatibilidad.as_deref(), &draft.compatibilidad),
        observaciones: changed(original.observaciones.as_deref(), &draft.observaciones),
    }
}

/// Apply an editor update. Empty updates and blank names are rejected.
pub async fn edit_producto(db: &DatabaseConnection, id: i32, update: UpdateProducto) -> Result<productos::Model> {
    if update.is_empty() {
        return Err(AppError::validation("No hay cambios para guardar."));
    }
    if update.nombre.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("El nombre del producto es obligatorio."));
    }

    let updated = db::producto::update(db, id, update)
        .await?
        .ok_or_else(|| AppError::not_found(format!("el producto {id}")))?;
    info!("Updated product {}", id);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::producto::fixtures::producto;

    #[test]
    fn test_lookup_thresholds() {
        assert!(!should_lookup("123"));
        assert!(should_lookup("1234"));
        assert!(!is_scanner_code("1234567"));
        assert!(is_scanner_code("12345678"));
    }

    #[test]
    fn test_new_lookup_is_blank_without_stock() {
        let lookup = Lookup::New(ProductoForm::blank("99990000"));
        assert_eq!(lookup.form().stock, 0);
        assert_eq!(lookup.form().disponibilidad().label(), "Sin stock");
    }

    #[test]
    fn test_diff_update_only_changed_fields() {
        let original = producto(1, "Toner 85A", "Nuevo", 4);
        let mut draft = ProductoForm::from_producto(&original);
        assert!(diff_update(&original, &draft).is_empty());

        draft.marca = "Canon".to_string();
        draft.observaciones = "  caja abierta ".to_string();
        let update = diff_update(&original, &draft);
        assert_eq!(update.marca.as_deref(), Some("Canon"));
        assert_eq!(update.observaciones.as_deref(), Some("caja abierta"));
        assert_eq!(update.nombre, None);
        assert_eq!(update.modelo, None);
    }

    #[test]
    fn test_scan_messages() {
        let found = ScanResult::Found(producto(2, "Monitor", "Usado", 1));
        assert_eq!(found.message(), "Producto encontrado: Monitor (HP)");
        let missing = ScanResult::Missing("123".to_string());
        assert!(missing.message().starts_with("No se encontró"));
    }
}

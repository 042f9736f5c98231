//! Product view models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Disponibilidad;
use crate::entities::{categorias, productos, stock};
use crate::error::{AppError, Result};

/// Physical condition of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstadoProducto {
    Nuevo,
    Usado,
    MalEstado,
}

impl EstadoProducto {
    pub const ALL: [EstadoProducto; 3] = [Self::Nuevo, Self::Usado, Self::MalEstado];

    /// Parse the free-text column, ignoring case and surrounding spaces.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "nuevo" => Some(Self::Nuevo),
            "usado" => Some(Self::Usado),
            "mal estado" => Some(Self::MalEstado),
            _ => None,
        }
    }

    /// Canonical spelling written to the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nuevo => "Nuevo",
            Self::Usado => "Usado",
            Self::MalEstado => "Mal estado",
        }
    }
}

/// Product row joined with its stock quantity and category name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductoConStock {
    pub id: i32,
    pub codigo_barras: Option<String>,
    pub nombre: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub categoria_id: Option<i32>,
    pub categoria: Option<String>,
    pub compatibilidad: Option<String>,
    pub observaciones: Option<String>,
    pub estado: Option<String>,
    pub imagen_url: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub cantidad: i32,
    pub ultima_actualizacion: Option<DateTime<Utc>>,
}

impl ProductoConStock {
    /// Flatten a product, its optional stock row and the category list.
    pub fn from_models(
        producto: productos::Model,
        stock: Option<stock::Model>,
        categorias: &[categorias::Model],
    ) -> Self {
        let categoria = producto
            .categoria_id
            .and_then(|id| categorias.iter().find(|c| c.id == id))
            .map(|c| c.nombre.clone());

        Self {
            id: producto.id,
            codigo_barras: producto.codigo_barras,
            nombre: producto.nombre,
            marca: producto.marca,
            modelo: producto.modelo,
            categoria_id: producto.categoria_id,
            categoria,
            compatibilidad: producto.compatibilidad,
            observaciones: producto.observaciones,
            estado: producto.estado,
            imagen_url: producto.imagen_url,
            activo: producto.activo,
            created_at: producto.created_at.with_timezone(&Utc),
            cantidad: stock.as_ref().map(|s| s.cantidad).unwrap_or(0),
            ultima_actualizacion: stock
                .and_then(|s| s.ultima_actualizacion)
                .map(|t| t.with_timezone(&Utc)),
        }
    }

    /// Availability tier for the current quantity.
    pub fn disponibilidad(&self) -> Disponibilidad {
        Disponibilidad::from_cantidad(self.cantidad)
    }

    /// Parsed condition, if the free text is one of the known values.
    pub fn estado_producto(&self) -> Option<EstadoProducto> {
        self.estado.as_deref().and_then(EstadoProducto::parse)
    }

    pub fn codigo(&self) -> &str {
        self.codigo_barras.as_deref().unwrap_or("")
    }

    pub fn estado_label(&self) -> &str {
        self.estado.as_deref().filter(|e| !e.trim().is_empty()).unwrap_or("N/A")
    }
}

/// Registration form state, also used to upsert by barcode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductoForm {
    pub codigo: String,
    pub nombre: String,
    pub marca: String,
    pub modelo: String,
    pub categoria_id: Option<i32>,
    pub compatibilidad: String,
    pub observaciones: String,
    pub estado: Option<EstadoProducto>,
    pub imagen_url: Option<String>,
    pub stock: i32,
}

impl ProductoForm {
    /// Empty form for a barcode that is not registered yet.
    pub fn blank(codigo: &str) -> Self {
        Self {
            codigo: codigo.trim().to_string(),
            ..Default::default()
        }
    }

    /// Form pre-filled from an existing product.
    pub fn from_producto(producto: &ProductoConStock) -> Self {
        Self {
            codigo: producto.codigo().to_string(),
            nombre: producto.nombre.clone(),
            marca: producto.marca.clone().unwrap_or_default(),
            modelo: producto.modelo.clone().unwrap_or_default(),
            categoria_id: producto.categoria_id,
            compatibilidad: producto.compatibilidad.clone().unwrap_or_default(),
            observaciones: producto.observaciones.clone().unwrap_or_default(),
            estado: producto.estado_producto(),
            imagen_url: producto.imagen_url.clone(),
            stock: producto.cantidad,
        }
    }

    pub fn disponibilidad(&self) -> Disponibilidad {
        Disponibilidad::from_cantidad(self.stock)
    }

    /// Check required fields before saving.
    pub fn validate(&self) -> Result<()> {
        if self.codigo.trim().is_empty() {
            return Err(AppError::validation(
                "Por favor, ingresa un código para el producto antes de continuar.",
            ));
        }
        if self.nombre.trim().is_empty() {
            return Err(AppError::validation("El nombre del producto es obligatorio."));
        }
        if self.estado.is_none() {
            return Err(AppError::validation("Selecciona el estado del producto."));
        }
        if self.stock < 0 {
            return Err(AppError::validation("El stock no puede ser negativo."));
        }
        Ok(())
    }
}

/// Editable fields of the product editor. `None` means unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateProducto {
    pub nombre: Option<String>,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub compatibilidad: Option<String>,
    pub observaciones: Option<String>,
}

impl UpdateProducto {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.marca.is_none()
            && self.modelo.is_none()
            && self.compatibilidad.is_none()
            && self.observaciones.is_none()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Minimal product used across module tests.
    pub fn producto(id: i32, nombre: &str, estado: &str, cantidad: i32) -> ProductoConStock {
        ProductoConStock {
            id,
            codigo_barras: Some(format!("780{id:05}")),
            nombre: nombre.to_string(),
            marca: Some("HP".to_string()),
            modelo: Some("M404".to_string()),
            categoria_id: Some(1),
            categoria: Some("Impresora".to_string()),
            compatibilidad: None,
            observaciones: None,
            estado: Some(estado.to_string()),
            imagen_url: None,
            activo: true,
            created_at: Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap(),
            cantidad,
            ultima_actualizacion: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::producto;
    use super::*;

    #[test]
    fn test_estado_parse_ignores_case() {
        assert_eq!(EstadoProducto::parse("mal estado"), Some(EstadoProducto::MalEstado));
        assert_eq!(EstadoProducto::parse("Mal estado"), Some(EstadoProducto::MalEstado));
        assert_eq!(EstadoProducto::parse(" NUEVO "), Some(EstadoProducto::Nuevo));
        assert_eq!(EstadoProducto::parse("roto"), None);
    }

    #[test]
    fn test_form_from_producto_keeps_stock() {
        let p = producto(1, "Toner 85A", "Usado", 7);
        let form = ProductoForm::from_producto(&p);
        assert_eq!(form.codigo, "78000001");
        assert_eq!(form.estado, Some(EstadoProducto::Usado));
        assert_eq!(form.stock, 7);
        assert_eq!(form.disponibilidad(), Disponibilidad::Media);
    }

    #[test]
    fn test_blank_form_is_out_of_stock() {
        let form = ProductoForm::blank(" 12345 ");
        assert_eq!(form.codigo, "12345");
        assert_eq!(form.disponibilidad(), Disponibilidad::SinStock);
    }

    #[test]
    fn test_form_validation() {
        let mut form = ProductoForm::blank("12345");
        assert!(form.validate().is_err());

        form.nombre = "Monitor 24".to_string();
        assert!(form.validate().is_err());

        form.estado = Some(EstadoProducto::Nuevo);
        assert!(form.validate().is_ok());

        form.codigo = "  ".to_string();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateProducto::default().is_empty());
        let update = UpdateProducto {
            marca: Some("Epson".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}

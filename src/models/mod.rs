//! Data models for products, stock availability, and users.

pub mod disponibilidad;
pub mod producto;
pub mod usuario;

pub use disponibilidad::Disponibilidad;
pub use producto::{EstadoProducto, ProductoConStock, ProductoForm, UpdateProducto};
pub use usuario::Perfil;

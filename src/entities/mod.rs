//! SeaORM entities for the backend's `public` schema.

pub mod prelude;

pub mod categorias;
pub mod productos;
pub mod stock;
pub mod usuarios;

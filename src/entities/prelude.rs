pub use super::categorias::Entity as Categorias;
pub use super::productos::Entity as Productos;
pub use super::stock::Entity as Stock;
pub use super::usuarios::Entity as Usuarios;

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "productos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub codigo_barras: Option<String>,
    pub nombre: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub categoria_id: Option<i32>,
    pub compatibilidad: Option<String>,
    pub observaciones: Option<String>,
    /// Free text: "Nuevo", "Usado", "Mal estado".
    pub estado: Option<String>,
    pub imagen_url: Option<String>,
    pub activo: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categorias::Entity",
        from = "Column::CategoriaId",
        to = "super::categorias::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Categorias,
    #[sea_orm(has_one = "super::stock::Entity")]
    Stock,
}

impl Related<super::categorias::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categorias.def()
    }
}

impl Related<super::stock::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stock.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

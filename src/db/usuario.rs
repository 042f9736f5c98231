//! Users enabled to operate the inventory.

use crate::entities::{prelude::*, usuarios};
use sea_orm::*;
use sea_orm::prelude::Uuid;

/// Find an active user by email (case-insensitive).
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<usuarios::Model>, DbErr> {
    use sea_orm::sea_query::{Expr, Func};

    Usuarios::find()
        .filter(Expr::expr(Func::lower(Expr::col(usuarios::Column::Email))).eq(email.trim().to_lowercase()))
        .filter(usuarios::Column::Activo.eq(true))
        .one(db)
        .await
}

/// Find the active user already linked to an auth identity.
pub async fn find_by_auth_uid(db: &DatabaseConnection, auth_uid: Uuid) -> Result<Option<usuarios::Model>, DbErr> {
    by_auth_uid(auth_uid).one(db).await
}

fn by_auth_uid(auth_uid: Uuid) -> Select<usuarios::Entity> {
    Usuarios::find()
        .filter(usuarios::Column::AuthUid.eq(auth_uid))
        .filter(usuarios::Column::Activo.eq(true))
}

/// Link a user row to the auth identity on first sign-in.
pub async fn link_auth_uid(
    db: &DatabaseConnection,
    id: i32,
    auth_uid: Uuid,
) -> Result<Option<usuarios::Model>, DbErr> {
    let Some(model) = Usuarios::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    if model.auth_uid == Some(auth_uid) {
        return Ok(Some(model));
    }

    let mut active: usuarios::ActiveModel = model.into();
    active.auth_uid = Set(Some(auth_uid));
    Ok(Some(active.update(db).await?))
}

/// Set the display name of the user linked to `auth_uid`.
pub async fn update_nombre(db: &DatabaseConnection, auth_uid: Uuid, nombre: &str) -> Result<u64, DbErr> {
    use sea_orm::sea_query::Expr;

    let result = Usuarios::update_many()
        .col_expr(usuarios::Column::Nombre, Expr::value(nombre.trim()))
        .filter(usuarios::Column::AuthUid.eq(auth_uid))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_auth_uid_requires_active_link() {
        let uid = Uuid::nil();
        let sql = by_auth_uid(uid).build(DbBackend::Postgres).to_string();
        assert!(sql.contains(r#""usuarios"."auth_uid" = "#), "{sql}");
        assert!(sql.contains("00000000-0000-0000-0000-000000000000"), "{sql}");
        assert!(sql.contains(r#""usuarios"."activo" = TRUE"#), "{sql}");
    }
}

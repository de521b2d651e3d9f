//! User repository (component C, §4.C, §3 "User").

use std::collections::BTreeMap;

use sqlx::{postgres::Postgres, Executor, FromRow};

use crate::error::CatalogResult;
use crate::model::{Authenticator, AuthenticatorType, Secret, User};
use crate::repo::membership::USER_ROLES;

#[derive(FromRow)]
struct UserRow {
    username: String,
    name: Option<String>,
    email: Option<String>,
    flags: String,
}

#[derive(FromRow)]
struct AuthenticatorRow {
    #[sqlx(rename = "type")]
    kind: String,
    secrets: Vec<String>,
}

fn parse_authenticator_type(kind: &str) -> Option<AuthenticatorType> {
    match kind {
        "password" => Some(AuthenticatorType::Password),
        "x509" => Some(AuthenticatorType::X509),
        _ => None,
    }
}

pub async fn get<'e>(username: &str, db: impl Executor<'e, Database = Postgres> + Copy) -> CatalogResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>("select username, name, email, flags from users where username = $1")
        .bind(username)
        .fetch_optional(db)
        .await?;
    let Some(row) = row else { return Ok(None) };

    let auth_rows = sqlx::query_as::<_, AuthenticatorRow>(
        "select type, secrets from authenticators where username = $1",
    )
    .bind(username)
    .fetch_all(db)
    .await?;

    let mut authenticators = BTreeMap::new();
    for auth_row in auth_rows {
        if let Some(kind) = parse_authenticator_type(&auth_row.kind) {
            authenticators.insert(
                kind,
                Authenticator { secrets: auth_row.secrets.into_iter().map(Secret).collect() },
            );
        }
    }

    let role_names = USER_ROLES.right_of(username, db).await?;

    Ok(Some(User {
        username: row.username,
        name: row.name,
        email: row.email,
        flags: row.flags,
        authenticators,
        role_names,
    }))
}

pub async fn save<'e>(user: &User, db: impl Executor<'e, Database = Postgres> + Copy) -> CatalogResult<()> {
    sqlx::query(
        "insert into users (username, name, email, flags) values ($1, $2, $3, $4) \
         on conflict (username) do update set name = excluded.name, email = excluded.email, flags = excluded.flags",
    )
    .bind(&user.username)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.flags)
    .execute(db)
    .await?;

    for (kind, auth) in &user.authenticators {
        let kind_str = match kind {
            AuthenticatorType::Password => "password",
            AuthenticatorType::X509 => "x509",
        };
        let secrets: Vec<String> = auth.secrets.iter().map(|s| s.0.clone()).collect();
        sqlx::query(
            "insert into authenticators (username, type, secrets) values ($1, $2, $3) \
             on conflict (username, type) do update set secrets = excluded.secrets",
        )
        .bind(&user.username)
        .bind(kind_str)
        .bind(secrets)
        .execute(db)
        .await?;
    }

    Ok(())
}

pub async fn add_role<'e>(username: &str, role_name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
    USER_ROLES.add(username, role_name, db).await
}

pub async fn remove_role<'e>(username: &str, role_name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
    USER_ROLES.remove(username, role_name, db).await
}

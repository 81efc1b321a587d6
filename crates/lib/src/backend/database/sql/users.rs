//! User storage operations for SQL backends.

use crate::{
    Error, Result, UserId,
    backend::BackendError,
    user::{User, UserDeletion, UserError},
};

use super::{SqlxBackend, SqlxResultExt, decks::lock_user, is_unique_violation};

type UserRow = (String, String, String, i64);

const USER_COLUMNS: &str = "id, username, display_name, created_at";

fn user_from_row((id, username, display_name, created_at): UserRow) -> User {
    User {
        id: UserId::from(id),
        username,
        display_name,
        created_at,
    }
}

/// Insert a new user. Fails with `UsernameAlreadyExists` if the username is taken.
pub(crate) async fn insert_user(backend: &SqlxBackend, user: &User) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO users (id, username, display_name, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(user.id.as_str())
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(user.created_at)
    .execute(backend.pool())
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(UserError::UsernameAlreadyExists {
            username: user.username.clone(),
        }
        .into()),
        Err(e) => Err(e).sql_context("Failed to insert user"),
    }
}

pub(crate) async fn get_user(backend: &SqlxBackend, id: &UserId) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(backend.pool())
            .await
            .sql_context("Failed to get user")?;
    Ok(row.map(user_from_row))
}

pub(crate) async fn find_user_by_username(
    backend: &SqlxBackend,
    username: &str,
) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(backend.pool())
            .await
            .sql_context("Failed to find user by username")?;
    Ok(row.map(user_from_row))
}

pub(crate) async fn update_user(backend: &SqlxBackend, user: &User) -> Result<()> {
    let result = sqlx::query("UPDATE users SET username = $1, display_name = $2 WHERE id = $3")
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(user.id.as_str())
        .execute(backend.pool())
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Err(UserError::UserNotFound {
            identifier: user.id.to_string(),
        }
        .into()),
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(UserError::UsernameAlreadyExists {
            username: user.username.clone(),
        }
        .into()),
        Err(e) => Err(e).sql_context("Failed to update user"),
    }
}

pub(crate) async fn list_users(backend: &SqlxBackend) -> Result<Vec<User>> {
    let rows: Vec<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
            .fetch_all(backend.pool())
            .await
            .sql_context("Failed to list users")?;
    Ok(rows.into_iter().map(user_from_row).collect())
}

/// Remove a user, every deck they own with its cards and relations, and their
/// sharing entries and likes elsewhere, in one transaction.
///
/// The user row is locked first: deck inserts and ownership transfers lock
/// their owner's row too, so none can add a deck for this user meanwhile.
pub(crate) async fn delete_user(
    backend: &SqlxBackend,
    id: &UserId,
) -> Result<Option<UserDeletion>> {
    let mut tx = backend
        .pool()
        .begin()
        .await
        .sql_context("Failed to begin transaction")?;

    match lock_user(&mut tx, id).await {
        Ok(()) => {}
        Err(Error::Backend(BackendError::UserMissing { .. })) => return Ok(None),
        Err(err) => return Err(err),
    }

    let cards = sqlx::query(
        "DELETE FROM cards WHERE deck_id IN (SELECT id FROM decks WHERE owner_id = $1)",
    )
    .bind(id.as_str())
    .execute(&mut *tx)
    .await
    .sql_context("Failed to delete owned cards")?
    .rows_affected();

    for (statement, context) in [
        (
            "DELETE FROM deck_shares
             WHERE user_id = $1 OR deck_id IN (SELECT id FROM decks WHERE owner_id = $2)",
            "Failed to delete user shares",
        ),
        (
            "DELETE FROM deck_likes
             WHERE user_id = $1 OR deck_id IN (SELECT id FROM decks WHERE owner_id = $2)",
            "Failed to delete user likes",
        ),
    ] {
        sqlx::query(statement)
            .bind(id.as_str())
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .sql_context(context)?;
    }

    let decks = sqlx::query("DELETE FROM decks WHERE owner_id = $1")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete owned decks")?
        .rows_affected();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await
        .sql_context("Failed to delete user")?;

    tx.commit().await.sql_context("Failed to commit transaction")?;
    Ok(Some(UserDeletion {
        decks: decks as usize,
        cards: cards as usize,
    }))
}

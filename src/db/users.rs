use log::info;
use rusqlite::{params, Connection};

use super::error::DbResult;
use crate::models::{NewUser, User};

/// Retrieve every user ordered by id. The query is the single source of truth
/// for how users are ordered in the UI.
pub fn fetch_users(conn: &Connection) -> DbResult<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, first_name, last_name FROM users ORDER BY id")?;

    let users = stmt
        .query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

/// Persist users that already carry an id. Rows whose id exists get their
/// names replaced; the whole batch commits or none of it does.
pub fn insert_users(conn: &Connection, users: &[User]) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO users (id, first_name, last_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name = excluded.last_name",
        )?;
        for user in users {
            stmt.execute(params![user.id, user.first_name, user.last_name])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Insert a new row and let SQLite pick the id. The hydrated struct is
/// returned so callers can log or focus it without re-querying.
pub fn create_user(conn: &Connection, new_user: &NewUser) -> DbResult<User> {
    conn.execute(
        "INSERT INTO users (first_name, last_name) VALUES (?1, ?2)",
        params![new_user.first_name, new_user.last_name],
    )?;

    Ok(User {
        id: conn.last_insert_rowid(),
        first_name: new_user.first_name.clone(),
        last_name: new_user.last_name.clone(),
    })
}

/// Remove the row with `id`. Returns `false` when nothing matched; a missing
/// row is not an error.
pub fn delete_user(conn: &Connection, id: i64) -> DbResult<bool> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_users(conn: &Connection) -> DbResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

/// Make sure a fresh install has something to show, then report what is
/// stored. Only an empty table is seeded, so deleting the sample user sticks.
pub fn seed_sample_user(conn: &Connection) -> DbResult<Vec<User>> {
    if count_users(conn)? == 0 {
        insert_users(conn, &[User::new(1, "Pepe", "Botella")])?;
        info!("event=seed module=db status=ok inserted=1");
    }

    let users = fetch_users(conn)?;
    info!("event=seed module=db status=loaded users={users:?}");
    Ok(users)
}

//! SQLite persistence for the registered tables.
//!
//! Length and uniqueness limits live in the rendered DDL, so every write
//! path is checked by SQLite itself. String lengths are also counted here
//! before writing, since SQLite's `length()` stops at an embedded NUL.

use std::path::Path;

use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::models::{NewPost, NewUser, Post, User};
use crate::schema::{Model, Registry, TableDef};

pub type Result<T> = std::result::Result<T, StoreError>;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P, registry: Registry) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening database at {}", path.display());
        Self::init(Connection::open(path)?, registry)
    }

    pub fn open_in_memory(registry: Registry) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, registry)
    }

    fn init(conn: Connection, registry: Registry) -> Result<Self> {
        for sql in registry.create_all_sql() {
            debug!("{}", sql);
            conn.execute(&sql, [])?;
        }
        info!("Created {} table(s)", registry.tables().len());
        Ok(Self { conn })
    }

    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        let table = User::TABLE;
        check_lengths(table, &[("username", user.username.as_deref())])?;
        self.conn
            .execute(&insert_sql(table), params![user.username])
            .map_err(|e| StoreError::classify(table, e))?;
        let id = self.conn.last_insert_rowid();
        info!("Created user {}", id);
        Ok(User {
            id,
            username: user.username.clone(),
        })
    }

    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn
            .query_row(&select_one_sql(User::TABLE), [id], User::from_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found(User::TABLE, id))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(&select_all_sql(User::TABLE))?;
        let users = stmt.query_map([], User::from_row)?.collect::<rusqlite::Result<_>>()?;
        Ok(users)
    }

    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.delete(User::TABLE, id)
    }

    /// Inserts a post. `user_id` is stored as given; it is not checked
    /// against `users`.
    pub fn create_post(&self, post: &NewPost) -> Result<Post> {
        let table = Post::TABLE;
        check_post_lengths(post)?;
        self.conn
            .execute(&insert_sql(table), params![post.title, post.content, post.user_id])
            .map_err(|e| StoreError::classify(table, e))?;
        let id = self.conn.last_insert_rowid();
        info!("Created post {} for user {:?}", id, post.user_id);
        Ok(Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            user_id: post.user_id,
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Post> {
        self.conn
            .query_row(&select_one_sql(Post::TABLE), [id], Post::from_row)
            .optional()?
            .ok_or_else(|| StoreError::not_found(Post::TABLE, id))
    }

    pub fn list_posts(&self) -> Result<Vec<Post>> {
        let mut stmt = self.conn.prepare(&select_all_sql(Post::TABLE))?;
        let posts = stmt.query_map([], Post::from_row)?.collect::<rusqlite::Result<_>>()?;
        Ok(posts)
    }

    /// Replaces every data column of post `id`. The id itself never changes.
    pub fn update_post(&self, id: i64, post: &NewPost) -> Result<Post> {
        let table = Post::TABLE;
        check_post_lengths(post)?;
        let changed = self
            .conn
            .execute(&update_sql(table), params![post.title, post.content, post.user_id, id])
            .map_err(|e| StoreError::classify(table, e))?;
        if changed == 0 {
            return Err(StoreError::not_found(table, id));
        }
        info!("Updated post {}", id);
        Ok(Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            user_id: post.user_id,
        })
    }

    pub fn delete_post(&self, id: i64) -> Result<()> {
        self.delete(Post::TABLE, id)
    }

    fn delete(&self, table: &TableDef, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
        if self.conn.execute(&sql, [id])? == 0 {
            warn!("Delete of missing {} row {}", table.name(), id);
            return Err(StoreError::not_found(table, id));
        }
        info!("Deleted {} row {}", table.name(), id);
        Ok(())
    }
}

fn check_lengths(table: &TableDef, values: &[(&str, Option<&str>)]) -> Result<()> {
    for (name, value) in values {
        let (Some(column), Some(value)) = (table.column(name), value) else {
            continue;
        };
        if !column.fits(value) {
            warn!("Rejected over-long {}.{}", table.name(), name);
            return Err(StoreError::length(table, name));
        }
    }
    Ok(())
}

fn check_post_lengths(post: &NewPost) -> Result<()> {
    check_lengths(
        Post::TABLE,
        &[("title", post.title.as_deref()), ("content", post.content.as_deref())],
    )
}

fn column_list(table: &TableDef) -> String {
    table.columns().iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
}

fn insert_sql(table: &TableDef) -> String {
    let columns: Vec<_> = table.data_columns().collect();
    let placeholders: Vec<_> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders.join(", ")
    )
}

// Binds the data columns first, then the id as the last parameter.
fn update_sql(table: &TableDef) -> String {
    let assignments: Vec<_> = table
        .data_columns()
        .enumerate()
        .map(|(i, name)| format!("{} = ?{}", name, i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        table.name(),
        assignments.join(", "),
        assignments.len() + 1
    )
}

fn select_one_sql(table: &TableDef) -> String {
    format!("SELECT {} FROM {} WHERE id = ?1", column_list(table), table.name())
}

fn select_all_sql(table: &TableDef) -> String {
    format!("SELECT {} FROM {} ORDER BY id", column_list(table), table.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{self, POSTS};

    fn store() -> Store {
        Store::open_in_memory(models::registry()).unwrap()
    }

    fn named(name: &str) -> NewUser {
        NewUser {
            username: Some(name.to_string()),
        }
    }

    fn post(title: &str, content: &str, user_id: i64) -> NewPost {
        NewPost {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            user_id: Some(user_id),
        }
    }

    #[test]
    fn test_generated_sql() {
        assert_eq!(
            insert_sql(&POSTS),
            "INSERT INTO posts (title, content, user_id) VALUES (?1, ?2, ?3)"
        );
        assert_eq!(
            update_sql(&POSTS),
            "UPDATE posts SET title = ?1, content = ?2, user_id = ?3 WHERE id = ?4"
        );
        assert_eq!(
            select_one_sql(&POSTS),
            "SELECT id, title, content, user_id FROM posts WHERE id = ?1"
        );
    }

    #[test]
    fn test_username_length_limit() {
        let store = store();
        assert!(store.create_user(&named(&"a".repeat(50))).is_ok());
        let err = store.create_user(&named(&"b".repeat(51))).unwrap_err();
        assert!(matches!(err, StoreError::LengthViolation { ref column, .. } if column == "username"));
    }

    #[test]
    fn test_length_counts_characters() {
        let store = store();
        // 50 two-byte characters
        assert!(store.create_user(&named(&"é".repeat(50))).is_ok());
    }

    #[test]
    fn test_embedded_nul_does_not_shorten_length() {
        let store = store();
        let err = store.create_user(&named(&format!("\0{}", "x".repeat(60)))).unwrap_err();
        assert!(matches!(err, StoreError::LengthViolation { ref column, .. } if column == "username"));

        let stored = store.create_user(&named(&format!("\0{}", "x".repeat(49)))).unwrap();
        assert_eq!(store.get_user(stored.id).unwrap().username.map(|u| u.chars().count()), Some(50));

        let err = store
            .create_post(&post("t", &format!("\0{}", "c".repeat(6000)), 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::LengthViolation { ref column, .. } if column == "content"));

        let created = store.create_post(&post("t", "c", 1)).unwrap();
        let err = store
            .update_post(created.id, &post(&format!("\0{}", "t".repeat(50)), "c", 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::LengthViolation { ref column, .. } if column == "title"));
        assert_eq!(store.list_posts().unwrap(), vec![created]);
    }

    #[test]
    fn test_content_and_title_length_limits() {
        let store = store();
        assert!(store.create_post(&post("t", &"c".repeat(5000), 1)).is_ok());

        let err = store.create_post(&post("t", &"c".repeat(5001), 1)).unwrap_err();
        assert!(matches!(err, StoreError::LengthViolation { ref column, .. } if column == "content"));

        assert!(store.create_post(&post(&"t".repeat(50), "c", 1)).is_ok());
        let err = store.create_post(&post(&"t".repeat(51), "c", 1)).unwrap_err();
        assert!(matches!(err, StoreError::LengthViolation { ref column, .. } if column == "title"));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let store = store();
        let alice = store.create_user(&named("alice")).unwrap();
        assert_eq!(alice.username.as_deref(), Some("alice"));

        let err = store.create_user(&named("alice")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UniqueViolation { ref table, ref column } if table == "users" && column == "username"
        ));
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_null_usernames_do_not_collide() {
        let store = store();
        assert!(store.create_user(&NewUser::default()).is_ok());
        assert!(store.create_user(&NewUser::default()).is_ok());
        assert_eq!(store.list_users().unwrap().len(), 2);
    }

    #[test]
    fn test_post_for_missing_user_is_accepted() {
        let store = store();
        let created = store.create_post(&post("hello", "world", 999)).unwrap();
        assert_eq!(store.get_post(created.id).unwrap().user_id, Some(999));
        assert!(matches!(store.get_user(999), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let store = store();
        let first = store.create_post(&post("a", "a", 1)).unwrap();
        let second = store.create_post(&post("b", "b", 1)).unwrap();
        assert!(second.id > first.id);

        store.delete_post(second.id).unwrap();
        let third = store.create_post(&post("c", "c", 1)).unwrap();
        assert!(third.id > second.id);

        let a = store.create_user(&named("a")).unwrap();
        store.delete_user(a.id).unwrap();
        let b = store.create_user(&named("b")).unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_update_post() {
        let store = store();
        let created = store.create_post(&post("old", "old", 1)).unwrap();
        let updated = store.update_post(created.id, &post("new", "body", 2)).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(store.get_post(created.id).unwrap(), updated);

        let err = store.update_post(created.id, &post("t", &"x".repeat(5001), 2)).unwrap_err();
        assert!(matches!(err, StoreError::LengthViolation { .. }));
        assert_eq!(store.get_post(created.id).unwrap(), updated);

        assert!(matches!(
            store.update_post(created.id + 100, &post("t", "c", 1)),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_missing_post() {
        let store = store();
        assert!(matches!(store.delete_post(42), Err(StoreError::NotFound { id: 42, .. })));
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog.db");
        {
            let store = Store::open(&path, models::registry()).unwrap();
            store.create_user(&named("alice")).unwrap();
        }
        let store = Store::open(&path, models::registry()).unwrap();
        assert_eq!(store.list_users().unwrap()[0].username.as_deref(), Some("alice"));
        assert!(store.create_user(&named("alice")).is_err());
    }
}

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::schema::{Column, Model, Registry, TableDef};

pub const USERNAME_MAX_LEN: usize = 50;
pub const TITLE_MAX_LEN: usize = 50;
pub const CONTENT_MAX_LEN: usize = 5000;

const USER_COLUMNS: &[Column] = &[
    Column::primary_key("id"),
    Column::string("username", USERNAME_MAX_LEN).unique(),
];

// user_id is meant to point at users.id, but carries no foreign key and no index.
const POST_COLUMNS: &[Column] = &[
    Column::primary_key("id"),
    Column::string("title", TITLE_MAX_LEN),
    Column::string("content", CONTENT_MAX_LEN),
    Column::integer("user_id"),
];

pub const USERS: TableDef = TableDef::new("users", USER_COLUMNS);
pub const POSTS: TableDef = TableDef::new("posts", POST_COLUMNS);

/// Registry holding every table the server persists.
pub fn registry() -> Registry {
    Registry::new().register::<User>().register::<Post>()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

impl Model for User {
    const TABLE: &'static TableDef = &USERS;
}

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<i64>,
}

impl Model for Post {
    const TABLE: &'static TableDef = &POSTS;
}

impl Post {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            user_id: row.get("user_id")?,
        })
    }
}

/// Body for creating or replacing a post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

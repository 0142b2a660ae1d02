// src/models/friend.rs

//! Friend roster data structures.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// A blog tracked by the friend circle.
///
/// Serialized as a `[name, blog_url, avatar]` triple, which is the shape of
/// both the roster's `friends` list and the published error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FriendRow", into = "FriendRow")]
pub struct Friend {
    /// Display name, also the identity key
    pub name: String,

    /// Base URL of the blog
    pub blog_url: String,

    /// Avatar image URL (may be empty)
    pub avatar: String,
}

#[derive(Serialize, Deserialize)]
struct FriendRow(String, String, #[serde(default)] String);

impl From<FriendRow> for Friend {
    fn from(row: FriendRow) -> Self {
        Self {
            name: row.0,
            blog_url: row.1,
            avatar: row.2,
        }
    }
}

impl From<Friend> for FriendRow {
    fn from(friend: Friend) -> Self {
        FriendRow(friend.name, friend.blog_url, friend.avatar)
    }
}

impl Friend {
    pub fn new(
        name: impl Into<String>,
        blog_url: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            blog_url: blog_url.into(),
            avatar: avatar.into(),
        }
    }
}

/// Roster document parsing.
///
/// Two document shapes are accepted:
/// - `{"friends": [[name, blog_url, avatar], ...]}`
/// - `{"content": [{"title": name, "url": blog_url, "avatar": avatar}, ...]}`
pub struct Roster;

impl Roster {
    /// Parse a roster from raw JSON text.
    ///
    /// Unparseable JSON is an error; an unrecognized shape yields an empty roster.
    pub fn parse(location: &str, text: &str) -> Result<Vec<Friend>> {
        let document: Value =
            serde_json::from_str(text).map_err(|e| AppError::roster(location, e))?;
        Ok(Self::from_value(&document))
    }

    /// Extract friends from an already-parsed roster document.
    pub fn from_value(document: &Value) -> Vec<Friend> {
        if let Some(rows) = document.get("friends").and_then(Value::as_array) {
            return rows.iter().filter_map(Self::friend_from_row).collect();
        }
        if let Some(items) = document.get("content").and_then(Value::as_array) {
            return items.iter().filter_map(Self::friend_from_object).collect();
        }

        log::warn!("Roster has neither a 'friends' nor a 'content' list; treating as empty");
        Vec::new()
    }

    fn friend_from_row(row: &Value) -> Option<Friend> {
        let fields = row.as_array()?;
        let text = |i: usize| fields.get(i).and_then(Value::as_str);

        match (text(0), text(1)) {
            (Some(name), Some(blog_url)) => {
                Some(Friend::new(name, blog_url, text(2).unwrap_or("")))
            }
            _ => {
                log::warn!("Skipping malformed roster row: {row}");
                None
            }
        }
    }

    fn friend_from_object(item: &Value) -> Option<Friend> {
        let text = |key: &str| item.get(key).and_then(Value::as_str);

        match (text("title"), text("url")) {
            (Some(name), Some(blog_url)) => {
                Some(Friend::new(name, blog_url, text("avatar").unwrap_or("")))
            }
            _ => {
                log::warn!("Skipping malformed roster entry: {item}");
                None
            }
        }
    }
}

//! Conversions from DB rows to the wire models in `misfits-types`.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use misfits_db::models::{ChatRow, NotificationRow, PostRow, UserRow};
use misfits_types::models::{Chat, Notification, Post, User};

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC; RFC 3339 is accepted too.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn user_view(row: UserRow) -> User {
    User {
        id: row.id,
        username: row.username,
        email: row.email,
        bio: row.bio,
        profile_pic: row.profile_pic,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn post_view(row: PostRow) -> Post {
    Post {
        id: row.id,
        content: row.content,
        image: row.image,
        likes_count: row.likes_count,
        author_id: row.user_id,
        author_username: row.author_username,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn chat_view(row: ChatRow) -> Chat {
    Chat {
        id: row.id,
        sender_id: row.sender_id,
        receiver_id: row.receiver_id,
        message: row.message,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub fn notification_view(row: NotificationRow) -> Notification {
    Notification {
        id: row.id,
        content: row.content,
        user_id: row.user_id,
        post_id: row.post_id,
        notification_type: row.notification_type,
        created_at: parse_timestamp(&row.created_at),
    }
}

/// Database row types: these map directly to SQLite rows.
/// Distinct from misfits-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never plaintext.
    pub password: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub content: String,
    pub image: Option<String>,
    pub likes_count: i64,
    pub user_id: i64,
    pub author_username: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ChatRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub post_id: Option<i64>,
    pub notification_type: Option<String>,
    pub created_at: String,
}

/// Notification type tags.
pub const NOTIFICATION_LIKE: &str = "like";
pub const NOTIFICATION_FRIEND_REQUEST: &str = "friend_request";

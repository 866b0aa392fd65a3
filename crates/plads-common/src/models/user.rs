use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User model (safe for client responses -- no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    /// Storage key of the avatar image
    pub image: String,
    /// Ids of the places this user created, in creation order
    pub places: Vec<Uuid>,
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Directory entry for a staff member. Owned by the Directory Service;
/// read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    /// Name shown in listings. Falls back to the username when the profile
    /// has no real name filled in.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

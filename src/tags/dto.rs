use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tags::repo::Tag;

/// A tag by name, as it appears in tag payloads and nested inside recipe
/// payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

//! Group — a set of lights sharing a group identifier.
//!
//! A group never stores its members. Membership is recomputed from the
//! lights' own [`GroupId`] every time it is needed.

use serde::{Deserialize, Serialize};

use crate::error::{GlowHubError, ValidationError};
use crate::id::{GroupId, GroupKey};
use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub key: GroupKey,
    pub id: GroupId,
    pub label: String,
    pub updated_at: Option<Timestamp>,
}

impl Group {
    /// Build a group from the label reported by its lights.
    ///
    /// Apostrophes are dropped from the label and the key is derived with
    /// [`GroupKey::from_label`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyLabel`] when nothing is left of the
    /// label after cleaning.
    pub fn new(
        id: GroupId,
        label: &str,
        updated_at: Option<Timestamp>,
    ) -> Result<Self, GlowHubError> {
        let label = label.replace('\'', "");
        let key = GroupKey::from_label(&label);
        if key.as_str().is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        Ok(Self {
            key,
            id,
            label,
            updated_at,
        })
    }
}

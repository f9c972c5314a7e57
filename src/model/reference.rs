use rand::Rng;
use serde::{Deserialize, Serialize};

/// Display binding of an entity: rendered as `#<color>[<label>](<uuid>)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub label: String,
    #[serde(rename = "value")]
    pub uuid: String,
    pub color: String,
}

impl Reference {
    pub fn new(label: impl Into<String>, color: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            uuid: uuid.into(),
            color: color.into(),
        }
    }

    /// Fresh reference with a random display color and a new UUID.
    pub fn mint(label: impl Into<String>) -> Self {
        Self::new(label, random_color(), uuid::Uuid::new_v4().to_string())
    }

    /// Display-form markup token.
    pub fn markup(&self) -> String {
        format!("#{}[{}]({})", self.color, self.label, self.uuid)
    }
}

/// Six lowercase hex digits, without a leading `#` so the token stays parseable.
pub fn random_color() -> String {
    let mut rng = rand::thread_rng();
    let (r, g, b): (u8, u8, u8) = (rng.r#gen(), rng.r#gen(), rng.r#gen());
    format!("{r:02x}{g:02x}{b:02x}")
}

//! Domain models for the dashboard.
//!
//! Row types live next to their repositories in [`crate::db`]; the types here
//! are what handlers, templates and the JSON API work with.

pub mod account;
pub mod product;
pub mod session;
pub mod user;

pub use account::{Account, CurrentAccount};
pub use product::{
    PaginationResponse, Product, ProductDraft, ProductForm, ProductPatch, ProductPatchForm,
    ProductResponse,
};
pub use session::{Flash, FlashKind, keys as session_keys};
pub use user::{User, UserDraft, UserForm};

/// Serde helpers shared by the form types.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    /// Accept `"42"`, `42` or `42.5` and keep the raw text.
    ///
    /// HTML forms post everything as strings while the JSON API sends numbers;
    /// validation decides what the text means.
    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
            Some(StringOrNumber::String(s)) => s,
            Some(StringOrNumber::Int(n)) => n.to_string(),
            Some(StringOrNumber::Float(n)) => n.to_string(),
            None => String::new(),
        })
    }

    /// Like [`string_or_number`] but keeps absence distinct from an empty value.
    pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
            Some(StringOrNumber::String(s)) => Some(s),
            Some(StringOrNumber::Int(n)) => Some(n.to_string()),
            Some(StringOrNumber::Float(n)) => Some(n.to_string()),
            None => None,
        })
    }
}

//! Decoding helpers for Odoo's field conventions.
//!
//! Odoo sends `false` for any empty field regardless of its type, and many2one fields as `[id, "display name"]`.

use serde::Deserialize;
use serde::Deserializer;

#[derive(Deserialize)]
#[serde(untagged)]
enum Nullable<T> {
    Value(T),
    Flag(bool),
    Null(()),
}

/// `deserialize_with` helper mapping `false`/`null` to `None`.
pub fn odoo_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Nullable::<T>::deserialize(deserializer)? {
        Nullable::Value(value) => Some(value),
        Nullable::Flag(_) | Nullable::Null(_) => None,
    })
}

/// Reference to another record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Many2One(pub i64, pub String);

impl Many2One {
    pub fn id(&self) -> i64 {
        self.0
    }

    pub fn name(&self) -> &str {
        &self.1
    }
}

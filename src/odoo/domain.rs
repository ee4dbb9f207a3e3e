use serde::Serialize;
use serde_json::json;
use serde_json::Value;

/// Search domain: a conjunction of `[field, operator, value]` leaves.
///
/// ```
/// use optiflow::odoo::Domain;
///
/// let domain = Domain::new().eq("type", "product").is_in("state", ["sale", "done"]);
/// assert_eq!(
///     serde_json::to_string(&domain).unwrap(),
///     r#"[["type","=","product"],["state","in",["sale","done"]]]"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Domain(Vec<Value>);

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaf<V: Serialize>(mut self, field: &str, operator: &str, value: V) -> Self {
        self.0.push(json!([field, operator, value]));
        self
    }

    pub fn eq<V: Serialize>(self, field: &str, value: V) -> Self {
        self.leaf(field, "=", value)
    }

    pub fn ge<V: Serialize>(self, field: &str, value: V) -> Self {
        self.leaf(field, ">=", value)
    }

    pub fn is_in<V: Serialize>(self, field: &str, values: V) -> Self {
        self.leaf(field, "in", values)
    }
}

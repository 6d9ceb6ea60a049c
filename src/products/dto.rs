use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{ProductError, Result};
use crate::products::repo_types::Product;
use crate::products::validation::ProductCandidate;

pub const MISSING_PRODUCT: &str = "param is missing or the value is empty: product";

/// The only fields a client may set. Unknown keys are dropped on decode.
///
/// The outer `Option` says whether the key was sent at all, so an explicit
/// `null` reaches validation (or clears `description`) instead of being
/// treated as omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductParams {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// Number or numeric string; anything else fails validation.
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Value>,
    /// `null` means "not supplied": the flag is never stored empty.
    #[serde(default)]
    pub available: Option<bool>,
}

/// Wraps whatever was sent, `null` included, in `Some`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ProductParams {
    /// Pulls the params out of a `{"product": {...}}` request body.
    pub fn from_body(mut body: Value) -> Result<Self> {
        let product = match body.get_mut("product").map(Value::take) {
            Some(Value::Null) | None => return Err(ProductError::BadRequest(MISSING_PRODUCT.into())),
            Some(Value::Object(fields)) if fields.is_empty() => {
                return Err(ProductError::BadRequest(MISSING_PRODUCT.into()))
            }
            Some(product) => product,
        };
        serde_json::from_value(product)
            .map_err(|e| ProductError::BadRequest(format!("invalid product: {e}")))
    }

    /// `None`: not sent. `Some(None)`: sent as `null`.
    fn price_text(&self) -> Option<Option<String>> {
        let text = match self.price.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        };
        Some(text)
    }

    pub fn into_candidate(self) -> ProductCandidate {
        ProductCandidate {
            price: self.price_text().flatten(),
            name: self.name.flatten(),
            description: self.description.flatten(),
            available: self.available,
        }
    }

    /// Supplied fields win, `null` included; everything else keeps the
    /// stored value.
    pub fn merged_onto(self, current: &Product) -> ProductCandidate {
        ProductCandidate {
            price: self
                .price_text()
                .unwrap_or_else(|| Some(current.price.to_string())),
            name: self.name.unwrap_or_else(|| Some(current.name.clone())),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            available: self.available.or(Some(current.available)),
        }
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

pub const BLANK: &str = "can't be blank";
pub const NOT_A_NUMBER: &str = "is not a number";
pub const NEGATIVE: &str = "must be greater than or equal to 0";
/// Numeric, but beyond what a 96-bit decimal holds (about ±7.9e28, 28 places).
pub const OUT_OF_RANGE: &str = "is out of range";

/// Field name → ordered violation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Raw, unchecked product values. `price` keeps its textual form so that
/// non-numeric input can be reported rather than rejected at decode time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCandidate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub available: Option<bool>,
}

/// The mutable fields of a product after they passed [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub available: bool,
}

pub fn validate(candidate: &ProductCandidate) -> Result<ProductFields, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = match candidate.name.as_deref() {
        Some(n) if !n.trim().is_empty() => Some(n.to_string()),
        _ => {
            errors.add("name", BLANK);
            None
        }
    };

    let price = match candidate.price.as_deref().map(str::trim) {
        None | Some("") => {
            errors.add("price", BLANK);
            None
        }
        Some(raw) => match parse_price(raw) {
            Price::NotANumber => {
                errors.add("price", NOT_A_NUMBER);
                None
            }
            Price::Valid(p) if p.is_sign_negative() && !p.is_zero() => {
                errors.add("price", NEGATIVE);
                None
            }
            Price::OutOfRange { negative: true } => {
                errors.add("price", NEGATIVE);
                None
            }
            Price::OutOfRange { negative: false } => {
                errors.add("price", OUT_OF_RANGE);
                None
            }
            Price::Valid(p) => Some(p),
        },
    };

    match (name, price) {
        (Some(name), Some(price)) if errors.is_empty() => Ok(ProductFields {
            name,
            description: candidate.description.clone(),
            price: price.normalize(),
            // absent only if the caller skipped the create-time default
            available: candidate.available.unwrap_or(true),
        }),
        _ => Err(errors),
    }
}

enum Price {
    Valid(Decimal),
    OutOfRange { negative: bool },
    NotANumber,
}

fn parse_price(raw: &str) -> Price {
    if let Ok(p) = Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw)) {
        return Price::Valid(p);
    }
    // f64 also reads "inf" and "nan"; only digits, sign, point and exponent count
    let plain = !raw
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E');
    match raw.parse::<f64>() {
        Ok(f) if plain => Price::OutOfRange {
            negative: f.is_sign_negative() && f != 0.0,
        },
        _ => Price::NotANumber,
    }
}

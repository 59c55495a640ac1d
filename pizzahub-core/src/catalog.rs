//! Menu pricing primitives
//!
//! A pizza carries a base price plus one price per size. Prices are whole
//! currency units. Admin forms post numbers as strings as often as not, so
//! [`Price`] accepts either on the way in and always writes a number.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::Error;

/// A price in whole currency units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(pub i64);

impl Price {
    pub fn amount(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Price(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PriceVisitor;

        impl<'de> Visitor<'de> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a whole amount as a number or numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
                Ok(Price(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
                i64::try_from(v)
                    .map(Price)
                    .map_err(|_| E::custom("price out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
                if !v.is_finite() || v.abs() > i64::MAX as f64 {
                    return Err(E::custom("price out of range"));
                }
                Ok(Price(v.round() as i64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    return Ok(Price(0));
                }
                if let Ok(amount) = trimmed.parse::<i64>() {
                    return Ok(Price(amount));
                }
                match trimmed.parse::<f64>() {
                    Ok(amount) => self.visit_f64(amount),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

/// Pizza size label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub const ALL: [Size; 3] = [Size::Small, Size::Medium, Size::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
        }
    }
}

impl FromStr for Size {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Size::Small),
            "medium" => Ok(Size::Medium),
            "large" => Ok(Size::Large),
            other => Err(Error::InvalidSize(other.to_string())),
        }
    }
}

/// Menu category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    #[serde(rename = "veg")]
    Veg,
    #[serde(rename = "non-veg")]
    NonVeg,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Veg => "veg",
            Category::NonVeg => "non-veg",
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "veg" => Ok(Category::Veg),
            "non-veg" => Ok(Category::NonVeg),
            other => Err(Error::InvalidCategory(other.to_string())),
        }
    }
}

/// Price per size
pub type SizePrices = BTreeMap<Size, Price>;

/// Price shown on the public menu: the medium price, or the base price when
/// there is no (non-zero) medium entry.
pub fn display_price(sizes: &SizePrices, base_price: Price) -> Price {
    match sizes.get(&Size::Medium) {
        Some(price) if price.0 != 0 => *price,
        _ => base_price,
    }
}

/// Ensure every size has an entry, using the base price for missing ones.
pub fn fill_sizes(sizes: &mut SizePrices, base_price: Price) {
    for size in Size::ALL {
        sizes.entry(size).or_insert(base_price);
    }
}

/// Trim topping names, drop blanks and repeated names. First occurrence wins.
pub fn normalize_toppings<I, S>(toppings: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for topping in toppings {
        let name = topping.as_ref().trim();
        if !name.is_empty() && !out.iter().any(|t| t == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_accepts_numbers_and_strings() {
        let p: Price = serde_json::from_str("299").unwrap();
        assert_eq!(p, Price(299));

        let p: Price = serde_json::from_str("\"349\"").unwrap();
        assert_eq!(p, Price(349));

        let p: Price = serde_json::from_str("199.6").unwrap();
        assert_eq!(p, Price(200));

        let p: Price = serde_json::from_str("\" \"").unwrap();
        assert_eq!(p, Price(0));

        assert!(serde_json::from_str::<Price>("\"cheap\"").is_err());
        assert!(serde_json::from_str::<Price>("true").is_err());
    }

    #[test]
    fn test_price_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Price(42)).unwrap(), "42");
    }

    #[test]
    fn test_display_price_prefers_medium() {
        let mut sizes = SizePrices::new();
        sizes.insert(Size::Small, Price(199));
        sizes.insert(Size::Medium, Price(299));
        assert_eq!(display_price(&sizes, Price(250)), Price(299));
    }

    #[test]
    fn test_display_price_falls_back_to_base() {
        let mut sizes = SizePrices::new();
        assert_eq!(display_price(&sizes, Price(250)), Price(250));

        sizes.insert(Size::Medium, Price(0));
        assert_eq!(display_price(&sizes, Price(250)), Price(250));
    }

    #[test]
    fn test_fill_sizes_keeps_existing_entries() {
        let mut sizes = SizePrices::new();
        sizes.insert(Size::Large, Price(499));
        fill_sizes(&mut sizes, Price(300));

        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes[&Size::Small], Price(300));
        assert_eq!(sizes[&Size::Medium], Price(300));
        assert_eq!(sizes[&Size::Large], Price(499));
    }

    #[test]
    fn test_size_map_wire_format() {
        let json = r#"{"small":"199","medium":299,"large":399}"#;
        let sizes: SizePrices = serde_json::from_str(json).unwrap();
        assert_eq!(sizes[&Size::Small], Price(199));

        let out = serde_json::to_string(&sizes).unwrap();
        assert_eq!(out, r#"{"small":199,"medium":299,"large":399}"#);
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(serde_json::to_string(&Category::NonVeg).unwrap(), "\"non-veg\"");
        assert_eq!("veg".parse::<Category>().unwrap(), Category::Veg);
        assert!("vegan".parse::<Category>().is_err());
    }

    #[test]
    fn test_normalize_toppings() {
        let toppings = normalize_toppings([" Olives", "Basil ", "", "Olives"]);
        assert_eq!(toppings, vec!["Olives".to_string(), "Basil".to_string()]);
    }
}

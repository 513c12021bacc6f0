//! ============================================================================
//! Query-String Codec - FilterState <-> flat string parameters
//! ============================================================================
//! `decode` never fails: absent keys leave a field unset, numeric text that
//! does not parse becomes NaN. `encode` omits unset, empty and false fields,
//! so `encode(decode(p)) == p` for any `p` that `encode` produced.
//! ============================================================================

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::state::{CategorySet, FilterField, FilterState, MinRating};

/// Characters left readable in encoded keys and values
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b',');

const CATEGORY_SEPARATOR: &str = ",";

/// Ordered string parameters of a URL query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2` (a leading `?` is allowed)
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace every value of `key` with a single one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter().position(|(k, _)| *k == key) {
            Some(index) => {
                self.0[index].1 = value;
                let mut seen = false;
                self.0.retain(|(k, _)| {
                    if *k != key {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.0.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as `key=value&...` without a leading `?`
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_VALUE),
                    utf8_percent_encode(v, QUERY_VALUE)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Lenient decimal parse used for every numeric parameter.
/// Blank text is zero; anything else that is not a number is NaN.
/// The only spelled-out values accepted are `Infinity`, `+Infinity` and
/// `-Infinity`; `inf`, `nan` and other case variants are NaN.
pub fn parse_decimal(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let unsigned = trimmed
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(trimmed);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return match trimmed {
            "Infinity" | "+Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            _ => f64::NAN,
        };
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Text form of a numeric parameter that `parse_decimal` reads back
fn format_decimal(value: f64) -> String {
    if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

/// Build a filter from query parameters. Unknown keys are ignored.
pub fn decode(params: &QueryParams) -> FilterState {
    let mut filter = FilterState::default();

    for field in FilterField::ALL {
        let Some(raw) = params.get(field.key()) else {
            continue;
        };
        match field {
            FilterField::Search => filter.search = Some(raw.to_string()),
            FilterField::Categories => {
                filter.categories = raw
                    .split(CATEGORY_SEPARATOR)
                    .filter(|c| !c.is_empty())
                    .collect::<CategorySet>()
            }
            FilterField::MinPrice => filter.min_price = Some(parse_decimal(raw)),
            FilterField::MaxPrice => filter.max_price = Some(parse_decimal(raw)),
            FilterField::Rating => filter.rating = Some(MinRating::new(raw)),
            FilterField::DiscountedOnly => filter.discounted_only = raw == "true",
            FilterField::MinDiscountPercent => {
                filter.min_discount_percent = Some(parse_decimal(raw))
            }
        }
    }

    filter
}

/// Render a filter as query parameters, in field order
pub fn encode(filter: &FilterState) -> QueryParams {
    let mut params = QueryParams::new();

    for field in FilterField::ALL {
        let value = match field {
            FilterField::Search => filter.search.clone().filter(|s| !s.is_empty()),
            FilterField::Categories => {
                let joined = filter
                    .categories
                    .iter()
                    .filter(|c| !c.is_empty())
                    .collect::<Vec<_>>()
                    .join(CATEGORY_SEPARATOR);
                (!joined.is_empty()).then_some(joined)
            }
            FilterField::MinPrice => filter.min_price.map(format_decimal),
            FilterField::MaxPrice => filter.max_price.map(format_decimal),
            FilterField::Rating => filter
                .rating
                .as_ref()
                .filter(|r| !r.is_empty())
                .map(|r| r.as_str().to_string()),
            FilterField::DiscountedOnly => filter.discounted_only.then(|| "true".to_string()),
            FilterField::MinDiscountPercent => filter.min_discount_percent.map(format_decimal),
        };

        if let Some(value) = value {
            params.set(field.key(), value);
        }
    }

    params
}

impl FilterState {
    pub fn from_query(params: &QueryParams) -> Self {
        decode(params)
    }

    pub fn to_query(&self) -> QueryParams {
        encode(self)
    }
}

//! Poem model as returned by the remote API, plus the pure formatting helpers
//! used when rendering one.

use serde::{Deserialize, Deserializer};

/// Title shown for poems without a name.
pub const UNTITLED: &str = "Без названия";

/// A poem as delivered by `/poems/*`.
///
/// The API is loose about types: `id` may be a number or a string, and the
/// year fields may be numbers (possibly fractional), numeric strings or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Poem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "de_year")]
    pub date_from: Option<f64>,
    #[serde(default, deserialize_with = "de_year")]
    pub date_to: Option<f64>,
}

impl Poem {
    /// Display title, falling back to [`UNTITLED`] for absent or empty names.
    pub fn title(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNTITLED,
        }
    }

    /// First `max_lines` lines of the text (CRLF or LF separated).
    pub fn preview(&self, max_lines: usize) -> Vec<&str> {
        self.text.lines().take(max_lines).collect()
    }

    /// Formatted year range, empty when the poem carries no start year.
    pub fn date_label(&self) -> String {
        format_date(self.date_from, self.date_to)
    }
}

/// Format a year range for display.
///
/// Both inputs are truncated to whole years. A zero or absent `from` yields an
/// empty string; a `to` that is absent, zero, or equal to `from` yields just
/// the start year.
pub fn format_date(from: Option<f64>, to: Option<f64>) -> String {
    let Some(from) = from.filter(|v| *v != 0.0) else {
        return String::new();
    };
    let from_year = from.floor() as i64;
    let to_year = to.map(|v| v.floor() as i64).filter(|y| *y != 0);

    match to_year {
        Some(to_year) if to_year != from_year => format!("{from_year}-{to_year}"),
        _ => from_year.to_string(),
    }
}

/// Parse a year given as text (`"1825"`, `"1825.5"`). Non-numeric input is
/// treated as absent.
pub fn parse_year(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(serde_json::Number),
    Text(String),
}

/// Ids become strings. Integral floats (`42.0`) lose the fraction so they
/// match the integer form used in URLs.
fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        RawId::Text(s) => s,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawYear {
    Number(f64),
    Text(String),
}

fn de_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<RawYear>::deserialize(deserializer)? {
        None => None,
        Some(RawYear::Number(n)) => Some(n),
        Some(RawYear::Text(s)) => parse_year(&s),
    })
}

//! Query-parameter validation for the `/epochs` listing.

use serde::Deserialize;

/// Raw pagination parameters, validated by [`Page::from_query`].
#[derive(Debug, Default, Deserialize)]
pub struct EpochsQuery {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Page {
    pub fn from_query(query: &EpochsQuery) -> Result<Self, String> {
        let limit = query
            .limit
            .as_deref()
            .map(|v| parse_count("limit", v, true))
            .transpose()?;
        let offset = query
            .offset
            .as_deref()
            .map(|v| parse_count("offset", v, false))
            .transpose()?
            .unwrap_or(0);
        Ok(Page { limit, offset })
    }

    /// Slice `items` to this page. The offset must point inside the data.
    pub fn apply<'a, T>(&self, items: &'a [T]) -> Result<&'a [T], String> {
        if self.offset >= items.len() {
            return Err("Offset exceeds the size of the dataset".to_string());
        }
        let rest = &items[self.offset..];
        Ok(match self.limit {
            Some(limit) => &rest[..limit.min(rest.len())],
            None => rest,
        })
    }
}

fn parse_count(name: &str, raw: &str, must_be_positive: bool) -> Result<usize, String> {
    let invalid = |reason: &str| format!("Invalid value for {name}: {raw} ({reason})");

    if raw.contains('.') {
        return Err(invalid("must be an integer"));
    }
    let value: i64 = raw.trim().parse().map_err(|_| invalid("must be a number"))?;
    if value < 0 {
        return Err(invalid("must be non-negative"));
    }
    if must_be_positive && value == 0 {
        return Err(invalid("must be positive"));
    }
    usize::try_from(value).map_err(|_| invalid("is too large"))
}

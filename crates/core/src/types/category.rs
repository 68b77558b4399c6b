//! Product category enum.
//!
//! The catalog is partitioned into four fixed categories. Categories are
//! stored as kebab-case text in the database and on the wire.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The four fixed product categories of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    MenWatches,
    WomenWatches,
    KidsWatches,
    SmartWatches,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 4] = [
        Self::MenWatches,
        Self::WomenWatches,
        Self::KidsWatches,
        Self::SmartWatches,
    ];

    /// The kebab-case wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MenWatches => "men-watches",
            Self::WomenWatches => "women-watches",
            Self::KidsWatches => "kids-watches",
            Self::SmartWatches => "smart-watches",
        }
    }

    /// Parse a category from its kebab-case representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "men-watches" => Some(Self::MenWatches),
            "women-watches" => Some(Self::WomenWatches),
            "kids-watches" => Some(Self::KidsWatches),
            "smart-watches" => Some(Self::SmartWatches),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Category {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Category {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Self::parse(&s).ok_or_else(|| format!("unknown product category: {s}").into())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Category {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Category::parse("pocket-watches"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&Category::MenWatches).unwrap();
        assert_eq!(json, "\"men-watches\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::MenWatches);
    }
}

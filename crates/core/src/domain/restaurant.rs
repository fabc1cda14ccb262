use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RestaurantId(pub i64);

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub i64);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference data for one restaurant. Immutable after catalog load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub cuisine: String,
    pub location: String,
    pub city: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rating: f64,
    pub price_range: Option<String>,
    pub description: Option<String>,
}

/// A physical table inside a restaurant. Capacity never changes at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: TableId,
    pub restaurant_id: RestaurantId,
    pub table_number: u32,
    pub capacity: u32,
}

/// Substring filters for catalog search. Empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestaurantFilter {
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub name: Option<String>,
}

impl RestaurantFilter {
    pub fn by_cuisine(cuisine: impl Into<String>) -> Self {
        Self { cuisine: Some(cuisine.into()), ..Self::default() }
    }

    pub fn by_location(location: impl Into<String>) -> Self {
        Self { location: Some(location.into()), ..Self::default() }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Self::default() }
    }
}

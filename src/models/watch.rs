use std::fmt;

use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSegment {
    Spot,
    #[serde(alias = "derivative")]
    Futures,
}

impl MarketSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSegment::Spot => "spot",
            MarketSegment::Futures => "futures",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "spot" => Some(MarketSegment::Spot),
            "futures" | "derivative" => Some(MarketSegment::Futures),
            _ => None,
        }
    }
}

impl fmt::Display for MarketSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
    Cross,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
            Direction::Cross => "cross",
        }
    }

    /// Human-readable label used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Above => "Crossed above",
            Direction::Below => "Crossed below",
            Direction::Cross => "Crossed target",
        }
    }
}

/// A user's price-threshold watch, stored in the `alarms` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watch {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub symbol: String,
    pub market_type: MarketSegment,
    pub direction: Direction,
    pub target_price: f64,

    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,

    pub created_at: i64,
    #[serde(default)]
    pub fired_at: Option<i64>,
    // None until the first cycle that resolved a price for this watch
    #[serde(default)]
    pub last_price: Option<f64>,
}

fn default_active() -> bool {
    true
}

impl Watch {
    pub fn group_key(&self) -> InstrumentKey {
        InstrumentKey {
            symbol: self.symbol.to_uppercase(),
            market: self.market_type,
        }
    }

    /// Note text worth showing, if any.
    pub fn note_text(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// The (symbol, market segment) pair watches are grouped by within one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentKey {
    pub symbol: String,
    pub market: MarketSegment,
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.symbol, self.market)
    }
}

/// The only fields a cycle ever writes back to a watch.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchUpdate {
    pub last_price: f64,
    pub fired_at: Option<i64>,
    pub active: Option<bool>,
}

impl WatchUpdate {
    pub fn is_fire(&self) -> bool {
        self.fired_at.is_some()
    }

    pub fn to_set_doc(&self) -> Document {
        let mut set = doc! { "last_price": self.last_price };
        if let Some(at) = self.fired_at {
            set.insert("fired_at", at);
        }
        if let Some(active) = self.active {
            set.insert("active", active);
        }
        doc! { "$set": set }
    }
}

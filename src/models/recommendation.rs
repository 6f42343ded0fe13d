use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::{fmt::Display, str::FromStr};

use crate::db::{RecommendationStore, StoreError, StoreResult};

/// Classification of the link between a product and the product it recommends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    CrossSell,
    UpSell,
    Accessory,
    #[default]
    Unknown,
}

impl RecommendationType {
    pub const ALL: [RecommendationType; 4] = [
        RecommendationType::CrossSell,
        RecommendationType::UpSell,
        RecommendationType::Accessory,
        RecommendationType::Unknown,
    ];

    /// Symbolic name, as stored in the database and sent over the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::CrossSell => "CROSS_SELL",
            RecommendationType::UpSell => "UP_SELL",
            RecommendationType::Accessory => "ACCESSORY",
            RecommendationType::Unknown => "UNKNOWN",
        }
    }
}

impl Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown recommendation type '{0}'")]
pub struct UnknownRecommendationType(pub String);

impl FromStr for RecommendationType {
    type Err = UnknownRecommendationType;

    /// Matches the symbolic name exactly; lowercase spellings are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecommendationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownRecommendationType(s.to_string()))
    }
}

/// Errors raised by the model: bad input on deserialize, misuse, or a failed write
#[derive(Debug, thiserror::Error)]
pub enum DataValidationError {
    #[error("Invalid Recommendation: missing {0}")]
    MissingField(&'static str),

    #[error("Invalid attribute: {field} '{value}'")]
    InvalidAttribute { field: &'static str, value: String },

    #[error("Invalid Recommendation: body of request contained bad or no data ({0})")]
    BadData(String),

    #[error("Update called with empty ID field")]
    MissingId,

    #[error("Delete called with empty ID field")]
    DeleteMissingId,

    #[error("{0}")]
    Storage(#[from] StoreError),
}

/// Exact-match filter on a single column
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationFilter {
    Name(String),
    InStock(bool),
    Type(RecommendationType),
    RecommendationName(String),
    RecommendationId(i32),
}

impl RecommendationFilter {
    /// Column the filter compares against
    pub fn column(&self) -> &'static str {
        match self {
            RecommendationFilter::Name(_) => "name",
            RecommendationFilter::InStock(_) => "recommendation_in_stock",
            RecommendationFilter::Type(_) => "recommendation_type",
            RecommendationFilter::RecommendationName(_) => "recommendation_name",
            RecommendationFilter::RecommendationId(_) => "recommendation_id",
        }
    }

    /// Whether a record satisfies the filter. A missing in-stock flag matches neither value.
    pub fn matches(&self, record: &Recommendation) -> bool {
        match self {
            RecommendationFilter::Name(name) => record.name == *name,
            RecommendationFilter::InStock(flag) => record.recommendation_in_stock == Some(*flag),
            RecommendationFilter::Type(kind) => record.recommendation_type == *kind,
            RecommendationFilter::RecommendationName(name) => record.recommendation_name == *name,
            RecommendationFilter::RecommendationId(id) => record.recommendation_id == *id,
        }
    }
}

/// A product-to-product recommendation link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recommendation {
    /// Assigned by storage on create; `None` while transient
    pub id: Option<i32>,
    pub name: String,
    pub recommendation_type: RecommendationType,
    pub recommendation_name: String,
    pub recommendation_id: i32,
    pub recommendation_in_stock: Option<bool>,
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Recommendation {} id=[{}]>", self.name, id),
            None => write!(f, "<Recommendation {} id=[None]>", self.name),
        }
    }
}

impl Recommendation {
    pub fn new(
        name: impl Into<String>,
        recommendation_type: RecommendationType,
        recommendation_name: impl Into<String>,
        recommendation_id: i32,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            recommendation_type,
            recommendation_name: recommendation_name.into(),
            recommendation_id,
            recommendation_in_stock: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_in_stock(&self) -> bool {
        self.recommendation_in_stock == Some(true)
    }

    // Persistence

    /// Inserts the record as a new row. Any id already set is discarded
    /// and replaced by the one storage assigns.
    pub async fn create(&mut self, store: &dyn RecommendationStore) -> Result<(), DataValidationError> {
        tracing::info!(name = %self.name, "Creating recommendation");
        self.id = None;

        match store.insert(self).await {
            Ok(id) => {
                self.id = Some(id);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, record = %self, "Error creating record");
                Err(e.into())
            }
        }
    }

    /// Persists the current field values of an existing record
    pub async fn update(&self, store: &dyn RecommendationStore) -> Result<(), DataValidationError> {
        tracing::info!(name = %self.name, "Saving recommendation");
        if self.id.is_none() {
            return Err(DataValidationError::MissingId);
        }

        store.update(self).await.map_err(|e| {
            tracing::error!(error = %e, record = %self, "Error updating record");
            e.into()
        })
    }

    /// Removes the record from storage, consuming it
    pub async fn delete(self, store: &dyn RecommendationStore) -> Result<(), DataValidationError> {
        tracing::info!(name = %self.name, "Deleting recommendation");
        let id = self.id.ok_or(DataValidationError::DeleteMissingId)?;

        store.delete(id).await.map_err(|e| {
            tracing::error!(error = %e, record = %self, "Error deleting record");
            e.into()
        })
    }

    // Wire format

    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "recommendation_type": self.recommendation_type.as_str(),
            "recommendation_name": self.recommendation_name,
            "recommendation_id": self.recommendation_id,
            "recommendation_in_stock": self.recommendation_in_stock,
        })
    }

    /// Populates the record from a JSON object. `id` is never read.
    ///
    /// Fields are only assigned once the whole object validates, so a
    /// failed call leaves the record untouched. A missing
    /// `recommendation_in_stock` key keeps the current flag; `null` clears it.
    pub fn deserialize(&mut self, data: &Value) -> Result<&mut Self, DataValidationError> {
        let object = data
            .as_object()
            .ok_or_else(|| DataValidationError::BadData("expected a JSON object".to_string()))?;

        let name = required_string(object, "name")?;

        let raw_type = required(object, "recommendation_type")?;
        let recommendation_type = match raw_type {
            Value::String(s) => s.parse::<RecommendationType>().map_err(|e| {
                DataValidationError::InvalidAttribute {
                    field: "recommendation_type",
                    value: e.0,
                }
            })?,
            other => {
                return Err(DataValidationError::InvalidAttribute {
                    field: "recommendation_type",
                    value: other.to_string(),
                })
            }
        };

        let recommendation_name = required_string(object, "recommendation_name")?;
        let recommendation_id = required_integer(object, "recommendation_id")?;

        let recommendation_in_stock = match object.get("recommendation_in_stock") {
            None => self.recommendation_in_stock,
            Some(Value::Null) => None,
            Some(Value::Bool(flag)) => Some(*flag),
            Some(other) => {
                return Err(DataValidationError::BadData(format!(
                    "recommendation_in_stock must be a boolean, got {}",
                    other
                )))
            }
        };

        self.name = name;
        self.recommendation_type = recommendation_type;
        self.recommendation_name = recommendation_name;
        self.recommendation_id = recommendation_id;
        self.recommendation_in_stock = recommendation_in_stock;
        Ok(self)
    }

    // Queries

    pub async fn all(store: &dyn RecommendationStore) -> StoreResult<Vec<Self>> {
        tracing::info!("Processing all recommendations");
        store.all().await
    }

    pub async fn find(store: &dyn RecommendationStore, id: i32) -> StoreResult<Option<Self>> {
        tracing::info!(id, "Processing lookup");
        store.find(id).await
    }

    pub async fn find_by(
        store: &dyn RecommendationStore,
        filter: &RecommendationFilter,
    ) -> StoreResult<Vec<Self>> {
        tracing::info!(column = filter.column(), ?filter, "Processing filtered query");
        store.filter(filter).await
    }

    pub async fn find_by_name(store: &dyn RecommendationStore, name: &str) -> StoreResult<Vec<Self>> {
        Self::find_by(store, &RecommendationFilter::Name(name.to_string())).await
    }

    pub async fn find_by_type(
        store: &dyn RecommendationStore,
        recommendation_type: RecommendationType,
    ) -> StoreResult<Vec<Self>> {
        Self::find_by(store, &RecommendationFilter::Type(recommendation_type)).await
    }

    pub async fn find_by_recommendation_name(
        store: &dyn RecommendationStore,
        recommendation_name: &str,
    ) -> StoreResult<Vec<Self>> {
        Self::find_by(
            store,
            &RecommendationFilter::RecommendationName(recommendation_name.to_string()),
        )
        .await
    }

    pub async fn find_by_recommendation_id(
        store: &dyn RecommendationStore,
        recommendation_id: i32,
    ) -> StoreResult<Vec<Self>> {
        Self::find_by(store, &RecommendationFilter::RecommendationId(recommendation_id)).await
    }

    pub async fn find_by_in_stock(store: &dyn RecommendationStore, in_stock: bool) -> StoreResult<Vec<Self>> {
        Self::find_by(store, &RecommendationFilter::InStock(in_stock)).await
    }
}

fn required<'a>(object: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, DataValidationError> {
    object.get(key).ok_or(DataValidationError::MissingField(key))
}

fn required_string(object: &Map<String, Value>, key: &'static str) -> Result<String, DataValidationError> {
    match required(object, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(DataValidationError::BadData(format!(
            "{} must be a string, got {}",
            key, other
        ))),
    }
}

/// Accepts a JSON integer or a string of decimal digits (HTML forms post strings)
fn required_integer(object: &Map<String, Value>, key: &'static str) -> Result<i32, DataValidationError> {
    let value = required(object, key)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        DataValidationError::BadData(format!("{} must be an integer, got {}", key, value))
    })
}

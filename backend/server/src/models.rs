use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CARS_COLLECTION: &str = "carsModel";
pub const REFS_COLLECTION: &str = "refModel";
pub const ADMIN_COLLECTION: &str = "admin";

pub const CAR_TYPES: &str = "types";
pub const STOCK: &str = "stock";

/// A vehicle model and its stock per fuel type. Other stored fields ride along in `extra`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CarModel {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub model: String,
    /// Fuel type to record, e.g. `types.diesel = { stock, .. }`, in stored order.
    #[serde(default)]
    pub types: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CarModel {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: None,
            model: model.into(),
            types: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn with_stock(mut self, fuel: &str, stock: impl Into<Value>) -> Self {
        let mut record = Map::new();
        record.insert(STOCK.to_string(), stock.into());
        self.types.insert(fuel.to_string(), Value::Object(record));
        self
    }
}

/// A part reference code. Fields other than `_id` and `stock` are kept as stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RefModel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub stock: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RefModel {
    pub fn new(id: impl Into<String>, stock: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            stock: stock.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct AdminAccount {
    pub email: String,
    #[serde(default)]
    pub pass: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct StockPayload {
    #[serde(default)]
    pub stock: Value,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub pass: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

//! # MongoDB
//!
//! Persistent document store holding every record the server exposes.
//!
//! ## Collections
//!
//! All in one database (`DB_NAME`):
//! - `carsModel`: one document per vehicle model, `{ model, types: { <fuel>: { stock } } }`
//! - `refModel`: one document per part reference, `{ _id, stock, .. }`
//! - `admin`: login accounts, `{ email, pass }`, seeded by hand
//!
//! ## Implementation
//!
//! - Handlers only see the [`Store`] trait, the router state owns an `Arc<dyn Store>`
//! - Nothing is cached, every request goes back to the database
//! - Updates report the driver's modified count, callers decide what success means
//! - `_id` values leave the store as hex strings, everything else as relaxed extended JSON
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{Bson, Document, doc, oid::ObjectId},
    options::{ClientOptions, ServerApi, ServerApiVersion},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::{
    config::Config,
    error::StoreError,
    models::{
        ADMIN_COLLECTION, AdminAccount, CAR_TYPES, CARS_COLLECTION, CarModel, REFS_COLLECTION,
        RefModel, STOCK,
    },
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_cars(&self) -> Result<Vec<CarModel>, StoreError>;

    /// Sets `types.<fuel>.stock` on the first car named `model`, returns the modified count.
    async fn update_car_stock(
        &self,
        model: &str,
        fuel: &str,
        stock: Value,
    ) -> Result<u64, StoreError>;

    async fn list_refs(&self) -> Result<Vec<RefModel>, StoreError>;

    /// Sets `stock` on the ref with this id, returns the modified count.
    async fn update_ref_stock(&self, id: ObjectId, stock: Value) -> Result<u64, StoreError>;

    async fn find_admin(&self, email: &str) -> Result<Option<AdminAccount>, StoreError>;
}

pub struct MongoStore {
    client: Client,
    cars: Collection<Document>,
    refs: Collection<Document>,
    admins: Collection<AdminAccount>,
}

impl MongoStore {
    /// Builds the client and confirms the deployment answers before returning.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.db_uri()).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;
        let database = client.database(&config.db_name);

        let store = Self {
            cars: database.collection(CARS_COLLECTION),
            refs: database.collection(REFS_COLLECTION),
            admins: database.collection(ADMIN_COLLECTION),
            client,
        };

        store.ping().await?;
        info!(database = %config.db_name, "Connected to MongoDB");

        Ok(store)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        Ok(())
    }

    async fn list_cars(&self) -> Result<Vec<CarModel>, StoreError> {
        find_all(&self.cars).await
    }

    async fn update_car_stock(
        &self,
        model: &str,
        fuel: &str,
        stock: Value,
    ) -> Result<u64, StoreError> {
        let mut set = Document::new();
        set.insert(format!("{CAR_TYPES}.{fuel}.{STOCK}"), json_to_bson(stock)?);

        let result = self
            .cars
            .update_one(doc! { "model": model }, doc! { "$set": set })
            .await?;

        #[cfg(feature = "verbose")]
        info!(model, fuel, ?result, "Car stock update result");

        Ok(result.modified_count)
    }

    async fn list_refs(&self) -> Result<Vec<RefModel>, StoreError> {
        find_all(&self.refs).await
    }

    async fn update_ref_stock(&self, id: ObjectId, stock: Value) -> Result<u64, StoreError> {
        let result = self
            .refs
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "stock": json_to_bson(stock)? } },
            )
            .await?;

        #[cfg(feature = "verbose")]
        info!(%id, ?result, "Ref stock update result");

        Ok(result.modified_count)
    }

    async fn find_admin(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.admins.find_one(doc! { "email": email }).await?)
    }
}

async fn find_all<T: DeserializeOwned>(
    collection: &Collection<Document>,
) -> Result<Vec<T>, StoreError> {
    let documents: Vec<Document> = collection.find(doc! {}).await?.try_collect().await?;

    documents.into_iter().map(from_document).collect()
}

fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, StoreError> {
    serde_json::from_value(document_to_json(document))
        .map_err(|e| StoreError::Decode(e.to_string()))
}

pub fn document_to_json(mut document: Document) -> Value {
    if let Ok(id) = document.get_object_id("_id") {
        document.insert("_id", id.to_hex());
    }

    Bson::Document(document).into_relaxed_extjson()
}

/// Integers that fit land as Int32, every other number as Double, like the Node driver.
pub fn json_to_bson(value: Value) -> Result<Bson, StoreError> {
    match value {
        Value::Number(number) => match number.as_i64() {
            Some(int) => Ok(i32::try_from(int).map_or(Bson::Double(int as f64), Bson::Int32)),
            None => number
                .as_f64()
                .map(Bson::Double)
                .ok_or_else(|| StoreError::Encode(number.to_string())),
        },
        other => Bson::try_from(other).map_err(|e| StoreError::Encode(e.to_string())),
    }
}

pub fn parse_object_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_document_to_json_hex_id() {
        let id = ObjectId::new();
        let document = doc! { "_id": id, "model": "Clio", "types": { "diesel": { "stock": 5 } } };

        let car: CarModel = from_document(document).unwrap();

        assert_eq!(car.id, Some(id.to_hex()));
        assert_eq!(car.model, "Clio");
        assert_eq!(car.types["diesel"]["stock"], json!(5));
    }

    #[test]
    fn test_car_keeps_extra_fields() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "model": "Clio",
            "image": "clio.png",
            "price": 19000,
            "types": { "diesel": { "stock": 5 } }
        };

        let car: CarModel = from_document(document).unwrap();

        assert_eq!(
            serde_json::to_value(&car).unwrap(),
            json!({
                "_id": id.to_hex(),
                "model": "Clio",
                "image": "clio.png",
                "price": 19000,
                "types": { "diesel": { "stock": 5 } },
            })
        );
    }

    #[test]
    fn test_car_tolerates_odd_documents() {
        let draft: CarModel =
            from_document(doc! { "_id": ObjectId::new(), "name": "draft" }).unwrap();
        assert_eq!(draft.model, "");
        assert!(draft.types.is_empty());
        assert_eq!(draft.extra["name"], json!("draft"));

        let odd: CarModel =
            from_document(doc! { "model": "Zoe", "types": { "electrique": "n/a" } }).unwrap();
        assert_eq!(odd.types["electrique"], json!("n/a"));
    }

    #[test]
    fn test_fuel_types_keep_stored_order() {
        let document = doc! {
            "model": "Clio",
            "types": {
                "essence": { "stock": 1 },
                "diesel": { "stock": 2 },
                "hybride": { "stock": 3 }
            }
        };

        let car: CarModel = from_document(document).unwrap();
        let fuels: Vec<&str> = car.types.keys().map(String::as_str).collect();

        assert_eq!(fuels, ["essence", "diesel", "hybride"]);
    }

    #[test]
    fn test_ref_keeps_extra_fields() {
        let document = doc! { "_id": ObjectId::new(), "ref": "A-12", "stock": 3 };

        let reference: RefModel = from_document(document).unwrap();

        assert_eq!(reference.stock, json!(3));
        assert_eq!(reference.extra["ref"], json!("A-12"));
    }

    #[test]
    fn test_json_to_bson_numbers() {
        assert_eq!(json_to_bson(json!(10)).unwrap(), Bson::Int32(10));
        assert_eq!(json_to_bson(json!(5_000_000_000i64)).unwrap(), Bson::Double(5e9));
        assert_eq!(json_to_bson(json!(-3_000_000_000i64)).unwrap(), Bson::Double(-3e9));
        assert_eq!(json_to_bson(json!(2.5)).unwrap(), Bson::Double(2.5));
        assert_eq!(json_to_bson(Value::Null).unwrap(), Bson::Null);
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("65a1f0c2e4b0a1b2c3d4e5f6").is_ok());
        assert!(matches!(parse_object_id("x1"), Err(StoreError::InvalidId(_))));
        assert!(parse_object_id("").is_err());
    }
}

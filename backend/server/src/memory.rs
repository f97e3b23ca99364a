//! In-process [`Store`] with the same update rules as MongoDB's `updateOne`:
//! only the first match is touched and writing an equal value modifies nothing.
use std::sync::RwLock;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::{Map, Value};

use crate::{
    database::Store,
    error::StoreError,
    models::{AdminAccount, CAR_TYPES, CarModel, RefModel, STOCK},
};

#[derive(Default)]
pub struct MemoryStore {
    cars: RwLock<Vec<CarModel>>,
    refs: RwLock<Vec<RefModel>>,
    admins: RwLock<Vec<AdminAccount>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new(cars: Vec<CarModel>, refs: Vec<RefModel>, admins: Vec<AdminAccount>) -> Self {
        Self {
            cars: RwLock::new(cars),
            refs: RwLock::new(refs),
            admins: RwLock::new(admins),
            unavailable: false,
        }
    }

    /// Every call fails as if the database went away.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable);
        }

        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn list_cars(&self) -> Result<Vec<CarModel>, StoreError> {
        self.check()?;

        Ok(self.cars.read().map_err(|_| StoreError::Unavailable)?.clone())
    }

    async fn update_car_stock(
        &self,
        model: &str,
        fuel: &str,
        stock: Value,
    ) -> Result<u64, StoreError> {
        self.check()?;

        let mut cars = self.cars.write().map_err(|_| StoreError::Unavailable)?;
        let Some(car) = cars.iter_mut().find(|car| car.model == model) else {
            return Ok(0);
        };

        let record = car
            .types
            .entry(fuel)
            .or_insert_with(|| Value::Object(Map::new()));

        // MongoDB refuses to create a field inside a non-document value
        let Value::Object(fields) = record else {
            return Err(StoreError::PathConflict(format!("{CAR_TYPES}.{fuel}")));
        };

        match fields.get_mut(STOCK) {
            Some(slot) => Ok(replace(slot, stock)),
            None => {
                fields.insert(STOCK.to_string(), stock);
                Ok(1)
            }
        }
    }

    async fn list_refs(&self) -> Result<Vec<RefModel>, StoreError> {
        self.check()?;

        Ok(self.refs.read().map_err(|_| StoreError::Unavailable)?.clone())
    }

    async fn update_ref_stock(&self, id: ObjectId, stock: Value) -> Result<u64, StoreError> {
        self.check()?;

        let id = id.to_hex();
        let mut refs = self.refs.write().map_err(|_| StoreError::Unavailable)?;

        match refs.iter_mut().find(|reference| reference.id == id) {
            Some(reference) => Ok(replace(&mut reference.stock, stock)),
            None => Ok(0),
        }
    }

    async fn find_admin(&self, email: &str) -> Result<Option<AdminAccount>, StoreError> {
        self.check()?;

        let admins = self.admins.read().map_err(|_| StoreError::Unavailable)?;

        Ok(admins.iter().find(|admin| admin.email == email).cloned())
    }
}

/// Returns the modified count for a `$set` of `value` into `slot`.
fn replace(slot: &mut Value, value: Value) -> u64 {
    if *slot == value {
        return 0;
    }

    *slot = value;
    1
}

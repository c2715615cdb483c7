//! Checkout staging.
//!
//! "Proceed to checkout" writes the selected cart lines under the key
//! `checkoutItems`; the checkout page reads them back and clears them once the
//! order is placed. This is the only client-side durable state outside the
//! in-memory query cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::api::Id;
use crate::api::cart::CartItem;
use crate::api::orders::{CreateOrder, Order, OrderLine, create_order};
use crate::client::QueryClient;
use crate::errors::{CheckoutError, StorageError};

/// Storage key of the staged checkout lines
pub const CHECKOUT_ITEMS_KEY: &str = "checkoutItems";

/// String key/value storage, the shape of browser `localStorage`
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// A cart line selected for checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: Id,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&CartItem> for CheckoutItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        }
    }
}

/// Shipping and payment choices made on the checkout page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub shipping_address_id: Id,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// Staged checkout lines on top of a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct CheckoutStaging<S> {
    store: S,
}

impl CheckoutStaging<FileStore> {
    /// Staging in the configured storage directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(dir))
    }
}

impl<S: KeyValueStore> CheckoutStaging<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the staged lines
    pub fn stage(&self, items: &[CheckoutItem]) -> Result<(), StorageError> {
        let contents = serde_json::to_string(items)?;
        self.store.set(CHECKOUT_ITEMS_KEY, &contents)
    }

    /// Stage the selected lines of a cart
    pub fn stage_cart_items<'a>(
        &self,
        items: impl IntoIterator<Item = &'a CartItem>,
    ) -> Result<(), StorageError> {
        let items: Vec<CheckoutItem> = items.into_iter().map(CheckoutItem::from).collect();
        self.stage(&items)
    }

    /// The staged lines; nothing staged reads as empty
    pub fn load(&self) -> Result<Vec<CheckoutItem>, StorageError> {
        match self.store.get(CHECKOUT_ITEMS_KEY)? {
            Some(contents) if !contents.trim().is_empty() => Ok(serde_json::from_str(&contents)?),
            _ => Ok(Vec::new()),
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(CHECKOUT_ITEMS_KEY)
    }

    /// Sum of the staged lines
    pub fn subtotal(&self) -> Result<f64, StorageError> {
        Ok(self
            .load()?
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum())
    }
}

/// Place an order for the staged lines.
///
/// The staging is cleared only once the backend confirmed the order, so a failed
/// attempt can be retried from the same page.
pub async fn place_order<S: KeyValueStore>(
    client: &QueryClient,
    staging: &CheckoutStaging<S>,
    details: CheckoutDetails,
) -> Result<Order, CheckoutError> {
    let items = staging.load()?;
    if items.is_empty() {
        return Err(CheckoutError::NothingStaged);
    }

    let order = CreateOrder {
        items: items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                price: item.price,
            })
            .collect(),
        shipping_address_id: details.shipping_address_id,
        payment_method: details.payment_method,
        notes: details.notes,
    };
    let placed = client.mutate(&create_order(), order).await?;
    staging.clear()?;
    crate::debug_log!("🛒 [CHECKOUT] Order {} placed, staging cleared", placed.id);
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: f64, quantity: u32) -> CheckoutItem {
        CheckoutItem {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            price,
            quantity,
            image: None,
        }
    }

    #[test]
    fn file_store_round_trips_staged_items() {
        let dir = tempfile::tempdir().unwrap();
        let staging = CheckoutStaging::in_dir(dir.path().join("storage"));
        assert!(staging.load().unwrap().is_empty());

        staging.stage(&[item("p1", 10.0, 2), item("p2", 2.5, 1)]).unwrap();
        assert!(dir.path().join("storage/checkoutItems.json").exists());
        assert_eq!(staging.load().unwrap().len(), 2);
        assert_eq!(staging.subtotal().unwrap(), 22.5);

        staging.clear().unwrap();
        assert!(staging.load().unwrap().is_empty());
        staging.clear().unwrap();
    }

    #[test]
    fn staged_json_uses_camel_case_keys() {
        let staging = CheckoutStaging::new(MemoryStore::new());
        staging.stage(&[item("p1", 1.0, 1)]).unwrap();
        let raw = staging.store().get(CHECKOUT_ITEMS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"productId\":\"p1\""));
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn corrupt_staging_is_an_error() {
        let store = MemoryStore::new();
        store.set(CHECKOUT_ITEMS_KEY, "{not json").unwrap();
        let staging = CheckoutStaging::new(store);
        assert!(matches!(staging.load(), Err(StorageError::Serde(_))));
    }
}

//! Local persistence of the cart between sessions.
//!
//! Saved as the plain item list, the same shape the server receives.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use quickcart_core::CartItem;

use crate::error::Result;
use crate::local_cart::LocalCart;

/// Somewhere to keep the cart between runs.
pub trait CartStorage: Send + Sync {
    /// The saved cart, or an empty one if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the saved cart cannot be read.
    fn load(&self) -> Result<LocalCart>;

    /// Overwrite the saved cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the cart cannot be written.
    fn save(&self, cart: &LocalCart) -> Result<()>;
}

/// Cart saved as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<LocalCart> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LocalCart::new()),
            Err(e) => return Err(e.into()),
        };
        let items: Vec<CartItem> = serde_json::from_slice(&bytes)?;
        Ok(LocalCart::from_items(&items))
    }

    fn save(&self, cart: &LocalCart) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(&cart.items())?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Cart kept in memory, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Vec<CartItem>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved item list.
    #[must_use]
    pub fn saved_items(&self) -> Vec<CartItem> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<LocalCart> {
        Ok(LocalCart::from_items(&self.saved_items()))
    }

    fn save(&self, cart: &LocalCart) -> Result<()> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = cart.items();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quickcart_core::ProductId;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("quickcart-storage-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let storage = JsonFileStorage::new(temp_path("missing.json"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_survives_reload() {
        let path = temp_path("cart.json");
        let storage = JsonFileStorage::new(&path);
        let mut cart = LocalCart::new();
        cart.add(ProductId::new(2), 3).unwrap();

        storage.save(&cart).unwrap();
        let reloaded = JsonFileStorage::new(&path).load().unwrap();

        assert_eq!(reloaded, cart);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_corrupt_file_reported() {
        let path = temp_path("corrupt.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not json").unwrap();

        let err = JsonFileStorage::new(&path).load().unwrap_err();

        assert!(matches!(err, crate::ClientError::Snapshot(_)));
        std::fs::remove_file(path).unwrap();
    }
}

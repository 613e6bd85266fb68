//! Today's menu and the dessert list.
//!
//! The menu is a single record persisted wholesale under the `menu` key.
//! Dessert categories start from the built-in list and are edited in
//! memory only; a restart brings the defaults back.

use std::sync::{Arc, PoisonError, RwLock};

use comanda_core::{DessertCategory, MenuData, default_desserts};

use crate::storage::{MENU_KEY, SharedStore, StorageError, load_json, save_json};

#[derive(Clone)]
pub struct MenuStore {
    inner: Arc<MenuStoreInner>,
}

struct MenuStoreInner {
    store: SharedStore,
    desserts: RwLock<Vec<DessertCategory>>,
}

impl std::fmt::Debug for MenuStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuStore").finish_non_exhaustive()
    }
}

impl MenuStore {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self {
            inner: Arc::new(MenuStoreInner {
                store,
                desserts: RwLock::new(default_desserts()),
            }),
        }
    }

    /// The stored menu, or the default one when nothing valid is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn current(&self) -> Result<MenuData, StorageError> {
        Ok(load_json(self.inner.store.as_ref(), MENU_KEY)?
            .into_option()
            .unwrap_or_default())
    }

    /// Overwrite the stored menu.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the menu cannot be written.
    pub fn replace(&self, menu: &MenuData) -> Result<(), StorageError> {
        save_json(self.inner.store.as_ref(), MENU_KEY, menu)?;
        tracing::info!(restaurant = %menu.restaurant_name, items = menu.items.len(), "Menu saved");
        Ok(())
    }

    /// Current dessert categories.
    #[must_use]
    pub fn categories(&self) -> Vec<DessertCategory> {
        self.inner
            .desserts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace one category. Returns `false` if `index` is out of range.
    pub fn update_category(&self, index: usize, category: DessertCategory) -> bool {
        let mut desserts = self
            .inner
            .desserts
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match desserts.get_mut(index) {
            Some(slot) => {
                *slot = category;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use comanda_core::Price;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    #[test]
    fn test_default_when_missing_or_corrupt() {
        let store = Arc::new(MemoryStore::new());
        let menu = MenuStore::new(store.clone());
        assert_eq!(menu.current().unwrap(), MenuData::default());

        store.set(MENU_KEY, "{\"restaurantName\":").unwrap();
        assert_eq!(menu.current().unwrap(), MenuData::default());
    }

    #[test]
    fn test_replace_persists() {
        let store = Arc::new(MemoryStore::new());
        let menu = MenuStore::new(store.clone());

        let mut updated = MenuData::default();
        updated.items = vec!["Strogonoff".into()];
        updated.price = Price::from_cents(2590);
        menu.replace(&updated).unwrap();

        let reopened = MenuStore::new(store);
        assert_eq!(reopened.current().unwrap(), updated);
    }

    #[test]
    fn test_dessert_edits_stay_in_memory() {
        let store = Arc::new(MemoryStore::new());
        let menu = MenuStore::new(store.clone());

        let edited = DessertCategory {
            title: "Pudim".into(),
            items: vec!["Leite condensado".into()],
        };
        assert!(menu.update_category(3, edited.clone()));
        assert!(!menu.update_category(99, edited.clone()));
        assert_eq!(menu.categories()[3], edited);

        assert_eq!(MenuStore::new(store).categories(), default_desserts());
    }
}

use anyhow::{Result, anyhow};
use std::sync::{Arc, RwLock};

#[cfg(feature = "rocksdb")]
use rocksdb::{DB, Options};

/// Persistence middleware for the serialized preference document.
///
/// Backends only move an opaque string around; schema and migration are the
/// store's business.
pub trait PreferencePersistence: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, raw: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct NoopPersistence;

impl PreferencePersistence for NoopPersistence {
    fn load(&self) -> Result<Option<String>> {
        Ok(None)
    }

    fn save(&self, _raw: &str) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPersistence {
    slot: RwLock<Option<String>>,
}

impl InMemoryPersistence {
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(Some(raw.into())),
        }
    }
}

impl PreferencePersistence for InMemoryPersistence {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .slot
            .read()
            .map_err(|_| anyhow!("preference slot lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, raw: &str) -> Result<()> {
        let mut guard = self
            .slot
            .write()
            .map_err(|_| anyhow!("preference slot lock poisoned"))?;
        *guard = Some(raw.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .slot
            .write()
            .map_err(|_| anyhow!("preference slot lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

impl<P: PreferencePersistence + ?Sized> PreferencePersistence for Arc<P> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, raw: &str) -> Result<()> {
        (**self).save(raw)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

#[cfg(feature = "rocksdb")]
pub struct RocksDbPersistence {
    db: Arc<DB>,
    namespace: String,
}

#[cfg(feature = "rocksdb")]
impl RocksDbPersistence {
    pub fn open_default(path: &str) -> Result<Self> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path)?;
        Ok(Self {
            db: Arc::new(db),
            namespace: "user".to_owned(),
        })
    }

    /// Keep several documents (e.g. one per profile) in the same database.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_owned();
        self
    }

    fn key(&self) -> String {
        format!("preferences:{}", self.namespace)
    }
}

#[cfg(feature = "rocksdb")]
impl PreferencePersistence for RocksDbPersistence {
    fn load(&self) -> Result<Option<String>> {
        let value = self.db.get(self.key().as_bytes())?;
        match value {
            Some(raw) => Ok(Some(String::from_utf8(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, raw: &str) -> Result<()> {
        self.db.put(self.key().as_bytes(), raw.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.db.delete(self.key().as_bytes())?;
        Ok(())
    }
}

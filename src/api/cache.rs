//! Local cache seam: config rows (`autoLogin`, `accessToken`) and the frozen
//! crew records keyed by symbol.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::data::crew::CrewDto;

pub const CONFIG_AUTO_LOGIN: &str = "autoLogin";
pub const CONFIG_ACCESS_TOKEN: &str = "accessToken";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io failed: {0}")]
    Io(#[from] io::Error),
    #[error("cache entry is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid cache key `{0}`")]
    InvalidKey(String),
    #[error("cache lock poisoned")]
    Poisoned,
}

pub trait CrewCache {
    fn config(&self, key: &str) -> impl Future<Output = Result<Option<Value>, CacheError>> + Send;

    fn put_config(
        &self,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    fn delete_config(&self, key: &str) -> impl Future<Output = Result<(), CacheError>> + Send;

    fn immortal(&self, symbol: &str)
        -> impl Future<Output = Result<Option<CrewDto>, CacheError>> + Send;

    fn put_immortal(
        &self,
        symbol: &str,
        crew: &CrewDto,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    config: Mutex<HashMap<String, Value>>,
    immortals: Mutex<HashMap<String, CrewDto>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immortal_count(&self) -> usize {
        self.immortals.lock().map(|map| map.len()).unwrap_or(0)
    }
}

impl CrewCache for MemoryCache {
    async fn config(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let map = self.config.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    async fn put_config(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let mut map = self.config.lock().map_err(|_| CacheError::Poisoned)?;
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_config(&self, key: &str) -> Result<(), CacheError> {
        let mut map = self.config.lock().map_err(|_| CacheError::Poisoned)?;
        map.remove(key);
        Ok(())
    }

    async fn immortal(&self, symbol: &str) -> Result<Option<CrewDto>, CacheError> {
        let map = self.immortals.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(map.get(symbol).cloned())
    }

    async fn put_immortal(&self, symbol: &str, crew: &CrewDto) -> Result<(), CacheError> {
        let mut map = self.immortals.lock().map_err(|_| CacheError::Poisoned)?;
        map.insert(symbol.to_string(), crew.clone());
        Ok(())
    }
}

/// Cache persisted as JSON under a directory:
/// `config.json` holds the config rows, `immortals/<symbol>.json` one record each.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    fn immortal_path(&self, symbol: &str) -> Result<PathBuf, CacheError> {
        let valid = !symbol.is_empty()
            && symbol
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(CacheError::InvalidKey(symbol.to_string()));
        }
        Ok(self.dir.join("immortals").join(format!("{symbol}.json")))
    }

    async fn read_config(&self) -> Result<Map<String, Value>, CacheError> {
        match tokio::fs::read_to_string(self.config_path()).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_config(&self, rows: &Map<String, Value>) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let raw = serde_json::to_string_pretty(rows)?;
        tokio::fs::write(self.config_path(), raw).await?;
        Ok(())
    }
}

impl CrewCache for JsonFileCache {
    async fn config(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.read_config().await?.get(key).cloned())
    }

    async fn put_config(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let mut rows = self.read_config().await?;
        rows.insert(key.to_string(), value);
        self.write_config(&rows).await
    }

    async fn delete_config(&self, key: &str) -> Result<(), CacheError> {
        let mut rows = self.read_config().await?;
        if rows.remove(key).is_some() {
            self.write_config(&rows).await?;
        }
        Ok(())
    }

    async fn immortal(&self, symbol: &str) -> Result<Option<CrewDto>, CacheError> {
        let path = self.immortal_path(symbol)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put_immortal(&self, symbol: &str, crew: &CrewDto) -> Result<(), CacheError> {
        let path = self.immortal_path(symbol)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(crew)?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crew(symbol: &str) -> CrewDto {
        serde_json::from_value(serde_json::json!({
            "archetype_id": 12, "symbol": symbol, "max_rarity": 5,
            "base_skills": { "science_skill": { "core": 900, "range_min": 100, "range_max": 300 } }
        }))
        .unwrap()
    }

    fn poison<T: Send>(lock: &Mutex<T>) {
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.lock().unwrap();
                    panic!("writer died holding the lock");
                })
                .join();
        });
        assert!(lock.is_poisoned());
    }

    #[tokio::test]
    async fn memory_cache_reports_poisoned_locks() {
        let cache = MemoryCache::new();
        cache.put_config(CONFIG_AUTO_LOGIN, Value::Bool(true)).await.unwrap();
        poison(&cache.config);
        poison(&cache.immortals);

        assert!(matches!(
            cache.put_config(CONFIG_ACCESS_TOKEN, Value::from("token-2")).await,
            Err(CacheError::Poisoned)
        ));
        assert!(matches!(
            cache.delete_config(CONFIG_AUTO_LOGIN).await,
            Err(CacheError::Poisoned)
        ));
        assert!(matches!(
            cache.config(CONFIG_AUTO_LOGIN).await,
            Err(CacheError::Poisoned)
        ));
        assert!(matches!(
            cache.put_immortal("spock_crew", &crew("spock_crew")).await,
            Err(CacheError::Poisoned)
        ));
        assert!(matches!(
            cache.immortal("spock_crew").await,
            Err(CacheError::Poisoned)
        ));
    }

    #[tokio::test]
    async fn json_file_cache_round_trips_config_rows() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());

        assert_eq!(cache.config(CONFIG_AUTO_LOGIN).await.unwrap(), None);
        cache.put_config(CONFIG_AUTO_LOGIN, Value::Bool(true)).await.unwrap();
        cache
            .put_config(CONFIG_ACCESS_TOKEN, Value::from("token-1"))
            .await
            .unwrap();
        assert_eq!(
            cache.config(CONFIG_ACCESS_TOKEN).await.unwrap(),
            Some(Value::from("token-1"))
        );

        cache.delete_config(CONFIG_ACCESS_TOKEN).await.unwrap();
        assert_eq!(cache.config(CONFIG_ACCESS_TOKEN).await.unwrap(), None);
        assert_eq!(
            cache.config(CONFIG_AUTO_LOGIN).await.unwrap(),
            Some(Value::Bool(true))
        );
    }

    #[tokio::test]
    async fn json_file_cache_stores_immortals_by_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFileCache::new(dir.path());
        let record = crew("spock_crew");

        assert!(cache.immortal("spock_crew").await.unwrap().is_none());
        cache.put_immortal("spock_crew", &record).await.unwrap();
        assert_eq!(cache.immortal("spock_crew").await.unwrap(), Some(record));
        assert!(matches!(
            cache.immortal("../config").await,
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn memory_cache_counts_immortals() {
        let cache = MemoryCache::new();
        cache.put_immortal("a", &crew("a")).await.unwrap();
        cache.put_immortal("a", &crew("a")).await.unwrap();
        assert_eq!(cache.immortal_count(), 1);
    }
}

use anyhow::{Context, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Key holding the serialized player snapshot.
pub const PLAYER_KEY: &str = "PLAYER_DATA";
/// Key holding the proxy session payload.
pub const SESSION_KEY: &str = "NETEASE_SESSION";

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let s = Self {
            conn: Connection::open_in_memory().context("open in-memory db")?,
        };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS kv (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS lyrics_cache (
  track_id TEXT PRIMARY KEY,
  lrc TEXT NOT NULL,
  sub_lrc TEXT NOT NULL,
  fetched_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key=?1", params![key], |row| row.get(0))
            .optional()
            .with_context(|| format!("read {key}"))
    }

    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO kv(key, value, updated_at)
VALUES(?1, ?2, ?3)
ON CONFLICT(key) DO UPDATE SET
  value=excluded.value,
  updated_at=excluded.updated_at
"#,
                params![key, value, now_unix()],
            )
            .with_context(|| format!("write {key}"))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key=?1", params![key])
            .with_context(|| format!("delete {key}"))?;
        Ok(())
    }

    pub fn cache_lyrics(&self, track_id: &str, lrc: &str, sub_lrc: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO lyrics_cache(track_id, lrc, sub_lrc, fetched_at)
VALUES(?1, ?2, ?3, ?4)
ON CONFLICT(track_id) DO UPDATE SET
  lrc=excluded.lrc,
  sub_lrc=excluded.sub_lrc,
  fetched_at=excluded.fetched_at
"#,
                params![track_id, lrc, sub_lrc, now_unix()],
            )
            .context("cache lyrics")?;
        Ok(())
    }

    /// `(lrc, sub_lrc)` for a track, if cached.
    pub fn cached_lyrics(&self, track_id: &str) -> anyhow::Result<Option<(String, String)>> {
        self.conn
            .query_row(
                "SELECT lrc, sub_lrc FROM lyrics_cache WHERE track_id=?1",
                params![track_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("read lyrics cache")
    }
}

/// Shared, thread-safe access to [`Storage`] from async code.
///
/// sqlite calls are blocking, so every operation hops onto the blocking pool.
#[derive(Clone)]
pub struct StorageHandle {
    inner: Arc<Mutex<Storage>>,
}

impl StorageHandle {
    pub fn new(storage: Storage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    pub async fn run<F, R>(&self, f: F) -> anyhow::Result<R>
    where
        F: FnOnce(&Storage) -> anyhow::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let storage = inner.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
            f(&storage)
        })
        .await
        .context("storage task")?
    }

    /// Synchronous access, for startup and shutdown paths outside the runtime's hot loop.
    pub fn blocking<R>(&self, f: impl FnOnce(&Storage) -> anyhow::Result<R>) -> anyhow::Result<R> {
        let storage = self.inner.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        f(&storage)
    }
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_upserts_and_removes() {
        let s = Storage::open_in_memory().unwrap();
        assert_eq!(s.get(PLAYER_KEY).unwrap(), None);
        s.set(PLAYER_KEY, "one").unwrap();
        s.set(PLAYER_KEY, "two").unwrap();
        assert_eq!(s.get(PLAYER_KEY).unwrap().as_deref(), Some("two"));
        s.remove(PLAYER_KEY).unwrap();
        assert_eq!(s.get(PLAYER_KEY).unwrap(), None);
    }

    #[test]
    fn lyrics_cache_round_trip() {
        let s = Storage::open_in_memory().unwrap();
        assert!(s.cached_lyrics("1").unwrap().is_none());
        s.cache_lyrics("1", "[00:01]a", "").unwrap();
        assert_eq!(
            s.cached_lyrics("1").unwrap(),
            Some(("[00:01]a".to_string(), String::new()))
        );
    }

    #[test]
    fn opens_on_disk_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.sqlite3");
        {
            let s = Storage::open(&path).unwrap();
            s.set(SESSION_KEY, "abc").unwrap();
        }
        let s = Storage::open(&path).unwrap();
        assert_eq!(s.get(SESSION_KEY).unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn handle_runs_on_blocking_pool() {
        let h = StorageHandle::new(Storage::open_in_memory().unwrap());
        h.run(|s| s.set("k", "v")).await.unwrap();
        let v = h.run(|s| s.get("k")).await.unwrap();
        assert_eq!(v.as_deref(), Some("v"));
    }
}

use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;

use crate::error::Result;

use super::schema::SCHEMA;
use super::KvBackend;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }
}

impl KvBackend for Repository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        let value = self
            .conn
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM kv WHERE key = ?1",
                        params![key],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?;
                Ok(value)
            })
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO kv (key, value) VALUES (?1, ?2)
                       ON CONFLICT(key) DO UPDATE SET
                           value = excluded.value,
                           updated_at = datetime('now')"#,
                    params![key, value],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_none() {
        let repo = Repository::in_memory().await.expect("repo");
        assert_eq!(repo.get("nothing").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_overwrites_previous_value() {
        let repo = Repository::in_memory().await.expect("repo");

        tokio_test::assert_ok!(repo.set("season", "winter").await);
        tokio_test::assert_ok!(repo.set("season", "summer").await);

        assert_eq!(
            repo.get("season").await.expect("get").as_deref(),
            Some("summer")
        );
    }

    #[tokio::test]
    async fn values_survive_reopening_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rhythms.db");
        let path = path.to_string_lossy().to_string();

        {
            let repo = Repository::new(&path).await.expect("open");
            repo.set("routines", "[]").await.expect("set");
        }

        let reopened = Repository::new(&path).await.expect("reopen");
        assert_eq!(
            reopened.get("routines").await.expect("get").as_deref(),
            Some("[]")
        );
    }
}

//! Bulk import and removal of fixture data
//!
//! A fixture directory holds one JSON array per collection
//! (`bootcamps.json`, `courses.json`, `users.json`, `reviews.json`).
//! Missing files are skipped.

use crate::core::filter::FilterExpression;
use crate::core::store::{Document, RecordStore};
use crate::entities::SEEDED_COLLECTIONS;
use crate::storage::in_memory::{ID_FIELD, InMemoryDatabase};
use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

/// Field holding the creation timestamp
const CREATED_AT: &str = "createdAt";

/// Legacy identifier field accepted in fixture files
const LEGACY_ID: &str = "_id";

/// Records imported or deleted, per collection
pub type SeedReport = IndexMap<String, u64>;

/// Import every fixture file found in `dir`
pub async fn import_dir(db: &InMemoryDatabase, dir: impl AsRef<Path>) -> Result<SeedReport> {
    let dir = dir.as_ref();
    let mut report = SeedReport::new();

    for name in SEEDED_COLLECTIONS {
        let path = dir.join(format!("{}.json", name));
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))?;
        if !exists {
            tracing::debug!(path = %path.display(), "No fixture file, skipping");
            continue;
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let imported = import_json(db, name, &content)
            .await
            .with_context(|| format!("Failed to import {}", path.display()))?;

        tracing::info!(collection = name, records = imported, "Data imported");
        report.insert(name.to_string(), imported);
    }

    Ok(report)
}

/// Import one JSON array of documents into `collection`
pub async fn import_json(db: &InMemoryDatabase, collection: &str, content: &str) -> Result<u64> {
    let records: Vec<Value> = serde_json::from_str(content)?;
    let target = db.collection(collection);

    let mut imported = 0;
    for (index, record) in records.into_iter().enumerate() {
        let Value::Object(document) = record else {
            return Err(anyhow!("record {} of {} is not an object", index, collection));
        };
        target.create(normalize(document)).await?;
        imported += 1;
    }
    Ok(imported)
}

/// Delete every record of the seeded collections
pub async fn clear(db: &InMemoryDatabase) -> Result<SeedReport> {
    let mut report = SeedReport::new();
    for name in SEEDED_COLLECTIONS {
        let removed = db
            .collection(name)
            .delete_many(&FilterExpression::match_all())
            .await?;
        tracing::info!(collection = name, records = removed, "Data deleted");
        report.insert(name.to_string(), removed);
    }
    Ok(report)
}

/// Rename `_id` to `id` and stamp records without a creation time
fn normalize(mut document: Document) -> Document {
    if let Some(id) = document.remove(LEGACY_ID) {
        document.insert(ID_FIELD.to_string(), id);
    }
    if !document.contains_key(CREATED_AT) {
        document.insert(
            CREATED_AT.to_string(),
            Utc::now()
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .into(),
        );
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::Collection;
    use serde_json::json;

    #[tokio::test]
    async fn test_import_dir_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bootcamps.json"),
            json!([
                { "_id": "b1", "name": "Devworks" },
                { "_id": "b2", "name": "ModernTech", "createdAt": "2024-01-01T00:00:00.000Z" }
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("courses.json"),
            json!([{ "_id": "c1", "title": "Front End", "bootcamp": "b1" }]).to_string(),
        )
        .unwrap();

        let db = InMemoryDatabase::new();
        let report = import_dir(&db, dir.path()).await.unwrap();
        assert_eq!(report.get("bootcamps"), Some(&2));
        assert_eq!(report.get("courses"), Some(&1));
        assert!(!report.contains_key("users"));

        let bootcamps = db.collection("bootcamps");
        let b1 = bootcamps.get("b1").await.unwrap().unwrap();
        assert!(b1.get("_id").is_none());
        assert!(b1.get("createdAt").is_some());
        let b2 = bootcamps.get("b2").await.unwrap().unwrap();
        assert_eq!(b2["createdAt"], json!("2024-01-01T00:00:00.000Z"));

        let removed = clear(&db).await.unwrap();
        assert_eq!(removed.get("bootcamps"), Some(&2));
        assert_eq!(
            bootcamps.count(&FilterExpression::match_all()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_unreadable_fixture_dir_is_an_error() {
        // A regular file where the directory should be: lookups fail with
        // "not a directory", which is not the same as a missing fixture
        let file = tempfile::NamedTempFile::new().unwrap();
        let db = InMemoryDatabase::new();

        let err = import_dir(&db, file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to check"));
    }

    #[tokio::test]
    async fn test_import_rejects_non_objects() {
        let db = InMemoryDatabase::new();
        let result = import_json(&db, "users", "[1, 2]").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_ids_fail_the_import() {
        let db = InMemoryDatabase::new();
        let content = json!([{ "_id": "u1" }, { "_id": "u1" }]).to_string();
        assert!(import_json(&db, "users", &content).await.is_err());
    }
}

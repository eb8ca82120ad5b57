use crate::db::DirectoryDb;
use crate::models::{Company, CorpRecord};
use anyhow::{Context, Result};
use std::path::Path;

pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

/// Name lookup over the DART corporation code list.
#[derive(Clone)]
pub struct CompanyDirectory {
    db: DirectoryDb,
}

impl CompanyDirectory {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = DirectoryDb::new(database_url)
            .await
            .with_context(|| format!("Failed to open company directory at {}", database_url))?;
        Ok(Self { db })
    }

    /// Replace the whole directory with `records` in a single transaction.
    ///
    /// Records without a corp code or name are skipped; a repeated corp code
    /// keeps the last record. Returns the number of stored rows.
    pub async fn rebuild_from_records(&self, records: &[CorpRecord]) -> Result<u64> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM companies")
            .execute(&mut *tx)
            .await?;

        let mut skipped = 0usize;
        for record in records {
            let corp_code = record.corp_code.trim();
            let corp_name = record.corp_name.trim();
            if corp_code.is_empty() || corp_name.is_empty() {
                skipped += 1;
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO companies (corp_code, corp_name, stock_code, modify_date)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(corp_code) DO UPDATE SET
                    corp_name = excluded.corp_name,
                    stock_code = excluded.stock_code,
                    modify_date = excluded.modify_date
                "#
            )
            .bind(corp_code)
            .bind(corp_name)
            .bind(record.stock_code.trim())
            .bind(record.modify_date.trim())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        if skipped > 0 {
            tracing::warn!("Skipped {} corp records without code or name", skipped);
        }

        let stored = self.count().await?;
        tracing::info!("Company directory rebuilt with {} companies", stored);
        Ok(stored)
    }

    /// Load a `corp_codes.json` export and rebuild from it.
    pub async fn rebuild_from_json(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let records: Vec<CorpRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse corp code list in {}", path.display()))?;

        tracing::info!("Loaded {} corp records from {}", records.len(), path.display());
        self.rebuild_from_records(&records).await
    }

    /// Substring match on the company name, listed companies first, then by name.
    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<Company>> {
        let pattern = format!("%{}%", query.trim());

        let companies = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, corp_code, corp_name, stock_code, modify_date
            FROM companies
            WHERE corp_name LIKE ?
            ORDER BY
                CASE WHEN stock_code IS NOT NULL AND stock_code != '' THEN 0 ELSE 1 END,
                corp_name
            LIMIT ?
            "#
        )
        .bind(pattern)
        .bind(limit.max(1))
        .fetch_all(self.db.pool())
        .await?;

        Ok(companies)
    }

    pub async fn get_by_corp_code(&self, corp_code: &str) -> Result<Option<Company>> {
        let company = sqlx::query_as::<_, Company>(
            "SELECT id, corp_code, corp_name, stock_code, modify_date FROM companies WHERE corp_code = ?"
        )
        .bind(corp_code)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(company)
    }

    pub async fn count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM companies")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count.max(0) as u64)
    }
}

//! # Calculation Repository
//!
//! The calculation history. Rows are inserted and deleted, never updated.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{PricingColumns, TermsColumns};
use preco_core::{Calculation, TaxPolicy};

const SELECT_CALCULATION: &str = r#"
    SELECT
        id, product_id, product_name,
        base_cost, additional_costs, margin_mode, margin_value, tax_percentage,
        tax_policy,
        total_cost, profit_amount, profit_percentage,
        price_before_tax, tax_amount, final_price,
        created_at
    FROM calculations
"#;

const INSERT_CALCULATION: &str = r#"
    INSERT INTO calculations (
        id, product_id, product_name,
        base_cost, additional_costs, margin_mode, margin_value, tax_percentage,
        tax_policy,
        total_cost, profit_amount, profit_percentage,
        price_before_tax, tax_amount, final_price,
        created_at
    ) VALUES (
        ?1, ?2, ?3,
        ?4, ?5, ?6, ?7, ?8,
        ?9,
        ?10, ?11, ?12,
        ?13, ?14, ?15,
        ?16
    )
"#;

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

#[derive(Debug, sqlx::FromRow)]
struct CalculationRecord {
    id: String,
    product_id: Option<String>,
    product_name: String,
    #[sqlx(flatten)]
    terms: TermsColumns,
    tax_policy: TaxPolicy,
    #[sqlx(flatten)]
    pricing: PricingColumns,
    created_at: DateTime<Utc>,
}

impl TryFrom<CalculationRecord> for Calculation {
    type Error = DbError;

    fn try_from(record: CalculationRecord) -> DbResult<Self> {
        Ok(Calculation {
            id: record.id,
            product_id: record.product_id,
            product_name: record.product_name,
            terms: record.terms.into_terms()?,
            tax_policy: record.tax_policy,
            pricing: record.pricing.into_result()?,
            created_at: record.created_at,
        })
    }
}

/// Appends a history entry on any executor (pool or transaction).
pub(crate) async fn insert<'e, E>(executor: E, calculation: &Calculation) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let query = sqlx::query(INSERT_CALCULATION)
        .bind(calculation.id.clone())
        .bind(calculation.product_id.clone())
        .bind(calculation.product_name.clone());
    let query = TermsColumns::from_terms(&calculation.terms)?.bind(query);
    let query = query.bind(calculation.tax_policy);
    let query = PricingColumns::from_result(&calculation.pricing).bind(query);

    query.bind(calculation.created_at).execute(executor).await?;

    Ok(())
}

/// Repository for the calculation history.
#[derive(Debug, Clone)]
pub struct CalculationRepository {
    pool: SqlitePool,
}

impl CalculationRepository {
    /// Creates a new CalculationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CalculationRepository { pool }
    }

    /// Records a calculation.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - `product_id` names no saved product
    pub async fn insert(&self, calculation: &Calculation) -> DbResult<()> {
        debug!(id = %calculation.id, product_id = ?calculation.product_id, "Recording calculation");
        insert(&self.pool, calculation).await
    }

    /// Gets a history entry by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Calculation>> {
        let sql = format!("{} WHERE id = ?1", SELECT_CALCULATION);
        let record = sqlx::query_as::<_, CalculationRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(Calculation::try_from).transpose()
    }

    /// Lists the most recent `limit` entries, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Calculation>> {
        let sql = format!("{} {} LIMIT ?1", SELECT_CALCULATION, NEWEST_FIRST);
        let records = sqlx::query_as::<_, CalculationRecord>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        records.into_iter().map(Calculation::try_from).collect()
    }

    /// Lists the most recent `limit` entries recorded for one product, newest first.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<Calculation>> {
        let sql = format!(
            "{} WHERE product_id = ?1 {} LIMIT ?2",
            SELECT_CALCULATION, NEWEST_FIRST
        );
        let records = sqlx::query_as::<_, CalculationRecord>(&sql)
            .bind(product_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        records.into_iter().map(Calculation::try_from).collect()
    }

    /// Deletes one history entry.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No entry with this id
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting calculation");

        let result = sqlx::query("DELETE FROM calculations WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Calculation", id));
        }

        Ok(())
    }

    /// Deletes the whole history. Returns how many entries were removed.
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM calculations")
            .execute(&self.pool)
            .await?;

        debug!(removed = result.rows_affected(), "Cleared calculation history");
        Ok(result.rows_affected())
    }

    /// Counts history entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM calculations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

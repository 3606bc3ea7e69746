//! # Product Repository
//!
//! Database operations for saved products.
//!
//! ## Key Operations
//! - Upsert (`save`): last write wins, `created_at` is kept from the first save
//! - Newest-first listing and name search
//! - Delete, leaving history rows behind with `product_id = NULL`

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{PricingColumns, TermsColumns};
use preco_core::{Product, TaxPolicy};

const SELECT_PRODUCT: &str = r#"
    SELECT
        id, name, image_uri,
        base_cost, additional_costs, margin_mode, margin_value, tax_percentage,
        tax_policy,
        total_cost, profit_amount, profit_percentage,
        price_before_tax, tax_amount, final_price,
        created_at, updated_at
    FROM products
"#;

const UPSERT_PRODUCT: &str = r#"
    INSERT INTO products (
        id, name, image_uri,
        base_cost, additional_costs, margin_mode, margin_value, tax_percentage,
        tax_policy,
        total_cost, profit_amount, profit_percentage,
        price_before_tax, tax_amount, final_price,
        created_at, updated_at
    ) VALUES (
        ?1, ?2, ?3,
        ?4, ?5, ?6, ?7, ?8,
        ?9,
        ?10, ?11, ?12,
        ?13, ?14, ?15,
        ?16, ?17
    )
    ON CONFLICT (id) DO UPDATE SET
        name = excluded.name,
        image_uri = excluded.image_uri,
        base_cost = excluded.base_cost,
        additional_costs = excluded.additional_costs,
        margin_mode = excluded.margin_mode,
        margin_value = excluded.margin_value,
        tax_percentage = excluded.tax_percentage,
        tax_policy = excluded.tax_policy,
        total_cost = excluded.total_cost,
        profit_amount = excluded.profit_amount,
        profit_percentage = excluded.profit_percentage,
        price_before_tax = excluded.price_before_tax,
        tax_amount = excluded.tax_amount,
        final_price = excluded.final_price,
        updated_at = excluded.updated_at
"#;

/// Row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductRecord {
    id: String,
    name: String,
    image_uri: Option<String>,
    #[sqlx(flatten)]
    terms: TermsColumns,
    tax_policy: TaxPolicy,
    #[sqlx(flatten)]
    pricing: PricingColumns,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = DbError;

    fn try_from(record: ProductRecord) -> DbResult<Self> {
        Ok(Product {
            id: record.id,
            name: record.name,
            terms: record.terms.into_terms()?,
            tax_policy: record.tax_policy,
            image_uri: record.image_uri,
            pricing: record.pricing.into_result()?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Inserts or replaces a product on any executor (pool or transaction).
pub(crate) async fn upsert<'e, E>(executor: E, product: &Product) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let query = sqlx::query(UPSERT_PRODUCT)
        .bind(product.id.clone())
        .bind(product.name.clone())
        .bind(product.image_uri.clone());
    let query = TermsColumns::from_terms(&product.terms)?.bind(query);
    let query = query.bind(product.tax_policy);
    let query = PricingColumns::from_result(&product.pricing).bind(query);

    query
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(executor)
        .await?;

    Ok(())
}

/// Escapes a name fragment for `LIKE ... ESCAPE '\'`.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// repo.save(&product).await?;
/// let found = repo.search("cadeira").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Saves a product: inserts it, or overwrites the row with the same id.
    pub async fn save(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Saving product");
        upsert(&self.pool, product).await
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("{} WHERE id = ?1", SELECT_PRODUCT);
        let record = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(Product::try_from).transpose()
    }

    /// Lists every product, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{} ORDER BY created_at DESC, rowid DESC", SELECT_PRODUCT);
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        records.into_iter().map(Product::try_from).collect()
    }

    /// Finds products whose name contains `fragment` (ASCII case-insensitive).
    ///
    /// An empty fragment lists everything.
    pub async fn search(&self, fragment: &str) -> DbResult<Vec<Product>> {
        let fragment = fragment.trim();
        debug!(query = %fragment, "Searching products");

        if fragment.is_empty() {
            return self.list().await;
        }

        let sql = format!(
            r"{} WHERE name LIKE ?1 ESCAPE '\' ORDER BY created_at DESC, rowid DESC",
            SELECT_PRODUCT
        );
        let records = sqlx::query_as::<_, ProductRecord>(&sql)
            .bind(like_pattern(fragment))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), "Search returned products");
        records.into_iter().map(Product::try_from).collect()
    }

    /// Deletes a product. Its history entries stay, detached.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No product with this id
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts saved products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use preco_core::{AdditionalCost, MarginMode, Money, PricingTerms};
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn terms() -> PricingTerms {
        PricingTerms {
            base_cost: Money::new(dec!(800)),
            additional_costs: vec![
                AdditionalCost::new("Frete", Money::new(dec!(25))),
                AdditionalCost::new("Embalagem", Money::new(dec!(15))),
            ],
            margin_mode: MarginMode::Percentage,
            margin_value: dec!(25),
            tax_percentage: dec!(18),
        }
    }

    fn product(id: &str, name: &str, created: i64) -> Product {
        Product::new(id, name, terms(), TaxPolicy::GrossUp, None, at(created)).unwrap()
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_and_get_keeps_full_precision() {
        let db = db().await;
        let saved = product("p-1", "Cadeira", 100);
        db.products().save(&saved).await.unwrap();

        let loaded = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(
            loaded.pricing.final_price.amount(),
            saved.pricing.final_price.amount()
        );
        assert!(loaded.pricing.final_price.amount().scale() > 2);
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let db = db().await;
        assert!(db.products().get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_row() {
        let db = db().await;
        let repo = db.products();
        let mut item = product("p-1", "Cadeira", 100);
        repo.save(&item).await.unwrap();

        let mut cheaper = terms();
        cheaper.base_cost = Money::new(dec!(500));
        item.reprice(cheaper, TaxPolicy::OnPreTaxPrice, at(200)).unwrap();
        item.rename("Cadeira gamer", at(200));
        repo.save(&item).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let loaded = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Cadeira gamer");
        assert_eq!(loaded.tax_policy, TaxPolicy::OnPreTaxPrice);
        assert_eq!(loaded.terms.base_cost.amount(), dec!(500));
        assert_eq!(loaded.created_at, at(100));
        assert_eq!(loaded.updated_at, at(200));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let db = db().await;
        let repo = db.products();
        repo.save(&product("p-old", "Mesa", 100)).await.unwrap();
        repo.save(&product("p-new", "Cadeira", 300)).await.unwrap();
        repo.save(&product("p-mid", "Banco", 200)).await.unwrap();

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p-new", "p-mid", "p-old"]);
    }

    #[tokio::test]
    async fn test_search_by_name_fragment() {
        let db = db().await;
        let repo = db.products();
        repo.save(&product("p-1", "Cadeira de escritório", 100)).await.unwrap();
        repo.save(&product("p-2", "Mesa", 200)).await.unwrap();
        repo.save(&product("p-3", "CADEIRA infantil", 300)).await.unwrap();

        let found = repo.search("cadeira").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "p-3");

        assert_eq!(repo.search("  ").await.unwrap().len(), 3);
        assert!(repo.search("sofá").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = db().await;
        let repo = db.products();
        repo.save(&product("p-1", "Desconto 10%", 100)).await.unwrap();
        repo.save(&product("p-2", "Desconto 100", 200)).await.unwrap();

        let found = repo.search("10%").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p-1");
        assert!(repo.search("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_product() {
        let db = db().await;
        let repo = db.products();
        repo.save(&product("p-1", "Cadeira", 100)).await.unwrap();

        repo.delete("p-1").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);

        let err = repo.delete("p-1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_decimal_fails_to_load() {
        let db = db().await;
        db.products().save(&product("p-1", "Cadeira", 100)).await.unwrap();

        sqlx::query("UPDATE products SET final_price = 'abc' WHERE id = 'p-1'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.products().get_by_id("p-1").await.unwrap_err();
        assert!(matches!(err, DbError::Decode { ref field, .. } if field == "final_price"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("10%_x"), r"%10\%\_x%");
    }
}

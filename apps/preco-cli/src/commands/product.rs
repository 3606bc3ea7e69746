//! # Product Commands
//!
//! Saved products: add, update, list, show, delete.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Save Flow                                    │
//! │                                                                         │
//! │  preco product add --name Cadeira --base-cost 800 --cost Frete=25       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate name + image + PricingForm::validate_for(policy)              │
//! │       │   (all failures collected, VALIDATION_ERROR lists each field)   │
//! │       ▼                                                                 │
//! │  Product::new(...)  ──► prices the terms                                │
//! │  Calculation::for_product(...)  ──► snapshot for the history            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::save_product_with_calculation  (one transaction)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductDto                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `update` follows the same path starting from the stored product; every
//! save appends a history entry.

use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use super::pricing::{parse_cost_arg, validate_terms, MarginModeArg, PricingArgs};
use super::{
    breakdown_rows, format_date, join_costs, record_id, render_rows, AdditionalCostDto, Deleted,
    PricingDto, Report,
};
use crate::error::ApiError;
use crate::state::{AppContext, ConfigState};
use preco_core::validation::{validate_image_uri, validate_product_name, validate_search_query};
use preco_core::{
    AdditionalCostField, Calculation, FormErrors, MarginMode, PricingForm, PricingTerms, Product,
    TaxPolicy,
};
use preco_db::generate_id;

// =============================================================================
// DTOs
// =============================================================================

/// Product DTO for output.
///
/// Decouples the domain model from what `--json` prints (camelCase keys,
/// display-rounded prices).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub image_uri: Option<String>,
    pub tax_policy: TaxPolicy,
    pub base_cost: preco_core::Money,
    pub additional_costs: Vec<AdditionalCostDto>,
    pub margin_mode: MarginMode,
    pub margin_value: Decimal,
    pub tax_percentage: Decimal,
    pub pricing: PricingDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            name: p.name,
            image_uri: p.image_uri,
            tax_policy: p.tax_policy,
            base_cost: p.terms.base_cost,
            additional_costs: p
                .terms
                .additional_costs
                .into_iter()
                .map(AdditionalCostDto::from)
                .collect(),
            margin_mode: p.terms.margin_mode,
            margin_value: p.terms.margin_value,
            tax_percentage: p.terms.tax_percentage,
            pricing: p.pricing.into(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl Report for ProductDto {
    fn render(&self, config: &ConfigState) -> String {
        let margin = match self.margin_mode {
            MarginMode::Percentage => config.format_percent(self.margin_value, 2),
            MarginMode::Fixed => {
                format!("{} (fixed)", config.format_money(preco_core::Money::new(self.margin_value)))
            }
        };

        let mut rows = vec![
            ("Tax policy".to_string(), self.tax_policy.to_string()),
            ("Base cost".to_string(), config.format_money(self.base_cost)),
            (
                "Additional costs".to_string(),
                join_costs(config, &self.additional_costs),
            ),
            ("Margin".to_string(), margin),
        ];
        rows.extend(breakdown_rows(config, &self.pricing, self.tax_percentage));
        if let Some(uri) = &self.image_uri {
            rows.push(("Image".to_string(), uri.clone()));
        }
        rows.push(("Updated".to_string(), format_date(&self.updated_at)));

        format!("{} ({})\n{}", self.name, self.id, render_rows(&rows))
    }
}

/// `product list` output: a JSON array, or one line per product.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProductList(pub Vec<ProductDto>);

impl Report for ProductList {
    fn render(&self, config: &ConfigState) -> String {
        if self.0.is_empty() {
            return "No products".to_string();
        }
        self.0
            .iter()
            .map(|p| {
                format!(
                    "{}  {}  {}",
                    p.id,
                    p.name,
                    config.format_money(p.pricing.final_price)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    /// Product name
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub pricing: PricingArgs,

    /// Image location (path or URI)
    #[arg(long)]
    pub image_uri: Option<String>,
}

/// Every field is optional; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Args)]
pub struct UpdateArgs {
    /// Product ID
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub base_cost: Option<String>,

    /// Replaces all additional costs (repeatable)
    #[arg(long = "cost", value_name = "[DESCRIPTION=]VALUE", allow_hyphen_values = true)]
    pub costs: Vec<String>,

    /// Removes all additional costs
    #[arg(long, conflicts_with = "costs")]
    pub clear_costs: bool,

    #[arg(long, value_enum)]
    pub margin_mode: Option<MarginModeArg>,

    #[arg(long, allow_hyphen_values = true)]
    pub margin: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub tax: Option<String>,

    #[arg(long)]
    pub image_uri: Option<String>,

    /// Removes the image
    #[arg(long, conflicts_with = "image_uri")]
    pub clear_image: bool,
}

impl UpdateArgs {
    /// The stored terms as a form, with the given fields replaced.
    fn apply_to(&self, terms: &PricingTerms) -> PricingForm {
        let mut form = form_from_terms(terms);
        if let Some(base_cost) = &self.base_cost {
            form.base_cost = base_cost.clone();
        }
        if self.clear_costs {
            form.additional_costs.clear();
        } else if !self.costs.is_empty() {
            form.additional_costs = self.costs.iter().map(|c| parse_cost_arg(c)).collect();
        }
        if let Some(mode) = self.margin_mode {
            form.margin_mode = mode.into();
        }
        if let Some(margin) = &self.margin {
            form.margin_value = margin.clone();
        }
        if let Some(tax) = &self.tax {
            form.tax_percentage = tax.clone();
        }
        form
    }
}

/// Turns stored terms back into form text so edits re-validate the same way.
fn form_from_terms(terms: &PricingTerms) -> PricingForm {
    PricingForm {
        base_cost: terms.base_cost.amount().to_string(),
        additional_costs: terms
            .additional_costs
            .iter()
            .map(|c| AdditionalCostField::new(c.description.clone(), c.value.amount().to_string()))
            .collect(),
        margin_mode: terms.margin_mode,
        margin_value: terms.margin_value.to_string(),
        tax_percentage: terms.tax_percentage.to_string(),
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Validates, prices and saves a new product with its first history entry.
pub async fn add(ctx: &AppContext, policy: TaxPolicy, args: &AddArgs) -> Result<ProductDto, ApiError> {
    let start = Instant::now();
    debug!(name = %args.name, policy = %policy, "product add command");

    let mut errors = Vec::new();
    if let Err(e) = validate_product_name(&args.name) {
        errors.push(e);
    }
    if let Err(e) = validate_image_uri(args.image_uri.as_deref()) {
        errors.push(e);
    }
    let form = args.pricing.to_form(&ctx.config);
    let terms = validate_terms(&form, policy, errors)?;

    let now = Utc::now();
    let product = Product::new(
        generate_id(),
        args.name.as_str(),
        terms,
        policy,
        args.image_uri.clone(),
        now,
    )?;
    let calculation = Calculation::for_product(generate_id(), &product, now);

    ctx.db
        .inner()
        .save_product_with_calculation(&product, &calculation)
        .await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        id = %product.id,
        calculation_id = %calculation.id,
        "Product saved"
    );

    Ok(product.into())
}

/// Edits a stored product, reprices it and appends a history entry.
///
/// The tax policy is `policy_flag` when given, otherwise the product's own.
pub async fn update(
    ctx: &AppContext,
    policy_flag: Option<TaxPolicy>,
    args: &UpdateArgs,
) -> Result<ProductDto, ApiError> {
    let start = Instant::now();
    debug!(id = %args.id, "product update command");
    let id = record_id("id", &args.id)?;

    let db = ctx.db.inner();
    let mut product = db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;
    let policy = policy_flag.unwrap_or(product.tax_policy);

    let mut errors = Vec::new();
    if let Some(name) = &args.name {
        if let Err(e) = validate_product_name(name) {
            errors.push(e);
        }
    }
    if let Err(e) = validate_image_uri(args.image_uri.as_deref()) {
        errors.push(e);
    }
    let form = args.apply_to(&product.terms);
    let terms = validate_terms(&form, policy, errors)?;

    let now = Utc::now();
    product.reprice(terms, policy, now)?;
    if let Some(name) = &args.name {
        product.rename(name.as_str(), now);
    }
    if args.clear_image {
        product.image_uri = None;
    } else if args.image_uri.is_some() {
        product.image_uri = args.image_uri.clone();
    }

    let calculation = Calculation::for_product(generate_id(), &product, now);
    db.save_product_with_calculation(&product, &calculation)
        .await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        id = %product.id,
        calculation_id = %calculation.id,
        "Product updated"
    );

    Ok(product.into())
}

/// Lists products newest first, optionally filtered by a name fragment.
pub async fn list(ctx: &AppContext, search: Option<&str>) -> Result<ProductList, ApiError> {
    let start = Instant::now();
    let products = ctx.db.inner().products();

    let found = match search {
        Some(query) => {
            let query = validate_search_query(query).map_err(FormErrors::from)?;
            products.search(&query).await?
        }
        None => products.list().await?,
    };

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = found.len(),
        "product list complete"
    );

    Ok(ProductList(found.into_iter().map(ProductDto::from).collect()))
}

/// Gets a single product by its UUID.
pub async fn show(ctx: &AppContext, id: &str) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "product show command");
    let id = record_id("id", id)?;
    let product = ctx
        .db
        .inner()
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(product.into())
}

/// Deletes a product. Its history entries stay, detached.
pub async fn delete(ctx: &AppContext, id: &str) -> Result<Deleted, ApiError> {
    let id = record_id("id", id)?;
    ctx.db.inner().products().delete(&id).await?;
    info!(id = %id, "Product deleted");

    Ok(Deleted { kind: "product", id })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    async fn ctx() -> AppContext {
        AppContext::in_memory(ConfigState::default()).await.unwrap()
    }

    fn add_args(name: &str, base: &str, costs: &[&str]) -> AddArgs {
        AddArgs {
            name: name.to_string(),
            pricing: PricingArgs {
                base_cost: base.to_string(),
                costs: costs.iter().map(|c| c.to_string()).collect(),
                margin_mode: MarginModeArg::Percentage,
                margin: Some("25".to_string()),
                tax: Some("18".to_string()),
            },
            image_uri: None,
        }
    }

    #[tokio::test]
    async fn test_add_saves_product_and_history() {
        let ctx = ctx().await;
        let dto = add(
            &ctx,
            TaxPolicy::OnPreTaxPrice,
            &add_args("Cadeira", "800", &["Frete=25", "Embalagem=15"]),
        )
        .await
        .unwrap();

        assert_eq!(dto.pricing.final_price.amount(), dec!(1239));
        assert_eq!(dto.additional_costs.len(), 2);
        assert_eq!(dto.additional_costs[0].description, "Frete");

        let history = ctx
            .db
            .inner()
            .calculations()
            .list_for_product(&dto.id, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].product_name, "Cadeira");
    }

    #[tokio::test]
    async fn test_add_reports_every_invalid_field() {
        let ctx = ctx().await;
        let err = add(&ctx, TaxPolicy::GrossUp, &{
            let mut args = add_args("", "-1", &["abc"]);
            args.pricing.tax = Some("100".to_string());
            args
        })
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["name", "base_cost", "additional_costs[0]", "tax_percentage"]
        );
        assert_eq!(ctx.db.inner().products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_keeps_omitted_fields() {
        let ctx = ctx().await;
        let dto = add(
            &ctx,
            TaxPolicy::OnPreTaxPrice,
            &add_args("Cadeira", "800", &["25", "15"]),
        )
        .await
        .unwrap();

        let updated = update(
            &ctx,
            None,
            &UpdateArgs {
                id: dto.id.clone(),
                tax: Some("10".to_string()),
                ..UpdateArgs::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Cadeira");
        assert_eq!(updated.tax_policy, TaxPolicy::OnPreTaxPrice);
        assert_eq!(updated.additional_costs.len(), 2);
        assert_eq!(updated.pricing.price_before_tax.amount(), dec!(1050));
        assert_eq!(updated.pricing.final_price.amount(), dec!(1155));
        assert_eq!(updated.created_at, dto.created_at);

        let history = ctx
            .db
            .inner()
            .calculations()
            .list_for_product(&dto.id, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_update_switches_policy_and_clears() {
        let ctx = ctx().await;
        let mut args = add_args("Mesa", "800", &["25", "15"]);
        args.image_uri = Some("file:///mesa.jpg".to_string());
        let dto = add(&ctx, TaxPolicy::OnPreTaxPrice, &args).await.unwrap();

        let updated = update(
            &ctx,
            Some(TaxPolicy::GrossUp),
            &UpdateArgs {
                id: dto.id.clone(),
                name: Some("Mesa grande".to_string()),
                clear_costs: true,
                clear_image: true,
                ..UpdateArgs::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Mesa grande");
        assert_eq!(updated.tax_policy, TaxPolicy::GrossUp);
        assert!(updated.additional_costs.is_empty());
        assert!(updated.image_uri.is_none());
        // 800 * 1.25 / 0.82
        assert_eq!(updated.pricing.final_price.amount(), dec!(1219.51));
    }

    #[tokio::test]
    async fn test_update_invalid_leaves_product_untouched() {
        let ctx = ctx().await;
        let dto = add(&ctx, TaxPolicy::OnPreTaxPrice, &add_args("Banco", "100", &[]))
            .await
            .unwrap();

        let err = update(
            &ctx,
            None,
            &UpdateArgs {
                id: dto.id.clone(),
                base_cost: Some("abc".to_string()),
                ..UpdateArgs::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let stored = show(&ctx, &dto.id).await.unwrap();
        assert_eq!(stored.base_cost.amount(), dec!(100));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let ctx = ctx().await;
        let err = update(
            &ctx,
            None,
            &UpdateArgs {
                id: "0b5e3f5c-8d1a-4c7e-9f2b-6a4d3c2b1a00".to_string(),
                ..UpdateArgs::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let ctx = ctx().await;
        let dto = add(&ctx, TaxPolicy::OnPreTaxPrice, &add_args("Vaso", "50", &[]))
            .await
            .unwrap();

        let err = show(&ctx, "p-1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.fields[0].field, "id");

        let err = delete(&ctx, "").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = update(
            &ctx,
            None,
            &UpdateArgs {
                id: "vaso".to_string(),
                ..UpdateArgs::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // Uppercase finds the stored lowercase id
        let shown = show(&ctx, &dto.id.to_uppercase()).await.unwrap();
        assert_eq!(shown.id, dto.id);
    }

    #[tokio::test]
    async fn test_list_and_search() {
        let ctx = ctx().await;
        for name in ["Cadeira azul", "Mesa", "Cadeira verde"] {
            add(&ctx, TaxPolicy::OnPreTaxPrice, &add_args(name, "10", &[]))
                .await
                .unwrap();
        }

        let all = list(&ctx, None).await.unwrap();
        assert_eq!(all.0.len(), 3);
        assert_eq!(all.0[0].name, "Cadeira verde");

        let chairs = list(&ctx, Some("cadeira")).await.unwrap();
        assert_eq!(chairs.0.len(), 2);

        let text = chairs.render(&ctx.config);
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_delete_keeps_history() {
        let ctx = ctx().await;
        let dto = add(&ctx, TaxPolicy::OnPreTaxPrice, &add_args("Vaso", "50", &[]))
            .await
            .unwrap();

        delete(&ctx, &dto.id).await.unwrap();
        assert_eq!(show(&ctx, &dto.id).await.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(delete(&ctx, &dto.id).await.unwrap_err().code, ErrorCode::NotFound);

        let history = ctx.db.inner().calculations().list(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].product_id.is_none());
        assert_eq!(history[0].product_name, "Vaso");
    }

    #[test]
    fn test_form_from_terms_round_trips_values() {
        let terms = PricingForm {
            base_cost: "1.234,56".to_string(),
            additional_costs: vec![AdditionalCostField::new("Frete", "7,5")],
            margin_mode: MarginMode::Fixed,
            margin_value: "-5".to_string(),
            tax_percentage: "12,5".to_string(),
        }
        .validate()
        .unwrap();

        assert_eq!(form_from_terms(&terms).validate().unwrap(), terms);
    }
}

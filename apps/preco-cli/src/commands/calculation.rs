//! # History Commands
//!
//! The calculation history: list, show (shareable summary), delete, clear.
//!
//! Entries are written by `product add`, `product update` and
//! `calc --record`; they are never edited.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use super::{
    format_date, join_costs, record_id, render_rows, AdditionalCostDto, Deleted, PricingDto,
    Report,
};
use crate::error::ApiError;
use crate::state::{AppContext, ConfigState};
use preco_core::{Calculation, MarginMode, Money, TaxPolicy};

/// Default number of entries `history list` shows.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationDto {
    pub id: String,
    pub product_id: Option<String>,
    pub product_name: String,
    pub tax_policy: TaxPolicy,
    pub base_cost: Money,
    pub additional_costs: Vec<AdditionalCostDto>,
    pub margin_mode: MarginMode,
    pub margin_value: Decimal,
    pub tax_percentage: Decimal,
    pub pricing: PricingDto,
    pub created_at: DateTime<Utc>,
}

impl From<Calculation> for CalculationDto {
    fn from(c: Calculation) -> Self {
        CalculationDto {
            id: c.id,
            product_id: c.product_id,
            product_name: c.product_name,
            tax_policy: c.tax_policy,
            base_cost: c.terms.base_cost,
            additional_costs: c
                .terms
                .additional_costs
                .into_iter()
                .map(AdditionalCostDto::from)
                .collect(),
            margin_mode: c.terms.margin_mode,
            margin_value: c.terms.margin_value,
            tax_percentage: c.terms.tax_percentage,
            pricing: c.pricing.into(),
            created_at: c.created_at,
        }
    }
}

impl CalculationDto {
    /// The text a user would paste into a message.
    ///
    /// ```text
    /// Details: Cadeira
    /// Date: 14/10/2026 09:30 UTC
    ///
    /// Base cost:         R$ 800,00
    /// Profit (25,0%):    R$ 210,00
    /// ...
    ///
    /// Additional costs: Frete: R$ 25,00, Embalagem: R$ 15,00
    /// ```
    pub fn share_summary(&self, config: &ConfigState) -> String {
        let rows = vec![
            ("Base cost".to_string(), config.format_money(self.base_cost)),
            (
                format!("Profit ({})", config.format_percent_fixed(self.pricing.profit_percentage)),
                config.format_money(self.pricing.profit_amount),
            ),
            (
                "Price before tax".to_string(),
                config.format_money(self.pricing.price_before_tax),
            ),
            (
                format!("Tax ({})", config.format_percent(self.tax_percentage, 2)),
                config.format_money(self.pricing.tax_amount),
            ),
            (
                "Final price".to_string(),
                config.format_money(self.pricing.final_price),
            ),
        ];

        format!(
            "Details: {}\nDate: {}\n\n{}\n\nAdditional costs: {}",
            self.product_name,
            format_date(&self.created_at),
            render_rows(&rows),
            join_costs(config, &self.additional_costs)
        )
    }
}

impl Report for CalculationDto {
    fn render(&self, config: &ConfigState) -> String {
        self.share_summary(config)
    }
}

/// `history list` output.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CalculationList(pub Vec<CalculationDto>);

impl Report for CalculationList {
    fn render(&self, config: &ConfigState) -> String {
        if self.0.is_empty() {
            return "No calculations".to_string();
        }
        self.0
            .iter()
            .map(|c| {
                let detached = if c.product_id.is_none() { " *" } else { "" };
                format!(
                    "{}  {}  {}{}  {}",
                    c.id,
                    format_date(&c.created_at),
                    c.product_name,
                    detached,
                    config.format_money(c.pricing.final_price)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `history clear` output.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cleared {
    pub removed: u64,
}

impl Report for Cleared {
    fn render(&self, _config: &ConfigState) -> String {
        format!("Removed {} calculations", self.removed)
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Lists history entries newest first.
///
/// With `product_id`, only that product's entries.
pub async fn list(
    ctx: &AppContext,
    limit: u32,
    product_id: Option<&str>,
) -> Result<CalculationList, ApiError> {
    let start = Instant::now();
    let calculations = ctx.db.inner().calculations();

    let entries = match product_id {
        Some(id) => {
            let id = record_id("product", id)?;
            calculations.list_for_product(&id, limit).await?
        }
        None => calculations.list(limit).await?,
    };

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = entries.len(),
        "history list complete"
    );

    Ok(CalculationList(
        entries.into_iter().map(CalculationDto::from).collect(),
    ))
}

pub async fn show(ctx: &AppContext, id: &str) -> Result<CalculationDto, ApiError> {
    debug!(id = %id, "history show command");
    let id = record_id("id", id)?;
    let calculation = ctx
        .db
        .inner()
        .calculations()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Calculation", &id))?;

    Ok(calculation.into())
}

pub async fn delete(ctx: &AppContext, id: &str) -> Result<Deleted, ApiError> {
    let id = record_id("id", id)?;
    ctx.db.inner().calculations().delete(&id).await?;
    info!(id = %id, "Calculation deleted");

    Ok(Deleted {
        kind: "calculation",
        id,
    })
}

/// Removes every history entry. Requires `confirmed`.
pub async fn clear(ctx: &AppContext, confirmed: bool) -> Result<Cleared, ApiError> {
    if !confirmed {
        return Err(ApiError::validation(
            "Refusing to clear the history without --yes",
        ));
    }

    let removed = ctx.db.inner().calculations().clear().await?;
    info!(removed = removed, "Calculation history cleared");

    Ok(Cleared { removed })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::TimeZone;
    use preco_core::{AdditionalCost, PricingTerms};
    use rust_decimal_macros::dec;

    const FIRST: &str = "7d3f2a10-5b8c-4e6f-a1d2-3c4b5a697801";
    const SECOND: &str = "7d3f2a10-5b8c-4e6f-a1d2-3c4b5a697802";

    async fn ctx() -> AppContext {
        AppContext::in_memory(ConfigState::default()).await.unwrap()
    }

    fn standalone(id: &str, name: &str, costs: Vec<AdditionalCost>) -> Calculation {
        let terms = PricingTerms {
            base_cost: Money::new(dec!(800)),
            additional_costs: costs,
            margin_mode: MarginMode::Percentage,
            margin_value: dec!(25),
            tax_percentage: dec!(18),
        };
        let at = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap();
        Calculation::standalone(id, name, terms, TaxPolicy::OnPreTaxPrice, at).unwrap()
    }

    #[test]
    fn test_share_summary() {
        let calc = standalone(
            "c-1",
            "Cadeira",
            vec![
                AdditionalCost::new("Frete", Money::new(dec!(25))),
                AdditionalCost::new("Embalagem", Money::new(dec!(15))),
            ],
        );
        let text = CalculationDto::from(calc).share_summary(&ConfigState::default());

        assert!(text.starts_with("Details: Cadeira\nDate: 14/10/2026 09:30 UTC\n"));
        assert!(text.contains("Profit (25,0%):"));
        assert!(text.contains("R$ 1050,00"));
        assert!(text.contains("Tax (18%):"));
        assert!(text.contains("R$ 1239,00"));
        assert!(text.ends_with("Additional costs: Frete: R$ 25,00, Embalagem: R$ 15,00"));
    }

    #[test]
    fn test_share_summary_without_costs() {
        let calc = standalone("c-1", "Avulso", vec![]);
        let text = CalculationDto::from(calc).share_summary(&ConfigState::default());
        assert!(text.ends_with("Additional costs: none"));
    }

    #[tokio::test]
    async fn test_list_show_delete() {
        let ctx = ctx().await;
        let calculations = ctx.db.inner().calculations();
        calculations.insert(&standalone(FIRST, "Um", vec![])).await.unwrap();
        calculations.insert(&standalone(SECOND, "Dois", vec![])).await.unwrap();

        let all = list(&ctx, DEFAULT_LIST_LIMIT, None).await.unwrap();
        assert_eq!(all.0.len(), 2);
        let one = list(&ctx, 1, None).await.unwrap();
        assert_eq!(one.0.len(), 1);

        let shown = show(&ctx, FIRST).await.unwrap();
        assert_eq!(shown.product_name, "Um");

        delete(&ctx, FIRST).await.unwrap();
        assert_eq!(show(&ctx, FIRST).await.unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(delete(&ctx, FIRST).await.unwrap_err().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_malformed_ids_are_rejected() {
        let ctx = ctx().await;

        let err = show(&ctx, "c-1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.fields[0].field, "id");

        let err = delete(&ctx, "c-1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = list(&ctx, DEFAULT_LIST_LIMIT, Some("cadeira")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.fields[0].field, "product");
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let ctx = ctx().await;
        let calculations = ctx.db.inner().calculations();
        calculations.insert(&standalone(FIRST, "Um", vec![])).await.unwrap();
        calculations.insert(&standalone(SECOND, "Dois", vec![])).await.unwrap();

        let err = clear(&ctx, false).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(calculations.count().await.unwrap(), 2);

        let cleared = clear(&ctx, true).await.unwrap();
        assert_eq!(cleared.removed, 2);
        assert_eq!(calculations.count().await.unwrap(), 0);
    }
}

use rust_decimal::Decimal;

use super::{check_amount, clearable_text, max_amount, optional_text, required_text, ValidationErrors};
use crate::models::{
    CatalogItem, CatalogItemPatch, CreateCatalogItemRequest, ItemStatus, NewCatalogItem, PricingType,
    UpdateCatalogItemRequest,
};

pub const NAME_MAX: usize = 255;
pub const DESCRIPTION_MAX: usize = 5000;
pub const CATEGORY_MAX: usize = 100;
pub const SKU_MAX: usize = 64;
pub const DURATION_MAX_MINUTES: i32 = 10_080;
pub const DEFAULT_CURRENCY: &str = "INR";

pub fn validate_create_item(req: CreateCatalogItemRequest) -> Result<NewCatalogItem, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = required_text(&mut errors, "name", req.name.as_deref(), NAME_MAX);
    let description = optional_text(&mut errors, "description", req.description.as_deref(), DESCRIPTION_MAX);
    let category = optional_text(&mut errors, "category", req.category.as_deref(), CATEGORY_MAX);
    let sku = sku(&mut errors, req.sku.as_deref()).flatten();

    if req.item_type.is_none() {
        errors.add("item_type", "is required");
    }
    if req.pricing_type.is_none() {
        errors.add("pricing_type", "is required");
    }

    // Free items may omit the price
    let unit_price = match (req.unit_price, req.pricing_type) {
        (Some(price), _) => check_price(&mut errors, price),
        (None, Some(PricingType::Free)) => Some(Decimal::ZERO),
        (None, _) => {
            errors.add("unit_price", "is required");
            None
        }
    };
    let currency = match req.currency.as_deref() {
        Some(raw) => currency(&mut errors, raw),
        None => Some(DEFAULT_CURRENCY.to_string()),
    };
    if let Some(rate) = req.tax_rate {
        check_tax_rate(&mut errors, rate);
    }
    if let Some(minutes) = req.duration_minutes {
        check_duration(&mut errors, minutes);
    }

    let (Some(name), Some(item_type), Some(pricing_type), Some(unit_price), Some(currency)) =
        (name, req.item_type, req.pricing_type, unit_price, currency)
    else {
        return Err(errors);
    };

    let item = NewCatalogItem {
        name,
        description,
        item_type,
        category,
        sku,
        pricing_type,
        unit_price,
        currency,
        tax_rate: req.tax_rate,
        duration_minutes: req.duration_minutes,
        image_url: None,
        status: req.status.unwrap_or(ItemStatus::Draft),
    };
    check_pricing_rules(&mut errors, pricing_type, item.unit_price, item.duration_minutes);
    errors.into_result(item)
}

pub fn validate_update_item(req: UpdateCatalogItemRequest) -> Result<CatalogItemPatch, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = match req.name.as_deref() {
        Some(raw) => required_text(&mut errors, "name", Some(raw), NAME_MAX),
        None => None,
    };
    let patch = CatalogItemPatch {
        name,
        description: clearable_text(&mut errors, "description", req.description.as_deref(), DESCRIPTION_MAX),
        item_type: req.item_type,
        category: clearable_text(&mut errors, "category", req.category.as_deref(), CATEGORY_MAX),
        sku: sku(&mut errors, req.sku.as_deref()),
        pricing_type: req.pricing_type,
        unit_price: req.unit_price.and_then(|price| check_price(&mut errors, price)),
        currency: req.currency.as_deref().and_then(|raw| currency(&mut errors, raw)),
        tax_rate: req.tax_rate.map(|rate| {
            check_tax_rate(&mut errors, rate);
            Some(rate)
        }),
        duration_minutes: req.duration_minutes.map(|minutes| {
            check_duration(&mut errors, minutes);
            Some(minutes)
        }),
        image_url: None,
        status: req.status,
    };

    if errors.is_empty() && patch.is_empty() {
        errors.add("body", "at least one field must be provided");
    }
    errors.into_result(patch)
}

/// Cross-field rules checked against the row an update would produce
pub fn validate_catalog_item(item: &CatalogItem) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_pricing_rules(&mut errors, item.pricing_type, item.unit_price, item.duration_minutes);
    errors.into_result(())
}

fn check_pricing_rules(
    errors: &mut ValidationErrors,
    pricing_type: PricingType,
    unit_price: Decimal,
    duration_minutes: Option<i32>,
) {
    if pricing_type == PricingType::Free && !unit_price.is_zero() {
        errors.add("unit_price", "must be 0 for free items");
    }
    if pricing_type.requires_duration() && duration_minutes.is_none() {
        errors.add("duration_minutes", format!("is required for {} pricing", pricing_type));
    }
}

fn check_price(errors: &mut ValidationErrors, price: Decimal) -> Option<Decimal> {
    check_amount(errors, "unit_price", price, max_amount()).then_some(price)
}

// NUMERIC(5,2)
fn check_tax_rate(errors: &mut ValidationErrors, rate: Decimal) {
    if (rate.is_sign_negative() && !rate.is_zero()) || rate > Decimal::ONE_HUNDRED {
        errors.add("tax_rate", "must be between 0 and 100");
    } else if rate.normalize().scale() > 2 {
        errors.add("tax_rate", "must have at most 2 decimal places");
    }
}

fn check_duration(errors: &mut ValidationErrors, minutes: i32) {
    if !(1..=DURATION_MAX_MINUTES).contains(&minutes) {
        errors.add("duration_minutes", format!("must be between 1 and {}", DURATION_MAX_MINUTES));
    }
}

fn currency(errors: &mut ValidationErrors, raw: &str) -> Option<String> {
    let code = raw.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code.to_ascii_uppercase())
    } else {
        errors.add("currency", "must be a 3-letter ISO 4217 code");
        None
    }
}

/// `None` when absent, `Some(None)` when blank
fn sku(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<Option<String>> {
    let value = clearable_text(errors, "sku", raw, SKU_MAX)?;
    if let Some(code) = &value {
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            errors.add("sku", "may only contain letters, digits, '-' and '_'");
            return None;
        }
    }
    Some(value)
}

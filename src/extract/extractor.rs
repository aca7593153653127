use crate::extract::parse_price;
use crate::recipe::{
    CompiledField, CompiledSelector, ExtractionRecipe, CURRENCY_FIELD, PRICE_FIELD, TITLE_FIELD,
};
use regex::Regex;
use rust_decimal::Decimal;
use scraper::Html;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Values pulled out of one page by a recipe
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    /// `product_title` field, if matched
    pub title: Option<String>,
    /// Normalized `price`, `None` when unmatched or unparseable
    pub price: Option<Decimal>,
    /// Raw text the price was parsed from
    pub raw_price: Option<String>,
    /// `currency` field, if matched
    pub currency: Option<String>,
    /// Every other field, as raw strings
    pub extra: BTreeMap<String, String>,
    /// Names of fields whose selector matched nothing
    pub misses: Vec<String>,
}

/// Applies extraction recipes to HTML
///
/// Extraction never fails: a selector that matches nothing is logged and
/// recorded in [`ExtractedFields::misses`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceExtractor;

impl PriceExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates every field of `recipe` against `html`
    pub fn extract(&self, html: &str, recipe: &ExtractionRecipe) -> ExtractedFields {
        let document = Html::parse_document(html);
        let mut fields = ExtractedFields::default();

        for field in &recipe.compiled {
            let Some(value) = evaluate(field, &document, html) else {
                if field.name == PRICE_FIELD {
                    warn!(domain = recipe.domain(), field = %field.name, "Price selector matched nothing");
                } else {
                    debug!(domain = recipe.domain(), field = %field.name, "Selector matched nothing");
                }
                fields.misses.push(field.name.clone());
                continue;
            };

            match field.name.as_str() {
                PRICE_FIELD => {
                    fields.price = parse_price(&value);
                    if fields.price.is_none() {
                        warn!(domain = recipe.domain(), raw = %value, "Could not parse price");
                    }
                    fields.raw_price = Some(value);
                }
                TITLE_FIELD => fields.title = Some(value),
                CURRENCY_FIELD => fields.currency = Some(value),
                _ => {
                    fields.extra.insert(field.name.clone(), value);
                }
            }
        }

        fields
    }
}

/// Evaluates one compiled field; `None` when nothing (or only whitespace) matched
fn evaluate(field: &CompiledField, document: &Html, raw_html: &str) -> Option<String> {
    let value = match &field.selector {
        CompiledSelector::Css {
            selector,
            attribute,
        } => {
            let element = document.select(selector).next()?;
            match attribute {
                Some(name) => element.value().attr(name)?.to_string(),
                None => element.text().collect::<String>(),
            }
        }
        CompiledSelector::Regex(pattern) => first_capture(pattern, raw_html)?,
    };

    let value = match &field.cleanup {
        Some(cleanup) => first_capture(cleanup, &value)?,
        None => value,
    };

    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Capture group 1 if the pattern has one, else the whole match
fn first_capture(pattern: &Regex, haystack: &str) -> Option<String> {
    let captures = pattern.captures(haystack)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
}

use regex::Regex;
use scraper::Selector;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Field name of the required price selector
pub const PRICE_FIELD: &str = "price";
/// Field name of the product title selector
pub const TITLE_FIELD: &str = "product_title";
/// Field name of the currency selector
pub const CURRENCY_FIELD: &str = "currency";

/// How a selector expression is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    #[default]
    Css,
    /// Declared for recipe compatibility; rejected at validation
    Xpath,
    Regex,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Css => "css",
            SelectorKind::Xpath => "xpath",
            SelectorKind::Regex => "regex",
        }
    }
}

/// One field's selector as written in a recipe file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectorSpec {
    #[serde(default)]
    pub kind: SelectorKind,

    /// CSS selector or regex pattern
    pub expression: String,

    /// Attribute to read instead of the element text (CSS only)
    #[serde(default)]
    pub attribute: Option<String>,

    /// Optional regex applied to the extracted value; keeps capture group 1
    /// (or the whole match)
    #[serde(default)]
    pub cleanup: Option<String>,
}

impl SelectorSpec {
    /// A CSS selector reading element text
    pub fn css(expression: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Css,
            expression: expression.into(),
            attribute: None,
            cleanup: None,
        }
    }

    /// A regex evaluated against the raw HTML
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            kind: SelectorKind::Regex,
            expression: pattern.into(),
            attribute: None,
            cleanup: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn with_cleanup(mut self, pattern: impl Into<String>) -> Self {
        self.cleanup = Some(pattern.into());
        self
    }
}

/// Per-recipe fetch and record options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecipeOptions {
    /// Wait for client-side content before extracting
    #[serde(default)]
    pub dynamic: bool,

    /// Selector to wait for in dynamic mode; defaults to the CSS price selector
    #[serde(default)]
    pub wait_selector: Option<String>,

    /// Currency used when the page has no currency field
    #[serde(default)]
    pub currency: Option<String>,
}

/// Recipe document as deserialized from TOML, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeFile {
    pub domain: String,
    pub fields: BTreeMap<String, SelectorSpec>,
    #[serde(default)]
    pub options: RecipeOptions,
}

/// A selector compiled at load time
#[derive(Debug, Clone)]
pub(crate) enum CompiledSelector {
    Css {
        selector: Selector,
        attribute: Option<String>,
    },
    Regex(Regex),
}

/// A compiled field: selector plus optional cleanup pattern
#[derive(Debug, Clone)]
pub(crate) struct CompiledField {
    pub(crate) name: String,
    pub(crate) selector: CompiledSelector,
    pub(crate) cleanup: Option<Regex>,
}

/// A validated, immutable extraction recipe
///
/// Construct through [`ExtractionRecipe::new`] or the loaders; both reject
/// recipes without a `price` selector, unsupported selector kinds, and
/// expressions that do not compile.
#[derive(Debug, Clone)]
pub struct ExtractionRecipe {
    domain: String,
    fields: BTreeMap<String, SelectorSpec>,
    options: RecipeOptions,
    pub(crate) compiled: Vec<CompiledField>,
}

impl ExtractionRecipe {
    pub(crate) fn from_parts(
        domain: String,
        fields: BTreeMap<String, SelectorSpec>,
        options: RecipeOptions,
        compiled: Vec<CompiledField>,
    ) -> Self {
        Self {
            domain,
            fields,
            options,
            compiled,
        }
    }

    /// Exact host or `*.`-wildcard this recipe applies to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn fields(&self) -> &BTreeMap<String, SelectorSpec> {
        &self.fields
    }

    pub fn options(&self) -> &RecipeOptions {
        &self.options
    }

    /// The selector to wait for when rendering dynamically
    ///
    /// Falls back to the price selector when it is CSS.
    pub fn wait_selector(&self) -> Option<&str> {
        if !self.options.dynamic {
            return None;
        }
        self.options.wait_selector.as_deref().or_else(|| {
            self.fields
                .get(PRICE_FIELD)
                .filter(|spec| spec.kind == SelectorKind::Css)
                .map(|spec| spec.expression.as_str())
        })
    }

    /// Recipe-level currency, `"USD"` when unset
    pub fn default_currency(&self) -> &str {
        self.options.currency.as_deref().unwrap_or("USD")
    }
}

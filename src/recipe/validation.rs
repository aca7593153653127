use crate::recipe::types::{
    CompiledField, CompiledSelector, ExtractionRecipe, RecipeFile, RecipeOptions, SelectorKind,
    SelectorSpec, PRICE_FIELD,
};
use crate::recipe::RecipeError;
use regex::Regex;
use scraper::Selector;
use std::collections::BTreeMap;

impl ExtractionRecipe {
    /// Validates and compiles a recipe
    ///
    /// # Returns
    ///
    /// * `Ok(ExtractionRecipe)` - Every selector compiled
    /// * `Err(RecipeError)` - Missing price, bad domain, unsupported kind, or bad expression
    pub fn new(
        domain: impl Into<String>,
        fields: BTreeMap<String, SelectorSpec>,
        options: RecipeOptions,
    ) -> Result<Self, RecipeError> {
        let domain = domain.into().trim().to_lowercase();
        validate_domain_pattern(&domain)?;

        if !fields.contains_key(PRICE_FIELD) {
            return Err(RecipeError::MissingPrice { domain });
        }

        let compiled = fields
            .iter()
            .map(|(name, spec)| compile_field(name, spec))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(wait) = &options.wait_selector {
            Selector::parse(wait).map_err(|e| RecipeError::InvalidSelector {
                field: "wait_selector".to_string(),
                expression: wait.clone(),
                reason: format!("{:?}", e),
            })?;
        }

        Ok(ExtractionRecipe::from_parts(domain, fields, options, compiled))
    }
}

impl TryFrom<RecipeFile> for ExtractionRecipe {
    type Error = RecipeError;

    fn try_from(file: RecipeFile) -> Result<Self, Self::Error> {
        ExtractionRecipe::new(file.domain, file.fields, file.options)
    }
}

fn compile_field(name: &str, spec: &SelectorSpec) -> Result<CompiledField, RecipeError> {
    let invalid = |reason: String| RecipeError::InvalidSelector {
        field: name.to_string(),
        expression: spec.expression.clone(),
        reason,
    };

    if spec.expression.trim().is_empty() {
        return Err(invalid("expression is empty".to_string()));
    }

    let selector = match spec.kind {
        SelectorKind::Css => CompiledSelector::Css {
            selector: Selector::parse(&spec.expression).map_err(|e| invalid(format!("{:?}", e)))?,
            attribute: spec.attribute.clone(),
        },
        SelectorKind::Regex => {
            CompiledSelector::Regex(Regex::new(&spec.expression).map_err(|e| invalid(e.to_string()))?)
        }
        SelectorKind::Xpath => {
            return Err(RecipeError::UnsupportedSelectorKind {
                field: name.to_string(),
                kind: spec.kind.as_str().to_string(),
            })
        }
    };

    let cleanup = spec
        .cleanup
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| RecipeError::InvalidSelector {
            field: name.to_string(),
            expression: spec.cleanup.clone().unwrap_or_default(),
            reason: e.to_string(),
        })?;

    Ok(CompiledField {
        name: name.to_string(),
        selector,
        cleanup,
    })
}

/// Validates a recipe domain (exact host or `*.` wildcard)
fn validate_domain_pattern(pattern: &str) -> Result<(), RecipeError> {
    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

    if domain.is_empty() {
        return Err(RecipeError::InvalidDomain(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(RecipeError::InvalidDomain(format!(
            "Domain '{}' contains invalid characters",
            pattern
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(RecipeError::InvalidDomain(format!(
            "Domain '{}' is malformed",
            pattern
        )));
    }

    Ok(())
}

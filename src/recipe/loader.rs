use crate::recipe::types::{ExtractionRecipe, RecipeFile};
use crate::recipe::RecipeError;
use crate::url::matches_wildcard;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads and validates a recipe from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the recipe file
///
/// # Returns
///
/// * `Ok(ExtractionRecipe)` - Successfully loaded and compiled recipe
/// * `Err(RecipeError)` - Failed to read, parse, or validate the recipe
pub fn load_recipe(path: &Path) -> Result<ExtractionRecipe, RecipeError> {
    let content = std::fs::read_to_string(path)?;
    let recipe = parse_recipe(&content)?;
    info!(path = %path.display(), domain = recipe.domain(), "Loaded recipe");
    Ok(recipe)
}

/// Parses and validates a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<ExtractionRecipe, RecipeError> {
    let file: RecipeFile = toml::from_str(content)?;
    ExtractionRecipe::try_from(file)
}

/// Loads every `*.toml` recipe in a directory
///
/// A missing directory yields an empty book. Files that fail to load are
/// logged and skipped so one broken recipe does not stop the others.
pub fn load_recipes_from_dir(dir: &Path) -> Result<RecipeBook, RecipeError> {
    let mut book = RecipeBook::new();

    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Recipe directory not found");
        return Ok(book);
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        match load_recipe(&path) {
            Ok(recipe) => book.insert(recipe),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping invalid recipe"),
        }
    }

    info!(count = book.len(), dir = %dir.display(), "Recipes loaded");
    Ok(book)
}

/// Recipes indexed by the host they apply to
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    exact: HashMap<String, Arc<ExtractionRecipe>>,
    wildcard: Vec<Arc<ExtractionRecipe>>,
}

impl RecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipe, replacing any previous one for the same domain pattern
    pub fn insert(&mut self, recipe: ExtractionRecipe) {
        let recipe = Arc::new(recipe);
        if recipe.domain().starts_with("*.") {
            if let Some(existing) = self
                .wildcard
                .iter_mut()
                .find(|r| r.domain() == recipe.domain())
            {
                warn!(domain = recipe.domain(), "Replacing duplicate recipe");
                *existing = recipe;
            } else {
                self.wildcard.push(recipe);
            }
        } else if self
            .exact
            .insert(recipe.domain().to_string(), Arc::clone(&recipe))
            .is_some()
        {
            warn!(domain = recipe.domain(), "Replacing duplicate recipe");
        }
    }

    /// Finds the recipe for a host: exact match first, then the most specific wildcard
    pub fn find(&self, host: &str) -> Option<Arc<ExtractionRecipe>> {
        let host = host.to_lowercase();
        if let Some(recipe) = self.exact.get(&host) {
            return Some(Arc::clone(recipe));
        }

        let found = self
            .wildcard
            .iter()
            .filter(|r| matches_wildcard(r.domain(), &host))
            .max_by_key(|r| r.domain().len())
            .cloned();
        if found.is_none() {
            debug!(host, "No recipe for host");
        }
        found
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All recipes, exact ones first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ExtractionRecipe>> {
        self.exact.values().chain(self.wildcard.iter())
    }
}

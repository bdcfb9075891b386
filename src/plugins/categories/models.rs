use serde::Deserialize;
use validator::Validate;

use crate::http_error::AppError;
use crate::plugins::shared::{clearable, explicit_null};
use crate::slug::slugify;
use crate::store::CategoryChanges;

#[derive(Deserialize, Validate, Debug, Default)]
pub struct CategoryPayload {
    #[validate(length(min = 2, max = 50, message = "Category name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
}

impl CategoryPayload {
    /// Trims, validates and derives the slug. Absent fields stay `None`.
    pub fn validated(mut self) -> Result<CategoryChanges, AppError> {
        self.name = self.name.map(|n| n.trim().to_string());
        self.validate()?;

        let slug = self.name.as_deref().map(slugify);
        if slug.as_deref() == Some("") {
            return Err(AppError::validation("Category name must contain at least one letter or digit"));
        }
        Ok(CategoryChanges { name: self.name, slug, description: clearable(self.description) })
    }
}

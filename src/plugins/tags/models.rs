use serde::Deserialize;
use validator::Validate;

use crate::http_error::AppError;
use crate::slug::slugify;

#[derive(Deserialize, Validate, Debug, Default)]
pub struct TagPayload {
    #[validate(length(min = 2, max = 50, message = "Tag name must be between 2 and 50 characters"))]
    pub name: Option<String>,
}

/// A validated tag name with its slug.
#[derive(Debug, PartialEq)]
pub struct TagName {
    pub name: String,
    pub slug: String,
}

impl TagPayload {
    pub fn validated(mut self) -> Result<Option<TagName>, AppError> {
        self.name = self.name.map(|n| n.trim().to_string());
        self.validate()?;
        let Some(name) = self.name else {
            return Ok(None);
        };
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(AppError::validation("Tag name must contain at least one letter or digit"));
        }
        Ok(Some(TagName { name, slug }))
    }
}

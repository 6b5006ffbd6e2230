// category listing

use std::collections::BTreeMap;

use serde::Serialize;

use super::Db;
use crate::ApiError;

#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub categories: BTreeMap<i64, String>,
}

/// All categories as an id to label mapping.
///
/// An empty category table is reported as not found, not as an empty mapping.
pub async fn list_categories(db: &Db) -> Result<CategoryList, ApiError> {
    let categories = db.categories().await?;

    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }

    Ok(CategoryList {
        categories: categories.into_iter().map(|c| (c.id, c.label)).collect(),
    })
}

// question listing, search, create/delete, and quiz selection

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::paginate::paginate;
use super::{Db, NewQuestion, Question, integer_value};
use crate::ApiError;

/// `quiz_category.type` value the client sends for "every category".
pub const ALL_CATEGORIES: &str = "click";

#[derive(Debug, Serialize)]
pub struct QuestionList {
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub categories: BTreeMap<i64, String>,
    pub current_category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: i64,
    pub total_questions: i64,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub created: i64,
    pub total_questions: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub current_category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryQuestions {
    pub questions: Vec<Question>,
    pub current_category: String,
    pub total_questions: usize,
}

#[derive(Debug, Serialize)]
pub struct QuizQuestion {
    pub question: Option<Question>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub quiz_category: Option<QuizCategory>,
    #[serde(default)]
    pub previous_questions: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizCategory {
    #[serde(rename = "type")]
    pub kind: String,
    // clients send the id as either a number or a numeric string
    #[serde(default)]
    pub id: Option<Value>,
}

impl QuizCategory {
    /// The category to draw from, or `None` for every category.
    pub fn scope(&self) -> Result<Option<i64>, ApiError> {
        if self.kind == ALL_CATEGORIES {
            return Ok(None);
        }

        self.id
            .as_ref()
            .and_then(integer_value)
            .map(Some)
            .ok_or(ApiError::Unprocessable)
    }
}

pub async fn list_questions(db: &Db, page: i64) -> Result<QuestionList, ApiError> {
    let selection = db.questions().await?;
    let categories = db.categories_by_label().await?;
    let questions = paginate(page, &selection);

    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }

    Ok(QuestionList {
        questions: questions.to_vec(),
        total_questions: selection.len(),
        categories: categories.into_iter().map(|c| (c.id, c.label)).collect(),
        current_category: None,
    })
}

pub async fn delete_question(db: &Db, id: i64) -> Result<Deleted, ApiError> {
    if db.question(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    db.delete_question(id).await?;

    Ok(Deleted {
        deleted: id,
        total_questions: db.count_questions().await?,
    })
}

// stored exactly as given; nulls included
pub async fn create_question(db: &Db, new: &NewQuestion) -> Result<Created, ApiError> {
    let created = db.insert_question(new).await?;

    Ok(Created {
        created,
        total_questions: db.count_questions().await?,
    })
}

/// Case-insensitive substring search over question text.
///
/// A missing or empty term is not found; a term with no matches is an empty success.
pub async fn search_questions(
    db: &Db,
    term: Option<&str>,
    page: i64,
) -> Result<SearchResults, ApiError> {
    let term = term.filter(|t| !t.is_empty()).ok_or(ApiError::NotFound)?;

    let matches = db.search_questions(term).await?;
    debug!(term, matches = matches.len(), "search");

    Ok(SearchResults {
        questions: paginate(page, &matches).to_vec(),
        total_questions: matches.len(),
        current_category: None,
    })
}

// every failure here, including an unknown category, is reported as not found
pub async fn questions_by_category(
    db: &Db,
    category_id: &str,
) -> Result<CategoryQuestions, ApiError> {
    let id: i64 = category_id.trim().parse().map_err(|_| ApiError::NotFound)?;

    let questions = db.questions_in_category(id).await.map_err(|e| {
        warn!(error = %e, category = id, "category questions lookup failed");
        ApiError::NotFound
    })?;

    let category = db
        .category(id)
        .await
        .map_err(|e| {
            warn!(error = %e, category = id, "category lookup failed");
            ApiError::NotFound
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(CategoryQuestions {
        total_questions: questions.len(),
        questions,
        current_category: category.label,
    })
}

/// Picks a random question the player hasn't seen yet.
///
/// Returns a null question once every candidate has been shown.
pub async fn next_quiz_question(db: &Db, request: QuizRequest) -> Result<QuizQuestion, ApiError> {
    let (Some(quiz_category), Some(previous)) = (request.quiz_category, request.previous_questions)
    else {
        return Err(ApiError::Unprocessable);
    };

    let scope = quiz_category.scope()?;
    let candidates = db.quiz_candidates(scope, &previous).await?;
    debug!(
        category = ?scope,
        seen = previous.len(),
        candidates = candidates.len(),
        "quiz draw"
    );

    let question = candidates.choose(&mut rand::thread_rng()).cloned();

    Ok(QuizQuestion { question })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(kind: &str, id: Option<Value>) -> QuizCategory {
        QuizCategory {
            kind: kind.to_string(),
            id,
        }
    }

    #[test]
    fn test_all_categories_marker() {
        let c = category(ALL_CATEGORIES, Some(Value::from(0)));
        assert_eq!(c.scope(), Ok(None));
    }

    #[test]
    fn test_numeric_and_string_ids() {
        assert_eq!(category("Science", Some(Value::from(1))).scope(), Ok(Some(1)));
        assert_eq!(category("Science", Some(Value::from("3"))).scope(), Ok(Some(3)));
    }

    #[test]
    fn test_malformed_category_is_unprocessable() {
        assert_eq!(category("Science", None).scope(), Err(ApiError::Unprocessable));
        assert_eq!(
            category("Science", Some(Value::from("art"))).scope(),
            Err(ApiError::Unprocessable)
        );
        assert_eq!(
            category("Science", Some(Value::Bool(true))).scope(),
            Err(ApiError::Unprocessable)
        );
    }
}

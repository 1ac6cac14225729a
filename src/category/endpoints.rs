//! HTTP handlers for listing and managing categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    api::{Action, ApiResponse, Entity, IdQuery},
    category::{
        Category, CategoryForm, ValidCategoryForm, create_category, delete_category,
        get_categories, update_category,
    },
    db::lock_connection,
    entry_type::EntryType,
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    #[serde(default, rename = "type")]
    pub entry_type: Option<EntryType>,
}

/// List categories, optionally filtered by `?type=`.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    query: Result<Query<CategoryListQuery>, QueryRejection>,
) -> Result<Json<Vec<Category>>, Error> {
    let Query(query) = query?;
    let connection = lock_connection(&state.db_connection)?;

    get_categories(query.entry_type, &connection).map(Json)
}

/// Create a category from a JSON body.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    payload: Result<Json<CategoryForm>, JsonRejection>,
) -> Result<ApiResponse<Category>, Error> {
    let Json(form) = payload?;
    let form = ValidCategoryForm::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(form, &connection)?;
    tracing::info!("created category {} \"{}\"", category.id, category.name);

    Ok(ApiResponse::success(Entity::Category, Action::Create, category))
}

/// Update the category given by `?id=`.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    query: Result<Query<IdQuery>, QueryRejection>,
    payload: Result<Json<CategoryForm>, JsonRejection>,
) -> Result<ApiResponse<Category>, Error> {
    let category_id = query?.require()?;
    let Json(form) = payload?;
    let form = ValidCategoryForm::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = update_category(category_id, form, &connection)?;

    Ok(ApiResponse::success(Entity::Category, Action::Update, category))
}

/// Delete the category given by `?id=`.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<ApiResponse<()>, Error> {
    let category_id = query?.require()?;
    let connection = lock_connection(&state.db_connection)?;

    delete_category(category_id, &connection)?;
    tracing::info!("deleted category {category_id}");

    Ok(ApiResponse::without_data(Entity::Category, Action::Delete))
}

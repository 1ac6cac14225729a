//! Shared request and response shapes for the JSON API.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{DatabaseId, Error};

/// The kinds of entity that the API manages, used in response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Category,
    Debt,
    Transaction,
}

/// The mutations that the API performs, used in response messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
    Pay,
}

impl Action {
    fn past_tense(self) -> &'static str {
        match self {
            Action::Create => "created",
            Action::Update => "updated",
            Action::Delete => "deleted",
            Action::Pay => "paid",
        }
    }
}

/// The body of every successful mutating request.
///
/// `data` holds the entity as stored after the mutation. Clients should use it
/// to replace their copy rather than patching local state.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A success response carrying `data`.
    pub fn success(entity: Entity, action: Action, data: T) -> Self {
        Self {
            success: true,
            message: success_message(entity, action),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A success response for a mutation that has nothing to return.
    pub fn without_data(entity: Entity, action: Action) -> Self {
        Self {
            success: true,
            message: success_message(entity, action),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// The message for a successful mutation, e.g. "Debt paid successfully".
pub fn success_message(entity: Entity, action: Action) -> String {
    format!("{entity:?} {} successfully", action.past_tense())
}

/// The `?id=` query parameter used by update and delete endpoints.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<DatabaseId>,
}

impl IdQuery {
    /// The ID from the query string.
    ///
    /// # Errors
    /// Returns [Error::MissingField] if the query string has no `id`.
    pub fn require(&self) -> Result<DatabaseId, Error> {
        self.id.ok_or(Error::MissingField("id"))
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

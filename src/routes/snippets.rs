use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::error::{AppError, AppResult};
use crate::forms::SnippetCreateForm;
use crate::session::FLASH;
use crate::state::AppState;
use crate::views::{self, render, Page};

const HOME_SNIPPETS: i64 = 10;

/// Snippet ids are positive integers; anything else names no snippet.
pub fn parse_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

pub async fn home(State(state): State<AppState>, page: Page) -> AppResult<Response> {
    let snippets = state.snippets.latest(HOME_SNIPPETS).await?;
    Ok(render(StatusCode::OK, views::home(&page.data().await, &snippets)))
}

pub async fn about(page: Page) -> Response {
    render(StatusCode::OK, views::about(&page.data().await))
}

pub async fn view(State(state): State<AppState>, Path(id): Path<String>, page: Page) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let snippet = state.snippets.get(id).await?;
    Ok(render(StatusCode::OK, views::snippet_view(&page.data().await, &snippet)))
}

pub async fn create(page: Page) -> Response {
    render(StatusCode::OK, views::snippet_create(&page.data().await, &SnippetCreateForm::blank()))
}

pub async fn create_post(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<SnippetCreateForm>, FormRejection>,
) -> AppResult<Response> {
    let Form(mut form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if !form.validate() {
        return Ok(render(
            StatusCode::UNPROCESSABLE_ENTITY,
            views::snippet_create(&page.data().await, &form),
        ));
    }

    let id = state.snippets.insert(&form.title, &form.content, form.expires).await?;
    tracing::info!(snippet_id = id, "Snippet created");
    page.session().put(FLASH, "Snippet successfully created!").await;
    Ok(Redirect::to(&format!("/snippet/view/{}", id)).into_response())
}

pub async fn delete_post(State(state): State<AppState>, Path(id): Path<String>, page: Page) -> AppResult<Response> {
    let id = parse_id(&id)?;
    state.snippets.delete(id).await?;
    tracing::info!(snippet_id = id, user_id = ?page.auth().user_id(), "Snippet deleted");
    page.session().put(FLASH, "Snippet successfully deleted!").await;
    Ok(Redirect::to("/").into_response())
}

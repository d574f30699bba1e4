use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};

use crate::error::{AppError, AppResult};
use crate::forms::{
    PasswordUpdateForm, UserLoginForm, UserSignupForm, BAD_CREDENTIALS, EMAIL_IN_USE, WRONG_CURRENT_PASSWORD,
};
use crate::models::ModelError;
use crate::session::{AUTHENTICATED_USER_ID, FLASH, TARGET_URL_PATH};
use crate::state::AppState;
use crate::views::{self, render, Page};

const AFTER_LOGIN: &str = "/snippet/create";

/// Only same-origin absolute paths are followed after login.
fn local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\")
}

fn decode<T>(form: Result<Form<T>, FormRejection>) -> AppResult<T> {
    form.map(|Form(f)| f).map_err(|e| AppError::BadRequest(e.body_text()))
}

pub async fn signup(page: Page) -> Response {
    render(StatusCode::OK, views::signup(&page.data().await, &UserSignupForm::default()))
}

pub async fn signup_post(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<UserSignupForm>, FormRejection>,
) -> AppResult<Response> {
    let mut form = decode(form)?;

    if form.validate() {
        match state.users.insert(&form.name, &form.email, &form.password).await {
            Ok(()) => {
                tracing::info!("New user signed up");
                page.session()
                    .put(FLASH, "Your signup was successful. Please log in.")
                    .await;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(ModelError::DuplicateEmail) => form.validator.add_field_error("email", EMAIL_IN_USE),
            Err(e) => return Err(e.into()),
        }
    }

    form.password.clear();
    Ok(render(StatusCode::UNPROCESSABLE_ENTITY, views::signup(&page.data().await, &form)))
}

pub async fn login(page: Page) -> Response {
    render(StatusCode::OK, views::login(&page.data().await, &UserLoginForm::default()))
}

pub async fn login_post(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<UserLoginForm>, FormRejection>,
) -> AppResult<Response> {
    let mut form = decode(form)?;

    if form.validate() {
        match state.users.authenticate(&form.email, &form.password).await {
            Ok(id) => {
                let session = page.session();
                // New privilege level, new token.
                session.renew_token().await;
                session.put(AUTHENTICATED_USER_ID, id).await;
                tracing::info!(user_id = id, "User logged in");

                let target = session
                    .pop_string(TARGET_URL_PATH)
                    .await
                    .filter(|t| local_path(t))
                    .unwrap_or_else(|| AFTER_LOGIN.to_string());
                return Ok(Redirect::to(&target).into_response());
            }
            Err(ModelError::InvalidCredentials) => form.validator.add_non_field_error(BAD_CREDENTIALS),
            Err(e) => return Err(e.into()),
        }
    }

    form.password.clear();
    Ok(render(StatusCode::UNPROCESSABLE_ENTITY, views::login(&page.data().await, &form)))
}

pub async fn logout_post(page: Page) -> Response {
    let session = page.session();
    session.destroy().await;
    session.put(FLASH, "You've been logged out successfully!").await;
    tracing::info!(user_id = ?page.auth().user_id(), "User logged out");
    Redirect::to("/").into_response()
}

pub async fn account_view(State(state): State<AppState>, page: Page) -> AppResult<Response> {
    let Some(id) = page.auth().user_id() else {
        return Ok(Redirect::to("/user/login").into_response());
    };
    match state.users.get(id).await {
        Ok(user) => Ok(render(StatusCode::OK, views::account(&page.data().await, &user))),
        Err(ModelError::NoRecord) => Ok(Redirect::to("/user/login").into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn password_update(page: Page) -> Response {
    render(
        StatusCode::OK,
        views::password_update(&page.data().await, &PasswordUpdateForm::default()),
    )
}

pub async fn password_update_post(
    State(state): State<AppState>,
    page: Page,
    form: Result<Form<PasswordUpdateForm>, FormRejection>,
) -> AppResult<Response> {
    let Some(id) = page.auth().user_id() else {
        return Ok(Redirect::to("/user/login").into_response());
    };
    let mut form = decode(form)?;

    if form.validate() {
        match state
            .users
            .password_update(id, &form.current_password, &form.new_password)
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = id, "Password updated");
                page.session().put(FLASH, "Your password has been updated!").await;
                return Ok(Redirect::to("/account/view").into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                form.validator.add_field_error("currentPassword", WRONG_CURRENT_PASSWORD)
            }
            Err(ModelError::NoRecord) => return Ok(Redirect::to("/user/login").into_response()),
            Err(e) => return Err(e.into()),
        }
    }

    let form = form.scrubbed();
    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        views::password_update(&page.data().await, &form),
    ))
}

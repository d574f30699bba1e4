//! HTML pages.
//!
//! Pages are maud templates, so every spliced value is HTML-escaped. Each
//! page is rendered into a complete string before anything is written, so a
//! failure or panic mid-render never leaves a half-sent body. Every page
//! shares [`TemplateData`]; the flash message is popped from the session only
//! when a page is actually rendered.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Datelike, Utc};
use maud::{html, Markup, DOCTYPE};

use crate::error::AppError;
use crate::forms::{PasswordUpdateForm, SnippetCreateForm, UserLoginForm, UserSignupForm};
use crate::middleware::{AuthState, CsrfToken};
use crate::models::{Snippet, User};
use crate::session::{Session, FLASH};
use crate::validator::Validator;

/// Data every page needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

/// Extractor giving handlers what they need to render a page.
#[derive(Debug, Clone)]
pub struct Page {
    session: Session,
    auth: AuthState,
    csrf: CsrfToken,
}

impl Page {
    /// Builds the shared data, consuming the pending flash message.
    pub async fn data(&self) -> TemplateData {
        TemplateData {
            current_year: Utc::now().year(),
            flash: self.session.pop_string(FLASH).await,
            is_authenticated: self.auth.is_authenticated(),
            csrf_token: self.csrf.as_str().to_string(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth(&self) -> AuthState {
        self.auth
    }
}

impl<S> FromRequestParts<S> for Page
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let csrf = CsrfToken::from_request_parts(parts, state).await?;
        let auth = match AuthState::from_request_parts(parts, state).await {
            Ok(auth) => auth,
            Err(never) => match never {},
        };
        Ok(Self { session, auth, csrf })
    }
}

/// A rendered page with its status code.
pub fn render(status: StatusCode, page: Markup) -> Response {
    (status, Html(page.into_string())).into_response()
}

/// `17 Mar 2022 at 10:15`, or empty for no time.
pub fn human_date(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%d %b %Y at %H:%M").to_string())
        .unwrap_or_default()
}

fn csrf_input(data: &TemplateData) -> Markup {
    html! { input type="hidden" name="csrf_token" value=(data.csrf_token); }
}

fn field_error(v: &Validator, field: &str) -> Markup {
    html! {
        @if let Some(msg) = v.field_error(field) {
            label.error { (msg) }
        }
    }
}

fn non_field_errors(v: &Validator) -> Markup {
    html! {
        @for msg in &v.non_field_errors {
            div.error { (msg) }
        }
    }
}

fn layout(title: &str, data: &TemplateData, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " - Snippetbox" }
                link rel="stylesheet" href="/static/css/main.css";
            }
            body {
                header {
                    h1 { a href="/" { "Snippetbox" } }
                }
                nav {
                    div {
                        a href="/" { "Home" }
                        " "
                        a href="/about" { "About" }
                        @if data.is_authenticated {
                            " "
                            a href="/snippet/create" { "Create snippet" }
                        }
                    }
                    div {
                        @if data.is_authenticated {
                            a href="/account/view" { "Account" }
                            form action="/user/logout" method="POST" {
                                (csrf_input(data))
                                button { "Logout" }
                            }
                        } @else {
                            a href="/user/signup" { "Signup" }
                            " "
                            a href="/user/login" { "Login" }
                        }
                    }
                }
                main {
                    @if let Some(flash) = &data.flash {
                        div.flash { (flash) }
                    }
                    (content)
                }
                footer { "Powered by Rust in " (data.current_year) }
            }
        }
    }
}

pub fn home(data: &TemplateData, snippets: &[Snippet]) -> Markup {
    let content = html! {
        h2 { "Latest Snippets" }
        @if snippets.is_empty() {
            p { "There's nothing to see here... yet!" }
        } @else {
            table {
                tr {
                    th { "Title" }
                    th { "Created" }
                    th { "ID" }
                }
                @for s in snippets {
                    tr {
                        td { a href=(format!("/snippet/view/{}", s.id)) { (s.title) } }
                        td { (human_date(Some(s.created))) }
                        td { "#" (s.id) }
                    }
                }
            }
        }
    };
    layout("Home", data, content)
}

pub fn about(data: &TemplateData) -> Markup {
    let content = html! {
        h2 { "About" }
        p { "Snippetbox is a place to paste and share short snippets of text." }
    };
    layout("About", data, content)
}

pub fn snippet_view(data: &TemplateData, snippet: &Snippet) -> Markup {
    let content = html! {
        div.snippet {
            div.metadata {
                strong { (snippet.title) }
                span { "#" (snippet.id) }
            }
            pre { code { (snippet.content) } }
            div.metadata {
                time { "Created: " (human_date(Some(snippet.created))) }
                time { "Expires: " (human_date(Some(snippet.expires))) }
            }
        }
        @if data.is_authenticated {
            form action=(format!("/snippet/delete/{}", snippet.id)) method="POST" {
                (csrf_input(data))
                button { "Delete" }
            }
        }
    };
    layout(&format!("Snippet #{}", snippet.id), data, content)
}

pub fn snippet_create(data: &TemplateData, form: &SnippetCreateForm) -> Markup {
    let v = &form.validator;
    let choices = [(365, "One Year"), (7, "One Week"), (1, "One Day")];
    let content = html! {
        form action="/snippet/create" method="POST" {
            (csrf_input(data))
            div {
                label { "Title:" }
                (field_error(v, "title"))
                input type="text" name="title" value=(form.title);
            }
            div {
                label { "Content:" }
                (field_error(v, "content"))
                textarea name="content" { (form.content) }
            }
            div {
                label { "Delete in:" }
                (field_error(v, "expires"))
                @for (days, text) in choices {
                    input type="radio" name="expires" value=(days) checked[form.expires == days];
                    " " (text) " "
                }
            }
            div {
                input type="submit" value="Publish snippet";
            }
        }
    };
    layout("Create a New Snippet", data, content)
}

pub fn signup(data: &TemplateData, form: &UserSignupForm) -> Markup {
    let v = &form.validator;
    let content = html! {
        form action="/user/signup" method="POST" novalidate {
            (csrf_input(data))
            div {
                label { "Name:" }
                (field_error(v, "name"))
                input type="text" name="name" value=(form.name);
            }
            div {
                label { "Email:" }
                (field_error(v, "email"))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(v, "password"))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Signup";
            }
        }
    };
    layout("Signup", data, content)
}

pub fn login(data: &TemplateData, form: &UserLoginForm) -> Markup {
    let v = &form.validator;
    let content = html! {
        form action="/user/login" method="POST" novalidate {
            (csrf_input(data))
            (non_field_errors(v))
            div {
                label { "Email:" }
                (field_error(v, "email"))
                input type="email" name="email" value=(form.email);
            }
            div {
                label { "Password:" }
                (field_error(v, "password"))
                input type="password" name="password";
            }
            div {
                input type="submit" value="Login";
            }
        }
    };
    layout("Login", data, content)
}

pub fn account(data: &TemplateData, user: &User) -> Markup {
    let content = html! {
        h2 { "Your Account" }
        table {
            tr { th { "Name" } td { (user.name) } }
            tr { th { "Email" } td { (user.email) } }
            tr { th { "Joined" } td { (human_date(Some(user.created))) } }
            tr {
                th { "Password" }
                td { a href="/account/password/update" { "Change password" } }
            }
        }
    };
    layout("Your Account", data, content)
}

pub fn password_update(data: &TemplateData, form: &PasswordUpdateForm) -> Markup {
    let v = &form.validator;
    let content = html! {
        h2 { "Change Password" }
        form action="/account/password/update" method="POST" novalidate {
            (csrf_input(data))
            div {
                label { "Current password:" }
                (field_error(v, "currentPassword"))
                input type="password" name="currentPassword";
            }
            div {
                label { "New password:" }
                (field_error(v, "newPassword"))
                input type="password" name="newPassword";
            }
            div {
                label { "Confirm new password:" }
                (field_error(v, "newPasswordConfirmation"))
                input type="password" name="newPasswordConfirmation";
            }
            div {
                input type="submit" value="Change password";
            }
        }
    };
    layout("Change Password", data, content)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::forms::{BAD_CREDENTIALS, BAD_EMAIL, BLANK, EMAIL_IN_USE, TOO_SHORT, WRONG_CURRENT_PASSWORD};
    use crate::session::SessionStore;
    use crate::tests::support::{TestApp, ALICE_EMAIL, ALICE_PASSWORD, TAKEN_EMAIL};

    #[tokio::test]
    async fn test_home_lists_snippets() {
        let mut app = TestApp::new();
        let res = app.get("/").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains(r#"<a href="/snippet/view/1">An old silent pond</a>"#));
        assert!(res.header("content-type").unwrap().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_about_page() {
        let mut app = TestApp::new();
        let res = app.get("/about").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("<h2>About</h2>"));
    }

    #[tokio::test]
    async fn test_snippet_view() {
        let mut app = TestApp::new();

        let res = app.get("/snippet/view/1").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("An old silent pond..."));

        for uri in [
            "/snippet/view/2",
            "/snippet/view/-1",
            "/snippet/view/0",
            "/snippet/view/1.23",
            "/snippet/view/foo",
            "/snippet/view/",
        ] {
            assert_eq!(app.get(uri).await.status, StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_signup() {
        let mut app = TestApp::new();

        struct Case {
            name: &'static str,
            email: &'static str,
            password: &'static str,
            status: StatusCode,
            error: Option<&'static str>,
        }
        let cases = [
            Case { name: "", email: "bob@example.com", password: "validPa$$word", status: StatusCode::UNPROCESSABLE_ENTITY, error: Some(BLANK) },
            Case { name: "Bob", email: "bob@example.", password: "validPa$$word", status: StatusCode::UNPROCESSABLE_ENTITY, error: Some(BAD_EMAIL) },
            Case { name: "Bob", email: "bob@example.com", password: "pa$$", status: StatusCode::UNPROCESSABLE_ENTITY, error: Some(TOO_SHORT) },
            Case { name: "Bob", email: TAKEN_EMAIL, password: "validPa$$word", status: StatusCode::UNPROCESSABLE_ENTITY, error: Some(EMAIL_IN_USE) },
            Case { name: "Bob", email: "bob@example.com", password: "validPa$$word", status: StatusCode::SEE_OTHER, error: None },
        ];

        for case in cases {
            let token = app.csrf_token("/user/signup").await;
            let res = app
                .post_form(
                    "/user/signup",
                    &[
                        ("name", case.name),
                        ("email", case.email),
                        ("password", case.password),
                        ("csrf_token", token.as_str()),
                    ],
                )
                .await;
            assert_eq!(res.status, case.status, "{} / {}", case.name, case.email);
            match case.error {
                Some(error) => {
                    assert!(res.body.contains(error), "missing {:?}", error);
                    assert!(!res.body.contains(case.password) || case.password.is_empty());
                }
                None => assert_eq!(res.location(), Some("/user/login")),
            }
        }

        let res = app.get("/user/login").await;
        assert!(res.body.contains("Your signup was successful. Please log in."));
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials() {
        let mut app = TestApp::new();
        let token = app.csrf_token("/user/login").await;
        let res = app
            .post_form(
                "/user/login",
                &[("email", ALICE_EMAIL), ("password", "wrong-password"), ("csrf_token", token.as_str())],
            )
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.body.contains(BAD_CREDENTIALS));
        assert!(res.body.contains(&format!(r#"value="{}""#, ALICE_EMAIL)));
    }

    #[tokio::test]
    async fn test_login_defaults_to_create_page() {
        let mut app = TestApp::new();
        let res = app.login().await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/snippet/create"));

        let res = app.get("/").await;
        assert!(res.body.contains("/user/logout"));
    }

    #[tokio::test]
    async fn test_protected_post_redirects_to_login_and_back() {
        let mut app = TestApp::new();
        let token = app.csrf_token("/user/login").await;

        let res = app
            .post_form(
                "/snippet/create",
                &[("title", "O snail"), ("content", "Climb"), ("expires", "7"), ("csrf_token", token.as_str())],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/user/login"));
        assert_eq!(app.snippets.count(), 1);

        let res = app.login().await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/snippet/create"));
    }

    #[tokio::test]
    async fn test_protected_get_remembers_path() {
        let mut app = TestApp::new();
        let res = app.get("/account/view").await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);

        let res = app.login().await;
        assert_eq!(res.location(), Some("/account/view"));

        // The target is used once.
        app.get("/account/view").await;
        let token = app.csrf_token("/").await;
        app.post_form("/user/logout", &[("csrf_token", token.as_str())]).await;
        assert_eq!(app.login().await.location(), Some("/snippet/create"));
    }

    #[tokio::test]
    async fn test_create_snippet() {
        let mut app = TestApp::new();
        app.login().await;
        let token = app.csrf_token("/snippet/create").await;

        let res = app
            .post_form(
                "/snippet/create",
                &[
                    ("title", "O snail"),
                    ("content", "Climb Mount Fuji,\nBut slowly, slowly!"),
                    ("expires", "7"),
                    ("csrf_token", token.as_str()),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/snippet/view/2"));

        let res = app.get("/snippet/view/2").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("Snippet successfully created!"));
        assert!(res.body.contains("O snail"));

        let res = app.get("/snippet/view/2").await;
        assert!(!res.body.contains("Snippet successfully created!"));
    }

    #[tokio::test]
    async fn test_create_snippet_validation() {
        let mut app = TestApp::new();
        app.login().await;
        let token = app.csrf_token("/snippet/create").await;

        let res = app
            .post_form(
                "/snippet/create",
                &[("title", ""), ("content", "<b>bold</b>"), ("expires", "2"), ("csrf_token", token.as_str())],
            )
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.body.contains(BLANK));
        assert!(res.body.contains("This field must equal 1, 7 or 365"));
        assert!(res.body.contains("&lt;b&gt;bold&lt;/b&gt;"));

        let res = app
            .post_form(
                "/snippet/create",
                &[("title", "t"), ("content", "c"), ("expires", "soon"), ("csrf_token", token.as_str())],
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(app.snippets.count(), 1);
    }

    #[tokio::test]
    async fn test_delete_snippet() {
        let mut app = TestApp::new();
        app.login().await;
        let token = app.csrf_token("/snippet/view/1").await;

        let res = app.post_form("/snippet/delete/99", &[("csrf_token", token.as_str())]).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);

        let res = app.post_form("/snippet/delete/1", &[("csrf_token", token.as_str())]).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/"));
        assert_eq!(app.get("/snippet/view/1").await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout() {
        let mut app = TestApp::new();
        app.login().await;
        let token = app.csrf_token("/").await;
        let logged_in = app.cookie.clone().unwrap();

        let res = app.post_form("/user/logout", &[("csrf_token", token.as_str())]).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/"));
        assert_ne!(app.cookie.as_deref(), Some(logged_in.as_str()));
        assert!(app.sessions.load(&logged_in).await.unwrap().is_none());

        let res = app.get("/").await;
        assert!(res.body.contains("been logged out successfully!"));
        assert!(!res.body.contains("/user/logout"));
        assert_eq!(app.get("/snippet/create").await.status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_account_view() {
        let mut app = TestApp::new();
        app.login().await;
        let res = app.get("/account/view").await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains(ALICE_EMAIL));
        assert!(res.body.contains("17 Mar 2022 at 10:15"));
    }

    #[tokio::test]
    async fn test_password_update() {
        let mut app = TestApp::new();
        app.login().await;
        let token = app.csrf_token("/account/password/update").await;

        let res = app
            .post_form(
                "/account/password/update",
                &[
                    ("currentPassword", "not-my-password"),
                    ("newPassword", "brand-new-pa$$"),
                    ("newPasswordConfirmation", "brand-new-pa$$"),
                    ("csrf_token", token.as_str()),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.body.contains(WRONG_CURRENT_PASSWORD));
        assert!(!res.body.contains("not-my-password"));

        let res = app
            .post_form(
                "/account/password/update",
                &[
                    ("currentPassword", ALICE_PASSWORD),
                    ("newPassword", "brand-new-pa$$"),
                    ("newPasswordConfirmation", "brand-new-pa$$"),
                    ("csrf_token", token.as_str()),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER);
        assert_eq!(res.location(), Some("/account/view"));
        assert!(app.get("/account/view").await.body.contains("Your password has been updated!"));
    }
}

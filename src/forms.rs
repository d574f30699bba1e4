//! Submitted form payloads.
//!
//! Each form is decoded from a urlencoded body by serde and carries its own
//! [`Validator`], which is never deserialized. `validate` runs the field checks;
//! handlers add store-dependent errors (duplicate email, bad credentials)
//! afterwards.

use serde::Deserialize;

use crate::validator::{matches, max_chars, min_chars, not_blank, permitted_value, Validator, EMAIL_RX};

pub const BLANK: &str = "This field cannot be blank";
pub const BAD_EMAIL: &str = "This field must be a valid email address";
pub const TOO_SHORT: &str = "This field must be at least 8 characters long";
pub const EMAIL_IN_USE: &str = "Email address is already in use";
pub const BAD_CREDENTIALS: &str = "Email or password is incorrect";
pub const WRONG_CURRENT_PASSWORD: &str = "Current password is incorrect";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";

pub const EXPIRY_CHOICES: [i64; 3] = [1, 7, 365];
const TITLE_MAX_CHARS: usize = 100;
const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Days until expiry; a missing field decodes as 0 and fails validation.
    #[serde(default)]
    pub expires: i64,
    #[serde(skip)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// Blank form as first shown, expiring in a year.
    pub fn blank() -> Self {
        Self { expires: 365, ..Self::default() }
    }

    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", BLANK);
        v.check_field(
            max_chars(&self.title, TITLE_MAX_CHARS),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", BLANK);
        v.check_field(
            permitted_value(self.expires, &EXPIRY_CHOICES),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v.valid()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", BLANK);
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(matches(&self.email, &EMAIL_RX), "email", BAD_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.check_field(min_chars(&self.password, PASSWORD_MIN_CHARS), "password", TOO_SHORT);
        v.valid()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(matches(&self.email, &EMAIL_RX), "email", BAD_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.valid()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordUpdateForm {
    #[serde(default, rename = "currentPassword")]
    pub current_password: String,
    #[serde(default, rename = "newPassword")]
    pub new_password: String,
    #[serde(default, rename = "newPasswordConfirmation")]
    pub new_password_confirmation: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl PasswordUpdateForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.current_password), "currentPassword", BLANK);
        v.check_field(not_blank(&self.new_password), "newPassword", BLANK);
        v.check_field(min_chars(&self.new_password, PASSWORD_MIN_CHARS), "newPassword", TOO_SHORT);
        v.check_field(
            not_blank(&self.new_password_confirmation),
            "newPasswordConfirmation",
            BLANK,
        );
        v.check_field(
            self.new_password == self.new_password_confirmation,
            "newPasswordConfirmation",
            PASSWORDS_DIFFER,
        );
        v.valid()
    }

    /// Password fields are never echoed back into a re-rendered form.
    pub fn scrubbed(self) -> Self {
        Self { validator: self.validator, ..Self::default() }
    }
}

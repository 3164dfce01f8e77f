// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Error responses of the HTML frontend
use actix_web::error::UrlencodedError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpRequest;
use actix_web::{body::BoxBody, HttpResponse, ResponseError};
use database::DatabaseError;
use itertools::Itertools;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use validator::ValidationErrors;

pub const CODE_INVALID_EMAIL: &str = "invalid_email";
pub const CODE_INVALID_LENGTH: &str = "invalid_length";
pub const CODE_OUT_OF_RANGE: &str = "out_of_range";
pub const CODE_VALUE_REQUIRED: &str = "value_required";
pub const CODE_INVALID_VALUE: &str = "invalid_value";

/// Error handler for the actix form extractor
///
/// Gets called when a incoming request results in an [`UrlencodedError`].
/// Returns a `Bad Request` [`ApiError`] error with an appropriate error code and message.
pub fn form_error_handler(err: UrlencodedError, _: &HttpRequest) -> actix_web::error::Error {
    let error_code = match err {
        UrlencodedError::Overflow { .. } => "payload_overflow",
        UrlencodedError::ContentType => "invalid_content_type",
        UrlencodedError::Parse(_) => "invalid_form",
        _ => "invalid_payload",
    };
    ApiError::bad_request()
        .with_code(error_code)
        .with_message(err.to_string())
        .into()
}

/// Error page returned for requests that cannot be turned into a redirect or a form
///
/// Can be build via the associated functions to represent various HTTP errors. Each
/// HTTP error has its default code and message that get rendered into a small HTML page.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: Cow<'static, str>,
    message: Cow<'static, str>,
}

impl ApiError {
    fn new<T>(status: StatusCode, code: T, message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Override the default code for an error
    pub fn with_code<T>(mut self, code: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.code = code.into();
        self
    }

    /// Override the default message for an error
    pub fn with_message<T>(mut self, message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        self.message = message.into();
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a new 400 Bad Request error
    pub fn bad_request() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "Invalid request due to malformed syntax",
        )
    }

    /// Create a new 404 Not Found error
    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "not_found",
            "A requested resource could not be found",
        )
    }

    /// Create a new 500 Internal Server Error
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_server_error",
            "An internal server error occurred",
        )
    }

    fn render(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{status} - Event Registration</title></head>
<body>
  <h1>{status}</h1>
  <p>{message}</p>
  <p><a href="/events">Back to the events</a></p>
</body>
</html>
"#,
            status = self.status,
            message = handlebars::html_escape(&self.message),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={}, code={}, message={}",
            self.status, self.code, self.message
        )
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::html())
            .body(self.render())
    }
}

impl From<crate::BlockingError> for ApiError {
    fn from(e: crate::BlockingError) -> Self {
        log::error!("Request threw internal error from blocking error: {}", e);
        Self::internal()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        log::error!("Request threw internal error from anyhow error: {:?}", e);
        Self::internal()
    }
}

impl From<handlebars::RenderError> for ApiError {
    fn from(e: handlebars::RenderError) -> Self {
        log::error!("Request threw internal error from template error: {}", e);
        Self::internal()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(db_error: DatabaseError) -> Self {
        match db_error {
            DatabaseError::NotFound => Self::not_found(),
            e => {
                log::error!("Request threw internal error from database error: {}", e);
                Self::internal()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrorEntry {
    /// The field related to the error
    /// It's a struct level error when no field is set
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<Cow<'static, str>>,
    /// Machine readable error message
    code: Cow<'static, str>,
    /// Human readable error message
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<Cow<'static, str>>,
}

impl ValidationErrorEntry {
    /// Message shown to the user, falls back to a generic text derived from the code
    fn describe(&self) -> String {
        if let Some(message) = &self.message {
            return message.to_string();
        }

        let field = self.field.as_deref().unwrap_or("input");

        match self.code.as_ref() {
            CODE_INVALID_LENGTH => format!("The {field} is too long."),
            CODE_VALUE_REQUIRED => format!("The {field} is required."),
            CODE_INVALID_EMAIL => format!("The {field} is not a valid email address."),
            CODE_OUT_OF_RANGE => format!("The {field} is out of range."),
            _ => format!("The {field} is invalid."),
        }
    }
}

/// Convert [`ValidationErrors`] into a list of [`ValidationErrorEntry`], sorted by field
pub fn validation_entries(validation_errors: &ValidationErrors) -> Vec<ValidationErrorEntry> {
    let mut entries = Vec::with_capacity(validation_errors.errors().len());

    collect_validation_errors(validation_errors, &mut entries);

    entries.sort_by(|a, b| a.field.cmp(&b.field));

    entries
}

/// Single line message listing every invalid field, identical messages are only shown once
pub fn validation_message(validation_errors: &ValidationErrors) -> String {
    let message = validation_entries(validation_errors)
        .iter()
        .map(ValidationErrorEntry::describe)
        .unique()
        .join(" ");

    if message.is_empty() {
        "Some provided values are invalid.".into()
    } else {
        message
    }
}

fn collect_validation_errors(
    validation_errors: &ValidationErrors,
    entries: &mut Vec<ValidationErrorEntry>,
) {
    for (field, error_kind) in validation_errors.errors() {
        let field: Option<Cow<'static, str>> = match *field {
            "__all__" => None,
            field => Some(field.into()),
        };

        match error_kind {
            validator::ValidationErrorsKind::Field(v) => {
                for error in v {
                    let code = convert_validation_code(&error.code);

                    entries.push(ValidationErrorEntry {
                        field: field.clone(),
                        code: Cow::Borrowed(code),
                        message: error.message.clone(),
                    });
                }
            }
            validator::ValidationErrorsKind::Struct(inner_errors) => {
                // Assume all fields were flattened when we encounter a struct level validation error
                collect_validation_errors(inner_errors, entries);
            }
            validator::ValidationErrorsKind::List(list) => {
                let invalid_indexes = list.keys().take(15).join(", ");

                let message = format!("Invalid values at index {invalid_indexes}");

                entries.push(ValidationErrorEntry {
                    field,
                    code: "invalid_values".into(),
                    message: Some(Cow::Owned(message)),
                })
            }
        };
    }
}

fn convert_validation_code(code: &str) -> &'static str {
    match code {
        "email" => CODE_INVALID_EMAIL,
        "length" => CODE_INVALID_LENGTH,
        "range" => CODE_OUT_OF_RANGE,
        "required" => CODE_VALUE_REQUIRED,
        _ => CODE_INVALID_VALUE,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::body::MessageBody;
    use pretty_assertions::assert_eq;
    use test_util::assert_eq_json;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct ValidationTester {
        #[validate(email)]
        mail: String,
        #[validate(length(max = 5))]
        length: String,
        #[validate(range(min = 5, max = 10))]
        range: usize,
        #[validate(required(message = "Name and email are required."))]
        required: Option<String>,
        #[validate(required(message = "Name and email are required."))]
        also_required: Option<String>,
    }

    fn tester() -> ValidationTester {
        ValidationTester {
            mail: "not_a_mail".into(),
            length: "looong".into(),
            range: 11,
            required: None,
            also_required: None,
        }
    }

    #[test]
    fn validation_entries_are_mapped() {
        let errors = tester().validate().unwrap_err();

        assert_eq_json!(
            validation_entries(&errors),
            [
                {
                    "field": "also_required",
                    "code": "value_required",
                    "message": "Name and email are required."
                },
                {
                    "field": "length",
                    "code": "invalid_length"
                },
                {
                    "field": "mail",
                    "code": "invalid_email"
                },
                {
                    "field": "range",
                    "code": "out_of_range"
                },
                {
                    "field": "required",
                    "code": "value_required",
                    "message": "Name and email are required."
                }
            ]
        );
    }

    #[test]
    fn validation_message_deduplicates() {
        let errors = tester().validate().unwrap_err();

        assert_eq!(
            validation_message(&errors),
            "Name and email are required. The length is too long. \
             The mail is not a valid email address. The range is out of range."
        );
    }

    #[test]
    fn error_page_escapes_message() {
        let error = ApiError::not_found().with_message("<b>gone</b>");

        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().try_into_bytes().unwrap();
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains("&lt;b&gt;gone&lt;/b&gt;"));
    }

    #[test]
    fn api_error_with_code() {
        let error = ApiError::internal().with_code("custom_code");

        assert_eq!(error.code(), "custom_code");
        assert_eq!(
            error.to_string(),
            "status=500 Internal Server Error, code=custom_code, message=An internal server error occurred"
        );
    }
}

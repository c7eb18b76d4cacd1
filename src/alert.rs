//! Alert system for displaying success and error messages to users.
//!
//! Alerts are returned as HTML fragments in response to HTMX requests and are swapped into the
//! `#alert-container` element that [base](crate::html::base) places at the bottom of every page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// Alert message types for styling
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertType {
    Success,
    Error,
}

/// An alert message with an optional longer explanation.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub alert_type: AlertType,
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> Alert<'a> {
    /// Create a new success alert
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Success,
            message,
            details,
        }
    }

    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            alert_type: AlertType::Error,
            message,
            details,
        }
    }

    pub fn into_html(self) -> Markup {
        let style = match self.alert_type {
            AlertType::Success => {
                "flex items-start gap-3 p-4 mb-4 text-sm rounded-lg border \
                text-green-800 bg-green-50 border-green-300 \
                dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
            }
            AlertType::Error => {
                "flex items-start gap-3 p-4 mb-4 text-sm rounded-lg border \
                text-red-800 bg-red-50 border-red-300 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
            }
        };

        let kind = match self.alert_type {
            AlertType::Success => "success",
            AlertType::Error => "error",
        };

        html! {
            div class=(style) role="alert" data-alert-type=(kind)
            {
                div class="flex-1"
                {
                    p class="font-medium" { (self.message) }

                    @if !self.details.is_empty() {
                        p { (self.details) }
                    }
                }

                button
                    type="button"
                    class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex h-8 w-8"
                    aria-label="Dismiss"
                    onclick="this.closest('[role=alert]').remove()"
                {
                    "×"
                }
            }
        }
    }
}

/// Render `alert` as an HTML fragment with the given status code.
pub fn render_alert(status_code: StatusCode, alert: Alert) -> Response {
    (status_code, alert.into_html()).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::test_utils::{assert_valid_html, parse_html_fragment};

    use super::{Alert, render_alert};

    #[tokio::test]
    async fn renders_error_alert_with_details() {
        let response = render_alert(
            StatusCode::BAD_REQUEST,
            Alert::error("Bad things", "Here is why"),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("no alert found");
        assert_eq!(alert.value().attr("data-alert-type"), Some("error"));
        let text = alert.text().collect::<String>();
        assert!(text.contains("Bad things"));
        assert!(text.contains("Here is why"));
    }

    #[tokio::test]
    async fn omits_empty_details() {
        let response = render_alert(StatusCode::OK, Alert::success("Saved", ""));

        let html = parse_html_fragment(response).await;
        let paragraphs = html.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraphs, 1);
    }
}

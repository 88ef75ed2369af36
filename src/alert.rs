//! Alert system for displaying success and error messages to users.
//!
//! Alerts are HTML fragments swapped into the `#alert-container` element of
//! the base page by HTMX.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An operation succeeded.
    SuccessSimple { message: String },
    /// An operation failed, `details` should tell the user how to fix it.
    Error { message: String, details: String },
}

impl Alert {
    /// Render the alert as an out-of-band swap into the alert container.
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, message, details),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    class=(container_style)
                {
                    div class="flex justify-between items-start gap-4"
                    {
                        div
                        {
                            p class="font-semibold" { (message) }

                            @if !details.is_empty() {
                                p class="text-sm" { (details) }
                            }
                        }

                        button
                            type="button"
                            aria-label="Dismiss"
                            onclick="this.closest('[role=alert]').remove()"
                            class="font-bold"
                        {
                            "×"
                        }
                    }
                }
            }
        }
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        let status_code = match self {
            Alert::Error { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Alert::SuccessSimple { .. } => StatusCode::OK,
        };

        (status_code, self.into_html()).into_response()
    }
}

const SUCCESS_STYLE: &str = "p-4 mb-4 text-sm rounded-lg shadow text-green-800 \
    bg-green-50 dark:bg-gray-800 dark:text-green-400";

const ERROR_STYLE: &str = "p-4 mb-4 text-sm rounded-lg shadow text-red-800 \
    bg-red-50 dark:bg-gray-800 dark:text-red-400";

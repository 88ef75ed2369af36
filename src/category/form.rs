//! The form shared by the create and edit category pages.

use maud::{Markup, html};

use crate::{
    category::CategoryKind,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
};

/// Which HTMX verb the form submits with.
pub(super) enum FormMethod {
    Post,
    Put,
}

/// Values to pre-fill the category form with.
pub(super) struct CategoryFormValues<'a> {
    pub title: &'a str,
    pub icon: &'a str,
    pub kind: CategoryKind,
}

impl Default for CategoryFormValues<'_> {
    fn default() -> Self {
        Self {
            title: "",
            icon: "",
            kind: CategoryKind::Expense,
        }
    }
}

pub(super) fn category_form_view(
    endpoint: &str,
    method: FormMethod,
    values: &CategoryFormValues<'_>,
    submit_text: &str,
    error_message: &str,
) -> Markup {
    let (hx_post, hx_put) = match method {
        FormMethod::Post => (Some(endpoint), None),
        FormMethod::Put => (None, Some(endpoint)),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="title" class=(FORM_LABEL_STYLE) { "Title" }

                input
                    id="title"
                    type="text"
                    name="title"
                    placeholder="Groceries"
                    value=(values.title)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="icon" class=(FORM_LABEL_STYLE) { "Icon" }

                input
                    id="icon"
                    type="text"
                    name="icon"
                    placeholder="🥕"
                    maxlength="8"
                    value=(values.icon)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset class="space-y-2"
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for kind in [CategoryKind::Expense, CategoryKind::Income] {
                        @let id = format!("category-type-{}", kind.as_str().to_lowercase());

                        div class="flex flex-1 items-center"
                        {
                            input
                                name="type_"
                                id=(id)
                                type="radio"
                                value=(kind.as_str())
                                checked[values.kind == kind]
                                required
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (kind) }
                        }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

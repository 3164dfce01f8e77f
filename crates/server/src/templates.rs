// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Server side rendered HTML pages
//!
//! All templates are compiled into the binary. Every page wraps its content in the `layout`
//! partial, which renders the navigation and the flash message.
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

const LAYOUT: &str = include_str!("../templates/layout.hbs");

const PAGES: &[(&str, &str)] = &[
    ("events", include_str!("../templates/events.hbs")),
    ("register", include_str!("../templates/register.hbs")),
    (
        "my_registrations",
        include_str!("../templates/my_registrations.hbs"),
    ),
    ("admin_login", include_str!("../templates/admin_login.hbs")),
    (
        "admin_dashboard",
        include_str!("../templates/admin_dashboard.hbs"),
    ),
    ("new_event", include_str!("../templates/new_event.hbs")),
    ("participants", include_str!("../templates/participants.hbs")),
];

pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);

        registry.register_partial("layout", LAYOUT)?;

        for (name, source) in PAGES {
            registry.register_template_string(name, source)?;
        }

        Ok(Self { registry })
    }

    #[tracing::instrument(level = "debug", skip(self, data))]
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        self.registry.render(name, data)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn layout(body: serde_json::Value) -> serde_json::Value {
        let mut context = json!({
            "title": "Test",
            "flash": null,
            "admin": null,
        });

        if let (Some(context), Some(body)) = (context.as_object_mut(), body.as_object()) {
            context.extend(body.clone());
        }

        context
    }

    #[test]
    fn all_templates_compile() {
        Templates::new().unwrap();
    }

    #[test]
    fn values_are_escaped() {
        let templates = Templates::new().unwrap();

        let html = templates
            .render(
                "my_registrations",
                &layout(json!({
                    "email": "<script>alert(1)</script>",
                    "registrations": [],
                })),
            )
            .unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn flash_is_rendered_with_level() {
        let templates = Templates::new().unwrap();
        let mut context = layout(json!({ "events": [] }));
        context["flash"] = json!({ "level": "success", "message": "Registration approved." });

        let html = templates.render("events", &context).unwrap();

        assert!(html.contains("flash-success"));
        assert!(html.contains("Registration approved."));
    }

    #[test]
    fn strict_mode_rejects_missing_values() {
        let templates = Templates::new().unwrap();

        assert!(templates.render("events", &json!({})).is_err());
    }
}

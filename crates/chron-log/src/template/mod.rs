//! Read-time rendering of activity descriptions.
//!
//! Template selection, first match wins:
//! 1. an explicit template passed to [`TemplateEngine::render`]
//! 2. the record's own `template`
//! 3. the registered template for the record's `event`
//! 4. the record's raw `description`, returned without substitution

mod presenter;
mod registry;
mod resolver;

pub use presenter::{ActivityPresenter, ActivityView};
pub use registry::{DEFAULT_TEMPLATES, TemplateRegistry};
pub use resolver::{NO_CAUSER, PlaceholderResolver, UNKNOWN};

use std::collections::HashMap;
use std::sync::LazyLock;

use chron_core::{ActivityRecord, EntityResolver};
use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Renders records into human-readable descriptions.
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    registry: TemplateRegistry,
}

impl TemplateEngine {
    /// Engine with the built-in default templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_registry(registry: TemplateRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Register an override for `event`. Visible to every later render.
    pub fn register(&mut self, event: impl Into<String>, template: impl Into<String>) {
        self.registry.register(event, template);
    }

    /// The template that applies to `record`, if any.
    #[must_use]
    pub fn select_template<'t>(
        &'t self,
        record: &'t ActivityRecord,
        template_override: Option<&'t str>,
    ) -> Option<&'t str> {
        template_override
            .filter(|t| !t.is_empty())
            .or_else(|| record.template.as_deref().filter(|t| !t.is_empty()))
            .or_else(|| {
                record
                    .event
                    .as_deref()
                    .filter(|e| !e.is_empty())
                    .and_then(|event| self.registry.get(event))
            })
    }

    /// Render `record`'s description.
    ///
    /// Never fails: unresolvable placeholders become empty strings or
    /// sentinels, and a record without any template renders its description.
    #[must_use]
    pub fn render(
        &self,
        record: &ActivityRecord,
        entities: &dyn EntityResolver,
        template_override: Option<&str>,
    ) -> String {
        match self.select_template(record, template_override) {
            Some(template) => Self::substitute(template, &PlaceholderResolver::new(record, entities)),
            None => record.description.clone(),
        }
    }

    /// Replace every `{path}` in `template`. Each distinct path resolves once.
    #[must_use]
    pub fn substitute(template: &str, resolver: &PlaceholderResolver<'_>) -> String {
        let mut resolved: HashMap<String, String> = HashMap::new();
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| {
                let path = caps.get(1).map_or("", |m| m.as_str());
                resolved
                    .entry(path.to_string())
                    .or_insert_with(|| resolver.resolve(path))
                    .clone()
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chron_core::{EntityRef, EntityRegistry, EntitySnapshot, NoEntities, Properties};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(description: &str) -> ActivityRecord {
        ActivityRecord {
            id: "act-0123456789abcdef".into(),
            log_name: "default".into(),
            description: description.into(),
            subject: None,
            causer: None,
            event: None,
            properties: Properties::new(),
            context: Properties::new(),
            template: None,
            batch_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn description_is_returned_verbatim_without_template() {
        let engine = TemplateEngine::new();
        let record = record("X {causer}");
        assert_eq!(engine.render(&record, &NoEntities, None), "X {causer}");
    }

    #[test]
    fn registered_created_template() {
        let mut engine = TemplateEngine::new();
        engine.register(
            "created",
            r#"{causer.name} created {subject.type} "{subject.name}""#,
        );
        let entities: EntityRegistry = [
            EntitySnapshot::new(EntityRef::new("User", "1")).with_attribute("name", "Ann"),
            EntitySnapshot::new(EntityRef::new("Article", "5")).with_attribute("name", "Hello"),
        ]
        .into_iter()
        .collect();

        let mut record = record("created article");
        record.event = Some("created".into());
        record.causer = Some(EntityRef::new("User", "1"));
        record.subject = Some(EntityRef::new("Article", "5"));

        assert_eq!(
            engine.render(&record, &entities, None),
            r#"Ann created article "Hello""#
        );
    }

    #[test]
    fn record_template_beats_event_template() {
        let mut engine = TemplateEngine::new();
        engine.register("custom_event", "Template from event: {properties.key}");
        let mut record = record("Default description");
        record.event = Some("custom_event".into());
        record.properties.insert("key".into(), json!("test value"));

        assert_eq!(
            engine.render(&record, &NoEntities, None),
            "Template from event: test value"
        );

        record.template = Some("Own: {properties.key}".into());
        assert_eq!(engine.render(&record, &NoEntities, None), "Own: test value");
        assert_eq!(
            engine.render(&record, &NoEntities, Some("Explicit {event}")),
            "Explicit custom_event"
        );
    }

    #[test]
    fn empty_templates_are_skipped() {
        let engine = TemplateEngine::with_registry(TemplateRegistry::empty());
        let mut record = record("fallback");
        record.template = Some(String::new());
        record.event = Some("created".into());
        assert_eq!(engine.render(&record, &NoEntities, Some("")), "fallback");
    }

    #[test]
    fn unknown_placeholders_render_empty() {
        let engine = TemplateEngine::new();
        let mut record = record("Default description");
        record.template = Some("Testing {unknown.variable} and {another.missing}".into());
        assert_eq!(engine.render(&record, &NoEntities, None), "Testing  and ");
    }

    #[test]
    fn repeated_placeholders_are_all_replaced() {
        let engine = TemplateEngine::new();
        let mut record = record("d");
        record.template = Some("{causer}/{causer}/{log_name}".into());
        assert_eq!(engine.render(&record, &NoEntities, None), "System/System/default");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let engine = TemplateEngine::new();
        let mut record = record("d");
        record.template = Some("plain text, no braces".into());
        assert_eq!(
            engine.render(&record, &NoEntities, None),
            "plain text, no braces"
        );
    }

    #[test]
    fn render_is_idempotent() {
        let engine = TemplateEngine::new();
        let mut record = record("d");
        record.event = Some("updated".into());
        record.subject = Some(EntityRef::new("Article", "1"));
        let first = engine.render(&record, &NoEntities, None);
        let second = engine.render(&record, &NoEntities, None);
        assert_eq!(first, second);
        assert_eq!(first, r#"unknown updated article "unknown""#);
    }
}

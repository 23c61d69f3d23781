//! Event -> template registry.

use std::collections::HashMap;

/// Templates shipped for the common lifecycle and session events.
pub const DEFAULT_TEMPLATES: [(&str, &str); 6] = [
    ("created", r#"{causer.name} created {subject.type} "{subject.name}""#),
    ("updated", r#"{causer.name} updated {subject.type} "{subject.name}""#),
    ("deleted", r#"{causer.name} deleted {subject.type} "{subject.name}""#),
    ("restored", r#"{causer.name} restored {subject.type} "{subject.name}""#),
    ("login", "{causer.name} logged in to the system"),
    ("logout", "{causer.name} logged out from the system"),
];

/// Two-tier template lookup: registered overrides win over built-in defaults.
///
/// Built once at startup and shared read-only by renderers afterwards; hosts
/// that register from several threads wrap it in a lock.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Registry holding the built-in defaults and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self {
            defaults: DEFAULT_TEMPLATES
                .iter()
                .map(|(event, template)| ((*event).to_string(), (*template).to_string()))
                .collect(),
            overrides: HashMap::new(),
        }
    }

    /// Registry without built-in defaults.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    /// Add or replace the override for `event`.
    pub fn register(&mut self, event: impl Into<String>, template: impl Into<String>) {
        self.overrides.insert(event.into(), template.into());
    }

    pub fn register_all<I, E, T>(&mut self, templates: I)
    where
        I: IntoIterator<Item = (E, T)>,
        E: Into<String>,
        T: Into<String>,
    {
        for (event, template) in templates {
            self.register(event, template);
        }
    }

    /// Template for `event`: override first, then default.
    #[must_use]
    pub fn get(&self, event: &str) -> Option<&str> {
        self.overrides
            .get(event)
            .or_else(|| self.defaults.get(event))
            .map(String::as_str)
    }

    /// Every event with a template, sorted, paired with the effective template.
    #[must_use]
    pub fn effective(&self) -> Vec<(&str, &str)> {
        let mut events: Vec<&str> = self
            .defaults
            .keys()
            .chain(self.overrides.keys())
            .map(String::as_str)
            .collect();
        events.sort_unstable();
        events.dedup();
        events
            .into_iter()
            .filter_map(|event| self.get(event).map(|template| (event, template)))
            .collect()
    }
}

//! Read-side presentation of a record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use chron_core::{ActivityRecord, EntityRef, EntityResolver, Properties};

use super::TemplateEngine;

/// A record paired with the engine and entity lookup needed to render it.
pub struct ActivityPresenter<'a> {
    record: &'a ActivityRecord,
    engine: &'a TemplateEngine,
    entities: &'a dyn EntityResolver,
}

/// Everything a presentation layer shows for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityView {
    pub id: String,
    pub description: String,
    pub raw_description: String,
    pub log_name: String,
    pub event: Option<String>,
    pub subject: Option<EntityRef>,
    pub subject_name: Option<String>,
    pub causer: Option<EntityRef>,
    pub causer_name: Option<String>,
    pub properties: Properties,
    pub context: Properties,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl<'a> ActivityPresenter<'a> {
    pub fn new(
        record: &'a ActivityRecord,
        engine: &'a TemplateEngine,
        entities: &'a dyn EntityResolver,
    ) -> Self {
        Self {
            record,
            engine,
            entities,
        }
    }

    /// The formatted description.
    #[must_use]
    pub fn description(&self) -> String {
        self.engine.render(self.record, self.entities, None)
    }

    /// Render an ad-hoc template against this record.
    #[must_use]
    pub fn render_template(&self, template: &str) -> String {
        self.engine.render(self.record, self.entities, Some(template))
    }

    #[must_use]
    pub fn view(&self) -> ActivityView {
        let name_of = |reference: &Option<EntityRef>| {
            reference
                .as_ref()
                .and_then(|r| self.entities.resolve(r))
                .map(|entity| entity.display_name())
        };

        ActivityView {
            id: self.record.id.clone(),
            description: self.description(),
            raw_description: self.record.description.clone(),
            log_name: self.record.log_name.clone(),
            event: self.record.event.clone(),
            subject: self.record.subject.clone(),
            subject_name: name_of(&self.record.subject),
            causer: self.record.causer.clone(),
            causer_name: name_of(&self.record.causer),
            properties: self.record.properties.clone(),
            context: self.record.context.clone(),
            batch_id: self.record.batch_id,
            created_at: self.record.created_at,
        }
    }
}

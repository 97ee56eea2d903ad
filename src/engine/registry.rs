//! Entity-type registry: name → (record source, parser), resolved once at startup.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::{CollectError, CollectResult};
use crate::source::{Parser, RecordSource};
use crate::EntityType;

/// Collect and parse behavior for one entity type.
#[derive(Clone)]
pub struct EntityHandler {
    pub source: Rc<dyn RecordSource>,
    pub parser: Rc<dyn Parser>,
}

impl EntityHandler {
    pub fn new(source: Rc<dyn RecordSource>, parser: Rc<dyn Parser>) -> Self {
        Self { source, parser }
    }
}

/// An entity type bound to its handler.
#[derive(Clone)]
pub struct ResolvedType {
    pub entity_type: EntityType,
    pub handler: EntityHandler,
}

/// One top-level Run's work: the primary type and its related types, in collection order.
#[derive(Clone)]
pub struct EntityPlan {
    pub primary: ResolvedType,
    pub related: Vec<ResolvedType>,
}

impl EntityPlan {
    pub fn name(&self) -> &str {
        &self.primary.entity_type.name
    }

    /// Primary first, then related types in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &ResolvedType> {
        std::iter::once(&self.primary).chain(self.related.iter())
    }
}

#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<String, EntityHandler>,
    fallback: Option<EntityHandler>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for any type without an explicit registration.
    pub fn with_fallback(mut self, handler: EntityHandler) -> Self {
        self.fallback = Some(handler);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, handler: EntityHandler) {
        self.handlers.insert(name.into(), handler);
    }

    fn handler_for(&self, name: &str) -> Option<&EntityHandler> {
        self.handlers.get(name).or(self.fallback.as_ref())
    }

    /// Bind every configured type to a handler and build one plan per top-level type.
    ///
    /// Fails if a type has no handler or a zero limit, a related name is unknown or
    /// self-referencing, a name repeats, or nothing is top-level.
    pub fn resolve(&self, types: &[EntityType]) -> CollectResult<Vec<EntityPlan>> {
        let mut by_name: HashMap<&str, ResolvedType> = HashMap::new();
        for et in types {
            if et.limit == 0 {
                return Err(CollectError::Config(format!(
                    "entity type '{}' has limit 0",
                    et.name
                )));
            }
            let handler = self.handler_for(&et.name).ok_or_else(|| {
                CollectError::Config(format!("no handler registered for '{}'", et.name))
            })?;
            let resolved = ResolvedType {
                entity_type: et.clone(),
                handler: handler.clone(),
            };
            if by_name.insert(et.name.as_str(), resolved).is_some() {
                return Err(CollectError::Config(format!(
                    "entity type '{}' configured twice",
                    et.name
                )));
            }
        }

        let mut plans = Vec::new();
        for et in types.iter().filter(|t| t.top_level) {
            let mut seen = HashSet::new();
            let mut related = Vec::new();
            for name in &et.related {
                if name == &et.name {
                    return Err(CollectError::Config(format!(
                        "entity type '{}' lists itself as related",
                        et.name
                    )));
                }
                let r = by_name.get(name.as_str()).ok_or_else(|| {
                    CollectError::Config(format!(
                        "entity type '{}' has unknown related type '{}'",
                        et.name, name
                    ))
                })?;
                if seen.insert(name.as_str()) {
                    related.push(r.clone());
                }
            }
            plans.push(EntityPlan {
                primary: by_name[et.name.as_str()].clone(),
                related,
            });
        }

        if plans.is_empty() {
            return Err(CollectError::Config(
                "no top-level entity types configured".to_string(),
            ));
        }
        Ok(plans)
    }
}

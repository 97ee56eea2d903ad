//! Rule-driven parser: copies the record, stamps scope fields, fans out nested arrays.

use serde_json::Value;

use super::{Parser, RawRecord};
use crate::engine::Batcher;
use crate::error::{CollectError, CollectResult};
use crate::{Entity, EntityType, Scope};

#[derive(Clone, Copy, Debug, Default)]
pub struct RuleParser;

/// Read `field` as a reference string. Numbers are accepted and stringified.
fn reference_of(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn stamp_scope(mut data: Value, scope: &Scope) -> Value {
    if let Value::Object(ref mut map) = data {
        map.insert("region".into(), Value::String(scope.region().to_string()));
        map.insert(
            "account_id".into(),
            Value::String(scope.account_id().to_string()),
        );
    }
    data
}

impl Parser for RuleParser {
    fn parse(
        &self,
        entity_type: &EntityType,
        record: &RawRecord,
        scope: &Scope,
        batch: &mut Batcher,
    ) -> CollectResult<()> {
        let rules = &entity_type.rules;
        let reference = reference_of(record, &rules.id_field).ok_or_else(|| {
            CollectError::Remote(format!(
                "{} record without '{}' in account {} region {}",
                entity_type.name,
                rules.id_field,
                scope.account_id(),
                scope.region()
            ))
        })?;

        let mut primary = record.clone();
        for (field, collection) in &rules.nested {
            let Some(Value::Array(items)) = primary.as_object_mut().and_then(|m| m.remove(field))
            else {
                continue;
            };
            for (i, item) in items.into_iter().enumerate() {
                // Nested items without their own id are keyed by parent and position.
                let child_ref = reference_of(&item, &rules.id_field)
                    .unwrap_or_else(|| format!("{reference}/{field}/{i}"));
                let mut data = stamp_scope(item, scope);
                if let Value::Object(ref mut m) = data {
                    m.insert("parent".into(), Value::String(reference.clone()));
                }
                batch.append(
                    collection,
                    Entity {
                        reference: child_ref,
                        data,
                    },
                );
            }
        }

        batch.append(
            entity_type.collection(),
            Entity {
                reference,
                data: stamp_scope(primary, scope),
            },
        );
        Ok(())
    }
}

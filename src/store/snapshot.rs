//! The battle-graph snapshot.

use im::Vector;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conditions::GameView;
use crate::core::{Id, Scalar};
use crate::error::{SerializationError, ValidationError};
use crate::schema::{
    AttributeComponent, Condition, EntityReference, EntityType, FieldPath, Regulator, StatsBundle,
};
use crate::triggers::Trigger;

use super::{Collection, Record};

/// The whole graph at one instant.
///
/// Collections are persistent vectors, so cloning a snapshot for
/// persistence or broadcast is cheap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleState {
    #[serde(default)]
    pub entities: Vector<EntityReference>,
    #[serde(default)]
    pub attributes: Vector<AttributeComponent>,
    #[serde(default)]
    pub stats_bundles: Vector<StatsBundle>,
    #[serde(default)]
    pub conditions: Vector<Condition>,
    #[serde(default)]
    pub triggers: Vector<Trigger>,
    #[serde(default)]
    pub regulators: Vector<Regulator>,
}

impl Default for BattleState {
    /// The built-in starting graph: one hero with HP and ATK.
    fn default() -> Self {
        let mut state = Self::empty();
        state.entities.push_back(
            EntityReference::new("char-001", EntityType::Character)
                .with_name("Test Hero")
                .with_tag("player"),
        );
        state
            .attributes
            .push_back(AttributeComponent::int("hp", "char-001", "HP", 100));
        state
            .attributes
            .push_back(AttributeComponent::int("atk", "char-001", "ATK", 15));
        state.stats_bundles.push_back(
            StatsBundle::new("bundle-001", "char-001")
                .with_attribute("hp")
                .with_attribute("atk")
                .with_name("Base Stats"),
        );
        state
    }
}

impl BattleState {
    /// A snapshot with every collection empty.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entities: Vector::new(),
            attributes: Vector::new(),
            stats_bundles: Vector::new(),
            conditions: Vector::new(),
            triggers: Vector::new(),
            regulators: Vector::new(),
        }
    }

    /// Number of records in a collection.
    #[must_use]
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Entities => self.entities.len(),
            Collection::Attributes => self.attributes.len(),
            Collection::StatsBundles => self.stats_bundles.len(),
            Collection::Conditions => self.conditions.len(),
            Collection::Triggers => self.triggers.len(),
            Collection::Regulators => self.regulators.len(),
        }
    }

    /// Get a record by key.
    #[must_use]
    pub fn get<R: Record>(&self, key: &Id) -> Option<&R> {
        R::items(self).iter().find(|r| r.key() == *key)
    }

    /// Position of a record by key.
    #[must_use]
    pub fn position<R: Record>(&self, key: &Id) -> Option<usize> {
        R::items(self).iter().position(|r| r.key() == *key)
    }

    #[must_use]
    pub fn entity(&self, uuid: &Id) -> Option<&EntityReference> {
        self.get(uuid)
    }

    #[must_use]
    pub fn bundle(&self, uuid: &Id) -> Option<&StatsBundle> {
        self.get(uuid)
    }

    /// Stats bundles owned by `owner`, in order.
    pub fn bundles_owned_by<'s>(&'s self, owner: &'s Id) -> impl Iterator<Item = &'s StatsBundle> + 's {
        self.stats_bundles.iter().filter(move |b| b.owner_uuid == *owner)
    }

    /// Attributes owned by `owner`, in order.
    pub fn attributes_of<'s>(&'s self, owner: &'s Id) -> impl Iterator<Item = &'s AttributeComponent> + 's {
        self.attributes.iter().filter(move |a| a.owner_uuid == *owner)
    }

    /// Every record whose `ownerUuid` is `owner`.
    #[must_use]
    pub fn dependents_of(&self, owner: &Id) -> Vec<(Collection, Id)> {
        self.owned_records()
            .into_iter()
            .filter(|(_, _, o)| *o == owner)
            .map(|(c, k, _)| (c, k))
            .collect()
    }

    /// Records whose owner is not in `entities`.
    ///
    /// Removing an entity never cascades; its dependents stay in place,
    /// queryable but inert.
    #[must_use]
    pub fn orphans(&self) -> Vec<(Collection, Id)> {
        self.owned_records()
            .into_iter()
            .filter(|(_, _, o)| !self.contains(o))
            .map(|(c, k, _)| (c, k))
            .collect()
    }

    fn owned_records(&self) -> Vec<(Collection, Id, &Id)> {
        let mut out = Vec::new();
        for e in &self.entities {
            if let Some(owner) = &e.owner_uuid {
                out.push((Collection::Entities, e.key(), owner));
            }
        }
        out.extend(self.attributes.iter().map(|r| (Collection::Attributes, r.key(), &r.owner_uuid)));
        out.extend(self.stats_bundles.iter().map(|r| (Collection::StatsBundles, r.key(), &r.owner_uuid)));
        out.extend(self.conditions.iter().map(|r| (Collection::Conditions, r.key(), &r.owner_uuid)));
        out.extend(self.triggers.iter().map(|r| (Collection::Triggers, r.key(), &r.owner_uuid)));
        out.extend(self.regulators.iter().map(|r| (Collection::Regulators, r.key(), &r.owner_uuid)));
        out
    }

    /// Serialize the full snapshot.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and validate a full snapshot. Absent collections are empty.
    pub fn from_json(payload: &str) -> Result<Self, SerializationError> {
        let value: Value = serde_json::from_str(payload)?;
        let partial = PartialSnapshot::from_value(&value, true)?;
        let mut state = Self::empty();
        partial.apply_to(&mut state);
        Ok(state)
    }

    /// Run every record's cross-field rules.
    ///
    /// Issue paths are prefixed with the collection and index, e.g.
    /// `attributes.1.value`.
    pub fn validate_records(&self) -> Result<(), ValidationError> {
        check_all(&self.entities)?;
        check_all(&self.attributes)?;
        check_all(&self.stats_bundles)?;
        check_all(&self.conditions)?;
        check_all(&self.triggers)?;
        check_all(&self.regulators)
    }
}

fn collection_path<R: Record>() -> FieldPath {
    FieldPath::root().field(R::COLLECTION.name())
}

fn check_all<R: Record>(items: &Vector<R>) -> Result<(), ValidationError> {
    let at = collection_path::<R>();
    let mut issues = Vec::new();
    for (i, item) in items.iter().enumerate() {
        item.check(&at.index(i), &mut issues);
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { kind: R::KIND, issues })
    }
}

impl GameView for BattleState {
    fn contains(&self, entity: &Id) -> bool {
        self.entities.iter().any(|e| e.uuid == *entity)
    }

    fn owner_of(&self, entity: &Id) -> Option<Id> {
        self.entity(entity)?.owner_uuid.clone()
    }

    fn attribute(&self, entity: &Id, key: &str) -> Option<Scalar> {
        self.attributes
            .iter()
            .find(|a| a.id == key && a.owner_uuid == *entity)?
            .scalar()
    }

    /// `statsUuid` when it names an existing bundle, else the first bundle
    /// the entity owns.
    fn stats_bundle_of(&self, entity: &Id) -> Option<Id> {
        let linked = self
            .entity(entity)
            .and_then(|e| e.stats_uuid.as_ref())
            .filter(|uuid| self.bundle(uuid).is_some());
        match linked {
            Some(uuid) => Some(uuid.clone()),
            None => self.bundles_owned_by(entity).next().map(|b| b.uuid.clone()),
        }
    }

    /// Inline stat first, then an attribute the bundle lists by id.
    fn bundle_stat(&self, bundle: &Id, key: &str) -> Option<Scalar> {
        let bundle = self.bundle(bundle)?;
        bundle.stat(key).or_else(|| {
            if !bundle.lists_attribute(key) {
                return None;
            }
            self.attributes.iter().find(|a| a.id == key)?.scalar()
        })
    }

    /// Listed by status entity uuid, or by a listed status's `definitionId`.
    fn has_status(&self, entity: &Id, status: &str) -> bool {
        let Some(holder) = self.entity(entity) else {
            return false;
        };
        holder.status_uuids.iter().any(|uuid| {
            uuid.is(status)
                || self
                    .entity(uuid)
                    .is_some_and(|s| s.definition_id.as_deref() == Some(status))
        })
    }

    fn has_tag(&self, entity: &Id, tag: &str) -> bool {
        self.entity(entity).is_some_and(|e| e.has_tag(tag))
    }
}

/// A snapshot payload where any collection may be absent.
///
/// Applying it replaces only the collections it carries; a `null` counts
/// as absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialSnapshot {
    pub entities: Option<Vector<EntityReference>>,
    pub attributes: Option<Vector<AttributeComponent>>,
    pub stats_bundles: Option<Vector<StatsBundle>>,
    pub conditions: Option<Vector<Condition>>,
    pub triggers: Option<Vector<Trigger>>,
    pub regulators: Option<Vector<Regulator>>,
}

impl PartialSnapshot {
    /// Decode a payload, optionally running structural and cross-field
    /// validation on every record it carries.
    pub fn from_value(value: &Value, validate: bool) -> Result<Self, SerializationError> {
        let Some(obj) = value.as_object() else {
            return Err(SerializationError::Malformed(serde::de::Error::custom(
                "snapshot must be a JSON object",
            )));
        };
        let read = |c: Collection| obj.get(c.name()).filter(|v| !v.is_null());

        Ok(Self {
            entities: decode(read(Collection::Entities), validate)?,
            attributes: decode(read(Collection::Attributes), validate)?,
            stats_bundles: decode(read(Collection::StatsBundles), validate)?,
            conditions: decode(read(Collection::Conditions), validate)?,
            triggers: decode(read(Collection::Triggers), validate)?,
            regulators: decode(read(Collection::Regulators), validate)?,
        })
    }

    /// Collections this payload carries.
    #[must_use]
    pub fn collections(&self) -> Vec<Collection> {
        let present = [
            self.entities.is_some(),
            self.attributes.is_some(),
            self.stats_bundles.is_some(),
            self.conditions.is_some(),
            self.triggers.is_some(),
            self.regulators.is_some(),
        ];
        Collection::ALL
            .into_iter()
            .zip(present)
            .filter_map(|(c, p)| p.then_some(c))
            .collect()
    }

    /// Overwrite the carried collections of `state`, in place.
    ///
    /// Returns the collections that were replaced.
    pub fn apply_to(self, state: &mut BattleState) -> Vec<Collection> {
        let replaced = self.collections();
        if let Some(v) = self.entities {
            state.entities = v;
        }
        if let Some(v) = self.attributes {
            state.attributes = v;
        }
        if let Some(v) = self.stats_bundles {
            state.stats_bundles = v;
        }
        if let Some(v) = self.conditions {
            state.conditions = v;
        }
        if let Some(v) = self.triggers {
            state.triggers = v;
        }
        if let Some(v) = self.regulators {
            state.regulators = v;
        }
        replaced
    }
}

fn decode<R: Record>(raw: Option<&Value>, validate: bool) -> Result<Option<Vector<R>>, SerializationError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    if validate {
        let at = collection_path::<R>();
        let mut issues = Vec::new();
        match raw.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    R::shape(item, &at.index(i), &mut issues);
                }
            }
            None => at.issue(&mut issues, format!("expected array, got {}", crate::schema::describe(raw))),
        }
        if !issues.is_empty() {
            return Err(ValidationError { kind: R::KIND, issues }.into());
        }
    }

    let items: Vector<R> = serde_json::from_value(raw.clone())?;
    if validate {
        check_all(&items)?;
    }
    Ok(Some(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CompareOp;
    use serde_json::json;

    #[test]
    fn test_default_snapshot() {
        let state = BattleState::default();
        let hero = Id::from("char-001");

        assert_eq!(state.entity(&hero).and_then(|e| e.name.as_deref()), Some("Test Hero"));
        assert_eq!(state.attributes_of(&hero).count(), 2);
        assert_eq!(state.stats_bundle_of(&hero), Some(Id::from("bundle-001")));
        assert_eq!(state.bundle_stat(&Id::from("bundle-001"), "atk"), Some(Scalar::Int(15)));
        assert!(state.conditions.is_empty());
        assert!(state.validate_records().is_ok());
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let mut state = BattleState::default();
        state
            .attributes
            .push_back(AttributeComponent::float("crit", "char-001", "Crit", 0.25));
        state.conditions.push_back(
            Condition::new("c1", "Low HP", "char-001", "char-001")
                .on_attribute("hp")
                .compare(CompareOp::LtPercent, 0.3),
        );
        state.stats_bundles.push_back(
            StatsBundle::new("bundle-002", "char-001")
                .with_stat("hp", 50)
                .with_stat("element", "fire"),
        );

        let back = BattleState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(back, state);
        let ids: Vec<_> = back.attributes.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["hp", "atk", "crit"]);
    }

    #[test]
    fn test_from_json_reports_record_paths() {
        let err = BattleState::from_json(
            &json!({
                "attributes": [
                    { "id": "hp", "ownerUuid": "c", "name": "HP", "valueType": "int", "value": 1 },
                    { "id": "mp", "ownerUuid": "c", "name": "MP", "valueType": "int", "value": 1.5 }
                ]
            })
            .to_string(),
        )
        .unwrap_err();

        match err {
            SerializationError::Invalid(e) => {
                assert_eq!(e.paths().collect::<Vec<_>>(), vec!["attributes.1.value"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            BattleState::from_json("not json"),
            Err(SerializationError::Malformed(_))
        ));
        assert!(matches!(
            BattleState::from_json("[1, 2]"),
            Err(SerializationError::Malformed(_))
        ));
        assert!(matches!(
            BattleState::from_json(r#"{ "entities": 3 }"#),
            Err(SerializationError::Invalid(_))
        ));
    }

    #[test]
    fn test_partial_apply_keeps_absent_collections() {
        let mut state = BattleState::default();
        let partial = PartialSnapshot::from_value(
            &json!({ "attributes": [], "regulators": null, "extra": true }),
            true,
        )
        .unwrap();

        assert_eq!(partial.collections(), vec![Collection::Attributes]);
        let replaced = partial.apply_to(&mut state);
        assert_eq!(replaced, vec![Collection::Attributes]);
        assert!(state.attributes.is_empty());
        assert_eq!(state.entities.len(), 1);
        assert_eq!(state.stats_bundles.len(), 1);
    }

    #[test]
    fn test_unvalidated_decode_skips_rules() {
        let payload = json!({
            "attributes": [
                { "id": "mp", "ownerUuid": "c", "name": "MP", "valueType": "int", "value": 1.5 }
            ]
        });
        assert!(PartialSnapshot::from_value(&payload, true).is_err());
        assert!(PartialSnapshot::from_value(&payload, false).is_ok());
    }

    #[test]
    fn test_orphans_and_dependents() {
        let mut state = BattleState::default();
        let hero = Id::from("char-001");
        assert_eq!(state.dependents_of(&hero).len(), 3);
        assert!(state.orphans().is_empty());

        state.entities.clear();
        let orphans = state.orphans();
        assert_eq!(
            orphans,
            vec![
                (Collection::Attributes, Id::from("hp")),
                (Collection::Attributes, Id::from("atk")),
                (Collection::StatsBundles, Id::from("bundle-001")),
            ]
        );
    }

    #[test]
    fn test_status_lookup() {
        let mut state = BattleState::default();
        state.entities.push_back(
            EntityReference::new("status-9", EntityType::Status).with_definition("poison"),
        );
        state.entities[0].status_uuids.push(Id::from("status-9"));
        let hero = Id::from("char-001");

        assert!(state.has_status(&hero, "status-9"));
        assert!(state.has_status(&hero, "poison"));
        assert!(!state.has_status(&hero, "burn"));
        assert!(state.has_tag(&hero, "player"));
    }
}

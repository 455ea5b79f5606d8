//! In-memory entity store, for tests and single-process embedding.

use crate::store::{CascadePolicy, Entity, EntityKind, EntityStore, Filter, StoreError};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Clone)]
struct Record {
    entity: Entity,
    version: u64,
}

/// Mutex-guarded map of records, versioned per entity.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Record>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, kind: EntityKind, id: Uuid) -> Result<Entity, StoreError> {
        let records = self.lock()?;
        records
            .get(&id)
            .filter(|r| r.entity.kind() == kind)
            .map(|r| r.entity.clone())
            .ok_or(StoreError::NotFound(id))
    }

    fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<Entity>, StoreError> {
        let records = self.lock()?;
        let hits = records
            .values()
            .filter(|r| r.entity.kind() == kind)
            .filter(|r| match filter {
                Filter::All => true,
                Filter::CompetitorEmail(email) => {
                    matches!(&r.entity, Entity::Competitor(c) if c.email.eq_ignore_ascii_case(email))
                }
                Filter::TournamentsByOwner(owner) => {
                    matches!(&r.entity, Entity::Tournament(t) if t.owner == *owner)
                }
            })
            .map(|r| r.entity.clone())
            .collect();
        Ok(hits)
    }

    fn put(&self, mut entity: Entity, expected_version: Option<u64>) -> Result<u64, StoreError> {
        let mut records = self.lock()?;
        let id = entity.id();
        let current = records.get(&id).map(|r| r.version);
        if let Some(expected) = expected_version {
            match current {
                None => return Err(StoreError::NotFound(id)),
                Some(actual) if actual != expected => {
                    return Err(StoreError::VersionConflict { id, expected, actual })
                }
                Some(_) => {}
            }
        }
        let version = current.unwrap_or(0) + 1;
        if let Entity::Tournament(t) = &mut entity {
            t.version = version;
        }
        records.insert(id, Record { entity, version });
        Ok(version)
    }

    fn delete(&self, id: Uuid, cascade: CascadePolicy) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        let record = records.get(&id).cloned().ok_or(StoreError::NotFound(id))?;
        match &record.entity {
            Entity::Tournament(t) => {
                let tid = t.id;
                records.remove(&id);
                // Stages, groups, matches, and Rules live inline, so they go
                // with the aggregate; competitor rosters are detached here.
                for r in records.values_mut() {
                    if let Entity::Competitor(c) = &mut r.entity {
                        c.tournament_ids.retain(|&x| x != tid);
                    }
                }
            }
            Entity::Sport(s) => {
                let dependents: Vec<Uuid> = records
                    .values()
                    .filter_map(|r| match &r.entity {
                        Entity::Tournament(t) if t.sport_id == s.id => Some(t.id),
                        _ => None,
                    })
                    .collect();
                if !dependents.is_empty() && cascade == CascadePolicy::Restrict {
                    return Err(StoreError::StillReferenced(id));
                }
                for dep in dependents {
                    records.remove(&dep);
                }
                records.remove(&id);
            }
            Entity::RuleSet(rs) => {
                let dependents: Vec<Uuid> = records
                    .values()
                    .filter_map(|r| match &r.entity {
                        Entity::Tournament(t) if t.rules.ruleset_id == rs.id => Some(t.id),
                        _ => None,
                    })
                    .collect();
                if !dependents.is_empty() && cascade == CascadePolicy::Restrict {
                    return Err(StoreError::StillReferenced(id));
                }
                for dep in dependents {
                    records.remove(&dep);
                }
                records.remove(&id);
            }
            Entity::Competitor(c) => {
                let cid = c.id;
                let enrolled = records.values().any(
                    |r| matches!(&r.entity, Entity::Tournament(t) if t.competitor_ids.contains(&cid)),
                );
                if enrolled && cascade == CascadePolicy::Restrict {
                    return Err(StoreError::StillReferenced(id));
                }
                for r in records.values_mut() {
                    if let Entity::Tournament(t) = &mut r.entity {
                        t.competitor_ids.retain(|&x| x != cid);
                    }
                }
                records.remove(&id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Competitor, Label, Rules, Sport, Tournament};
    use serde_json::json;

    fn sample_tournament() -> Tournament {
        Tournament::new(
            "owner",
            Label::new("Cup"),
            Uuid::new_v4(),
            Rules::new(Uuid::new_v4(), json!({})),
            Vec::new(),
        )
    }

    #[test]
    fn put_bumps_version_and_syncs_tournament() {
        let store = MemoryStore::new();
        let t = sample_tournament();
        let id = t.id;
        let v1 = store.put(Entity::Tournament(t), None).unwrap();
        assert_eq!(v1, 1);
        let stored = store.get_tournament(id).unwrap();
        assert_eq!(stored.version, 1);
        let v2 = store.put(Entity::Tournament(stored), Some(1)).unwrap();
        assert_eq!(v2, 2);
    }

    #[test]
    fn stale_write_is_rejected() {
        let store = MemoryStore::new();
        let t = sample_tournament();
        let id = t.id;
        store.put(Entity::Tournament(t.clone()), None).unwrap();
        store.put(Entity::Tournament(t.clone()), Some(1)).unwrap();
        let err = store.put(Entity::Tournament(t), Some(1)).unwrap_err();
        assert_eq!(
            err,
            StoreError::VersionConflict { id, expected: 1, actual: 2 }
        );
    }

    #[test]
    fn query_by_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let c = Competitor::new("Ada@Example.org", "Ada", "Lovelace");
        store.put(Entity::Competitor(c), None).unwrap();
        let hits = store
            .query(
                EntityKind::Competitor,
                &Filter::CompetitorEmail("ada@example.org".into()),
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn restrict_blocks_deleting_referenced_sport() {
        let store = MemoryStore::new();
        let sport = Sport::new(Label::new("Fencing"), Vec::new());
        let sport_id = sport.id;
        store.put(Entity::Sport(sport), None).unwrap();
        let mut t = sample_tournament();
        t.sport_id = sport_id;
        store.put(Entity::Tournament(t), None).unwrap();
        assert_eq!(
            store.delete(sport_id, CascadePolicy::Restrict),
            Err(StoreError::StillReferenced(sport_id))
        );
        store.delete(sport_id, CascadePolicy::Cascade).unwrap();
        assert!(store
            .query(EntityKind::Tournament, &Filter::All)
            .unwrap()
            .is_empty());
    }
}

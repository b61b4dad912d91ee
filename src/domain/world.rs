// Authoritative entity store. Owned by the simulation task; connection tasks
// reach it only through queued game events.

use super::state::{Entity, EntitySnapshot};
use std::collections::HashMap;

/// Errors returned by world store operations.
#[derive(Debug, PartialEq)]
pub enum WorldError {
    /// An entity with this id is already live.
    DuplicateId(u64),
}

/// Live entities in insertion order, indexed by id.
#[derive(Debug, Default)]
pub struct World {
    entities: Vec<Entity>,
    // id -> position in `entities`.
    index: HashMap<u64, usize>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity, rejecting ids that are already live.
    pub fn insert(&mut self, entity: Entity) -> Result<(), WorldError> {
        if self.index.contains_key(&entity.id) {
            return Err(WorldError::DuplicateId(entity.id));
        }
        self.index.insert(entity.id, self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    /// Removes and returns the entity with `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: u64) -> Option<Entity> {
        let slot = self.index.remove(&id)?;
        let removed = self.entities.remove(slot);
        for (offset, e) in self.entities[slot..].iter().enumerate() {
            self.index.insert(e.id, slot + offset);
        }
        Some(removed)
    }

    pub fn get(&self, id: u64) -> Option<&Entity> {
        self.index.get(&id).map(|&slot| &self.entities[slot])
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Entity> {
        self.index.get(&id).map(|&slot| &mut self.entities[slot])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Mutable view for the physics systems. Ids must not be changed through it.
    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Player-controlled subset of the live entities.
    pub fn players(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_player())
    }

    pub fn player_count(&self) -> usize {
        self.players().count()
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.entities.iter().map(EntitySnapshot::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn generic(id: u64) -> Entity {
        Entity::generic(id, Vec2::new(id as f32, 0.0), Vec2::ZERO, 10.0, 10)
    }

    #[test]
    fn when_id_already_live_then_insert_is_rejected() {
        let mut world = World::new();
        world.insert(generic(1)).expect("first insert should succeed");

        let result = world.insert(generic(1));

        assert_eq!(result, Err(WorldError::DuplicateId(1)));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn when_entity_removed_then_remaining_order_and_lookup_survive() {
        let mut world = World::new();
        for id in 1..=4 {
            world.insert(generic(id)).expect("insert should succeed");
        }

        let removed = world.remove(2).expect("entity 2 should be live");

        assert_eq!(removed.id, 2);
        let ids: Vec<u64> = world.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(world.get(4).map(|e| e.id), Some(4));
        assert!(world.get(2).is_none());
        assert!(world.remove(2).is_none());
    }

    #[test]
    fn when_removed_id_is_reinserted_then_it_is_accepted() {
        let mut world = World::new();
        world.insert(generic(7)).expect("insert should succeed");
        world.remove(7);

        assert!(world.insert(generic(7)).is_ok());
    }

    #[test]
    fn when_players_are_mixed_with_generic_bodies_then_player_view_only_lists_players() {
        let mut world = World::new();
        world.insert(generic(1)).expect("insert should succeed");
        world
            .insert(Entity::player(1_000_000, Vec2::ZERO, 20.0, 100))
            .expect("insert should succeed");
        world.insert(generic(2)).expect("insert should succeed");

        let player_ids: Vec<u64> = world.players().map(|e| e.id).collect();

        assert_eq!(player_ids, vec![1_000_000]);
        assert_eq!(world.player_count(), 1);
        assert!(player_ids.iter().all(|id| world.get(*id).is_some()));
    }

    #[test]
    fn when_snapshot_taken_then_it_carries_position_and_velocity_per_entity() {
        let mut world = World::new();
        world
            .insert(Entity::generic(
                3,
                Vec2::new(1.0, 2.0),
                Vec2::new(-3.0, 4.0),
                10.0,
                10,
            ))
            .expect("insert should succeed");

        let snapshot = world.snapshot();

        assert_eq!(
            snapshot,
            vec![EntitySnapshot {
                id: 3,
                x: 1.0,
                y: 2.0,
                vx: -3.0,
                vy: 4.0,
            }]
        );
    }
}

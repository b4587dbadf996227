//! Bidirectional id <-> `Entity` maps, one per entity kind.
//!
//! A referenced-but-missing id resolves to `None`; callers treat that as
//! "absent" and fall into the invariant-recovery paths of the rule/contact
//! steps rather than panicking. This is the one place the fail-fast
//! `.expect()` style used elsewhere is deliberately relaxed, because ids
//! here cross a trust boundary (network input, deferred despawns) that a
//! single-player game never has to cross.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::common::ids::{BeamId, FieldEffectId, ObjectiveId, ObstacleId, PlayerId, ProjectileId, UtilityId};

macro_rules! id_map {
    ($field:ident, $id:ty) => {
        pub fn $field(&self, id: $id) -> Option<Entity> {
            self.$field.by_id.get(&id).copied()
        }
    };
}

#[derive(Default, Debug)]
struct BiMap<Id: std::hash::Hash + Eq + Copy> {
    by_id: HashMap<Id, Entity>,
    by_entity: HashMap<Entity, Id>,
}

impl<Id: std::hash::Hash + Eq + Copy> BiMap<Id> {
    fn insert(&mut self, id: Id, entity: Entity) {
        self.by_id.insert(id, entity);
        self.by_entity.insert(entity, id);
    }

    fn remove_entity(&mut self, entity: Entity) {
        if let Some(id) = self.by_entity.remove(&entity) {
            self.by_id.remove(&id);
        }
    }
}

/// Typed id-keyed collections for every entity kind (Component B).
#[derive(Resource, Default, Debug)]
pub struct Registry {
    players: BiMap<PlayerId>,
    projectiles: BiMap<ProjectileId>,
    obstacles: BiMap<ObstacleId>,
    beams: BiMap<BeamId>,
    field_effects: BiMap<FieldEffectId>,
    utility: BiMap<UtilityId>,
    objectives: BiMap<ObjectiveId>,
}

impl Registry {
    pub fn insert_player(&mut self, id: PlayerId, entity: Entity) {
        self.players.insert(id, entity);
    }
    pub fn insert_projectile(&mut self, id: ProjectileId, entity: Entity) {
        self.projectiles.insert(id, entity);
    }
    pub fn insert_obstacle(&mut self, id: ObstacleId, entity: Entity) {
        self.obstacles.insert(id, entity);
    }
    pub fn insert_beam(&mut self, id: BeamId, entity: Entity) {
        self.beams.insert(id, entity);
    }
    pub fn insert_field_effect(&mut self, id: FieldEffectId, entity: Entity) {
        self.field_effects.insert(id, entity);
    }
    pub fn insert_utility(&mut self, id: UtilityId, entity: Entity) {
        self.utility.insert(id, entity);
    }
    pub fn insert_objective(&mut self, id: ObjectiveId, entity: Entity) {
        self.objectives.insert(id, entity);
    }

    id_map!(players, PlayerId);
    id_map!(projectiles, ProjectileId);
    id_map!(obstacles, ObstacleId);
    id_map!(beams, BeamId);
    id_map!(field_effects, FieldEffectId);
    id_map!(utility, UtilityId);
    id_map!(objectives, ObjectiveId);

    pub fn id_of_player(&self, entity: Entity) -> Option<PlayerId> {
        self.players.by_entity.get(&entity).copied()
    }
    pub fn id_of_projectile(&self, entity: Entity) -> Option<ProjectileId> {
        self.projectiles.by_entity.get(&entity).copied()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.by_id.keys().copied()
    }
    pub fn projectile_ids(&self) -> impl Iterator<Item = ProjectileId> + '_ {
        self.projectiles.by_id.keys().copied()
    }

    /// Drops every mapping that refers to `entity`, from whichever kind it
    /// belongs to. Called once per despawn by [`super::flush_despawns`].
    pub fn forget(&mut self, entity: Entity) {
        self.players.remove_entity(entity);
        self.projectiles.remove_entity(entity);
        self.obstacles.remove_entity(entity);
        self.beams.remove_entity(entity);
        self.field_effects.remove_entity(entity);
        self.utility.remove_entity(entity);
        self.objectives.remove_entity(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_id_resolves_to_none() {
        let registry = Registry::default();
        let fake = PlayerId::default_for_test();
        assert!(registry.players(fake).is_none());
    }

    #[test]
    fn forget_clears_both_directions() {
        let mut registry = Registry::default();
        let id = PlayerId::default_for_test();
        let entity = Entity::from_raw(0);
        registry.insert_player(id, entity);
        assert_eq!(registry.players(id), Some(entity));
        registry.forget(entity);
        assert_eq!(registry.players(id), None);
        assert_eq!(registry.id_of_player(entity), None);
    }
}

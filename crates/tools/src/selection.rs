use scenekit_common::EntityId;
use scenekit_ecs::EntitySet;
use std::collections::BTreeSet;

/// Set of entities picked in the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySelection {
    selected: BTreeSet<EntityId>,
}

impl EntitySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    /// Set `id`'s selection state. Without `add` the rest of the selection is
    /// cleared first.
    pub fn select(&mut self, id: EntityId, selected: bool, add: bool) {
        if !add {
            self.selected.clear();
        }
        if selected {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    /// Flip `id` without touching the rest of the selection.
    pub fn toggle(&mut self, id: EntityId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.selected.iter().copied()
    }

    /// Drop ids that no longer name a live entity.
    pub fn retain_live(&mut self, entities: &EntitySet) {
        self.selected.retain(|id| entities.contains_entity(*id));
    }

    /// Parent of the shallowest selected entity, where a new sibling would go.
    /// `None` when nothing is selected or a root is selected.
    pub fn rootmost_parent(&self, entities: &EntitySet) -> Option<EntityId> {
        let shallowest = self.shallowest(entities)?;
        entities.parent_of(shallowest)
    }

    /// The shallowest selected entity, where a new child would go. Ties go to
    /// the lowest id.
    pub fn rootmost_entity(&self, entities: &EntitySet) -> Option<EntityId> {
        self.shallowest(entities)
    }

    fn shallowest(&self, entities: &EntitySet) -> Option<EntityId> {
        self.selected
            .iter()
            .copied()
            .filter(|id| entities.contains_entity(*id))
            .min_by_key(|id| entities.parent_count(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_replaces_unless_adding() {
        let mut selection = EntitySelection::new();
        selection.select(EntityId(1), true, false);
        selection.select(EntityId(2), true, false);
        assert!(!selection.is_selected(EntityId(1)));
        assert!(selection.is_selected(EntityId(2)));

        selection.select(EntityId(3), true, true);
        assert_eq!(selection.len(), 2);
        selection.select(EntityId(2), false, true);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec![EntityId(3)]);
    }

    #[test]
    fn toggle_and_clear() {
        let mut selection = EntitySelection::new();
        selection.toggle(EntityId(4));
        assert!(selection.is_selected(EntityId(4)));
        selection.toggle(EntityId(4));
        assert!(selection.is_empty());
        selection.toggle(EntityId(5));
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn rootmost_queries() {
        let mut entities = EntitySet::default();
        let root = entities.create_entity();
        let child = entities.add_child(root).unwrap();
        let grandchild = entities.add_child(child).unwrap();
        let other = entities.create_entity();
        let other_child = entities.add_child(other).unwrap();

        let mut selection = EntitySelection::new();
        assert_eq!(selection.rootmost_entity(&entities), None);

        selection.select(grandchild, true, true);
        selection.select(other_child, true, true);
        assert_eq!(selection.rootmost_entity(&entities), Some(other_child));
        assert_eq!(selection.rootmost_parent(&entities), Some(other));

        selection.select(root, true, true);
        assert_eq!(selection.rootmost_entity(&entities), Some(root));
        assert_eq!(selection.rootmost_parent(&entities), None);
    }

    #[test]
    fn stale_ids_are_ignored() {
        let mut entities = EntitySet::default();
        let keep = entities.create_entity();
        let gone = entities.create_entity();
        let mut selection = EntitySelection::new();
        selection.select(keep, true, true);
        selection.select(gone, true, true);
        entities.remove_entity(gone, true);

        assert_eq!(selection.rootmost_entity(&entities), Some(keep));
        selection.retain_live(&entities);
        assert_eq!(selection.len(), 1);
    }
}

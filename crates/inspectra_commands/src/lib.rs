use bevy::{input_focus::InputFocus, prelude::*};

mod prefab;
mod snapshot;

pub use prefab::{
    BreakPrefab, PrefabLink, PrefabTemplate, apply_prefab, instantiate_prefab, revert_prefab,
};
pub use snapshot::{
    RecordEntity, restore_entity, snapshot_entity, snapshot_rebuild, write_snapshot,
};

pub struct CommandHistoryPlugin;

impl Plugin for CommandHistoryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CommandHistory>()
            .register_type::<PrefabLink>()
            .register_type::<PrefabTemplate>()
            .add_systems(Update, handle_undo_redo_keys);
    }
}

// ---------------------------------------------------------------------------
// EditorCommand trait
// ---------------------------------------------------------------------------

pub trait EditorCommand: Send + Sync + 'static {
    fn execute(&self, world: &mut World);
    fn undo(&self, world: &mut World);
    fn description(&self) -> &str;
}

// ---------------------------------------------------------------------------
// CommandHistory resource
// ---------------------------------------------------------------------------

/// Identity of one undo entry, stable while it stays on the undo stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(pub u64);

struct HistoryEntry {
    id: EntryId,
    command: Box<dyn EditorCommand>,
}

#[derive(Resource, Default)]
pub struct CommandHistory {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    next_id: u64,
}

impl CommandHistory {
    pub fn execute(&mut self, command: Box<dyn EditorCommand>, world: &mut World) -> EntryId {
        command.execute(world);
        self.push_recorded(command)
    }

    /// Pushes a command whose effect is already in the world, such as a
    /// snapshot taken before a series of live edits.
    pub fn push_recorded(&mut self, command: Box<dyn EditorCommand>) -> EntryId {
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.undo_stack.push(HistoryEntry { id, command });
        self.redo_stack.clear();
        id
    }

    /// Drops the entry `id` without undoing it, but only while it is the most
    /// recent one.
    pub fn pop_at(&mut self, id: EntryId) -> bool {
        if self.top_id() != Some(id) {
            return false;
        }
        self.undo_stack.pop();
        true
    }

    pub fn top_id(&self) -> Option<EntryId> {
        self.undo_stack.last().map(|entry| entry.id)
    }

    pub fn undo(&mut self, world: &mut World) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        entry.command.undo(world);
        self.redo_stack.push(entry);
        true
    }

    pub fn redo(&mut self, world: &mut World) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        entry.command.execute(world);
        self.undo_stack.push(entry);
        true
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Descriptions on the undo stack, oldest first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().map(|entry| entry.command.description())
    }
}

// ---------------------------------------------------------------------------
// Keyboard shortcut system
// ---------------------------------------------------------------------------

fn handle_undo_redo_keys(world: &mut World) {
    // Text fields own Ctrl+Z while they have focus.
    if world
        .get_resource::<InputFocus>()
        .is_some_and(|focus| focus.0.is_some())
    {
        return;
    }

    let keyboard = world.resource::<ButtonInput<KeyCode>>();
    let ctrl = keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]);
    let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    let z_pressed = keyboard.just_pressed(KeyCode::KeyZ);

    if !ctrl || !z_pressed {
        return;
    }

    world.resource_scope(|world, mut history: Mut<CommandHistory>| {
        if shift {
            history.redo(world);
        } else {
            history.undo(world);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct Counter(i32);

    struct Add(i32);

    impl EditorCommand for Add {
        fn execute(&self, world: &mut World) {
            world.resource_mut::<Counter>().0 += self.0;
        }

        fn undo(&self, world: &mut World) {
            world.resource_mut::<Counter>().0 -= self.0;
        }

        fn description(&self) -> &str {
            "Add"
        }
    }

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<Counter>();
        world
    }

    #[test]
    fn undo_and_redo() {
        let mut world = world();
        let mut history = CommandHistory::default();
        history.execute(Box::new(Add(2)), &mut world);
        history.execute(Box::new(Add(3)), &mut world);
        assert_eq!(world.resource::<Counter>().0, 5);
        assert_eq!(history.undo_descriptions().collect::<Vec<_>>(), vec!["Add", "Add"]);

        assert!(history.undo(&mut world));
        assert_eq!(world.resource::<Counter>().0, 2);
        assert!(history.redo(&mut world));
        assert_eq!(world.resource::<Counter>().0, 5);
        assert!(!history.redo(&mut world));
    }

    #[test]
    fn new_entry_clears_redo() {
        let mut world = world();
        let mut history = CommandHistory::default();
        history.execute(Box::new(Add(1)), &mut world);
        history.undo(&mut world);
        assert_eq!(history.redo_len(), 1);
        history.execute(Box::new(Add(4)), &mut world);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn pop_at_only_removes_the_top_entry() {
        let mut world = world();
        let mut history = CommandHistory::default();
        let first = history.push_recorded(Box::new(Add(1)));
        assert_eq!(history.top_id(), Some(first));

        let second = history.execute(Box::new(Add(1)), &mut world);
        assert!(!history.pop_at(first));
        assert_eq!(history.undo_len(), 2);

        assert!(history.pop_at(second));
        assert!(history.pop_at(first));
        assert_eq!(history.undo_len(), 0);
        // Popping discards without undoing.
        assert_eq!(world.resource::<Counter>().0, 1);
    }
}

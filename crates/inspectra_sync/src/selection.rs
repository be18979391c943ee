//! Owns the one active inspection session and reacts to selection changes.

use tracing::debug;

use crate::{
    engine::{EntityView, FrameOutcome},
    fields::WidgetSpec,
    host::{InspectorHost, UndoAnchor},
    ids::{ObjectId, WidgetId},
    inspector::{InspectorCx, InspectorRegistry},
    modification::ModificationState,
    resource::ResourceView,
    settings::InspectorSettings,
    store::PropertyStore,
};

pub const NO_SELECTION_MESSAGE: &str = "No object selected";
pub const MULTIPLE_SELECTION_MESSAGE: &str = "Multiple objects selected";

/// Centered message shown when nothing single is inspectable.
pub struct Placeholder {
    root: WidgetId,
    message: &'static str,
}

impl Placeholder {
    fn build(host: &mut dyn InspectorHost, message: &'static str) -> Self {
        let root = host.create(None, WidgetSpec::ScrollArea);
        let layout = host.create(Some(root), WidgetSpec::Column);
        host.create(Some(layout), WidgetSpec::FlexibleSpace);
        let row = host.create(Some(layout), WidgetSpec::Row);
        host.create(Some(row), WidgetSpec::FlexibleSpace);
        host.create(Some(row), WidgetSpec::Label(message.to_string()));
        host.create(Some(row), WidgetSpec::FlexibleSpace);
        host.create(Some(layout), WidgetSpec::FlexibleSpace);
        Self { root, message }
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn message(&self) -> &str {
        self.message
    }
}

pub enum InspectedTarget {
    None(Placeholder),
    Multiple(Placeholder),
    SceneEntity(EntityView),
    Resource(ResourceView),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    None,
    Multiple,
    SceneEntity,
    Resource,
}

impl InspectedTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::None(_) => TargetKind::None,
            Self::Multiple(_) => TargetKind::Multiple,
            Self::SceneEntity(_) => TargetKind::SceneEntity,
            Self::Resource(_) => TargetKind::Resource,
        }
    }

    fn destroy(self, cx: &mut InspectorCx<'_>) {
        match self {
            Self::None(placeholder) | Self::Multiple(placeholder) => {
                cx.host.destroy(placeholder.root)
            }
            Self::SceneEntity(view) => view.destroy(cx),
            Self::Resource(view) => view.destroy(cx),
        }
    }
}

/// Drives one [`InspectedTarget`] at a time.
///
/// Opening a scene object records an undo snapshot first so the session's
/// edits undo as one step. If the session ends without any modification, that
/// snapshot is popped again.
pub struct SelectionCoordinator {
    target: Option<InspectedTarget>,
    undo_anchor: Option<UndoAnchor>,
    store: PropertyStore,
    registry: InspectorRegistry,
    settings: InspectorSettings,
}

impl SelectionCoordinator {
    pub fn new(settings: InspectorSettings, registry: InspectorRegistry) -> Self {
        Self {
            target: None,
            undo_anchor: None,
            store: PropertyStore::default(),
            registry,
            settings,
        }
    }

    pub fn with_store(mut self, store: PropertyStore) -> Self {
        self.store = store;
        self
    }

    pub fn on_selection_changed(
        &mut self,
        host: &mut dyn InspectorHost,
        objects: &[ObjectId],
        paths: &[String],
    ) {
        if let Some(InspectedTarget::SceneEntity(view)) = &self.target
            && view.modification() == ModificationState::NotModified
            && let Some(anchor) = self.undo_anchor
            && host.pop_at(anchor)
        {
            debug!("Discarded unmodified undo snapshot {anchor:?}");
        }
        self.undo_anchor = None;
        self.clear(host);

        let target = match (objects, paths) {
            ([], []) => InspectedTarget::None(Placeholder::build(host, NO_SELECTION_MESSAGE)),
            ([object], []) => self.inspect_object(host, *object),
            ([], [path]) => self.inspect_resource(host, path),
            _ => InspectedTarget::Multiple(Placeholder::build(host, MULTIPLE_SELECTION_MESSAGE)),
        };
        debug!("Inspecting {:?}", target.kind());
        self.target = Some(target);
    }

    /// Runs one frame of the active session. Returns `None` when only a
    /// placeholder is shown.
    pub fn update(&mut self, host: &mut dyn InspectorHost) -> Option<FrameOutcome> {
        let events = host.drain_events();
        let outcome = {
            let mut cx = InspectorCx {
                host: &mut *host,
                store: &mut self.store,
                settings: &self.settings,
            };
            match self.target.as_mut()? {
                InspectedTarget::SceneEntity(view) => {
                    view.sync_frame(&mut cx, &self.registry, &events)
                }
                InspectedTarget::Resource(view) => view.sync_frame(&mut cx, &events),
                InspectedTarget::None(_) | InspectedTarget::Multiple(_) => return None,
            }
        };

        if outcome == FrameOutcome::TargetLost {
            debug!("Inspected target vanished");
            // The snapshot may hold edits made before the target went away.
            self.undo_anchor = None;
            self.clear(host);
            self.target = Some(InspectedTarget::None(Placeholder::build(
                host,
                NO_SELECTION_MESSAGE,
            )));
        }
        Some(outcome)
    }

    /// Window resized: drop regions are stale.
    pub fn on_resize(&mut self) {
        if let Some(InspectedTarget::SceneEntity(view)) = &mut self.target {
            view.mark_layout_stale();
        }
    }

    pub fn target(&self) -> Option<&InspectedTarget> {
        self.target.as_ref()
    }

    pub fn target_kind(&self) -> Option<TargetKind> {
        self.target.as_ref().map(InspectedTarget::kind)
    }

    pub fn entity_view(&self) -> Option<&EntityView> {
        match &self.target {
            Some(InspectedTarget::SceneEntity(view)) => Some(view),
            _ => None,
        }
    }

    pub fn resource_view(&self) -> Option<&ResourceView> {
        match &self.target {
            Some(InspectedTarget::Resource(view)) => Some(view),
            _ => None,
        }
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        match &self.target {
            Some(InspectedTarget::None(p) | InspectedTarget::Multiple(p)) => Some(p),
            _ => None,
        }
    }

    pub fn undo_anchor(&self) -> Option<UndoAnchor> {
        self.undo_anchor
    }

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    pub fn settings(&self) -> &InspectorSettings {
        &self.settings
    }

    /// Takes effect on the next refresh.
    pub fn set_settings(&mut self, settings: InspectorSettings) {
        self.settings = settings;
        self.on_resize();
    }

    pub fn registry_mut(&mut self) -> &mut InspectorRegistry {
        &mut self.registry
    }

    fn inspect_object(&mut self, host: &mut dyn InspectorHost, object: ObjectId) -> InspectedTarget {
        if !host.is_alive(object) {
            return InspectedTarget::None(Placeholder::build(host, NO_SELECTION_MESSAGE));
        }
        self.undo_anchor = Some(host.record_snapshot(object, "Inspector edit"));
        let mut cx = InspectorCx {
            host,
            store: &mut self.store,
            settings: &self.settings,
        };
        InspectedTarget::SceneEntity(EntityView::build(&mut cx, &self.registry, object))
    }

    fn inspect_resource(&mut self, host: &mut dyn InspectorHost, path: &str) -> InspectedTarget {
        let view = {
            let mut cx = InspectorCx {
                host: &mut *host,
                store: &mut self.store,
                settings: &self.settings,
            };
            ResourceView::build(&mut cx, &self.registry, path)
        };
        match view {
            Some(view) => InspectedTarget::Resource(view),
            None => InspectedTarget::None(Placeholder::build(host, NO_SELECTION_MESSAGE)),
        }
    }

    /// Tears down the current tree and discards input raised against it.
    fn clear(&mut self, host: &mut dyn InspectorHost) {
        if let Some(target) = self.target.take() {
            let mut cx = InspectorCx {
                host: &mut *host,
                store: &mut self.store,
                settings: &self.settings,
            };
            target.destroy(&mut cx);
        }
        host.drain_events();
    }
}

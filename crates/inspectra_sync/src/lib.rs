//! Reconciliation between one selected live object and the widget subtree that
//! displays it.
//!
//! Nothing in this crate talks to a concrete UI toolkit, scene graph or undo
//! log. Those are reached through the traits in [`host`], so the same engine
//! drives the Bevy inspector panel and the in-memory [`headless`] host used by
//! tests.

pub mod drop_target;
pub mod engine;
pub mod error;
pub mod fields;
pub mod headless;
pub mod host;
pub mod ids;
pub mod inspector;
pub mod modification;
pub mod resource;
pub mod selection;
pub mod settings;
pub mod store;

pub use drop_target::{ComponentGeometry, DropRegions, DropTarget};
pub use engine::{ComponentEntry, Divergence, EntityView, FrameOutcome, HeaderField};
pub use error::StoreError;
pub use fields::{
    Axis, EditorKind, FieldDescriptor, FieldValue, Mobility, ObjectEdit, ObjectFields,
    PrefabStatus, WidgetEvent, WidgetEventKind, WidgetSpec,
};
pub use host::{
    DirtySink, DragPayload, DragPhase, DragSource, InspectorHost, ResourceKind,
    ResourceLibrary, ResourceMeta, SceneAccess, SubObjectInfo, UndoAnchor, UndoLog, WidgetHost,
};
pub use ids::{ObjectId, SubObjectId, TypeKey, WidgetId};
pub use inspector::{GenericInspector, Inspectable, Inspector, InspectorCx, InspectorRegistry};
pub use modification::ModificationState;
pub use resource::ResourceView;
pub use selection::{InspectedTarget, Placeholder, SelectionCoordinator, TargetKind};
pub use settings::{CoordinateSpace, InspectorSettings};
pub use store::{OwnerId, PropertyKey, PropertyName, PropertyStore, PropertyValue};

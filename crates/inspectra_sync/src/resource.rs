use std::path::Path;

use crate::{
    engine::FrameOutcome,
    fields::{WidgetEvent, WidgetSpec},
    ids::{TypeKey, WidgetId},
    inspector::{Inspectable, Inspector, InspectorCx, InspectorRegistry},
    store::OwnerId,
};

/// Inspector session for one asset selected in the asset library.
pub struct ResourceView {
    path: String,
    owner: OwnerId,
    root: WidgetId,
    title: WidgetId,
    panel: WidgetId,
    inspector: Box<dyn Inspector>,
}

impl ResourceView {
    /// Returns `None` if the library has no metadata for `path`.
    pub fn build(
        cx: &mut InspectorCx<'_>,
        registry: &InspectorRegistry,
        path: &str,
    ) -> Option<Self> {
        let meta = cx.host.resource_meta(path)?;
        let type_key = TypeKey::new(meta.type_name);

        let root = cx.host.create(None, WidgetSpec::ScrollArea);
        let content = cx.host.create(Some(root), WidgetSpec::Column);
        let title = cx.host.create(
            Some(content),
            WidgetSpec::Panel {
                height: Some(cx.settings.resource_title_height),
            },
        );
        let title_layout = cx.host.create(Some(title), WidgetSpec::Column);
        cx.host.create(Some(title_layout), WidgetSpec::FlexibleSpace);
        cx.host.create(
            Some(title_layout),
            WidgetSpec::Label(title_text(path, &type_key)),
        );
        cx.host.create(Some(title_layout), WidgetSpec::FlexibleSpace);

        cx.host.create(
            Some(content),
            WidgetSpec::Space(cx.settings.component_spacing),
        );
        let panel = cx
            .host
            .create(Some(content), WidgetSpec::Panel { height: None });

        let owner = OwnerId::Resource(meta.uuid);
        let mut inspector = registry.create(&type_key);
        inspector.initialize(
            cx,
            panel,
            Inspectable::Resource {
                path: path.to_string(),
            },
            owner.clone(),
        );
        cx.host.create(Some(content), WidgetSpec::FlexibleSpace);

        Some(Self {
            path: path.to_string(),
            owner,
            root,
            title,
            panel,
            inspector,
        })
    }

    pub fn sync_frame(&mut self, cx: &mut InspectorCx<'_>, events: &[WidgetEvent]) -> FrameOutcome {
        if cx.host.resource_meta(&self.path).is_none() {
            return FrameOutcome::TargetLost;
        }
        for event in events {
            self.inspector.handle_event(cx, event);
        }
        FrameOutcome::Refreshed(self.inspector.refresh(cx))
    }

    pub fn destroy(mut self, cx: &mut InspectorCx<'_>) {
        self.inspector.destroy(cx);
        cx.host.destroy(self.root);
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn title(&self) -> WidgetId {
        self.title
    }

    pub fn panel(&self) -> WidgetId {
        self.panel
    }
}

/// `"brick (Image)"` for `textures/brick.png` of type `bevy_image::Image`.
fn title_text(path: &str, type_key: &TypeKey) -> String {
    let stem = Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path);
    format!("{stem} ({})", type_key.short_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fields::{FieldDescriptor, FieldValue, WidgetEventKind},
        headless::HeadlessHost,
        host::{ResourceKind, ResourceMeta},
        modification::ModificationState,
        settings::InspectorSettings,
        store::PropertyStore,
    };

    fn material_host() -> HeadlessHost {
        let mut host = HeadlessHost::default();
        host.add_resource(
            "materials/brick.mat",
            ResourceMeta {
                uuid: "4f1c".into(),
                type_name: "render::StandardMaterial".into(),
                kind: ResourceKind::Other,
            },
            vec![FieldDescriptor::float("roughness", 0.5)],
            Vec::new(),
        );
        host
    }

    #[test]
    fn title_uses_stem_and_type() {
        assert_eq!(
            title_text("textures/brick.png", &TypeKey::new("bevy_image::Image")),
            "brick (Image)"
        );
    }

    #[test]
    fn builds_and_edits_resource() {
        let mut host = material_host();
        let mut store = PropertyStore::default();
        let settings = InspectorSettings::default();
        let registry = InspectorRegistry::default();
        let mut cx = InspectorCx { host: &mut host, store: &mut store, settings: &settings };

        let mut view = ResourceView::build(&mut cx, &registry, "materials/brick.mat").unwrap();
        assert_eq!(view.owner(), &OwnerId::Resource("4f1c".into()));
        drop(cx);

        assert!(host.find_label(view.root(), "brick (StandardMaterial)").is_some());
        let roughness = host.find_field(view.panel(), "roughness").unwrap();
        let events = vec![WidgetEvent::new(
            roughness,
            WidgetEventKind::ValueChanged(FieldValue::Float(0.9)),
        )];

        let mut cx = InspectorCx { host: &mut host, store: &mut store, settings: &settings };
        assert_eq!(
            view.sync_frame(&mut cx, &events),
            FrameOutcome::Refreshed(ModificationState::ModifyInProgress)
        );
    }

    #[test]
    fn missing_resource_is_lost() {
        let mut host = material_host();
        let mut store = PropertyStore::default();
        let settings = InspectorSettings::default();
        let registry = InspectorRegistry::default();

        let mut cx = InspectorCx { host: &mut host, store: &mut store, settings: &settings };
        assert!(ResourceView::build(&mut cx, &registry, "missing.png").is_none());
        let mut view = ResourceView::build(&mut cx, &registry, "materials/brick.mat").unwrap();
        drop(cx);

        host.remove_resource("materials/brick.mat");
        let mut cx = InspectorCx { host: &mut host, store: &mut store, settings: &settings };
        assert_eq!(view.sync_frame(&mut cx, &[]), FrameOutcome::TargetLost);
    }
}

//! Drop zones between component panels, in content-local coordinates.

use bevy::math::{Rect, Vec2};

use crate::{
    host::{DragPayload, InspectorHost, ResourceKind},
    ids::TypeKey,
};

/// Measured size of one component entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComponentGeometry {
    pub title_height: f32,
    pub body_height: f32,
    pub folded: bool,
}

/// One region per component gap plus a trailing region below the last
/// component that extends to the bottom of the content area.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DropRegions {
    regions: Vec<Rect>,
}

impl DropRegions {
    pub fn compute(
        header_height: f32,
        spacing: f32,
        content_size: Vec2,
        components: &[ComponentGeometry],
    ) -> Self {
        let width = content_size.x;
        let mut regions = Vec::with_capacity(components.len() + 1);
        let mut y = header_height;
        for component in components {
            regions.push(Rect::new(0.0, y, width, y + spacing));
            y += component.title_height + spacing;
            if !component.folded {
                y += component.body_height;
            }
        }
        regions.push(Rect::new(0.0, y, width, content_size.y.max(y)));
        Self { regions }
    }

    pub fn regions(&self) -> &[Rect] {
        &self.regions
    }

    pub fn trailing(&self) -> Option<Rect> {
        self.regions.last().copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// First region containing `point`. Bottom and right edges are exclusive
    /// so neighbouring regions never both claim a point.
    pub fn hit(&self, point: Vec2) -> Option<(usize, Rect)> {
        self.regions
            .iter()
            .enumerate()
            .find(|(_, rect)| {
                point.x >= rect.min.x
                    && point.x < rect.max.x
                    && point.y >= rect.min.y
                    && point.y < rect.max.y
            })
            .map(|(index, rect)| (index, *rect))
    }
}

/// A valid drop under the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct DropTarget {
    pub region: usize,
    pub rect: Rect,
    pub component: TypeKey,
}

/// Resolves the drop under `pointer` (content-local). Only resource drags that
/// carry an attachable script type are valid.
pub fn resolve(
    regions: &DropRegions,
    pointer: Vec2,
    payload: Option<&DragPayload>,
    host: &dyn InspectorHost,
) -> Option<DropTarget> {
    let (region, rect) = regions.hit(pointer)?;
    let Some(DragPayload::Resources(paths)) = payload else {
        return None;
    };
    let component = component_type_for(paths, host)?;
    Some(DropTarget {
        region,
        rect,
        component,
    })
}

/// First attachable type declared by the first script among `paths`.
pub fn component_type_for(paths: &[String], host: &dyn InspectorHost) -> Option<TypeKey> {
    paths.iter().find_map(|path| {
        let meta = host.resource_meta(path)?;
        if meta.kind != ResourceKind::ScriptCode {
            return None;
        }
        host.script_types(path)
            .into_iter()
            .find(|type_key| host.can_attach(type_key))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fields::FieldDescriptor, headless::HeadlessHost, host::ResourceMeta};

    fn three_components() -> [ComponentGeometry; 3] {
        [
            ComponentGeometry {
                title_height: 20.0,
                body_height: 40.0,
                folded: false,
            },
            ComponentGeometry {
                title_height: 20.0,
                body_height: 0.0,
                folded: true,
            },
            ComponentGeometry {
                title_height: 20.0,
                body_height: 60.0,
                folded: false,
            },
        ]
    }

    #[test]
    fn regions_follow_component_layout() {
        let regions = DropRegions::compute(0.0, 10.0, Vec2::new(300.0, 400.0), &three_components());

        assert_eq!(
            regions.regions(),
            &[
                Rect::new(0.0, 0.0, 300.0, 10.0),
                Rect::new(0.0, 70.0, 300.0, 80.0),
                Rect::new(0.0, 100.0, 300.0, 110.0),
                Rect::new(0.0, 190.0, 300.0, 400.0),
            ]
        );
    }

    #[test]
    fn header_offsets_every_region() {
        let regions =
            DropRegions::compute(135.0, 10.0, Vec2::new(300.0, 400.0), &three_components());
        assert_eq!(regions.regions()[0], Rect::new(0.0, 135.0, 300.0, 145.0));
        assert_eq!(regions.trailing(), Some(Rect::new(0.0, 325.0, 300.0, 400.0)));
    }

    #[test]
    fn trailing_region_never_inverts() {
        let regions = DropRegions::compute(0.0, 10.0, Vec2::new(300.0, 50.0), &three_components());
        let trailing = regions.trailing().unwrap();
        assert_eq!(trailing.min.y, 190.0);
        assert_eq!(trailing.height(), 0.0);
    }

    #[test]
    fn hit_tests_are_half_open() {
        let regions = DropRegions::compute(0.0, 10.0, Vec2::new(300.0, 400.0), &three_components());
        assert_eq!(regions.hit(Vec2::new(5.0, 0.0)).map(|(i, _)| i), Some(0));
        assert_eq!(regions.hit(Vec2::new(5.0, 10.0)), None);
        assert_eq!(regions.hit(Vec2::new(5.0, 75.0)).map(|(i, _)| i), Some(1));
        assert_eq!(regions.hit(Vec2::new(5.0, 250.0)).map(|(i, _)| i), Some(3));
        assert_eq!(regions.hit(Vec2::new(300.0, 250.0)), None);
    }

    #[test]
    fn only_attachable_scripts_resolve() {
        let mut host = HeadlessHost::default();
        host.register_component_type("game::Spin", vec![FieldDescriptor::float("speed", 1.0)]);
        host.add_resource(
            "textures/brick.png",
            ResourceMeta {
                uuid: "tex".into(),
                type_name: "Image".into(),
                kind: ResourceKind::Other,
            },
            Vec::new(),
            Vec::new(),
        );
        host.add_resource(
            "scripts/spin.rs",
            ResourceMeta {
                uuid: "spin".into(),
                type_name: "Script".into(),
                kind: ResourceKind::ScriptCode,
            },
            Vec::new(),
            vec![TypeKey::new("game::Helper"), TypeKey::new("game::Spin")],
        );

        let regions = DropRegions::compute(0.0, 10.0, Vec2::new(300.0, 400.0), &[]);
        let texture = DragPayload::Resources(vec!["textures/brick.png".into()]);
        assert!(resolve(&regions, Vec2::new(1.0, 1.0), Some(&texture), &host).is_none());

        let script = DragPayload::Resources(vec![
            "textures/brick.png".into(),
            "scripts/spin.rs".into(),
        ]);
        let target = resolve(&regions, Vec2::new(1.0, 1.0), Some(&script), &host).unwrap();
        assert_eq!(target.component, TypeKey::new("game::Spin"));
        assert_eq!(target.region, 0);

        assert!(resolve(&regions, Vec2::new(1.0, -5.0), Some(&script), &host).is_none());
        assert!(resolve(&regions, Vec2::new(1.0, 1.0), None, &host).is_none());
    }
}

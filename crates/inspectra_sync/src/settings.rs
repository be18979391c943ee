use serde::{Deserialize, Serialize};

/// Whether position and rotation fields show world or parent-relative values.
/// Scale is always local.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateSpace {
    #[default]
    World,
    Local,
}

/// Layout constants and display options of the inspector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorSettings {
    /// Vertical gap before each component. Also the height of every
    /// non-trailing drop region.
    pub component_spacing: f32,
    pub padding: f32,
    /// Height of the scene-object header (name, mobility, prefab, transform).
    pub header_height: f32,
    pub resource_title_height: f32,
    pub remove_button_width: f32,
    pub coordinate_space: CoordinateSpace,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            component_spacing: 10.0,
            padding: 5.0,
            header_height: 135.0,
            resource_title_height: 30.0,
            remove_button_width: 30.0,
            coordinate_space: CoordinateSpace::World,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings: InspectorSettings =
            serde_json::from_str(r#"{ "component_spacing": 12.0, "coordinate_space": "Local" }"#)
                .unwrap();
        assert_eq!(settings.component_spacing, 12.0);
        assert_eq!(settings.coordinate_space, CoordinateSpace::Local);
        assert_eq!(settings.header_height, 135.0);
        assert_eq!(settings.padding, 5.0);
    }
}

//! Typed messages between field editors and the inspectors that own them,
//! plus the value types of the scene-object header.

use bevy::math::Vec3;

use crate::ids::WidgetId;

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    Text(String),
    /// Index into the option list of a [`EditorKind::Choice`] field.
    Choice(usize),
}

impl FieldValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<usize> {
        match self {
            Self::Choice(index) => Some(*index),
            _ => None,
        }
    }
}

/// Which field editor renders a value.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorKind {
    Float,
    Int,
    Bool,
    Text,
    Choice(Vec<String>),
}

impl EditorKind {
    /// Discrete editors commit on every change; continuous ones wait for a
    /// confirmation.
    pub fn commits_immediately(&self) -> bool {
        matches!(self, Self::Bool | Self::Choice(_))
    }
}

/// One editable field of a sub-object or resource.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: EditorKind,
    pub value: FieldValue,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: EditorKind, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
        }
    }

    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, EditorKind::Float, FieldValue::Float(value))
    }

    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, EditorKind::Int, FieldValue::Int(value))
    }

    pub fn bool(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, EditorKind::Bool, FieldValue::Bool(value))
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, EditorKind::Text, FieldValue::Text(value.into()))
    }
}

/// What the core asks the widget library to build.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetSpec {
    ScrollArea,
    /// Container with an optional fixed height.
    Panel { height: Option<f32> },
    Column,
    Row,
    Space(f32),
    FlexibleSpace,
    Label(String),
    Field {
        label: String,
        kind: EditorKind,
        value: FieldValue,
    },
    /// Fold toggle of a component title bar. Never takes key focus.
    Foldout { label: String, expanded: bool },
    Button { label: String, width: Option<f32> },
    /// Overlay tinted rectangle used to show the active drop region.
    Highlight,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WidgetEventKind {
    ValueChanged(FieldValue),
    Confirmed,
    FocusLost,
    Toggled(bool),
    Clicked,
}

/// A discrete input event raised by a field editor. Consumed in the frame it
/// was raised in.
#[derive(Clone, Debug, PartialEq)]
pub struct WidgetEvent {
    pub widget: WidgetId,
    pub kind: WidgetEventKind,
}

impl WidgetEvent {
    pub fn new(widget: WidgetId, kind: WidgetEventKind) -> Self {
        Self { widget, kind }
    }

    /// Explicit confirmation and focus loss both end an edit.
    pub fn is_commit(&self) -> bool {
        matches!(self.kind, WidgetEventKind::Confirmed | WidgetEventKind::FocusLost)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mobility {
    Static,
    Stationary,
    #[default]
    Movable,
}

impl Mobility {
    pub const ALL: [Mobility; 3] = [Self::Static, Self::Stationary, Self::Movable];

    pub fn label(self) -> &'static str {
        match self {
            Self::Static => "Static",
            Self::Stationary => "Stationary",
            Self::Movable => "Movable",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Static => 0,
            Self::Stationary => 1,
            Self::Movable => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn options() -> Vec<String> {
        Self::ALL.iter().map(|m| m.label().to_string()).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Self::X, Self::Y, Self::Z];

    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }

    pub fn get(self, v: Vec3) -> f32 {
        v[self.index()]
    }

    pub fn with(self, mut v: Vec3, value: f32) -> Vec3 {
        v[self.index()] = value;
        v
    }
}

/// Whether the inspected entity is a linked (non-root) prefab instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrefabStatus {
    #[default]
    None,
    Instance,
}

/// Snapshot of the fields shown in the scene-object header.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectFields {
    pub name: String,
    pub active: bool,
    pub mobility: Mobility,
    pub prefab: PrefabStatus,
    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
}

/// A single header edit, applied directly to the live object.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectEdit {
    Name(String),
    Active(bool),
    Mobility(Mobility),
    Position(Axis, f32),
    Rotation(Axis, f32),
    Scale(Axis, f32),
}

use bevy::reflect::{
    DynamicEnum, DynamicVariant, Enum, PartialReflect, ReflectRef, TypeInfo, VariantInfo,
};
use inspectra_sync::{EditorKind, FieldDescriptor, FieldValue};

/// Nested structs deeper than this are not expanded.
const MAX_REFLECT_DEPTH: usize = 4;

/// Field name used when the whole component is a unit enum.
pub(crate) const ROOT_FIELD: &str = "value";

/// Flattens every editable leaf of a reflected component into descriptors
/// named by their reflect path (`radius`, `color.red`, `.0`).
pub(crate) fn collect_fields(reflected: &dyn PartialReflect) -> Vec<FieldDescriptor> {
    let mut out = Vec::new();
    if let Some((kind, value)) = read_leaf(reflected) {
        out.push(FieldDescriptor::new(ROOT_FIELD, kind, value));
    } else {
        collect_children(reflected, "", 0, &mut out);
    }
    out
}

fn collect_children(
    value: &dyn PartialReflect,
    base_path: &str,
    depth: usize,
    out: &mut Vec<FieldDescriptor>,
) {
    match value.reflect_ref() {
        ReflectRef::Struct(s) => {
            for i in 0..s.field_len() {
                let (Some(name), Some(field)) = (s.name_at(i), s.field_at(i)) else {
                    continue;
                };
                let path = if base_path.is_empty() {
                    name.to_string()
                } else {
                    format!("{base_path}.{name}")
                };
                collect_field(field, path, depth, out);
            }
        }
        ReflectRef::TupleStruct(ts) => {
            for i in 0..ts.field_len() {
                let Some(field) = ts.field(i) else {
                    continue;
                };
                let path = if base_path.is_empty() {
                    format!(".{i}")
                } else {
                    format!("{base_path}.{i}")
                };
                collect_field(field, path, depth, out);
            }
        }
        _ => {}
    }
}

fn collect_field(
    value: &dyn PartialReflect,
    path: String,
    depth: usize,
    out: &mut Vec<FieldDescriptor>,
) {
    if let Some((kind, field)) = read_leaf(value) {
        out.push(FieldDescriptor::new(path, kind, field));
    } else if depth + 1 < MAX_REFLECT_DEPTH {
        collect_children(value, &path, depth + 1, out);
    }
}

macro_rules! read_int {
    ($value:expr, $($ty:ty),+) => {
        $(
            if let Some(&v) = $value.try_downcast_ref::<$ty>() {
                return i64::try_from(v).ok().map(|v| (EditorKind::Int, FieldValue::Int(v)));
            }
        )+
    };
}

/// Editor kind and current value of a primitive or unit-enum field.
fn read_leaf(value: &dyn PartialReflect) -> Option<(EditorKind, FieldValue)> {
    if let Some(&v) = value.try_downcast_ref::<f32>() {
        return Some((EditorKind::Float, FieldValue::Float(v)));
    }
    if let Some(&v) = value.try_downcast_ref::<f64>() {
        return Some((EditorKind::Float, FieldValue::Float(v as f32)));
    }
    if let Some(&v) = value.try_downcast_ref::<bool>() {
        return Some((EditorKind::Bool, FieldValue::Bool(v)));
    }
    if let Some(v) = value.try_downcast_ref::<String>() {
        return Some((EditorKind::Text, FieldValue::Text(v.clone())));
    }
    read_int!(value, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

    if let ReflectRef::Enum(e) = value.reflect_ref() {
        let (options, index) = unit_variants(e)?;
        return Some((EditorKind::Choice(options), FieldValue::Choice(index)));
    }
    None
}

/// Variant names and the active index, if every variant is a unit variant.
fn unit_variants(e: &dyn Enum) -> Option<(Vec<String>, usize)> {
    let TypeInfo::Enum(info) = e.get_represented_type_info()? else {
        return None;
    };
    if !info.iter().all(|variant| matches!(variant, VariantInfo::Unit(_))) {
        return None;
    }
    let options = info.variant_names().iter().map(ToString::to_string).collect();
    Some((options, e.variant_index()))
}

macro_rules! write_int {
    ($target:expr, $value:expr, $($ty:ty),+) => {
        $(
            if let Some(slot) = $target.try_downcast_mut::<$ty>() {
                return match <$ty>::try_from($value) {
                    Ok(v) => {
                        *slot = v;
                        true
                    }
                    Err(_) => false,
                };
            }
        )+
    };
}

/// Writes `value` into a reflected leaf. Values of the wrong shape or out of
/// range for the target type are rejected.
pub(crate) fn write_leaf(target: &mut dyn PartialReflect, value: &FieldValue) -> bool {
    match value {
        FieldValue::Float(_) | FieldValue::Int(_) if is_float(target) => {
            let Some(v) = value.as_f32() else {
                return false;
            };
            if let Some(slot) = target.try_downcast_mut::<f32>() {
                *slot = v;
            } else if let Some(slot) = target.try_downcast_mut::<f64>() {
                *slot = v as f64;
            }
            true
        }
        FieldValue::Int(v) => {
            let v = *v;
            write_int!(target, v, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
            false
        }
        FieldValue::Bool(v) => match target.try_downcast_mut::<bool>() {
            Some(slot) => {
                *slot = *v;
                true
            }
            None => false,
        },
        FieldValue::Text(v) => match target.try_downcast_mut::<String>() {
            Some(slot) => {
                slot.clone_from(v);
                true
            }
            None => false,
        },
        FieldValue::Choice(index) => write_variant(target, *index),
        FieldValue::Float(_) => false,
    }
}

fn is_float(target: &dyn PartialReflect) -> bool {
    target.try_downcast_ref::<f32>().is_some() || target.try_downcast_ref::<f64>().is_some()
}

fn write_variant(target: &mut dyn PartialReflect, index: usize) -> bool {
    let Some(TypeInfo::Enum(info)) = target.get_represented_type_info() else {
        return false;
    };
    let Some(variant @ VariantInfo::Unit(_)) = info.variant_at(index) else {
        return false;
    };
    target
        .try_apply(&DynamicEnum::new(variant.name(), DynamicVariant::Unit))
        .is_ok()
}

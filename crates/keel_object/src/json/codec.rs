use base64::{Engine as _, engine::general_purpose::STANDARD};
use keel_math::{IVec2, IVec3, IVec4, Quat, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};
use serde_json::{Map, Number};

use crate::info::{TypeInfo, ValueKind};
use crate::json::member;
use crate::value::{EnumValue, Value};

// -----------------------------------------------------------------------------
// Encoding

fn float_node(value: f64) -> serde_json::Value {
    match Number::from_f64(value) {
        Some(number) => serde_json::Value::Number(number),
        None => {
            log::warn!("non-finite float {value} stored as null");
            serde_json::Value::Null
        }
    }
}

fn float_array(components: &[f64]) -> serde_json::Value {
    serde_json::Value::Array(components.iter().map(|&c| float_node(c)).collect())
}

fn int_array<T: Copy + Into<serde_json::Value>>(components: &[T]) -> serde_json::Value {
    serde_json::Value::Array(components.iter().map(|&c| c.into()).collect())
}

/// Encodes one leaf value as its JSON form.
///
/// # Panics
///
/// Panics on reference values; those carry graph semantics and must go
/// through the reference path of the driver.
pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(v) => serde_json::Value::Bool(*v),
        Value::I8(v) => serde_json::Value::from(*v),
        Value::I16(v) => serde_json::Value::from(*v),
        Value::I32(v) => serde_json::Value::from(*v),
        Value::I64(v) => serde_json::Value::from(*v),
        Value::U8(v) => serde_json::Value::from(*v),
        Value::U16(v) => serde_json::Value::from(*v),
        Value::U32(v) => serde_json::Value::from(*v),
        Value::U64(v) => serde_json::Value::from(*v),
        Value::F32(v) => float_node(f64::from(*v)),
        Value::F64(v) => float_node(*v),
        Value::Str(v) => serde_json::Value::String(v.clone()),
        Value::Bytes(v) => {
            let mut map = Map::new();
            map.insert(
                member::BASE64.to_owned(),
                serde_json::Value::String(STANDARD.encode(v)),
            );
            serde_json::Value::Object(map)
        }
        Value::Vec2(v) => float_array(&[f64::from(v.x), f64::from(v.y)]),
        Value::Vec3(v) => float_array(&[f64::from(v.x), f64::from(v.y), f64::from(v.z)]),
        Value::Vec4(v) => float_array(&[
            f64::from(v.x),
            f64::from(v.y),
            f64::from(v.z),
            f64::from(v.w),
        ]),
        Value::IVec2(v) => int_array(&[v.x, v.y]),
        Value::IVec3(v) => int_array(&[v.x, v.y, v.z]),
        Value::IVec4(v) => int_array(&[v.x, v.y, v.z, v.w]),
        Value::UVec2(v) => int_array(&[v.x, v.y]),
        Value::UVec3(v) => int_array(&[v.x, v.y, v.z]),
        Value::UVec4(v) => int_array(&[v.x, v.y, v.z, v.w]),
        // Stored scalar first.
        Value::Quat(v) => float_array(&[
            f64::from(v.w),
            f64::from(v.x),
            f64::from(v.y),
            f64::from(v.z),
        ]),
        Value::Enum(v) => serde_json::Value::String(v.name.to_owned()),
        Value::Ref(_) | Value::WeakRef(_) => {
            panic!("references must be written through the reference path")
        }
    }
}

// -----------------------------------------------------------------------------
// Decoding

pub(crate) fn node_kind(node: &serde_json::Value) -> &'static str {
    match node {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn read_int<T: TryFrom<i64>>(node: &serde_json::Value, expected: &TypeInfo) -> Option<T> {
    let Some(raw) = node.as_i64() else {
        log::warn!("expected `{}`, found {}", expected.name(), node_kind(node));
        return None;
    };
    match T::try_from(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("value {raw} does not fit `{}`", expected.name());
            None
        }
    }
}

fn read_uint<T: TryFrom<u64>>(node: &serde_json::Value, expected: &TypeInfo) -> Option<T> {
    let Some(raw) = node.as_u64() else {
        log::warn!("expected `{}`, found {}", expected.name(), node_kind(node));
        return None;
    };
    match T::try_from(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("value {raw} does not fit `{}`", expected.name());
            None
        }
    }
}

fn read_f64(node: &serde_json::Value, expected: &TypeInfo) -> Option<f64> {
    match node.as_f64() {
        Some(value) => Some(value),
        None => {
            log::warn!("expected `{}`, found {}", expected.name(), node_kind(node));
            None
        }
    }
}

fn read_floats<const N: usize>(
    node: &serde_json::Value,
    expected: &TypeInfo,
) -> Option<[f32; N]> {
    let Some(components) = node.as_array() else {
        log::warn!("expected `{}`, found {}", expected.name(), node_kind(node));
        return None;
    };
    if components.len() != N {
        log::warn!(
            "expected {N} components for `{}`, found {}",
            expected.name(),
            components.len()
        );
        return None;
    }
    let mut out = [0.0f32; N];
    for (slot, component) in out.iter_mut().zip(components) {
        *slot = read_f64(component, expected)? as f32;
    }
    Some(out)
}

fn read_ints<T: Copy + Default + TryFrom<i64>, const N: usize>(
    node: &serde_json::Value,
    expected: &TypeInfo,
) -> Option<[T; N]> {
    let Some(components) = node.as_array() else {
        log::warn!("expected `{}`, found {}", expected.name(), node_kind(node));
        return None;
    };
    if components.len() != N {
        log::warn!(
            "expected {N} components for `{}`, found {}",
            expected.name(),
            components.len()
        );
        return None;
    }
    let mut out = [T::default(); N];
    for (slot, component) in out.iter_mut().zip(components) {
        *slot = read_int(component, expected)?;
    }
    Some(out)
}

fn read_uints<T: Copy + Default + TryFrom<u64>, const N: usize>(
    node: &serde_json::Value,
    expected: &TypeInfo,
) -> Option<[T; N]> {
    let Some(components) = node.as_array() else {
        log::warn!("expected `{}`, found {}", expected.name(), node_kind(node));
        return None;
    };
    if components.len() != N {
        log::warn!(
            "expected {N} components for `{}`, found {}",
            expected.name(),
            components.len()
        );
        return None;
    }
    let mut out = [T::default(); N];
    for (slot, component) in out.iter_mut().zip(components) {
        *slot = read_uint(component, expected)?;
    }
    Some(out)
}

fn read_bytes(node: &serde_json::Value, expected: &TypeInfo) -> Option<Vec<u8>> {
    let Some(data) = node.get(member::BASE64).and_then(serde_json::Value::as_str) else {
        log::warn!("expected `{}`, found {}", expected.name(), node_kind(node));
        return None;
    };
    match STANDARD.decode(data) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            log::warn!("invalid base64 data: {err}");
            None
        }
    }
}

fn read_enum(node: &serde_json::Value, expected: &TypeInfo) -> Option<EnumValue> {
    let constants = expected.enum_info()?;
    let Some(name) = node.as_str() else {
        log::warn!(
            "expected a constant of `{}`, found {}",
            constants.name(),
            node_kind(node)
        );
        return None;
    };
    match constants.constant(name) {
        Some((name, value)) => Some(EnumValue { name, value }),
        None => {
            log::warn!(
                "`{name}` is not a constant of enumeration `{}`",
                constants.name()
            );
            None
        }
    }
}

/// Decodes one JSON node as a leaf value of the expected type.
///
/// Returns `None` on any shape or range mismatch; the caller falls back to
/// the target's default value.
pub(crate) fn json_to_value(node: &serde_json::Value, expected: &TypeInfo) -> Option<Value> {
    match expected.kind() {
        ValueKind::Bool => match node.as_bool() {
            Some(value) => Some(Value::Bool(value)),
            None => {
                log::warn!("expected `bool`, found {}", node_kind(node));
                None
            }
        },
        ValueKind::I8 => read_int(node, expected).map(Value::I8),
        ValueKind::I16 => read_int(node, expected).map(Value::I16),
        ValueKind::I32 => read_int(node, expected).map(Value::I32),
        ValueKind::I64 => read_int(node, expected).map(Value::I64),
        ValueKind::U8 => read_uint(node, expected).map(Value::U8),
        ValueKind::U16 => read_uint(node, expected).map(Value::U16),
        ValueKind::U32 => read_uint(node, expected).map(Value::U32),
        ValueKind::U64 => read_uint(node, expected).map(Value::U64),
        ValueKind::F32 => read_f64(node, expected).map(|v| Value::F32(v as f32)),
        ValueKind::F64 => read_f64(node, expected).map(Value::F64),
        ValueKind::Str => match node.as_str() {
            Some(value) => Some(Value::Str(value.to_owned())),
            None => {
                log::warn!("expected `String`, found {}", node_kind(node));
                None
            }
        },
        ValueKind::Bytes => read_bytes(node, expected).map(Value::Bytes),
        ValueKind::Vec2 => {
            read_floats::<2>(node, expected).map(|[x, y]| Value::Vec2(Vec2::new(x, y)))
        }
        ValueKind::Vec3 => {
            read_floats::<3>(node, expected).map(|[x, y, z]| Value::Vec3(Vec3::new(x, y, z)))
        }
        ValueKind::Vec4 => read_floats::<4>(node, expected)
            .map(|[x, y, z, w]| Value::Vec4(Vec4::new(x, y, z, w))),
        ValueKind::IVec2 => {
            read_ints::<i32, 2>(node, expected).map(|[x, y]| Value::IVec2(IVec2::new(x, y)))
        }
        ValueKind::IVec3 => read_ints::<i32, 3>(node, expected)
            .map(|[x, y, z]| Value::IVec3(IVec3::new(x, y, z))),
        ValueKind::IVec4 => read_ints::<i32, 4>(node, expected)
            .map(|[x, y, z, w]| Value::IVec4(IVec4::new(x, y, z, w))),
        ValueKind::UVec2 => {
            read_uints::<u32, 2>(node, expected).map(|[x, y]| Value::UVec2(UVec2::new(x, y)))
        }
        ValueKind::UVec3 => read_uints::<u32, 3>(node, expected)
            .map(|[x, y, z]| Value::UVec3(UVec3::new(x, y, z))),
        ValueKind::UVec4 => read_uints::<u32, 4>(node, expected)
            .map(|[x, y, z, w]| Value::UVec4(UVec4::new(x, y, z, w))),
        ValueKind::Quat => read_floats::<4>(node, expected)
            .map(|[w, x, y, z]| Value::Quat(Quat::from_xyzw(x, y, z, w))),
        ValueKind::Enum => read_enum(node, expected).map(Value::Enum),
        ValueKind::Ref | ValueKind::WeakRef | ValueKind::Object => {
            log::warn!("`{}` is not a leaf type", expected.name());
            None
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

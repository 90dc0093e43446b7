use std::sync::OnceLock;

use serde_json::Map;

use crate::info::TypeInfo;
use crate::json::codec::{json_to_value, node_kind};
use crate::json::member;
use crate::persist::{FormatReader, LoadError, RefCode};
use crate::value::Value;

// -----------------------------------------------------------------------------
// JsonReader

enum ReadFrame<'doc> {
    Record {
        props: &'doc Map<String, serde_json::Value>,
    },
    Group {
        map: &'doc Map<String, serde_json::Value>,
    },
    Array {
        items: &'doc [serde_json::Value],
        cursor: usize,
    },
}

/// Walks a parsed JSON document scope by scope.
///
/// Array elements are consumed positionally and only on a successful read;
/// a failed read leaves the cursor where it was.
pub(crate) struct JsonReader<'doc> {
    records: &'doc [serde_json::Value],
    frames: Vec<ReadFrame<'doc>>,
}

fn empty_props() -> &'static Map<String, serde_json::Value> {
    static EMPTY: OnceLock<Map<String, serde_json::Value>> = OnceLock::new();
    EMPTY.get_or_init(Map::new)
}

impl<'doc> JsonReader<'doc> {
    pub(crate) fn new(doc: &'doc serde_json::Value) -> Result<Self, LoadError> {
        let Some(records) = doc.as_array() else {
            return Err(LoadError::Malformed("root is not an array"));
        };
        Ok(Self {
            records,
            frames: Vec::new(),
        })
    }

    fn peek(&self, name: Option<&str>) -> Option<&'doc serde_json::Value> {
        match self.frames.last() {
            Some(ReadFrame::Record { props: map }) | Some(ReadFrame::Group { map }) => {
                let Some(name) = name else {
                    panic!("unnamed read outside of an array scope");
                };
                map.get(name)
            }
            Some(ReadFrame::Array { items, cursor }) => {
                assert!(name.is_none(), "named read inside an array scope");
                items.get(*cursor)
            }
            None => panic!("read outside of a record"),
        }
    }

    fn advance(&mut self) {
        if let Some(ReadFrame::Array { cursor, .. }) = self.frames.last_mut() {
            *cursor += 1;
        }
    }
}

impl FormatReader for JsonReader<'_> {
    fn record_count(&self) -> u32 {
        self.records.len() as u32
    }

    fn record_class(&self, index: u32) -> Option<&str> {
        self.records
            .get(index as usize)?
            .get(member::OBJECT_CLASS)?
            .as_str()
    }

    fn begin_record(&mut self, index: u32) -> bool {
        let Some(node) = self.records.get(index as usize) else {
            return false;
        };
        if !node.is_object() {
            return false;
        }
        let props = match node.get(member::OBJECT_PROPERTIES) {
            Some(props) => match props.as_object() {
                Some(map) => map,
                None => return false,
            },
            // A record may legitimately have nothing to store.
            None => empty_props(),
        };
        self.frames.push(ReadFrame::Record { props });
        true
    }

    fn end_record(&mut self) {
        // Scopes an aborted load hook left open are discarded with it.
        loop {
            match self.frames.pop() {
                Some(ReadFrame::Record { .. }) => return,
                Some(_) => continue,
                None => panic!("no record scope to close"),
            }
        }
    }

    fn begin_group(&mut self, name: Option<&str>) -> bool {
        let Some(node) = self.peek(name) else {
            if let Some(name) = name {
                log::debug!("group `{name}` is absent");
            }
            return false;
        };
        let Some(map) = node.as_object() else {
            log::warn!("expected a group, found {}", node_kind(node));
            return false;
        };
        self.advance();
        self.frames.push(ReadFrame::Group { map });
        true
    }

    fn end_group(&mut self) {
        match self.frames.pop() {
            Some(ReadFrame::Group { .. }) => {}
            _ => panic!("end_group does not match an open group scope"),
        }
    }

    fn begin_array(&mut self, name: Option<&str>) -> bool {
        let Some(node) = self.peek(name) else {
            if let Some(name) = name {
                log::debug!("array `{name}` is absent");
            }
            return false;
        };
        let Some(items) = node.as_array() else {
            log::warn!("expected an array, found {}", node_kind(node));
            return false;
        };
        self.advance();
        self.frames.push(ReadFrame::Array {
            items: items.as_slice(),
            cursor: 0,
        });
        true
    }

    fn end_array(&mut self) {
        match self.frames.pop() {
            Some(ReadFrame::Array { .. }) => {}
            _ => panic!("end_array does not match an open array scope"),
        }
    }

    fn read_value(&mut self, name: Option<&str>, expected: &TypeInfo) -> Option<Value> {
        let Some(node) = self.peek(name) else {
            if let Some(name) = name {
                log::warn!("member `{name}` is absent; keeping the default");
            }
            return None;
        };
        let value = json_to_value(node, expected)?;
        self.advance();
        Some(value)
    }

    fn read_ref(&mut self, name: Option<&str>) -> Option<RefCode> {
        let Some(node) = self.peek(name) else {
            if let Some(name) = name {
                log::warn!("reference member `{name}` is absent; keeping the default");
            }
            return None;
        };
        let Some(map) = node.as_object() else {
            log::warn!("expected a reference, found {}", node_kind(node));
            return None;
        };
        let code = if map.is_empty() {
            RefCode::Null
        } else if let Some(path) = map.get(member::ASSET).and_then(serde_json::Value::as_str) {
            RefCode::Asset(path.to_owned())
        } else if let Some(id) = map.get(member::OBJECT_ID) {
            match id.as_u64().and_then(|raw| u32::try_from(raw).ok()) {
                Some(index) => RefCode::Index(index),
                None => {
                    log::warn!("reference index is not a valid record id");
                    return None;
                }
            }
        } else {
            log::warn!("object is not a recognizable reference");
            return None;
        };
        self.advance();
        Some(code)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::JsonReader;
    use crate::info::Typed;
    use crate::persist::{FormatReader, RefCode};
    use crate::value::Value;

    fn single_record(props: serde_json::Value) -> serde_json::Value {
        json!([{
            "objectClass": "Fixture",
            "objectID": 0,
            "objectProperties": props,
        }])
    }

    #[test]
    fn root_must_be_an_array() {
        let doc = json!({ "objectClass": "Fixture" });
        assert!(JsonReader::new(&doc).is_err());
    }

    #[test]
    fn record_metadata() {
        let doc = single_record(json!({}));
        let reader = JsonReader::new(&doc).unwrap();
        assert_eq!(reader.record_count(), 1);
        assert_eq!(reader.record_class(0), Some("Fixture"));
        assert_eq!(reader.record_class(1), None);
    }

    #[test]
    fn named_reads() {
        let doc = single_record(json!({ "hp": 31, "title": "north" }));
        let mut reader = JsonReader::new(&doc).unwrap();
        assert!(reader.begin_record(0));
        assert!(matches!(
            reader.read_value(Some("hp"), <i32 as Typed>::type_info()),
            Some(Value::I32(31))
        ));
        assert!(reader
            .read_value(Some("mana"), <i32 as Typed>::type_info())
            .is_none());
        assert!(matches!(
            reader.read_value(Some("title"), <String as Typed>::type_info()),
            Some(Value::Str(title)) if title == "north"
        ));
        reader.end_record();
    }

    #[test]
    fn record_without_properties_member_reads_empty() {
        let doc = json!([{ "objectClass": "Fixture", "objectID": 0 }]);
        let mut reader = JsonReader::new(&doc).unwrap();
        assert!(reader.begin_record(0));
        assert!(reader
            .read_value(Some("hp"), <i32 as Typed>::type_info())
            .is_none());
        reader.end_record();
    }

    #[test]
    fn groups_enter_and_exit() {
        let doc = single_record(json!({ "bounds": { "radius": 2.5 } }));
        let mut reader = JsonReader::new(&doc).unwrap();
        assert!(reader.begin_record(0));
        assert!(reader.begin_group(Some("bounds")));
        assert!(matches!(
            reader.read_value(Some("radius"), <f32 as Typed>::type_info()),
            Some(Value::F32(radius)) if radius == 2.5
        ));
        reader.end_group();
        assert!(!reader.begin_group(Some("missing")));
        assert!(!reader.begin_group(Some("radius")));
        reader.end_record();
    }

    #[test]
    fn array_cursor_consumes_on_success() {
        let doc = single_record(json!({ "seq": [7, 8] }));
        let mut reader = JsonReader::new(&doc).unwrap();
        assert!(reader.begin_record(0));
        assert!(reader.begin_array(Some("seq")));
        assert!(matches!(
            reader.read_value(None, <u32 as Typed>::type_info()),
            Some(Value::U32(7))
        ));
        assert!(matches!(
            reader.read_value(None, <u32 as Typed>::type_info()),
            Some(Value::U32(8))
        ));
        // Exhaustion is silent and repeatable.
        assert!(reader.read_value(None, <u32 as Typed>::type_info()).is_none());
        assert!(reader.read_value(None, <u32 as Typed>::type_info()).is_none());
        reader.end_array();
        reader.end_record();
    }

    #[test]
    fn failed_array_read_leaves_the_cursor() {
        let doc = single_record(json!({ "seq": ["x", 9] }));
        let mut reader = JsonReader::new(&doc).unwrap();
        assert!(reader.begin_record(0));
        assert!(reader.begin_array(Some("seq")));
        assert!(reader.read_value(None, <u32 as Typed>::type_info()).is_none());
        // The mismatched element is still there for a different read.
        assert!(matches!(
            reader.read_value(None, <String as Typed>::type_info()),
            Some(Value::Str(s)) if s == "x"
        ));
        assert!(matches!(
            reader.read_value(None, <u32 as Typed>::type_info()),
            Some(Value::U32(9))
        ));
        reader.end_array();
        reader.end_record();
    }

    #[test]
    fn unnamed_groups_iterate_an_array() {
        let doc = single_record(json!({ "lods": [{ "bias": 1 }, { "bias": 2 }] }));
        let mut reader = JsonReader::new(&doc).unwrap();
        assert!(reader.begin_record(0));
        assert!(reader.begin_array(Some("lods")));
        let mut seen = Vec::new();
        while reader.begin_group(None) {
            if let Some(Value::I32(bias)) =
                reader.read_value(Some("bias"), <i32 as Typed>::type_info())
            {
                seen.push(bias);
            }
            reader.end_group();
        }
        reader.end_array();
        reader.end_record();
        assert_eq!(seen, [1, 2]);
    }

    #[test]
    fn reference_forms() {
        let doc = single_record(json!({
            "null": {},
            "inner": { "objectID": 3 },
            "managed": { "asset": "prefabs/tree" },
            "bogus": "nope",
            "negative": { "objectID": -1 },
        }));
        let mut reader = JsonReader::new(&doc).unwrap();
        assert!(reader.begin_record(0));
        assert_eq!(reader.read_ref(Some("null")), Some(RefCode::Null));
        assert_eq!(reader.read_ref(Some("inner")), Some(RefCode::Index(3)));
        assert_eq!(
            reader.read_ref(Some("managed")),
            Some(RefCode::Asset("prefabs/tree".into()))
        );
        assert_eq!(reader.read_ref(Some("bogus")), None);
        assert_eq!(reader.read_ref(Some("negative")), None);
        assert_eq!(reader.read_ref(Some("absent")), None);
        reader.end_record();
    }

    #[test]
    #[should_panic(expected = "named read inside an array scope")]
    fn named_read_in_array_panics() {
        let doc = single_record(json!({ "seq": [1] }));
        let mut reader = JsonReader::new(&doc).unwrap();
        reader.begin_record(0);
        reader.begin_array(Some("seq"));
        let _ = reader.read_value(Some("oops"), <u32 as Typed>::type_info());
    }

    #[test]
    #[should_panic(expected = "unnamed read outside of an array scope")]
    fn unnamed_read_in_record_panics() {
        let doc = single_record(json!({}));
        let mut reader = JsonReader::new(&doc).unwrap();
        reader.begin_record(0);
        let _ = reader.read_value(None, <u32 as Typed>::type_info());
    }
}

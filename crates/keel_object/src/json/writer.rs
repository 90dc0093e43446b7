use serde_json::Map;

use crate::json::codec::value_to_json;
use crate::json::member;
use crate::persist::{FormatWriter, RefToken};
use crate::value::Value;

// -----------------------------------------------------------------------------
// JsonWriter

enum Frame {
    Record {
        index: u32,
        class: String,
        props: Map<String, serde_json::Value>,
    },
    Group {
        name: Option<String>,
        map: Map<String, serde_json::Value>,
    },
    Array {
        name: Option<String>,
        items: Vec<serde_json::Value>,
    },
}

/// Builds the JSON document tree scope by scope.
///
/// Records stack while the graph walk is in flight but each lands at its own
/// index of the root array once closed.
pub(crate) struct JsonWriter {
    records: Vec<Option<serde_json::Value>>,
    frames: Vec<Frame>,
}

impl JsonWriter {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn insert_into_current(&mut self, name: Option<&str>, node: serde_json::Value) {
        match self.frames.last_mut() {
            Some(Frame::Record { props: map, .. }) | Some(Frame::Group { map, .. }) => {
                let Some(name) = name else {
                    panic!("unnamed value outside of an array scope");
                };
                map.insert(name.to_owned(), node);
            }
            Some(Frame::Array { items, .. }) => {
                assert!(name.is_none(), "named value inside an array scope");
                items.push(node);
            }
            None => panic!("value written outside of a record"),
        }
    }

    /// Consumes the writer into the finished document.
    ///
    /// # Panics
    ///
    /// Panics when scopes or records are still open.
    pub(crate) fn finish(self) -> serde_json::Value {
        assert!(self.frames.is_empty(), "unclosed scopes at end of document");
        let records = self
            .records
            .into_iter()
            .map(|slot| slot.expect("record left open"))
            .collect();
        serde_json::Value::Array(records)
    }
}

impl FormatWriter for JsonWriter {
    fn begin_record(&mut self, class_name: &str, index: u32) {
        let slot = index as usize;
        if self.records.len() <= slot {
            self.records.resize(slot + 1, None);
        }
        self.frames.push(Frame::Record {
            index,
            class: class_name.to_owned(),
            props: Map::new(),
        });
    }

    fn end_record(&mut self) {
        // Scopes an aborted save hook left open are discarded with it.
        loop {
            match self.frames.pop() {
                Some(Frame::Record {
                    index,
                    class,
                    props,
                }) => {
                    let mut record = Map::new();
                    record.insert(
                        member::OBJECT_CLASS.to_owned(),
                        serde_json::Value::String(class),
                    );
                    record.insert(member::OBJECT_ID.to_owned(), serde_json::Value::from(index));
                    record.insert(
                        member::OBJECT_PROPERTIES.to_owned(),
                        serde_json::Value::Object(props),
                    );
                    self.records[index as usize] = Some(serde_json::Value::Object(record));
                    return;
                }
                Some(_) => continue,
                None => panic!("no record scope to close"),
            }
        }
    }

    fn begin_group(&mut self, name: Option<&str>) {
        self.frames.push(Frame::Group {
            name: name.map(str::to_owned),
            map: Map::new(),
        });
    }

    fn end_group(&mut self) {
        match self.frames.pop() {
            Some(Frame::Group { name, map }) => {
                self.insert_into_current(name.as_deref(), serde_json::Value::Object(map));
            }
            _ => panic!("end_group does not match an open group scope"),
        }
    }

    fn begin_array(&mut self, name: Option<&str>) {
        self.frames.push(Frame::Array {
            name: name.map(str::to_owned),
            items: Vec::new(),
        });
    }

    fn end_array(&mut self) {
        match self.frames.pop() {
            Some(Frame::Array { name, items }) => {
                self.insert_into_current(name.as_deref(), serde_json::Value::Array(items));
            }
            _ => panic!("end_array does not match an open array scope"),
        }
    }

    fn write_value(&mut self, name: Option<&str>, value: &Value) {
        self.insert_into_current(name, value_to_json(value));
    }

    fn write_ref(&mut self, name: Option<&str>, token: RefToken<'_>) {
        let node = match token {
            RefToken::Null => serde_json::Value::Object(Map::new()),
            RefToken::Index(index) => {
                let mut map = Map::new();
                map.insert(member::OBJECT_ID.to_owned(), serde_json::Value::from(index));
                serde_json::Value::Object(map)
            }
            RefToken::Asset(path) => {
                let mut map = Map::new();
                map.insert(
                    member::ASSET.to_owned(),
                    serde_json::Value::String(path.to_owned()),
                );
                serde_json::Value::Object(map)
            }
        };
        self.insert_into_current(name, node);
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::JsonWriter;
    use crate::persist::{FormatWriter, RefToken};
    use crate::value::Value;

    #[test]
    fn record_shape() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Sprite", 0);
        writer.write_value(Some("layer"), &Value::I32(3));
        writer.write_ref(Some("next"), RefToken::Null);
        writer.end_record();

        assert_eq!(
            writer.finish(),
            json!([{
                "objectClass": "Sprite",
                "objectID": 0,
                "objectProperties": { "layer": 3, "next": {} },
            }])
        );
    }

    #[test]
    fn records_nest_temporally_but_land_flat() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Outer", 0);
        writer.begin_record("Inner", 1);
        writer.write_ref(Some("back"), RefToken::Index(0));
        writer.end_record();
        writer.write_ref(Some("child"), RefToken::Index(1));
        writer.end_record();

        assert_eq!(
            writer.finish(),
            json!([
                {
                    "objectClass": "Outer",
                    "objectID": 0,
                    "objectProperties": { "child": { "objectID": 1 } },
                },
                {
                    "objectClass": "Inner",
                    "objectID": 1,
                    "objectProperties": { "back": { "objectID": 0 } },
                },
            ])
        );
    }

    #[test]
    fn groups_and_arrays_nest() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Mesh", 0);
        writer.begin_group(Some("bounds"));
        writer.write_value(Some("radius"), &Value::F32(2.0));
        writer.end_group();
        writer.begin_array(Some("lods"));
        writer.write_value(None, &Value::U32(0));
        writer.begin_group(None);
        writer.write_value(Some("bias"), &Value::F32(0.5));
        writer.end_group();
        writer.end_array();
        writer.end_record();

        assert_eq!(
            writer.finish(),
            json!([{
                "objectClass": "Mesh",
                "objectID": 0,
                "objectProperties": {
                    "bounds": { "radius": 2.0 },
                    "lods": [0, { "bias": 0.5 }],
                },
            }])
        );
    }

    #[test]
    fn asset_refs_store_the_path() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Decal", 0);
        writer.write_ref(Some("texture"), RefToken::Asset("textures/crack.png"));
        writer.end_record();

        assert_eq!(
            writer.finish(),
            json!([{
                "objectClass": "Decal",
                "objectID": 0,
                "objectProperties": { "texture": { "asset": "textures/crack.png" } },
            }])
        );
    }

    #[test]
    fn end_record_discards_abandoned_scopes() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Broken", 0);
        writer.begin_group(Some("partial"));
        writer.begin_array(Some("items"));
        writer.end_record();

        assert_eq!(
            writer.finish(),
            json!([{
                "objectClass": "Broken",
                "objectID": 0,
                "objectProperties": {},
            }])
        );
    }

    #[test]
    #[should_panic(expected = "named value inside an array scope")]
    fn named_write_in_array_panics() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Bad", 0);
        writer.begin_array(Some("items"));
        writer.write_value(Some("oops"), &Value::Bool(true));
    }

    #[test]
    #[should_panic(expected = "unnamed value outside of an array scope")]
    fn unnamed_write_in_record_panics() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Bad", 0);
        writer.write_value(None, &Value::Bool(true));
    }

    #[test]
    #[should_panic(expected = "end_group does not match an open group scope")]
    fn mismatched_end_group_panics() {
        let mut writer = JsonWriter::new();
        writer.begin_record("Bad", 0);
        writer.begin_array(Some("items"));
        writer.end_group();
    }
}

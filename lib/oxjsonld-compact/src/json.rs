use json_event_parser::{JsonEvent, JsonSyntaxError, SliceJsonParser, WriterJsonSerializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

/// A JSON value tree.
///
/// This is the shape of the documents produced by [`JsonLdCompactor`](crate::JsonLdCompactor)
/// and of the context data it consumes.
/// Object keys are kept sorted so the textual encoding is stable.
///
/// ```
/// use oxjsonld_compact::JsonNode;
///
/// let node = JsonNode::from_slice(br#"{"b": [1, true], "a": null}"#)?;
/// assert_eq!(node.to_string(), r#"{"a":null,"b":[1,true]}"#);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum JsonNode {
    String(String),
    /// A number, kept in its lexical form.
    Number(String),
    Boolean(bool),
    Null,
    Array(Vec<JsonNode>),
    Object(BTreeMap<String, JsonNode>),
}

impl JsonNode {
    /// Parses a JSON text.
    ///
    /// Anything but whitespace after the root value is an error.
    pub fn from_slice(data: &[u8]) -> Result<Self, JsonSyntaxError> {
        let mut parser = SliceJsonParser::new(data);
        let mut builder = TreeBuilder::default();
        let root = loop {
            if let Some(root) = builder.push(parser.parse_next()?) {
                break root;
            }
        };
        // The parser reports the content following the root value
        loop {
            if parser.parse_next()? == JsonEvent::Eof {
                return Ok(root);
            }
        }
    }

    /// Builds an object from its entries.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, JsonNode)>) -> Self {
        Self::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&BTreeMap<String, JsonNode>> {
        if let Self::Object(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&[JsonNode]> {
        if let Self::Array(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Looks up an object entry. Returns `None` on non-objects.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&JsonNode> {
        self.as_object()?.get(key)
    }

    /// Writes the value as compact JSON text to a [`Write`] implementation.
    pub fn write_to<W: Write>(&self, writer: W) -> io::Result<W> {
        let mut serializer = WriterJsonSerializer::new(writer);
        let mut events = Vec::new();
        self.to_events(&mut events);
        for event in events {
            serializer.serialize_event(event)?;
        }
        serializer.finish()
    }

    fn to_events<'a>(&'a self, output: &mut Vec<JsonEvent<'a>>) {
        match self {
            Self::String(value) => output.push(JsonEvent::String(value.as_str().into())),
            Self::Number(value) => output.push(JsonEvent::Number(value.as_str().into())),
            Self::Boolean(value) => output.push(JsonEvent::Boolean(*value)),
            Self::Null => output.push(JsonEvent::Null),
            Self::Array(values) => {
                output.push(JsonEvent::StartArray);
                for value in values {
                    value.to_events(output);
                }
                output.push(JsonEvent::EndArray);
            }
            Self::Object(entries) => {
                output.push(JsonEvent::StartObject);
                for (key, value) in entries {
                    output.push(JsonEvent::ObjectKey(key.as_str().into()));
                    value.to_events(output);
                }
                output.push(JsonEvent::EndObject);
            }
        }
    }
}

impl fmt::Display for JsonNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.write_to(Vec::new()).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buffer))
    }
}

impl From<String> for JsonNode {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for JsonNode {
    #[inline]
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<Vec<JsonNode>> for JsonNode {
    #[inline]
    fn from(value: Vec<JsonNode>) -> Self {
        Self::Array(value)
    }
}

/// A JSON container still being read.
enum OpenNode {
    Object(BTreeMap<String, JsonNode>),
    ObjectWithPendingKey(BTreeMap<String, JsonNode>, String),
    Array(Vec<JsonNode>),
}

/// Assembles a [`JsonNode`] tree from a stream of parser events.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<OpenNode>,
}

impl TreeBuilder {
    /// Consumes an event and returns the root value once it is complete.
    fn push(&mut self, event: JsonEvent<'_>) -> Option<JsonNode> {
        match event {
            JsonEvent::String(value) => self.close(JsonNode::String(value.into())),
            JsonEvent::Number(value) => self.close(JsonNode::Number(value.into())),
            JsonEvent::Boolean(value) => self.close(JsonNode::Boolean(value)),
            JsonEvent::Null => self.close(JsonNode::Null),
            JsonEvent::StartArray => {
                self.stack.push(OpenNode::Array(Vec::new()));
                None
            }
            JsonEvent::StartObject => {
                self.stack.push(OpenNode::Object(BTreeMap::new()));
                None
            }
            JsonEvent::ObjectKey(key) => {
                if let Some(OpenNode::Object(object)) = self.stack.pop() {
                    self.stack
                        .push(OpenNode::ObjectWithPendingKey(object, key.into()));
                }
                None
            }
            JsonEvent::EndArray | JsonEvent::EndObject => match self.stack.pop() {
                Some(OpenNode::Object(object)) => self.close(JsonNode::Object(object)),
                Some(OpenNode::Array(array)) => self.close(JsonNode::Array(array)),
                Some(OpenNode::ObjectWithPendingKey(..)) | None => {
                    unreachable!("the parser only emits balanced containers")
                }
            },
            JsonEvent::Eof => unreachable!("the parser fails on a truncated root value"),
        }
    }

    /// Attaches a complete value to its parent container.
    fn close(&mut self, value: JsonNode) -> Option<JsonNode> {
        match self.stack.pop() {
            Some(OpenNode::ObjectWithPendingKey(mut object, key)) => {
                object.insert(key, value);
                self.stack.push(OpenNode::Object(object));
            }
            Some(OpenNode::Array(mut array)) => {
                array.push(value);
                self.stack.push(OpenNode::Array(array));
            }
            Some(open @ OpenNode::Object(_)) => self.stack.push(open),
            None => return Some(value),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() -> Result<(), JsonSyntaxError> {
        let node = JsonNode::from_slice(br#"{"a": [1, "b", {"c": false}], "d": null}"#)?;
        assert_eq!(
            node,
            JsonNode::object([
                (
                    "a",
                    JsonNode::Array(vec![
                        JsonNode::Number("1".into()),
                        "b".into(),
                        JsonNode::object([("c", JsonNode::Boolean(false))]),
                    ])
                ),
                ("d", JsonNode::Null),
            ])
        );
        Ok(())
    }

    #[test]
    fn test_parse_scalar() -> Result<(), JsonSyntaxError> {
        assert_eq!(JsonNode::from_slice(b"\"foo\"")?, "foo".into());
        assert_eq!(JsonNode::from_slice(b"null")?, JsonNode::Null);
        Ok(())
    }

    #[test]
    fn test_parse_invalid() {
        JsonNode::from_slice(b"{\"a\": ").unwrap_err();
        JsonNode::from_slice(b"[1 2]").unwrap_err();
        JsonNode::from_slice(br#"{"ex": "http://example.com/"} trailing"#).unwrap_err();
        JsonNode::from_slice(b"{} {}").unwrap_err();
        JsonNode::from_slice(b"").unwrap_err();
    }

    #[test]
    fn test_parse_surrounding_whitespace() -> Result<(), JsonSyntaxError> {
        assert_eq!(
            JsonNode::from_slice(b" \n[true]\n ")?,
            JsonNode::Array(vec![JsonNode::Boolean(true)])
        );
        Ok(())
    }

    #[test]
    fn test_serialize_sorts_keys() {
        let node = JsonNode::object([
            ("z", JsonNode::from("last")),
            ("@id", JsonNode::from("http://example.com/s")),
            ("m", JsonNode::Array(vec!["x\"y".into()])),
        ]);
        assert_eq!(
            node.to_string(),
            r#"{"@id":"http://example.com/s","m":["x\"y"],"z":"last"}"#
        );
    }

    #[test]
    fn test_accessors() -> Result<(), JsonSyntaxError> {
        let node = JsonNode::from_slice(br#"{"a": ["b"]}"#)?;
        assert_eq!(
            node.get("a").and_then(JsonNode::as_array),
            Some(["b".into()].as_slice())
        );
        assert_eq!(node.get("missing"), None);
        assert_eq!(JsonNode::from("s").get("a"), None);
        assert_eq!(JsonNode::from("s").as_str(), Some("s"));
        Ok(())
    }
}

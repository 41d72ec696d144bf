//! Pool exporter.
//!
//! The YAML document always starts with a metadata block carrying the
//! configured version string, followed by one block per top-level key:
//!
//! ```text
//!
//! metadata:
//!     version:
//!         essentia: "2.1"
//!
//! lowlevel:
//!     rms: [0.5, 0.25]
//! ```
//!
//! Blocks are separated by a blank line, nesting is indented by four spaces
//! and siblings appear in ascending byte order at every depth.

use std::fmt::{self, Write};

use serde_json::{Map, Value as JsonValue};

use crate::{
    config::{ExportConfig, OutputFormat},
    format::{DisplayReal, DisplaySeries, DisplayString, DisplayValue},
    pool::METADATA_ROOT,
    sink::{Destination, Sink},
    tree::{Children, KeyTree, Node},
    Pool, PoolError, Real, Result, Value,
};

const INDENT: &str = "    ";

/// Renders pools and hands the result to a [`Sink`].
///
/// The exporter holds no state between calls; the version string is injected
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exporter {
    version: String,
    format: OutputFormat,
}

impl Exporter {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            format: OutputFormat::Yaml,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.version.clone()).with_format(config.format)
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Renders `pool` into a complete document.
    pub fn render(&self, pool: &Pool) -> Result<String> {
        let tree = KeyTree::build(pool)?;
        let document = match self.format {
            OutputFormat::Yaml => {
                let mut out = String::new();
                self.write_yaml(&mut out, &tree)
                    .map_err(|_| PoolError::msg("failed to format YAML document"))?;
                out
            }
            OutputFormat::Json => self.render_json(&tree)?,
        };

        tracing::debug!(keys = pool.len(), format = ?self.format, bytes = document.len(), "rendered pool");
        Ok(document)
    }

    /// Renders `pool` and writes it to the file at `identifier`. An unusable
    /// destination fails before any output is produced.
    pub fn export(&self, pool: &Pool, identifier: &str) -> Result<()> {
        let destination = Destination::parse(identifier)?;
        self.export_to_destination(pool, &destination)
    }

    pub fn export_to_destination(&self, pool: &Pool, destination: &Destination) -> Result<()> {
        let document = self.render(pool)?;

        let result = destination
            .open()
            .and_then(|mut sink| sink.write_document(&document));
        match result {
            Ok(()) => {
                tracing::info!(%destination, bytes = document.len(), "exported pool");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%destination, error = %err, "export failed");
                Err(err)
            }
        }
    }

    /// Renders `pool` into an already opened sink.
    pub fn export_to(&self, pool: &Pool, sink: &mut dyn Sink) -> Result<()> {
        let document = self.render(pool)?;
        sink.write_document(&document)
    }

    fn write_yaml(&self, out: &mut String, tree: &KeyTree<'_>) -> fmt::Result {
        write!(
            out,
            "\n{METADATA_ROOT}:\n{INDENT}version:\n{INDENT}{INDENT}essentia: {}\n",
            DisplayString(&self.version)
        )?;

        for (segment, node) in tree.roots() {
            out.push('\n');
            write_node(out, segment, node, 0)?;
        }
        Ok(())
    }

    fn render_json(&self, tree: &KeyTree<'_>) -> Result<String> {
        let mut version = Map::new();
        version.insert("essentia".to_string(), JsonValue::String(self.version.clone()));
        let mut metadata = Map::new();
        metadata.insert("version".to_string(), JsonValue::Object(version));

        let mut root = json_children(tree.roots())?;
        root.insert(METADATA_ROOT.to_string(), JsonValue::Object(metadata));

        let mut document = serde_json::to_string_pretty(&JsonValue::Object(root))?;
        document.push('\n');
        Ok(document)
    }
}

fn write_node(out: &mut String, segment: &str, node: &Node<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.push_str(INDENT);
    }

    match node {
        Node::Branch(children) => {
            writeln!(out, "{segment}:")?;
            for (child, node) in children {
                write_node(out, child, node, depth + 1)?;
            }
            Ok(())
        }
        Node::Series(values) => writeln!(out, "{segment}: {}", DisplaySeries(values)),
        Node::Single(value) => writeln!(out, "{segment}: {}", DisplayValue(value)),
    }
}

fn json_children(children: &Children<'_>) -> Result<Map<String, JsonValue>> {
    let mut map = Map::new();
    for (segment, node) in children {
        let value = match node {
            Node::Branch(children) => JsonValue::Object(json_children(children)?),
            Node::Series(values) => JsonValue::Array(
                values.iter().map(json_value).collect::<Result<Vec<_>>>()?,
            ),
            Node::Single(value) => json_value(value)?,
        };
        map.insert(segment.to_string(), value);
    }
    Ok(map)
}

fn json_value(value: &Value) -> Result<JsonValue> {
    let reals = |values: &[Real]| -> Result<JsonValue> {
        Ok(JsonValue::Array(
            values.iter().copied().map(json_real).collect::<Result<Vec<_>>>()?,
        ))
    };

    match value {
        Value::Real(value) => json_real(*value),
        Value::String(value) => Ok(JsonValue::String(value.clone())),
        Value::RealVector(values) => reals(values),
        Value::StringVector(values) => Ok(JsonValue::Array(
            values.iter().cloned().map(JsonValue::String).collect(),
        )),
        Value::Matrix(matrix) => Ok(JsonValue::Array(
            matrix.row_iter().map(reals).collect::<Result<Vec<_>>>()?,
        )),
        Value::StereoSample(sample) => {
            let mut pair = Map::new();
            pair.insert("left".to_string(), json_real(sample.left)?);
            pair.insert("right".to_string(), json_real(sample.right)?);
            Ok(JsonValue::Object(pair))
        }
    }
}

/// Reuses the YAML number text so that integral values become JSON integers.
fn json_real(value: Real) -> Result<JsonValue> {
    if !value.is_finite() {
        return Err(PoolError::InvalidValue("JSON output cannot represent non-finite reals"));
    }
    Ok(serde_json::from_str(&DisplayReal(value).to_string())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Matrix, StereoSample};

    const HEADER: &str = "\nmetadata:\n    version:\n        essentia: \"test\"\n";

    fn render(pool: &Pool) -> String {
        Exporter::new("test").render(pool).unwrap()
    }

    #[test]
    fn empty_pool_is_header_only() {
        assert_eq!(render(&Pool::new()), HEADER);
    }

    #[test]
    fn single_keys_render_as_lists() {
        let mut pool = Pool::new();
        pool.add("foo", 1.0_f32).unwrap();
        assert_eq!(render(&pool), format!("{HEADER}\nfoo: [1]\n"));

        let mut pool = Pool::new();
        pool.add("foo", "foo").unwrap();
        assert_eq!(render(&pool), format!("{HEADER}\nfoo: [\"foo\"]\n"));
    }

    #[test]
    fn top_level_blocks_are_sorted_and_spaced() {
        let mut pool = Pool::new();
        pool.add("foo", 1).unwrap();
        pool.add("foo", 2).unwrap();
        pool.add("bar", 1).unwrap();
        pool.add("bar", 2).unwrap();

        assert_eq!(
            render(&pool),
            format!("{HEADER}\nbar: [1, 2]\n\nfoo: [1, 2]\n")
        );
    }

    #[test]
    fn nested_keys_are_indented_without_blank_lines() {
        let mut pool = Pool::new();
        pool.add("foo.foo", "barfoo").unwrap();
        pool.add("foo.bar", "foobar").unwrap();

        assert_eq!(
            render(&pool),
            format!("{HEADER}\nfoo:\n    bar: [\"foobar\"]\n    foo: [\"barfoo\"]\n")
        );
    }

    #[test]
    fn single_values_render_unbracketed() {
        let mut pool = Pool::new();
        pool.set("summary.frames", 12).unwrap();
        pool.set("summary.name", "track").unwrap();

        assert_eq!(
            render(&pool),
            format!("{HEADER}\nsummary:\n    frames: 12\n    name: \"track\"\n")
        );
    }

    #[test]
    fn version_is_escaped_like_any_string() {
        let document = Exporter::new("2.1 \"dev\"").render(&Pool::new()).unwrap();
        assert!(document.ends_with("essentia: \"2.1 \\\"dev\\\"\"\n"));
    }

    #[test]
    fn json_output_mirrors_the_tree() {
        let mut pool = Pool::new();
        pool.add("reals.single", 2).unwrap();
        pool.add("reals.single", 0.5_f32).unwrap();
        pool.add("reals.matrix", Matrix::filled(1, 2, 1.0)).unwrap();
        pool.add("stereo", StereoSample::new(3.0, -1.0)).unwrap();

        let document = Exporter::new("test")
            .with_format(OutputFormat::Json)
            .render(&pool)
            .unwrap();
        let parsed: JsonValue = serde_json::from_str(&document).unwrap();

        assert_eq!(parsed["metadata"]["version"]["essentia"], "test");
        assert_eq!(parsed["reals"]["single"], serde_json::json!([2, 0.5]));
        assert_eq!(parsed["reals"]["matrix"], serde_json::json!([[[1, 1]]]));
        assert_eq!(
            parsed["stereo"],
            serde_json::json!([{ "left": 3, "right": -1 }])
        );
    }

    #[test]
    fn json_rejects_non_finite_reals() {
        let mut pool = Pool::new();
        pool.add("bad", Real::NAN).unwrap();

        let err = Exporter::new("test")
            .with_format(OutputFormat::Json)
            .render(&pool)
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidValue(_)));
    }

    #[test]
    fn dash_is_an_ordinary_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("-");
        let mut pool = Pool::new();
        pool.add("foo", 1).unwrap();

        Exporter::new("test")
            .export(&pool, path.to_str().unwrap())
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{HEADER}\nfoo: [1]\n")
        );
    }

    #[test]
    fn empty_destination_fails() {
        let err = Exporter::new("test").export(&Pool::new(), "").unwrap_err();
        assert!(matches!(err, PoolError::EmptyDestination));
    }
}

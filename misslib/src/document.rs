use std::io::{self, Write};
use crate::variant::Variant;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="ISO-8859-1" ?>"#;

/// The format a variant configuration is written in
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Format {
    /// The simulator's native configuration format
    #[default]
    Xml,
    Json,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Xml => "xml",
            Format::Json => "json",
        }
    }
}

/// Writes a variant in the given format
pub fn write_variant<W: Write>(variant: &Variant, format: Format, writer: W) -> io::Result<()> {
    match format {
        Format::Xml => write_xml(variant, writer),
        Format::Json => write_json(variant, writer),
    }
}

/// Writes a variant as a simulator configuration document
///
/// The root `Cache` element carries the hierarchy-wide settings, with one `CacheLevel` child per
/// level, in hierarchy order. Attribute values are escaped, so any token survives the trip.
///
/// # Examples
///
/// ```
/// use misslib::config::{CacheSpec, LevelSpec};
/// use misslib::document::write_xml;
/// use misslib::variant::VariantKind;
/// let spec = CacheSpec {
///     block_size: 64,
///     write_miss_policy: "allocate".to_string(),
///     replacement_policy: "LRU".to_string(),
///     levels: vec![LevelSpec::new(100, 4, "write-back")],
/// };
/// let mut out = Vec::new();
/// write_xml(&VariantKind::Real.apply(&spec), &mut out).unwrap();
/// assert!(String::from_utf8(out).unwrap().contains(r#"<CacheLevel num_blocks="100" associativity="4" write_policy="write-back" />"#));
/// ```
pub fn write_xml<W: Write>(variant: &Variant, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{XML_HEADER}")?;
    writeln!(writer)?;
    writeln!(
        writer,
        r#"<Cache blocksize="{}" write_miss_policy="{}" replacement_policy="{}">"#,
        variant.block_size,
        escape(&variant.write_miss_policy),
        escape(&variant.replacement_policy)
    )?;
    for level in &variant.levels {
        writeln!(
            writer,
            r#"  <CacheLevel num_blocks="{}" associativity="{}" write_policy="{}" />"#,
            level.num_blocks,
            level.associativity,
            escape(&level.write_policy)
        )?;
    }
    writeln!(writer, "</Cache>")?;
    writer.flush()
}

/// Writes a variant as pretty printed JSON
pub fn write_json<W: Write>(variant: &Variant, mut writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, variant)?;
    writeln!(writer)?;
    writer.flush()
}

/// Escapes a string for use inside a double quoted XML attribute
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

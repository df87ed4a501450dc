//! Attribute values (C1): the `(Type, key, values)` triple that backs every
//! `%TF…%`/`%TA…%`/`%TO…%`/`%TD…%` attribute, plus the escaping rules and
//! constructor helpers used throughout the generators.

use chrono::{DateTime, FixedOffset};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::attributes::{FileFunction, GenerationSoftware, Ident};
use crate::traits::PartialGerberCode;

const MAX_VALUE_CHARS: usize = 65535;

/// Characters allowed in a strict-ASCII attribute value after NFKD
/// normalization. File, aperture and delete attribute values must stay
/// within this set; object attribute values may carry arbitrary Unicode
/// (e.g. `µ`, `Ω` in component values) and are `\uXXXX`-escaped instead.
fn is_strict_ascii_allowed(c: char) -> bool {
    matches!(c,
        'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '+' | '/' | '!' | '?'
        | '<' | '>' | '"' | '\'' | '(' | ')' | '{' | '}' | '.' | '|' | '&'
        | '@' | '#' | ' ' | ';' | '$' | ':' | '='
    )
}

/// Applies the common newline-stripping/truncation rules, then either
/// whitelist-filters (strict ASCII) or backslash-escapes (`\`, `%`, `*`,
/// `,`) the result.
pub fn escape_value(value: &str, strict_ascii: bool) -> String {
    let stripped: String = value
        .chars()
        .filter(|&c| c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let truncated: String = stripped.chars().take(MAX_VALUE_CHARS).collect();

    if strict_ascii {
        truncated.nfkd().filter(|&c| is_strict_ascii_allowed(c)).collect()
    } else {
        let mut out = String::with_capacity(truncated.len());
        for c in truncated.chars() {
            match c {
                '\\' => out.push_str("\\u005c"),
                '%' => out.push_str("\\u0025"),
                '*' => out.push_str("\\u002a"),
                ',' => out.push_str("\\u002c"),
                _ => out.push(c),
            }
        }
        out
    }
}

/// Which of the four X2/X3 attribute tags (`TF`, `TA`, `TO`, `TD`) a value
/// belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    File,
    Aperture,
    Object,
    Delete,
}

impl AttributeKind {
    fn type_char(self) -> &'static str {
        match self {
            AttributeKind::File => "TF",
            AttributeKind::Aperture => "TA",
            AttributeKind::Object => "TO",
            AttributeKind::Delete => "TD",
        }
    }

    /// File/Aperture/Delete attribute values are restricted to strict
    /// ASCII; Object attribute values (component metadata) may carry
    /// arbitrary Unicode.
    fn is_strict_ascii(self) -> bool {
        !matches!(self, AttributeKind::Object)
    }
}

/// One `(Type, key, values)` attribute, already escaped and ready to
/// render into either a Gerber `G04` comment or an Excellon `;` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    kind: AttributeKind,
    key: String,
    values: Vec<String>,
}

impl Attribute {
    fn new(kind: AttributeKind, key: impl Into<String>, raw_values: Vec<String>) -> Self {
        let strict = kind.is_strict_ascii();
        let values = raw_values.into_iter().map(|v| escape_value(&v, strict)).collect();
        Attribute { kind, key: key.into(), values }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// A `TD` attribute deleting every attribute currently set.
    pub fn delete_all() -> Self {
        Attribute { kind: AttributeKind::Delete, key: String::new(), values: Vec::new() }
    }

    /// A `TD.<key>` attribute deleting one specific attribute.
    pub fn delete(key: impl Into<String>) -> Self {
        Attribute { kind: AttributeKind::Delete, key: key.into(), values: Vec::new() }
    }

    fn body(&self) -> String {
        let mut s = String::new();
        s.push_str(self.kind.type_char());
        if !self.key.is_empty() {
            s.push('.');
            s.push_str(&self.key);
        }
        for v in &self.values {
            s.push(',');
            s.push_str(v);
        }
        s
    }

    /// Renders as a Gerber net comment: `G04 #@! <body>*`.
    pub fn to_gerber_comment(&self) -> String {
        format!("G04 #@! {}*\n", self.body())
    }

    /// Renders as an Excellon comment: `; #@! <body>`.
    pub fn to_excellon_comment(&self) -> String {
        format!("; #@! {}\n", self.body())
    }
}

fn serialize_to_string<T>(value: &T) -> String
where
    T: PartialGerberCode<Vec<u8>>,
{
    let mut buf = Vec::new();
    // Rendering enum fragments never performs I/O, so this cannot fail.
    value.serialize_partial(&mut buf).expect("in-memory serialization is infallible");
    String::from_utf8(buf).expect("attribute fragments are always valid UTF-8")
}

// --- File attribute constructors -----------------------------------------

pub fn file_generation_software(gs: &GenerationSoftware) -> Attribute {
    let mut values = vec![gs.vendor.clone(), gs.application.clone()];
    if let Some(v) = &gs.version {
        values.push(v.clone());
    }
    Attribute::new(AttributeKind::File, "GenerationSoftware", values)
}

pub fn file_creation_date(date: DateTime<FixedOffset>) -> Attribute {
    Attribute::new(AttributeKind::File, "CreationDate", vec![date.to_rfc3339()])
}

pub fn file_project_id(name: &str, guid: Uuid, revision: &str) -> Attribute {
    Attribute::new(
        AttributeKind::File,
        "ProjectId",
        vec![name.to_string(), guid.to_string(), revision.to_string()],
    )
}

pub fn file_part_single() -> Attribute {
    Attribute::new(AttributeKind::File, "Part", vec!["Single".to_string()])
}

pub fn file_same_coordinates(ident: Option<&Ident>) -> Attribute {
    let values = match ident {
        Some(i) => vec![serialize_to_string(i)],
        None => Vec::new(),
    };
    Attribute::new(AttributeKind::File, "SameCoordinates", values)
}

pub fn file_polarity_positive() -> Attribute {
    Attribute::new(AttributeKind::File, "FilePolarity", vec!["Positive".to_string()])
}

pub fn file_polarity_negative() -> Attribute {
    Attribute::new(AttributeKind::File, "FilePolarity", vec!["Negative".to_string()])
}

pub fn file_function(function: &FileFunction) -> Attribute {
    // FileFunction's PartialGerberCode impl renders "<Name>,<args...>",
    // which is exactly the value list a FileFunction attribute needs.
    let rendered = serialize_to_string(function);
    let values = rendered.split(',').map(str::to_string).collect();
    Attribute::new(AttributeKind::File, "FileFunction", values)
}

pub fn file_md5(hex_digest: &str) -> Attribute {
    Attribute::new(AttributeKind::File, "MD5", vec![hex_digest.to_string()])
}

// --- Aperture attribute constructors --------------------------------------

pub fn aperture_function(function: crate::attributes::ApertureFunction) -> Attribute {
    let rendered = serialize_to_string(&function);
    let values = rendered.split(',').map(str::to_string).collect();
    Attribute::new(AttributeKind::Aperture, "AperFunction", values)
}

/// A drill tool's aperture function in a merged mixed-plating file: the
/// normal function token (`ComponentDrill`/`ViaDrill`/`MechanicalDrill`)
/// prefixed with the plating/hole-type pair the original tool came from.
pub fn aperture_function_mixed_plating_drill(plated: bool, function: crate::attributes::ApertureFunction) -> Attribute {
    let (plating, hole_type) = if plated { ("Plated", "PTH") } else { ("NonPlated", "NPTH") };
    let mut values = vec![plating.to_string(), hole_type.to_string()];
    values.extend(serialize_to_string(&function).split(',').map(str::to_string));
    Attribute::new(AttributeKind::Aperture, "AperFunction", values)
}

// --- Object attribute constructors ----------------------------------------

pub fn object_net(net_name: &str) -> Attribute {
    Attribute::new(AttributeKind::Object, "N", vec![net_name.to_string()])
}

pub fn object_component(reference_designator: &str) -> Attribute {
    Attribute::new(AttributeKind::Object, "C", vec![reference_designator.to_string()])
}

pub fn object_pin(reference_designator: &str, pin_name: &str) -> Attribute {
    Attribute::new(
        AttributeKind::Object,
        "P",
        vec![reference_designator.to_string(), pin_name.to_string()],
    )
}

pub fn component_value(value: &str) -> Attribute {
    Attribute::new(AttributeKind::Object, "CVal", vec![value.to_string()])
}

pub fn component_mount_type(mount: crate::attributes::MountType) -> Attribute {
    let rendered = serialize_to_string(&mount);
    Attribute::new(AttributeKind::Object, "CMnt", vec![rendered])
}

pub fn component_manufacturer(name: &str) -> Attribute {
    Attribute::new(AttributeKind::Object, "CMfr", vec![name.to_string()])
}

pub fn component_mpn(mpn: &str) -> Attribute {
    Attribute::new(AttributeKind::Object, "CMPN", vec![mpn.to_string()])
}

pub fn component_footprint(name: &str) -> Attribute {
    Attribute::new(AttributeKind::Object, "CFtp", vec![name.to_string()])
}

pub fn component_rotation(degrees: crate::coordinates::Angle) -> Attribute {
    Attribute::new(AttributeKind::Object, "CRot", vec![degrees.normalized().deg_string()])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strict_ascii_drops_non_whitelisted_chars_after_nfkd() {
        // NFKD decomposes the fullwidth 'Ａ' into an ASCII-compatible form;
        // characters that still don't survive the whitelist are dropped.
        let escaped = escape_value("Caf\u{e9} \u{2122}", true);
        assert!(!escaped.contains('\u{2122}'));
    }

    #[test]
    fn non_strict_escapes_reserved_gerber_chars() {
        let escaped = escape_value("100% done, really*\\", false);
        assert_eq!(escaped, "100\\u0025 done\\u002c really\\u002a\\u005c");
    }

    #[test]
    fn newline_becomes_space_and_cr_is_stripped() {
        assert_eq!(escape_value("a\r\nb", true), "a b");
    }

    #[test]
    fn gerber_comment_format() {
        let attr = object_net("GND");
        assert_eq!(attr.to_gerber_comment(), "G04 #@! TO.N,GND*\n");
    }

    #[test]
    fn excellon_comment_format() {
        let attr = aperture_function(crate::attributes::ApertureFunction::ViaDrill);
        assert_eq!(attr.to_excellon_comment(), "; #@! TA.AperFunction,ViaDrill\n");
    }

    #[test]
    fn delete_all_has_no_key_or_values() {
        assert_eq!(Attribute::delete_all().to_gerber_comment(), "G04 #@! TD*\n");
        assert_eq!(Attribute::delete("N").to_gerber_comment(), "G04 #@! TD.N*\n");
    }

    #[test]
    fn value_truncated_to_max_chars() {
        let long = "a".repeat(MAX_VALUE_CHARS + 100);
        let escaped = escape_value(&long, true);
        assert_eq!(escaped.chars().count(), MAX_VALUE_CHARS);
    }
}

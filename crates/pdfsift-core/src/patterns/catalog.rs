//! Built-in pattern catalogs.

use super::PatternSpec;

/// JavaScript calls commonly used to unpack obfuscated payloads
pub const DANGEROUS_JAVASCRIPT_INSTRUCTIONS: &[&str] = &["eval", "unescape", "fromCharCode"];

/// PDF dictionary keys that trigger actions, run scripts or hide objects
pub const DANGEROUS_PDF_KEYS: &[&str] = &[
    "/AA",
    "/AcroForm",
    "/GoToE",
    "/GoToR",
    "/ImportData",
    "/JavaScript",
    "/JBIG2Decode",
    "/JS",
    "/Launch",
    "/ObjStm",
    "/OpenAction",
    "/RichMedia",
    "/SubmitForm",
    "/URI",
    "/XFA",
];

/// Known byte order marks and their names
pub const BOMS: &[(&[u8], &str)] = &[
    (b"\x2b\x2f\x76", "UTF-7 BOM"),
    (b"\xef\xbb\xbf", "UTF-8 BOM"),
    (b"\xf7\x64\x4c", "UTF-1 BOM"),
    (b"\xfe\xff", "UTF-16 BOM"),
    (b"\xff\xfe", "UTF-16-LE BOM"),
    (b"\x00\x00\xfe\xff", "UTF-32 BOM"),
    (b"\xff\xfe\x00\x00", "UTF-32-LE BOM"),
    (b"\x0e\xfe\xff", "SCSU BOM"),
    (b"\xfb\xee\x28", "BOCU-1 BOM"),
    (b"\xdd\x73\x66\x73", "UTF-EBCDIC BOM"),
    (b"\x84\x31\x95\x33", "GB-18030 BOM"),
];

/// Token that precedes the encrypted portion of a Type 1 font program
pub const CURRENTFILE_EEXEC: &[u8] = b"currentfile eexec";

/// Node type of page content streams
pub const CONTENTS: &str = "/Contents";

/// Every dangerous instruction as a literal pattern
pub fn dangerous_instructions() -> Vec<PatternSpec> {
    DANGEROUS_JAVASCRIPT_INSTRUCTIONS
        .iter()
        .chain(DANGEROUS_PDF_KEYS)
        .map(|instruction| PatternSpec::literal(instruction))
        .collect()
}

/// Every byte order mark as a hex pattern named after the BOM
pub fn byte_order_marks() -> Vec<PatternSpec> {
    BOMS.iter()
        .map(|(bytes, name)| PatternSpec::hex_bytes(*name, bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternType;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let dangerous: HashSet<String> = dangerous_instructions()
            .iter()
            .map(|spec| spec.name().to_string())
            .collect();
        assert_eq!(
            dangerous.len(),
            DANGEROUS_JAVASCRIPT_INSTRUCTIONS.len() + DANGEROUS_PDF_KEYS.len()
        );

        let boms: HashSet<String> = byte_order_marks()
            .iter()
            .map(|spec| spec.name().to_string())
            .collect();
        assert_eq!(boms.len(), BOMS.len());
    }

    #[test]
    fn test_bom_specs_are_hex() {
        let specs = byte_order_marks();
        let utf8 = specs.iter().find(|s| s.name() == "UTF-8 BOM").unwrap();
        assert_eq!(utf8.pattern_type(), PatternType::Hex);
        assert_eq!(utf8.pattern(), "EF BB BF");
        assert_eq!(utf8.label(), "UTF_8_BOM");
    }
}

//! ZIP payload extraction.

use std::io::{Cursor, Read};

use entsoe_types::{EntsoeError, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Returns true if the bytes start with a ZIP local file header.
#[must_use]
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

/// Extracts every member whose name satisfies `keep`, in archive order.
///
/// # Errors
///
/// Returns [`EntsoeError::Archive`] if the archive cannot be read.
pub fn members(bytes: &[u8], keep: impl Fn(&str) -> bool) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| EntsoeError::Archive(e.to_string()))?;
    let mut out = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let mut file = archive
            .by_index(idx)
            .map_err(|e| EntsoeError::Archive(e.to_string()))?;
        if file.is_dir() || !keep(file.name()) {
            continue;
        }
        let name = file.name().to_string();
        let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut content)?;
        out.push((name, content));
    }
    Ok(out)
}

/// Extracts the XML documents of an archive.
///
/// # Errors
///
/// Returns [`EntsoeError::Archive`] if the archive cannot be read.
pub fn xml_members(bytes: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    members(bytes, |name| name.to_ascii_lowercase().ends_with("xml"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    pub(crate) fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_xml_members() {
        let bytes = build_zip(&[("a.xml", "<a/>"), ("readme.txt", "hi"), ("b.xml", "<b/>")]);
        assert!(is_zip(&bytes));

        let members = xml_members(&bytes).unwrap();
        let names: Vec<_> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
        assert_eq!(members[1].1, b"<b/>");
    }

    #[test]
    fn test_not_a_zip() {
        assert!(!is_zip(b"<xml/>"));
        assert!(matches!(
            xml_members(b"garbage"),
            Err(EntsoeError::Archive(_))
        ));
    }
}

//! Feed documents and artefact contents used by the integration tests

use sha2::{Digest, Sha256};

/// Atom namespace
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// NCTS syndication extension namespace
pub const NCTS_NS: &str = "http://ns.electronichealth.net.au/ncts/syndication/asf/extensions/1.0.0";

/// Token the mock token endpoint hands out
pub const TEST_TOKEN: &str = "123";

/// One artefact published by the test feed
#[derive(Debug, Clone)]
pub struct Artefact {
    /// Atom entry ID
    pub id: &'static str,
    /// Category term
    pub category: &'static str,
    /// Content item identifier
    pub identifier: &'static str,
    /// Content item version
    pub version: &'static str,
    /// File name, which is also the URL path
    pub file: &'static str,
    /// Bytes served for the file
    pub served: &'static [u8],
    /// Bytes whose hash and length the feed advertises
    pub published: &'static [u8],
}

impl Artefact {
    const fn new(
        id: &'static str,
        category: &'static str,
        identifier: &'static str,
        version: &'static str,
        file: &'static str,
        content: &'static [u8],
    ) -> Self {
        Self {
            id,
            category,
            identifier,
            version,
            file,
            served: content,
            published: content,
        }
    }
}

/// The standard test feed
///
/// - BLUE: versions "1" and "2" of one item
/// - RED: a single entry
/// - PURPLE: semantic versions "1.0.0" and "1.1.0"
/// - GREEN: a single entry whose served bytes don't match the feed
/// - ORANGE: two content items, each in two versions
pub fn standard_artefacts() -> Vec<Artefact> {
    vec![
        Artefact::new("urn:uuid:blue1", "SCT_RF2_BLUE", "blue", "1", "blue1.r2", b"blue release 1\n"),
        Artefact::new("urn:uuid:blue2", "SCT_RF2_BLUE", "blue", "2", "blue2.r2", b"blue release 2\n"),
        Artefact::new("urn:uuid:red1", "SCT_RF2_RED", "red", "1", "red1.r2", b"red release 1\n"),
        Artefact::new("urn:uuid:purple1", "SCT_RF2_PURPLE", "purple", "1.0.0", "purple1.r2", b"purple 1.0.0\n"),
        Artefact::new("urn:uuid:purple2", "SCT_RF2_PURPLE", "purple", "1.1.0", "purple2.r2", b"purple 1.1.0\n"),
        Artefact {
            served: b"green release, tampered\n",
            ..Artefact::new("urn:uuid:green1", "SCT_RF2_GREEN", "green", "1", "green1.r2", b"green release 1\n")
        },
        Artefact::new("urn:uuid:orange-a1", "SCT_RF2_ORANGE", "orange-a", "20240131", "orange-a1.r2", b"orange a jan\n"),
        Artefact::new("urn:uuid:orange-a2", "SCT_RF2_ORANGE", "orange-a", "20240229", "orange-a2.r2", b"orange a feb\n"),
        Artefact::new("urn:uuid:orange-b1", "SCT_RF2_ORANGE", "orange-b", "20240131", "orange-b1.r2", b"orange b jan\n"),
        Artefact::new("urn:uuid:orange-b2", "SCT_RF2_ORANGE", "orange-b", "20240229", "orange-b2.r2", b"orange b feb\n"),
    ]
}

/// Hex SHA-256 of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Render a feed document advertising `artefacts` under `base_url`
pub fn feed_xml(base_url: &str, artefacts: &[Artefact]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="{ATOM_NS}" xmlns:ncts="{NCTS_NS}">
  <title>NCTS Test Syndication Feed</title>
  <id>urn:uuid:test-feed</id>
  <updated>2024-03-01T00:00:00Z</updated>
"#
    );

    for artefact in artefacts {
        xml.push_str(&format!(
            r#"  <entry>
    <id>{id}</id>
    <title>{file}</title>
    <category term="{category}" scheme="http://ns.electronichealth.net.au/ncts/syndication/asf/scheme/1.0.0"/>
    <link rel="alternate" type="application/octet-stream" href="{base_url}/{file}" length="{length}" ncts:sha256Hash="{hash}"/>
    <ncts:contentItemIdentifier>{identifier}</ncts:contentItemIdentifier>
    <ncts:contentItemVersion>{version}</ncts:contentItemVersion>
  </entry>
"#,
            id = artefact.id,
            file = artefact.file,
            category = artefact.category,
            length = artefact.published.len(),
            hash = sha256_hex(artefact.published),
            identifier = artefact.identifier,
            version = artefact.version,
        ));
    }

    xml.push_str("</feed>\n");
    xml
}

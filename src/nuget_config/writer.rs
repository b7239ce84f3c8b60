//! `nuget.config` document model and XML rendering

use crate::auth::SourceCredential;
use crate::feed::FeedSource;
use std::fmt::Write as _;

/// In-memory `nuget.config` with package sources and their credentials
#[derive(Debug, Clone, Default)]
pub struct NuGetConfigDocument {
    sources: Vec<FeedSource>,
    credentials: Vec<(String, SourceCredential)>,
}

impl NuGetConfigDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source; a source with the same name is replaced
    pub fn add_source(&mut self, source: FeedSource) {
        self.sources.retain(|s| s.name != source.name);
        self.sources.push(source);
    }

    #[must_use]
    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Store a credential for the source named `name`
    pub fn set_credential(&mut self, name: &str, credential: SourceCredential) {
        self.credentials.retain(|(n, _)| n != name);
        self.credentials.push((name.to_owned(), credential));
    }

    /// Render the document as XML
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        xml.push_str("<configuration>\n");
        xml.push_str("  <packageSources>\n");
        xml.push_str("    <clear />\n");
        for source in &self.sources {
            let _ = writeln!(
                xml,
                "    <add key=\"{}\" value=\"{}\" />",
                escape_xml(&source.name),
                escape_xml(&source.uri)
            );
        }
        xml.push_str("  </packageSources>\n");

        if !self.credentials.is_empty() {
            xml.push_str("  <packageSourceCredentials>\n");
            for (name, credential) in &self.credentials {
                let element = encode_element_name(name);
                let _ = writeln!(xml, "    <{element}>");
                let _ = writeln!(
                    xml,
                    "      <add key=\"Username\" value=\"{}\" />",
                    escape_xml(&credential.username)
                );
                let _ = writeln!(
                    xml,
                    "      <add key=\"ClearTextPassword\" value=\"{}\" />",
                    escape_xml(&credential.password)
                );
                let _ = writeln!(xml, "    </{element}>");
            }
            xml.push_str("  </packageSourceCredentials>\n");
        }

        xml.push_str("</configuration>\n");
        xml
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Encode a source name as an XML element name
///
/// Characters that cannot appear in a name are written as `_xHHHH_`, or
/// `_xHHHHHHHH_` above U+FFFF, which is how NuGet reads credential sections
/// back.
#[must_use]
pub fn encode_element_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for (index, c) in name.chars().enumerate() {
        let allowed = if index == 0 {
            c.is_alphabetic() || c == '_'
        } else {
            c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
        };
        if allowed {
            encoded.push(c);
        } else if u32::from(c) > 0xFFFF {
            let _ = write!(encoded, "_x{:08X}_", u32::from(c));
        } else {
            let _ = write!(encoded, "_x{:04X}_", u32::from(c));
        }
    }
    encoded
}

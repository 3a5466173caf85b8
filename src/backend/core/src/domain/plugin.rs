use serde::{Deserialize, Serialize};

/// A plugin descriptor as returned by the catalogue. Boefjes carry an
/// intrusiveness `scan_level` and consume OOI types; normalizers consume
/// MIME types. Modelled as a tagged sum rather than one flat struct with
/// optional fields, per the variant-per-role guidance in the design notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PluginKind {
    Boefje { scan_level: u8 },
    Normalizer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
    #[serde(flatten)]
    pub kind: PluginKind,
    pub enabled: bool,
    /// OOI types (boefje) or MIME types (normalizer) this plugin accepts.
    pub consumes: Vec<String>,
    /// MIME types this plugin's output is tagged with.
    pub produces: Vec<String>,
}

impl Plugin {
    pub fn is_boefje(&self) -> bool {
        matches!(self.kind, PluginKind::Boefje { .. })
    }

    pub fn scan_level(&self) -> Option<u8> {
        match self.kind {
            PluginKind::Boefje { scan_level } => Some(scan_level),
            PluginKind::Normalizer => None,
        }
    }
}

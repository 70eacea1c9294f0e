//! Reader display preferences, persisted per key in a small key-value
//! storage so one corrupt value never resets the others.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

const CLE_TAILLE_POLICE: &str = "fontSize";
const CLE_POLICE: &str = "fontFamily";
const CLE_ALIGNEMENT: &str = "textAlign";
const CLE_LARGEUR_SIDEBAR: &str = "sidebarWidth";

pub const LARGEUR_SIDEBAR_MIN: u32 = 250;
pub const LARGEUR_SIDEBAR_MAX: u32 = 600;

/// Small string-to-string storage, localStorage-shaped. Writes are
/// fire-and-forget: a failed persist must never break reading.
pub trait KvStorage: Send {
    fn get(&self, cle: &str) -> Option<String>;
    fn set(&mut self, cle: &str, valeur: &str);
}

#[derive(Debug, Default)]
pub struct MemoryKv {
    valeurs: BTreeMap<String, String>,
}

impl KvStorage for MemoryKv {
    fn get(&self, cle: &str) -> Option<String> {
        self.valeurs.get(cle).cloned()
    }

    fn set(&mut self, cle: &str, valeur: &str) {
        self.valeurs.insert(cle.to_owned(), valeur.to_owned());
    }
}

/// JSON-file backed storage for the CLI. The whole map is rewritten on each
/// set.
#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    valeurs: BTreeMap<String, String>,
}

impl FileKv {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let valeurs = match std::fs::read_to_string(&path) {
            Ok(body) => serde_json::from_str(&body)
                .with_context(|| format!("parse preference file {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("read preference file {}", path.display())));
            }
        };
        Ok(Self { path, valeurs })
    }
}

impl KvStorage for FileKv {
    fn get(&self, cle: &str) -> Option<String> {
        self.valeurs.get(cle).cloned()
    }

    fn set(&mut self, cle: &str, valeur: &str) {
        self.valeurs.insert(cle.to_owned(), valeur.to_owned());
        let body = match serde_json::to_string_pretty(&self.valeurs) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, "serialize preferences");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, body) {
            tracing::warn!(path = %self.path.display(), error = %err, "persist preferences");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Sans,
    Serif,
    Times,
    Mono,
}

impl FontFamily {
    pub fn css(self) -> &'static str {
        match self {
            FontFamily::Sans => "ui-sans-serif, system-ui, sans-serif",
            FontFamily::Serif => "ui-serif, Georgia, serif",
            FontFamily::Times => "'Times New Roman', Times, serif",
            FontFamily::Mono => "ui-monospace, monospace",
        }
    }

    fn parse(valeur: &str) -> Option<Self> {
        match valeur {
            "sans" => Some(FontFamily::Sans),
            "serif" => Some(FontFamily::Serif),
            "times" => Some(FontFamily::Times),
            "mono" => Some(FontFamily::Mono),
            _ => None,
        }
    }

    fn nom(self) -> &'static str {
        match self {
            FontFamily::Sans => "sans",
            FontFamily::Serif => "serif",
            FontFamily::Times => "times",
            FontFamily::Mono => "mono",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Justify,
}

impl TextAlign {
    fn parse(valeur: &str) -> Option<Self> {
        match valeur {
            "left" => Some(TextAlign::Left),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }

    fn nom(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReaderPreferences {
    pub taille_police: u32,
    pub police: FontFamily,
    pub alignement: TextAlign,
    pub largeur_sidebar: u32,
}

impl Default for ReaderPreferences {
    fn default() -> Self {
        Self {
            taille_police: 16,
            police: FontFamily::Sans,
            alignement: TextAlign::Justify,
            largeur_sidebar: 300,
        }
    }
}

impl ReaderPreferences {
    /// Loads each key independently; an absent or unreadable value falls
    /// back to its default without touching the others.
    pub fn charger(kv: &dyn KvStorage) -> Self {
        let defauts = Self::default();
        Self {
            taille_police: kv
                .get(CLE_TAILLE_POLICE)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defauts.taille_police),
            police: kv
                .get(CLE_POLICE)
                .and_then(|v| FontFamily::parse(&v))
                .unwrap_or(defauts.police),
            alignement: kv
                .get(CLE_ALIGNEMENT)
                .and_then(|v| TextAlign::parse(&v))
                .unwrap_or(defauts.alignement),
            largeur_sidebar: kv
                .get(CLE_LARGEUR_SIDEBAR)
                .and_then(|v| v.parse().ok())
                .map(clamp_largeur)
                .unwrap_or(defauts.largeur_sidebar),
        }
    }

    pub fn sauvegarder(&self, kv: &mut dyn KvStorage) {
        kv.set(CLE_TAILLE_POLICE, &self.taille_police.to_string());
        kv.set(CLE_POLICE, self.police.nom());
        kv.set(CLE_ALIGNEMENT, self.alignement.nom());
        kv.set(CLE_LARGEUR_SIDEBAR, &self.largeur_sidebar.to_string());
    }
}

pub fn clamp_largeur(largeur: u32) -> u32 {
    largeur.clamp(LARGEUR_SIDEBAR_MIN, LARGEUR_SIDEBAR_MAX)
}

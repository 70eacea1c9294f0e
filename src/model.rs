use serde::{Deserialize, Serialize};

/// Row types mirror the column names of the hosted schema (French), so the
/// store responses deserialize without renaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Considerant {
    pub numero: i64,
    pub contenu: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapitre {
    pub id_chapitre: i64,
    pub titre: String,
    pub contenu: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id_section: i64,
    pub titre: String,
    pub id_chapitre: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Identity key; defines the next/previous order.
    pub id_article: i64,
    /// Human display label ("Article 6", "Article 3 bis"); never an ordering key.
    pub numero: String,
    pub titre: String,
    pub contenu: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    /// Free-text considérant range, e.g. "12, 13-16, 20".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub considerants_associes: Option<String>,
    /// Delimited list of fiche-pratique references (`titre|lien` or bare links).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiches_associees: Option<String>,
    /// Single associated-document token; see `refs::parse_texte_associe`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texte_associe: Option<String>,
    pub id_chapitre: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_section: Option<i64>,
}

/// Article as displayed: the row plus its denormalized parent titles and
/// the parsed annotation fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleVue {
    #[serde(flatten)]
    pub article: Article,
    pub chapitre_titre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_titre: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub considerants_lies: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fiches: Vec<crate::refs::LienRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_associe: Option<crate::refs::LienRef>,
}

/// Descriptive row from the annex index table (`liste_annexes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnexeIndex {
    pub id_annexe: i64,
    #[serde(default)]
    pub numero: Option<i64>,
    #[serde(default)]
    pub titre: Option<String>,
}

/// Content row from the annex content table (`annexes`). A row without a
/// section title is the body of a simple annex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnexeRow {
    pub id_annexe: i64,
    #[serde(default)]
    pub titre_section: Option<String>,
    pub contenu: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subdivision {
    pub titre_section: String,
    pub contenu: String,
}

/// An annex is exactly one of the two shapes, decided by the resolver from
/// the fetched content rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "forme", rename_all = "snake_case")]
pub enum AnnexeContenu {
    Simple { contenu: String },
    Subdivisions { subdivisions: Vec<Subdivision> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annexe {
    pub id_annexe: i64,
    pub numero: i64,
    pub titre: String,
    #[serde(flatten)]
    pub contenu: AnnexeContenu,
}

impl Annexe {
    pub fn subdivisions(&self) -> &[Subdivision] {
        match &self.contenu {
            AnnexeContenu::Simple { .. } => &[],
            AnnexeContenu::Subdivisions { subdivisions } => subdivisions,
        }
    }
}

/// Title and preamble of the regulation, shown while nothing is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reglement {
    pub titre: String,
    pub visa: String,
}

/// The single displayed node. Setting any variant replaces the whole value,
/// so at most one node is ever active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Aucune,
    Considerant(Considerant),
    Chapitre(Chapitre),
    Article(ArticleVue),
    Annexe {
        annexe: Annexe,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subdivision: Option<usize>,
    },
    Section {
        section: Section,
        premier_article: ArticleVue,
    },
}

impl Selection {
    /// `(type, id)` pair used for the deep-link query parameters, if the
    /// variant maps to a URL.
    pub fn node_ref(&self) -> Option<(&'static str, i64)> {
        match self {
            Selection::Aucune => None,
            Selection::Considerant(c) => Some(("considerant", c.numero)),
            Selection::Chapitre(c) => Some(("chapitre", c.id_chapitre)),
            Selection::Article(a) => Some(("article", a.article.id_article)),
            Selection::Annexe { annexe, .. } => Some(("annexe", annexe.id_annexe)),
            Selection::Section { section, .. } => Some(("section", section.id_section)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_serializes_with_type_tag() {
        let sel = Selection::Considerant(Considerant {
            numero: 7,
            contenu: "texte".to_owned(),
        });
        let value = serde_json::to_value(&sel).unwrap();
        assert_eq!(value["type"], "considerant");
        assert_eq!(value["numero"], 7);
    }

    #[test]
    fn annexe_simple_and_subdivisions_are_distinct_shapes() {
        let simple = Annexe {
            id_annexe: 1,
            numero: 1,
            titre: "Annexe I".to_owned(),
            contenu: AnnexeContenu::Simple {
                contenu: "corps".to_owned(),
            },
        };
        assert!(simple.subdivisions().is_empty());

        let divisee = Annexe {
            id_annexe: 3,
            numero: 3,
            titre: "Annexe III".to_owned(),
            contenu: AnnexeContenu::Subdivisions {
                subdivisions: vec![Subdivision {
                    titre_section: "Partie A".to_owned(),
                    contenu: "corps".to_owned(),
                }],
            },
        };
        assert_eq!(divisee.subdivisions().len(), 1);
    }
}

//! Parsers for the free-text annotation fields attached to an article.
//!
//! The store keeps these as single denormalized strings with a loose,
//! historically grown grammar. The parsers are total: unparseable input
//! yields an empty result, never an error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A renderable reference: a display title and an optional link target.
/// An empty `lien` means "render as plain text".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LienRef {
    pub titre: String,
    pub lien: String,
}

/// Fiche-pratique slugs with a known display title, keyed by the last path
/// segment of their public URL.
const FICHES_CONNUES: &[(&str, &str)] = &[
    ("fria", "Analyse d'impact sur les droits fondamentaux (FRIA)"),
    ("transparence", "Obligations de transparence"),
    ("explicabilite", "Explicabilité des systèmes d'IA"),
    ("controle-humain", "Contrôle humain"),
    ("droits-rgpd", "Articulation avec les droits RGPD"),
    ("exactitude", "Exactitude et robustesse"),
    ("maitrise-ia", "Maîtrise de l'IA"),
    ("gestion-risques", "Système de gestion des risques"),
    ("secteur-bancaire", "IA dans le secteur bancaire"),
    ("exception-haut-risque", "Exception à la qualification haut risque"),
];

/// Expands a considérant range expression ("12, 13-16, 20") into the listed
/// numbers, first occurrence kept, duplicates and malformed tokens dropped.
pub fn parse_plage_considerants(texte: &str) -> Vec<i64> {
    let mut vus = HashSet::new();
    let mut numeros = Vec::new();

    for token in texte.split([',', ';']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((debut, fin)) = token.split_once('-') {
            let (Ok(debut), Ok(fin)) = (debut.trim().parse::<i64>(), fin.trim().parse::<i64>())
            else {
                continue;
            };
            // Descending ranges are malformed and dropped whole.
            if debut > fin {
                continue;
            }
            for numero in debut..=fin {
                if vus.insert(numero) {
                    numeros.push(numero);
                }
            }
        } else if let Ok(numero) = token.parse::<i64>()
            && vus.insert(numero)
        {
            numeros.push(numero);
        }
    }

    numeros
}

/// Splits a fiche-pratique reference list into titled links. Tokens separate
/// on `,`, `;` or newline; each is either `titre|lien` or a bare link whose
/// title is resolved from the known-slug table.
pub fn parse_fiches_associees(texte: &str) -> Vec<LienRef> {
    texte
        .split([',', ';', '\n'])
        .filter_map(|token| {
            let token = token.trim();
            if token.is_empty() {
                return None;
            }
            if let Some((titre, lien)) = token.split_once('|') {
                return Some(LienRef {
                    titre: titre.trim().to_owned(),
                    lien: lien.trim().to_owned(),
                });
            }
            Some(LienRef {
                titre: titre_de_fiche(token),
                lien: token.to_owned(),
            })
        })
        .collect()
}

fn titre_de_fiche(lien: &str) -> String {
    if let Some(titre) = fiche_connue(lien) {
        return titre.to_owned();
    }
    let segment = dernier_segment(lien);
    if let Some(titre) = fiche_connue(segment) {
        return titre.to_owned();
    }
    if !segment.is_empty() {
        return segment.to_owned();
    }
    lien.to_owned()
}

fn fiche_connue(cle: &str) -> Option<&'static str> {
    FICHES_CONNUES
        .iter()
        .find(|(slug, _)| *slug == cle)
        .map(|(_, titre)| *titre)
}

fn dernier_segment(lien: &str) -> &str {
    lien.trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// Parses the single associated-document field. Priority order:
/// explicit `titre|lien`, bare URL, `titre https://…` suffix link, then
/// plain text with no link.
pub fn parse_texte_associe(texte: &str) -> Option<LienRef> {
    let texte = texte.trim();
    if texte.is_empty() {
        return None;
    }

    if let Some((titre, lien)) = texte.split_once('|') {
        return Some(LienRef {
            titre: titre.trim().to_owned(),
            lien: lien.trim().to_owned(),
        });
    }

    if texte.starts_with("http://") || texte.starts_with("https://") {
        return Some(LienRef {
            titre: titre_depuis_url(texte),
            lien: texte.to_owned(),
        });
    }

    if let Some(position) = position_url(texte) {
        let titre = texte[..position].trim();
        if !titre.is_empty() {
            // The link ends at the first whitespace after the URL start.
            let reste = &texte[position..];
            let lien = reste.split_whitespace().next().unwrap_or(reste);
            return Some(LienRef {
                titre: titre.to_owned(),
                lien: lien.to_owned(),
            });
        }
    }

    Some(LienRef {
        titre: texte.to_owned(),
        lien: String::new(),
    })
}

fn position_url(texte: &str) -> Option<usize> {
    let http = texte.find("http://");
    let https = texte.find("https://");
    match (http, https) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (pos, None) | (None, pos) => pos,
    }
}

/// Derives a display title from a URL: last non-empty path segment, query
/// and fragment stripped, `%20` decoded to a space.
fn titre_depuis_url(lien: &str) -> String {
    let sans_query = lien.split(['?', '#']).next().unwrap_or(lien);
    let segment = dernier_segment(sans_query);
    if segment.is_empty() {
        return lien.to_owned();
    }
    segment.replace("%20", " ")
}

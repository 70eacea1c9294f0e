//! Builds the navigation tree shown in the sidebar and keeps its panel
//! open/closed state.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::prefs::KvStorage;
use crate::resolver::cle_numerique;
use crate::store::{DocumentStore, StoreResult};

const CLE_CONSIDERANTS_OUVERT: &str = "isConsiderantsOpen";
const CLE_DISPOSITIF_OUVERT: &str = "isDispositifOpen";
const CLE_ANNEXES_OUVERT: &str = "isAnnexesOpen";
const CLE_CHAPITRES_OUVERTS: &str = "openChapitres";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleSommaire {
    pub id_article: i64,
    pub numero: String,
    pub titre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSommaire {
    pub id_section: i64,
    pub titre: String,
    pub articles: Vec<ArticleSommaire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapitreSommaire {
    pub id_chapitre: i64,
    pub titre: String,
    /// Articles attached directly to the chapter, outside any section.
    pub articles: Vec<ArticleSommaire>,
    pub sections: Vec<SectionSommaire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnexeSommaire {
    pub id_annexe: i64,
    pub numero: i64,
    pub titre: String,
    pub subdivisions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SommaireTree {
    pub considerants: Vec<i64>,
    pub chapitres: Vec<ChapitreSommaire>,
    pub annexes: Vec<AnnexeSommaire>,
}

/// Assembles the whole tree from the list queries. Everything is grouped
/// client-side; articles order by the digits of their label.
pub async fn construire(store: &dyn DocumentStore) -> StoreResult<SommaireTree> {
    let considerants = store
        .tous_considerants()
        .await?
        .into_iter()
        .map(|c| c.numero)
        .collect();

    let chapitres = store.tous_chapitres().await?;
    let sections = store.toutes_sections().await?;
    let mut articles = store.tous_articles().await?;
    articles.sort_by_key(|a| cle_numerique(&a.numero));

    let mut arbre: Vec<ChapitreSommaire> = chapitres
        .into_iter()
        .map(|c| ChapitreSommaire {
            id_chapitre: c.id_chapitre,
            titre: c.titre,
            articles: Vec::new(),
            sections: Vec::new(),
        })
        .collect();
    for chapitre in &mut arbre {
        chapitre.sections = sections
            .iter()
            .filter(|s| s.id_chapitre == chapitre.id_chapitre)
            .map(|s| SectionSommaire {
                id_section: s.id_section,
                titre: s.titre.clone(),
                articles: Vec::new(),
            })
            .collect();
    }

    for article in articles {
        let Some(chapitre) = arbre
            .iter_mut()
            .find(|c| c.id_chapitre == article.id_chapitre)
        else {
            // Orphan rows are left out of the tree rather than failing it.
            tracing::warn!(id_article = article.id_article, "article without chapter");
            continue;
        };
        let entree = ArticleSommaire {
            id_article: article.id_article,
            numero: article.numero,
            titre: article.titre,
        };
        match article
            .id_section
            .and_then(|id| chapitre.sections.iter_mut().find(|s| s.id_section == id))
        {
            Some(section) => section.articles.push(entree),
            None => chapitre.articles.push(entree),
        }
    }

    let mut lignes_par_annexe: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for ligne in store.toutes_lignes_annexes().await? {
        let titres = lignes_par_annexe.entry(ligne.id_annexe).or_default();
        if let Some(titre) = ligne.titre_section.filter(|t| !t.trim().is_empty()) {
            titres.push(titre);
        }
    }
    let annexes = store
        .toutes_annexes()
        .await?
        .into_iter()
        .map(|index| {
            let numero = index.numero.unwrap_or(index.id_annexe);
            AnnexeSommaire {
                id_annexe: index.id_annexe,
                numero,
                titre: index
                    .titre
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| format!("Annexe {numero}")),
                subdivisions: lignes_par_annexe.remove(&index.id_annexe).unwrap_or_default(),
            }
        })
        .collect();

    Ok(SommaireTree {
        considerants,
        chapitres: arbre,
        annexes,
    })
}

/// Which sidebar panels are expanded. Defaults mirror a first visit: the
/// dispositif open, everything else folded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanneauxSommaire {
    pub considerants_ouvert: bool,
    pub dispositif_ouvert: bool,
    pub annexes_ouvert: bool,
    pub chapitres_ouverts: Vec<i64>,
}

impl Default for PanneauxSommaire {
    fn default() -> Self {
        Self {
            considerants_ouvert: false,
            dispositif_ouvert: true,
            annexes_ouvert: false,
            chapitres_ouverts: Vec::new(),
        }
    }
}

impl PanneauxSommaire {
    pub fn charger(kv: &dyn KvStorage) -> Self {
        let defauts = Self::default();
        let bool_de = |cle: &str, defaut: bool| {
            kv.get(cle)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaut)
        };
        Self {
            considerants_ouvert: bool_de(CLE_CONSIDERANTS_OUVERT, defauts.considerants_ouvert),
            dispositif_ouvert: bool_de(CLE_DISPOSITIF_OUVERT, defauts.dispositif_ouvert),
            annexes_ouvert: bool_de(CLE_ANNEXES_OUVERT, defauts.annexes_ouvert),
            chapitres_ouverts: kv
                .get(CLE_CHAPITRES_OUVERTS)
                .and_then(|v| serde_json::from_str(&v).ok())
                .unwrap_or(defauts.chapitres_ouverts),
        }
    }

    pub fn sauvegarder(&self, kv: &mut dyn KvStorage) {
        kv.set(CLE_CONSIDERANTS_OUVERT, &self.considerants_ouvert.to_string());
        kv.set(CLE_DISPOSITIF_OUVERT, &self.dispositif_ouvert.to_string());
        kv.set(CLE_ANNEXES_OUVERT, &self.annexes_ouvert.to_string());
        if let Ok(liste) = serde_json::to_string(&self.chapitres_ouverts) {
            kv.set(CLE_CHAPITRES_OUVERTS, &liste);
        }
    }

    pub fn basculer_chapitre(&mut self, id_chapitre: i64) {
        if let Some(position) = self
            .chapitres_ouverts
            .iter()
            .position(|id| *id == id_chapitre)
        {
            self.chapitres_ouverts.remove(position);
        } else {
            self.chapitres_ouverts.push(id_chapitre);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AnnexeIndex, AnnexeRow, Article, Chapitre, Considerant, Section,
    };
    use crate::prefs::MemoryKv;
    use crate::store::{Fixture, MemoryStore};

    fn article(id: i64, numero: &str, id_chapitre: i64, id_section: Option<i64>) -> Article {
        Article {
            id_article: id,
            numero: numero.to_owned(),
            titre: format!("Titre {id}"),
            contenu: String::new(),
            resume: None,
            considerants_associes: None,
            fiches_associees: None,
            texte_associe: None,
            id_chapitre,
            id_section,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(Fixture {
            reglement: None,
            considerants: vec![
                Considerant {
                    numero: 2,
                    contenu: String::new(),
                },
                Considerant {
                    numero: 1,
                    contenu: String::new(),
                },
            ],
            chapitres: vec![
                Chapitre {
                    id_chapitre: 1,
                    titre: "Chapitre I".to_owned(),
                    contenu: String::new(),
                },
                Chapitre {
                    id_chapitre: 2,
                    titre: "Chapitre II".to_owned(),
                    contenu: String::new(),
                },
            ],
            sections: vec![Section {
                id_section: 10,
                titre: "Section 1".to_owned(),
                id_chapitre: 2,
            }],
            articles: vec![
                article(5, "Article 2", 1, None),
                article(4, "Article 1", 1, None),
                article(6, "Article 10", 2, Some(10)),
                article(7, "Article 3", 2, Some(10)),
            ],
            liste_annexes: vec![
                AnnexeIndex {
                    id_annexe: 1,
                    numero: Some(1),
                    titre: Some("Annexe I".to_owned()),
                },
                AnnexeIndex {
                    id_annexe: 2,
                    numero: Some(2),
                    titre: None,
                },
            ],
            annexes: vec![
                AnnexeRow {
                    id_annexe: 2,
                    titre_section: Some("Partie A".to_owned()),
                    contenu: String::new(),
                },
                AnnexeRow {
                    id_annexe: 1,
                    titre_section: None,
                    contenu: String::new(),
                },
            ],
        })
    }

    #[tokio::test]
    async fn arbre_groupe_et_trie() {
        let arbre = construire(&store()).await.unwrap();

        assert_eq!(arbre.considerants, vec![1, 2]);

        assert_eq!(arbre.chapitres.len(), 2);
        let ch1 = &arbre.chapitres[0];
        assert_eq!(
            ch1.articles.iter().map(|a| a.numero.as_str()).collect::<Vec<_>>(),
            vec!["Article 1", "Article 2"]
        );
        assert!(ch1.sections.is_empty());

        let ch2 = &arbre.chapitres[1];
        assert!(ch2.articles.is_empty());
        assert_eq!(
            ch2.sections[0]
                .articles
                .iter()
                .map(|a| a.numero.as_str())
                .collect::<Vec<_>>(),
            vec!["Article 3", "Article 10"]
        );

        assert_eq!(arbre.annexes.len(), 2);
        assert!(arbre.annexes[0].subdivisions.is_empty());
        assert_eq!(arbre.annexes[1].titre, "Annexe 2");
        assert_eq!(arbre.annexes[1].subdivisions, vec!["Partie A".to_owned()]);
    }

    #[test]
    fn panneaux_par_defaut_puis_bascule() {
        let mut kv = MemoryKv::default();
        let mut panneaux = PanneauxSommaire::charger(&kv);
        assert!(!panneaux.considerants_ouvert);
        assert!(panneaux.dispositif_ouvert);

        panneaux.basculer_chapitre(3);
        panneaux.basculer_chapitre(5);
        panneaux.basculer_chapitre(3);
        panneaux.sauvegarder(&mut kv);

        let relus = PanneauxSommaire::charger(&kv);
        assert_eq!(relus.chapitres_ouverts, vec![5]);
    }
}

//! Turns a node reference into a fully displayable `Selection`: fetches the
//! row, joins the denormalized parent titles and decides the annex shape.

use crate::model::{
    Annexe, AnnexeContenu, Article, ArticleVue, Selection, Subdivision,
};
use crate::refs;
use crate::store::{DocumentStore, StoreError, StoreResult};
use crate::urlsync::NodeRef;

/// How an article is addressed: by identity key or by display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleCle<'a> {
    Id(i64),
    Numero(&'a str),
}

pub async fn resoudre_considerant(
    store: &dyn DocumentStore,
    numero: i64,
) -> StoreResult<Selection> {
    Ok(Selection::Considerant(store.considerant(numero).await?))
}

pub async fn resoudre_chapitre(
    store: &dyn DocumentStore,
    id_chapitre: i64,
) -> StoreResult<Selection> {
    Ok(Selection::Chapitre(store.chapitre(id_chapitre).await?))
}

pub async fn resoudre_article(
    store: &dyn DocumentStore,
    cle: ArticleCle<'_>,
) -> StoreResult<Selection> {
    let article = match cle {
        ArticleCle::Id(id) => store.article(id).await?,
        ArticleCle::Numero(numero) => store.article_par_numero(numero).await?,
    };
    Ok(Selection::Article(vue(store, article).await?))
}

/// Annotates an article row with its chapter title, the section title when
/// it belongs to one, and the parsed annotation fields.
pub async fn vue(store: &dyn DocumentStore, article: Article) -> StoreResult<ArticleVue> {
    let chapitre = store.chapitre(article.id_chapitre).await?;
    let section_titre = match article.id_section {
        Some(id_section) => Some(store.section(id_section).await?.titre),
        None => None,
    };
    Ok(annoter(article, chapitre.titre, section_titre))
}

fn annoter(article: Article, chapitre_titre: String, section_titre: Option<String>) -> ArticleVue {
    let considerants_lies = article
        .considerants_associes
        .as_deref()
        .map(refs::parse_plage_considerants)
        .unwrap_or_default();
    let fiches = article
        .fiches_associees
        .as_deref()
        .map(refs::parse_fiches_associees)
        .unwrap_or_default();
    let document_associe = article
        .texte_associe
        .as_deref()
        .and_then(refs::parse_texte_associe);
    ArticleVue {
        article,
        chapitre_titre,
        section_titre,
        considerants_lies,
        fiches,
        document_associe,
    }
}

pub async fn resoudre_annexe(
    store: &dyn DocumentStore,
    id_annexe: i64,
    subdivision: Option<usize>,
) -> StoreResult<Selection> {
    let index = store.annexe_index(id_annexe).await?;
    let lignes = store.annexe_contenu(id_annexe).await?;
    if lignes.is_empty() {
        return Err(StoreError::NotFound);
    }

    let sans_titre = |titre: &Option<String>| {
        titre.as_deref().map(str::trim).unwrap_or("").is_empty()
    };

    // Exactly one untitled row is the simple shape; anything else keeps only
    // the titled rows as subdivisions.
    let contenu = if lignes.len() == 1 && sans_titre(&lignes[0].titre_section) {
        AnnexeContenu::Simple {
            contenu: lignes[0].contenu.clone(),
        }
    } else {
        let subdivisions: Vec<Subdivision> = lignes
            .into_iter()
            .filter(|l| !sans_titre(&l.titre_section))
            .map(|l| Subdivision {
                titre_section: l.titre_section.unwrap_or_default(),
                contenu: l.contenu,
            })
            .collect();
        AnnexeContenu::Subdivisions { subdivisions }
    };

    let numero = index.numero.unwrap_or(index.id_annexe);
    let titre = index
        .titre
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("Annexe {numero}"));

    let annexe = Annexe {
        id_annexe: index.id_annexe,
        numero,
        titre,
        contenu,
    };
    let subdivision = match &annexe.contenu {
        AnnexeContenu::Simple { .. } => None,
        AnnexeContenu::Subdivisions { subdivisions } if !subdivisions.is_empty() => {
            let demande = subdivision.unwrap_or(0);
            Some(demande.min(subdivisions.len() - 1))
        }
        AnnexeContenu::Subdivisions { .. } => None,
    };
    Ok(Selection::Annexe { annexe, subdivision })
}

pub async fn resoudre_section(
    store: &dyn DocumentStore,
    id_section: i64,
) -> StoreResult<Selection> {
    let section = store.section(id_section).await?;
    let mut articles = store.articles_de_section(id_section).await?;
    // Display order follows the digits of the label, not the identity key.
    articles.sort_by_key(|a| cle_numerique(&a.numero));
    let premier = articles.into_iter().next().ok_or(StoreError::NotFound)?;

    let chapitre = store.chapitre(premier.id_chapitre).await?;
    let premier_article = annoter(premier, chapitre.titre, Some(section.titre.clone()));
    Ok(Selection::Section {
        section,
        premier_article,
    })
}

/// Ordering key for an article label: every ASCII digit, concatenated, as a
/// number ("Article 10 bis 2" sorts as 102). Labels without digits sort last.
pub fn cle_numerique(numero: &str) -> u64 {
    let chiffres: String = numero.chars().filter(char::is_ascii_digit).collect();
    chiffres.parse().unwrap_or(u64::MAX)
}

/// Resolution entry point shared by the session and the app server.
pub async fn resoudre_noeud(
    store: &dyn DocumentStore,
    noeud: &NodeRef,
) -> StoreResult<Selection> {
    match noeud {
        NodeRef::Considerant(numero) => resoudre_considerant(store, *numero).await,
        NodeRef::Chapitre(id) => resoudre_chapitre(store, *id).await,
        NodeRef::Article(id) => resoudre_article(store, ArticleCle::Id(*id)).await,
        NodeRef::ArticleNumero(numero) => {
            resoudre_article(store, ArticleCle::Numero(numero)).await
        }
        NodeRef::Annexe(id) => resoudre_annexe(store, *id, None).await,
        NodeRef::Section(id) => resoudre_section(store, *id).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnnexeIndex, AnnexeRow, Chapitre, Section};
    use crate::store::{Fixture, MemoryStore};

    fn article(id: i64, numero: &str, id_chapitre: i64, id_section: Option<i64>) -> Article {
        Article {
            id_article: id,
            numero: numero.to_owned(),
            titre: format!("Titre {id}"),
            contenu: "corps".to_owned(),
            resume: None,
            considerants_associes: None,
            fiches_associees: None,
            texte_associe: None,
            id_chapitre,
            id_section,
        }
    }

    fn store_sectionne() -> MemoryStore {
        MemoryStore::new(Fixture {
            chapitres: vec![Chapitre {
                id_chapitre: 1,
                titre: "Chapitre I".to_owned(),
                contenu: String::new(),
            }],
            sections: vec![Section {
                id_section: 4,
                titre: "Section 2".to_owned(),
                id_chapitre: 1,
            }],
            articles: vec![
                article(30, "Article 10", 1, Some(4)),
                article(31, "Article 2", 1, Some(4)),
                article(32, "Article 3 bis", 1, Some(4)),
            ],
            ..Fixture::default()
        })
    }

    #[test]
    fn cle_numerique_concatene_les_chiffres() {
        assert_eq!(cle_numerique("Article 6"), 6);
        assert_eq!(cle_numerique("Article 10 bis 2"), 102);
        assert_eq!(cle_numerique("Article premier"), u64::MAX);
    }

    #[tokio::test]
    async fn section_prend_le_plus_petit_numero() {
        let store = store_sectionne();
        let sel = resoudre_section(&store, 4).await.unwrap();
        let Selection::Section {
            section,
            premier_article,
        } = sel
        else {
            panic!("expected section selection");
        };
        assert_eq!(section.id_section, 4);
        assert_eq!(premier_article.article.numero, "Article 2");
        assert_eq!(premier_article.chapitre_titre, "Chapitre I");
        assert_eq!(premier_article.section_titre.as_deref(), Some("Section 2"));
    }

    #[tokio::test]
    async fn section_vide_introuvable() {
        let store = MemoryStore::new(Fixture {
            sections: vec![Section {
                id_section: 9,
                titre: "Section vide".to_owned(),
                id_chapitre: 1,
            }],
            ..Fixture::default()
        });
        assert!(matches!(
            resoudre_section(&store, 9).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn article_est_joint_a_ses_parents() {
        let store = store_sectionne();
        let sel = resoudre_article(&store, ArticleCle::Numero("Article 10"))
            .await
            .unwrap();
        let Selection::Article(vue) = sel else {
            panic!("expected article selection");
        };
        assert_eq!(vue.article.id_article, 30);
        assert_eq!(vue.chapitre_titre, "Chapitre I");
        assert_eq!(vue.section_titre.as_deref(), Some("Section 2"));
    }

    #[tokio::test]
    async fn annotations_d_article_analysees() {
        let mut riche = article(50, "Article 50", 1, None);
        riche.considerants_associes = Some("12, 13-15".to_owned());
        riche.fiches_associees = Some("Ma fiche|/fiches/xyz".to_owned());
        riche.texte_associe = Some("Guide https://example.com/guide.pdf".to_owned());
        let store = MemoryStore::new(Fixture {
            chapitres: vec![Chapitre {
                id_chapitre: 1,
                titre: "Chapitre I".to_owned(),
                contenu: String::new(),
            }],
            articles: vec![riche],
            ..Fixture::default()
        });

        let sel = resoudre_article(&store, ArticleCle::Id(50)).await.unwrap();
        let Selection::Article(vue) = sel else {
            panic!("expected article selection");
        };
        assert_eq!(vue.considerants_lies, vec![12, 13, 14, 15]);
        assert_eq!(vue.fiches[0].titre, "Ma fiche");
        let document = vue.document_associe.unwrap();
        assert_eq!(document.titre, "Guide");
        assert_eq!(document.lien, "https://example.com/guide.pdf");
    }

    fn store_annexes(lignes: Vec<AnnexeRow>) -> MemoryStore {
        MemoryStore::new(Fixture {
            liste_annexes: vec![AnnexeIndex {
                id_annexe: 7,
                numero: Some(3),
                titre: Some("Annexe III".to_owned()),
            }],
            annexes: lignes,
            ..Fixture::default()
        })
    }

    #[tokio::test]
    async fn annexe_simple() {
        let store = store_annexes(vec![AnnexeRow {
            id_annexe: 7,
            titre_section: None,
            contenu: "corps".to_owned(),
        }]);
        let sel = resoudre_annexe(&store, 7, None).await.unwrap();
        let Selection::Annexe { annexe, subdivision } = sel else {
            panic!("expected annexe selection");
        };
        assert_eq!(
            annexe.contenu,
            AnnexeContenu::Simple {
                contenu: "corps".to_owned()
            }
        );
        assert_eq!(subdivision, None);
    }

    #[tokio::test]
    async fn annexe_subdivisee_ignore_les_lignes_sans_titre() {
        let store = store_annexes(vec![
            AnnexeRow {
                id_annexe: 7,
                titre_section: Some("Partie A".to_owned()),
                contenu: "a".to_owned(),
            },
            AnnexeRow {
                id_annexe: 7,
                titre_section: None,
                contenu: "orpheline".to_owned(),
            },
            AnnexeRow {
                id_annexe: 7,
                titre_section: Some("Partie B".to_owned()),
                contenu: "b".to_owned(),
            },
        ]);
        let sel = resoudre_annexe(&store, 7, Some(1)).await.unwrap();
        let Selection::Annexe { annexe, subdivision } = sel else {
            panic!("expected annexe selection");
        };
        assert_eq!(annexe.subdivisions().len(), 2);
        assert_eq!(annexe.subdivisions()[1].titre_section, "Partie B");
        assert_eq!(subdivision, Some(1));
    }

    #[tokio::test]
    async fn annexe_une_ligne_titree_est_subdivisee() {
        let store = store_annexes(vec![AnnexeRow {
            id_annexe: 7,
            titre_section: Some("Partie unique".to_owned()),
            contenu: "a".to_owned(),
        }]);
        let sel = resoudre_annexe(&store, 7, None).await.unwrap();
        let Selection::Annexe { annexe, subdivision } = sel else {
            panic!("expected annexe selection");
        };
        assert_eq!(annexe.subdivisions().len(), 1);
        assert_eq!(subdivision, Some(0));
    }

    #[tokio::test]
    async fn annexe_sans_contenu_introuvable() {
        let store = store_annexes(Vec::new());
        assert!(matches!(
            resoudre_annexe(&store, 7, None).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn annexe_titre_par_defaut() {
        let store = MemoryStore::new(Fixture {
            liste_annexes: vec![AnnexeIndex {
                id_annexe: 5,
                numero: None,
                titre: None,
            }],
            annexes: vec![AnnexeRow {
                id_annexe: 5,
                titre_section: None,
                contenu: "corps".to_owned(),
            }],
            ..Fixture::default()
        });
        let sel = resoudre_annexe(&store, 5, None).await.unwrap();
        let Selection::Annexe { annexe, .. } = sel else {
            panic!("expected annexe selection");
        };
        assert_eq!(annexe.numero, 5);
        assert_eq!(annexe.titre, "Annexe 5");
    }
}

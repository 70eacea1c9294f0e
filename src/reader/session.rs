//! The reading session: one selected node, its loading state, the deep-link
//! URL and the persisted display preferences.

use std::sync::Arc;

use crate::model::Selection;
use crate::prefs::{self, FontFamily, KvStorage, ReaderPreferences, TextAlign};
use crate::resolver::{self, ArticleCle};
use crate::store::{DocumentStore, StoreError, StoreResult};
use crate::urlsync::{self, Decodage, NodeRef, UrlState};

const NOTICE_INTROUVABLE: &str = "Contenu introuvable.";
const NOTICE_CHARGEMENT: &str = "Impossible de charger le contenu.";

pub struct ReaderSession {
    store: Arc<dyn DocumentStore>,
    url: Box<dyn UrlState>,
    kv: Box<dyn KvStorage>,
    selection: Selection,
    chargement: bool,
    notice: Option<String>,
    plein_ecran: bool,
    preferences: ReaderPreferences,
    /// Monotonic token; only the latest navigation may apply its result.
    jeton: u64,
}

impl ReaderSession {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        url: Box<dyn UrlState>,
        kv: Box<dyn KvStorage>,
    ) -> Self {
        let preferences = ReaderPreferences::charger(kv.as_ref());
        Self {
            store,
            url,
            kv,
            selection: Selection::Aucune,
            chargement: false,
            notice: None,
            plein_ecran: false,
            preferences,
            jeton: 0,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn chargement(&self) -> bool {
        self.chargement
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn plein_ecran(&self) -> bool {
        self.plein_ecran
    }

    pub fn preferences(&self) -> &ReaderPreferences {
        &self.preferences
    }

    pub fn url_courante(&self) -> urlsync::QueryParams {
        self.url.read()
    }

    /// Starts a navigation: marks the session loading and hands back the
    /// token the eventual result must present.
    pub fn debut_navigation(&mut self) -> u64 {
        self.jeton += 1;
        self.chargement = true;
        self.jeton
    }

    /// Applies a resolution result. A stale token is discarded whole, so a
    /// slow earlier navigation can never overwrite a newer one.
    pub fn appliquer_resultat(&mut self, jeton: u64, resultat: StoreResult<Selection>) {
        if jeton != self.jeton {
            tracing::debug!(jeton, courant = self.jeton, "stale navigation dropped");
            return;
        }
        self.chargement = false;
        match resultat {
            Ok(selection) => {
                self.selection = selection;
                self.notice = None;
                self.sync_url(false);
            }
            Err(StoreError::NotFound) => {
                self.notice = Some(NOTICE_INTROUVABLE.to_owned());
            }
            Err(StoreError::Transport(err)) => {
                tracing::warn!(error = format!("{err:#}"), "navigation failed");
                self.notice = Some(NOTICE_CHARGEMENT.to_owned());
            }
        }
    }

    async fn naviguer(&mut self, noeud: NodeRef) {
        let jeton = self.debut_navigation();
        let resultat = resolver::resoudre_noeud(self.store.as_ref(), &noeud).await;
        self.appliquer_resultat(jeton, resultat);
    }

    pub async fn ouvrir_considerant(&mut self, numero: i64) {
        self.naviguer(NodeRef::Considerant(numero)).await;
    }

    pub async fn ouvrir_chapitre(&mut self, id_chapitre: i64) {
        self.naviguer(NodeRef::Chapitre(id_chapitre)).await;
    }

    pub async fn ouvrir_article(&mut self, id_article: i64) {
        self.naviguer(NodeRef::Article(id_article)).await;
    }

    pub async fn ouvrir_article_par_numero(&mut self, numero: &str) {
        self.naviguer(NodeRef::ArticleNumero(numero.to_owned())).await;
    }

    pub async fn ouvrir_annexe(&mut self, id_annexe: i64) {
        self.naviguer(NodeRef::Annexe(id_annexe)).await;
    }

    pub async fn ouvrir_annexe_subdivision(&mut self, id_annexe: i64, subdivision: usize) {
        let jeton = self.debut_navigation();
        let resultat =
            resolver::resoudre_annexe(self.store.as_ref(), id_annexe, Some(subdivision)).await;
        self.appliquer_resultat(jeton, resultat);
    }

    pub async fn ouvrir_section(&mut self, id_section: i64) {
        self.naviguer(NodeRef::Section(id_section)).await;
    }

    /// Restores the selection addressed by the current URL, replacing the
    /// history entry rather than pushing one. A URL without a node keeps the
    /// default view; a recognized type with a malformed key reads as a
    /// not-found node.
    pub async fn restaurer_depuis_url(&mut self) {
        let noeud = match urlsync::decode(&self.url.read()) {
            Decodage::Aucun => return,
            Decodage::Introuvable => {
                self.notice = Some(NOTICE_INTROUVABLE.to_owned());
                return;
            }
            Decodage::Noeud(noeud) => noeud,
        };
        let jeton = self.debut_navigation();
        let resultat = resolver::resoudre_noeud(self.store.as_ref(), &noeud).await;
        if jeton != self.jeton {
            return;
        }
        self.chargement = false;
        match resultat {
            Ok(selection) => {
                self.selection = selection;
                self.notice = None;
                self.sync_url(true);
            }
            Err(StoreError::NotFound) => {
                self.notice = Some(NOTICE_INTROUVABLE.to_owned());
            }
            Err(StoreError::Transport(err)) => {
                tracing::warn!(error = format!("{err:#}"), "restore failed");
                self.notice = Some(NOTICE_CHARGEMENT.to_owned());
            }
        }
    }

    /// Moves to the next node in reading order. Only considérants and
    /// articles step; at the end of the run this is a silent no-op.
    pub async fn suivant(&mut self) {
        self.pas(true).await;
    }

    pub async fn precedent(&mut self) {
        self.pas(false).await;
    }

    async fn pas(&mut self, avant: bool) {
        enum Voisin {
            Considerant(Option<crate::model::Considerant>),
            Article(Option<crate::model::Article>),
        }

        let jeton = self.debut_navigation();
        let voisin = match &self.selection {
            Selection::Considerant(c) => {
                let resultat = if avant {
                    self.store.considerant_apres(c.numero).await
                } else {
                    self.store.considerant_avant(c.numero).await
                };
                resultat.map(Voisin::Considerant)
            }
            Selection::Article(a) => {
                let id = a.article.id_article;
                let resultat = if avant {
                    self.store.article_apres(id).await
                } else {
                    self.store.article_avant(id).await
                };
                resultat.map(Voisin::Article)
            }
            _ => {
                self.chargement = false;
                return;
            }
        };

        let resultat = match voisin {
            Ok(Voisin::Considerant(Some(c))) => Ok(Some(Selection::Considerant(c))),
            Ok(Voisin::Article(Some(article))) => {
                resolver::vue(self.store.as_ref(), article)
                    .await
                    .map(|v| Some(Selection::Article(v)))
            }
            Ok(Voisin::Considerant(None)) | Ok(Voisin::Article(None)) => Ok(None),
            Err(err) => Err(err),
        };

        match resultat {
            Ok(Some(selection)) => self.appliquer_resultat(jeton, Ok(selection)),
            Ok(None) => {
                // Already at the boundary.
                if jeton == self.jeton {
                    self.chargement = false;
                }
            }
            Err(err) => self.appliquer_resultat(jeton, Err(err)),
        }
    }

    fn sync_url(&mut self, remplacer: bool) {
        let mut params = self.url.read();
        urlsync::encode(&self.selection, &mut params);
        self.url.write(params, remplacer);
    }

    pub fn basculer_plein_ecran(&mut self) {
        self.plein_ecran = !self.plein_ecran;
    }

    /// Escape always leaves fullscreen and never changes the selection.
    pub fn press_escape(&mut self) {
        self.plein_ecran = false;
    }

    pub fn set_taille_police(&mut self, taille: u32) {
        self.preferences.taille_police = taille;
        self.sauvegarder_preferences();
    }

    pub fn set_police(&mut self, police: FontFamily) {
        self.preferences.police = police;
        self.sauvegarder_preferences();
    }

    pub fn set_alignement(&mut self, alignement: TextAlign) {
        self.preferences.alignement = alignement;
        self.sauvegarder_preferences();
    }

    pub fn set_largeur_sidebar(&mut self, largeur: u32) {
        self.preferences.largeur_sidebar = prefs::clamp_largeur(largeur);
        self.sauvegarder_preferences();
    }

    fn sauvegarder_preferences(&mut self) {
        self.preferences.sauvegarder(self.kv.as_mut());
    }
}

//! In-memory store over a JSON fixture. Used by the CLI for offline runs
//! and by the tests.

use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{
    AnnexeIndex, AnnexeRow, Article, Chapitre, Considerant, Reglement, Section,
};
use crate::store::{DocumentStore, StoreError, StoreResult};

/// One JSON document holding every table, keyed by table name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub reglement: Option<Reglement>,
    #[serde(default)]
    pub considerants: Vec<Considerant>,
    #[serde(default)]
    pub chapitres: Vec<Chapitre>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub liste_annexes: Vec<AnnexeIndex>,
    #[serde(default)]
    pub annexes: Vec<AnnexeRow>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    fixture: Fixture,
}

impl MemoryStore {
    pub fn new(fixture: Fixture) -> Self {
        Self { fixture }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("read fixture {}", path.display()))?;
        let fixture = serde_json::from_str(&body)
            .with_context(|| format!("parse fixture {}", path.display()))?;
        Ok(Self::new(fixture))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn reglement(&self) -> StoreResult<Reglement> {
        self.fixture.reglement.clone().ok_or(StoreError::NotFound)
    }

    async fn considerant(&self, numero: i64) -> StoreResult<Considerant> {
        self.fixture
            .considerants
            .iter()
            .find(|c| c.numero == numero)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn considerant_apres(&self, numero: i64) -> StoreResult<Option<Considerant>> {
        Ok(self
            .fixture
            .considerants
            .iter()
            .filter(|c| c.numero > numero)
            .min_by_key(|c| c.numero)
            .cloned())
    }

    async fn considerant_avant(&self, numero: i64) -> StoreResult<Option<Considerant>> {
        Ok(self
            .fixture
            .considerants
            .iter()
            .filter(|c| c.numero < numero)
            .max_by_key(|c| c.numero)
            .cloned())
    }

    async fn tous_considerants(&self) -> StoreResult<Vec<Considerant>> {
        let mut considerants = self.fixture.considerants.clone();
        considerants.sort_by_key(|c| c.numero);
        Ok(considerants)
    }

    async fn chapitre(&self, id_chapitre: i64) -> StoreResult<Chapitre> {
        self.fixture
            .chapitres
            .iter()
            .find(|c| c.id_chapitre == id_chapitre)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn tous_chapitres(&self) -> StoreResult<Vec<Chapitre>> {
        let mut chapitres = self.fixture.chapitres.clone();
        chapitres.sort_by_key(|c| c.id_chapitre);
        Ok(chapitres)
    }

    async fn section(&self, id_section: i64) -> StoreResult<Section> {
        self.fixture
            .sections
            .iter()
            .find(|s| s.id_section == id_section)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn toutes_sections(&self) -> StoreResult<Vec<Section>> {
        let mut sections = self.fixture.sections.clone();
        sections.sort_by_key(|s| s.id_section);
        Ok(sections)
    }

    async fn article(&self, id_article: i64) -> StoreResult<Article> {
        self.fixture
            .articles
            .iter()
            .find(|a| a.id_article == id_article)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn article_par_numero(&self, numero: &str) -> StoreResult<Article> {
        self.fixture
            .articles
            .iter()
            .find(|a| a.numero == numero)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn article_apres(&self, id_article: i64) -> StoreResult<Option<Article>> {
        Ok(self
            .fixture
            .articles
            .iter()
            .filter(|a| a.id_article > id_article)
            .min_by_key(|a| a.id_article)
            .cloned())
    }

    async fn article_avant(&self, id_article: i64) -> StoreResult<Option<Article>> {
        Ok(self
            .fixture
            .articles
            .iter()
            .filter(|a| a.id_article < id_article)
            .max_by_key(|a| a.id_article)
            .cloned())
    }

    async fn articles_de_section(&self, id_section: i64) -> StoreResult<Vec<Article>> {
        let mut articles: Vec<Article> = self
            .fixture
            .articles
            .iter()
            .filter(|a| a.id_section == Some(id_section))
            .cloned()
            .collect();
        articles.sort_by_key(|a| a.id_article);
        Ok(articles)
    }

    async fn tous_articles(&self) -> StoreResult<Vec<Article>> {
        let mut articles = self.fixture.articles.clone();
        articles.sort_by_key(|a| a.id_article);
        Ok(articles)
    }

    async fn annexe_index(&self, id_annexe: i64) -> StoreResult<AnnexeIndex> {
        self.fixture
            .liste_annexes
            .iter()
            .find(|a| a.id_annexe == id_annexe)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn annexe_contenu(&self, id_annexe: i64) -> StoreResult<Vec<AnnexeRow>> {
        Ok(self
            .fixture
            .annexes
            .iter()
            .filter(|r| r.id_annexe == id_annexe)
            .cloned()
            .collect())
    }

    async fn toutes_annexes(&self) -> StoreResult<Vec<AnnexeIndex>> {
        let mut annexes = self.fixture.liste_annexes.clone();
        annexes.sort_by_key(|a| a.id_annexe);
        Ok(annexes)
    }

    async fn toutes_lignes_annexes(&self) -> StoreResult<Vec<AnnexeRow>> {
        Ok(self.fixture.annexes.clone())
    }
}

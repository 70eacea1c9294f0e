//! Read-only access to the document store.
//!
//! The reader never writes: the trait exposes equality lookups, limit-1
//! range queries for next/previous traversal, and the list queries the
//! sommaire needs.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    AnnexeIndex, AnnexeRow, Article, Chapitre, Considerant, Reglement, Section,
};

pub use memory::{Fixture, MemoryStore};
pub use rest::RestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The query matched no row. Recovered locally with an inline message.
    #[error("row not found")]
    NotFound,
    /// The store call itself failed (network, bad status, malformed body).
    #[error("document store request failed")]
    Transport(#[source] anyhow::Error),
}

impl StoreError {
    pub fn transport(err: impl Into<anyhow::Error>) -> Self {
        StoreError::Transport(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn reglement(&self) -> StoreResult<Reglement>;

    async fn considerant(&self, numero: i64) -> StoreResult<Considerant>;
    /// Smallest numero strictly greater than `numero`, if any.
    async fn considerant_apres(&self, numero: i64) -> StoreResult<Option<Considerant>>;
    /// Largest numero strictly less than `numero`, if any.
    async fn considerant_avant(&self, numero: i64) -> StoreResult<Option<Considerant>>;
    async fn tous_considerants(&self) -> StoreResult<Vec<Considerant>>;

    async fn chapitre(&self, id_chapitre: i64) -> StoreResult<Chapitre>;
    async fn tous_chapitres(&self) -> StoreResult<Vec<Chapitre>>;

    async fn section(&self, id_section: i64) -> StoreResult<Section>;
    async fn toutes_sections(&self) -> StoreResult<Vec<Section>>;

    async fn article(&self, id_article: i64) -> StoreResult<Article>;
    async fn article_par_numero(&self, numero: &str) -> StoreResult<Article>;
    async fn article_apres(&self, id_article: i64) -> StoreResult<Option<Article>>;
    async fn article_avant(&self, id_article: i64) -> StoreResult<Option<Article>>;
    async fn articles_de_section(&self, id_section: i64) -> StoreResult<Vec<Article>>;
    async fn tous_articles(&self) -> StoreResult<Vec<Article>>;

    async fn annexe_index(&self, id_annexe: i64) -> StoreResult<AnnexeIndex>;
    async fn annexe_contenu(&self, id_annexe: i64) -> StoreResult<Vec<AnnexeRow>>;
    async fn toutes_annexes(&self) -> StoreResult<Vec<AnnexeIndex>>;
    async fn toutes_lignes_annexes(&self) -> StoreResult<Vec<AnnexeRow>>;
}

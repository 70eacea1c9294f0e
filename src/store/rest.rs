//! PostgREST-style client for the hosted document store.
//!
//! Every logical operation maps onto `GET {base}/{table}` with the usual
//! `col=eq.N` / `order=` / `limit=` query parameters and a JSON array body.

use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::model::{
    AnnexeIndex, AnnexeRow, Article, Chapitre, Considerant, Reglement, Section,
};
use crate::store::{DocumentStore, StoreError, StoreResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const SELECT_ARTICLE: &str = "id_article,numero,titre,contenu,resume,considerants_associes,\
fiches_associees,texte_associe,id_chapitre,id_section";

#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid store url: {base_url}"))?;
        if base_url.scheme() != "http" && base_url.scheme() != "https" {
            anyhow::bail!("store url scheme must be http/https: {base_url}");
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("build store http client")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.map(|k| k.trim().to_owned()).filter(|k| !k.is_empty()),
        })
    }

    fn table_url(&self, table: &str, params: &[(&str, String)]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(anyhow::anyhow!("store url cannot be a base")))?
            .push(table);
        for (cle, valeur) in params {
            url.query_pairs_mut().append_pair(cle, valeur);
        }
        Ok(url)
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let url = self.table_url(table, params)?;

        let mut req = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key).bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|err| StoreError::transport(anyhow::Error::new(err).context(format!("GET {url}"))))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Transport(anyhow::anyhow!(
                "GET {url} returned {status}"
            )));
        }

        resp.json::<Vec<T>>()
            .await
            .map_err(|err| StoreError::transport(anyhow::Error::new(err).context("decode store response")))
    }

    async fn single<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<T> {
        self.rows(table, params)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn first<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<Option<T>> {
        Ok(self.rows(table, params).await?.into_iter().next())
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn reglement(&self) -> StoreResult<Reglement> {
        self.single(
            "reglement",
            &[
                ("select", "titre,visa".to_owned()),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn considerant(&self, numero: i64) -> StoreResult<Considerant> {
        self.single(
            "considerant",
            &[
                ("select", "numero,contenu".to_owned()),
                ("numero", format!("eq.{numero}")),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn considerant_apres(&self, numero: i64) -> StoreResult<Option<Considerant>> {
        self.first(
            "considerant",
            &[
                ("select", "numero,contenu".to_owned()),
                ("numero", format!("gt.{numero}")),
                ("order", "numero.asc".to_owned()),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn considerant_avant(&self, numero: i64) -> StoreResult<Option<Considerant>> {
        self.first(
            "considerant",
            &[
                ("select", "numero,contenu".to_owned()),
                ("numero", format!("lt.{numero}")),
                ("order", "numero.desc".to_owned()),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn tous_considerants(&self) -> StoreResult<Vec<Considerant>> {
        self.rows(
            "considerant",
            &[
                ("select", "numero,contenu".to_owned()),
                ("order", "numero.asc".to_owned()),
            ],
        )
        .await
    }

    async fn chapitre(&self, id_chapitre: i64) -> StoreResult<Chapitre> {
        self.single(
            "chapitre",
            &[
                ("select", "id_chapitre,titre,contenu".to_owned()),
                ("id_chapitre", format!("eq.{id_chapitre}")),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn tous_chapitres(&self) -> StoreResult<Vec<Chapitre>> {
        self.rows(
            "chapitre",
            &[
                ("select", "id_chapitre,titre,contenu".to_owned()),
                ("order", "id_chapitre.asc".to_owned()),
            ],
        )
        .await
    }

    async fn section(&self, id_section: i64) -> StoreResult<Section> {
        self.single(
            "section",
            &[
                ("select", "id_section,titre,id_chapitre".to_owned()),
                ("id_section", format!("eq.{id_section}")),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn toutes_sections(&self) -> StoreResult<Vec<Section>> {
        self.rows(
            "section",
            &[
                ("select", "id_section,titre,id_chapitre".to_owned()),
                ("order", "id_section.asc".to_owned()),
            ],
        )
        .await
    }

    async fn article(&self, id_article: i64) -> StoreResult<Article> {
        self.single(
            "article",
            &[
                ("select", SELECT_ARTICLE.to_owned()),
                ("id_article", format!("eq.{id_article}")),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn article_par_numero(&self, numero: &str) -> StoreResult<Article> {
        self.single(
            "article",
            &[
                ("select", SELECT_ARTICLE.to_owned()),
                ("numero", format!("eq.{numero}")),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn article_apres(&self, id_article: i64) -> StoreResult<Option<Article>> {
        self.first(
            "article",
            &[
                ("select", SELECT_ARTICLE.to_owned()),
                ("id_article", format!("gt.{id_article}")),
                ("order", "id_article.asc".to_owned()),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn article_avant(&self, id_article: i64) -> StoreResult<Option<Article>> {
        self.first(
            "article",
            &[
                ("select", SELECT_ARTICLE.to_owned()),
                ("id_article", format!("lt.{id_article}")),
                ("order", "id_article.desc".to_owned()),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn articles_de_section(&self, id_section: i64) -> StoreResult<Vec<Article>> {
        self.rows(
            "article",
            &[
                ("select", SELECT_ARTICLE.to_owned()),
                ("id_section", format!("eq.{id_section}")),
                ("order", "id_article.asc".to_owned()),
            ],
        )
        .await
    }

    async fn tous_articles(&self) -> StoreResult<Vec<Article>> {
        self.rows(
            "article",
            &[
                ("select", SELECT_ARTICLE.to_owned()),
                ("order", "id_article.asc".to_owned()),
            ],
        )
        .await
    }

    async fn annexe_index(&self, id_annexe: i64) -> StoreResult<AnnexeIndex> {
        self.single(
            "liste_annexes",
            &[
                ("select", "id_annexe,numero,titre".to_owned()),
                ("id_annexe", format!("eq.{id_annexe}")),
                ("limit", "1".to_owned()),
            ],
        )
        .await
    }

    async fn annexe_contenu(&self, id_annexe: i64) -> StoreResult<Vec<AnnexeRow>> {
        self.rows(
            "annexes",
            &[
                ("select", "id_annexe,titre_section,contenu".to_owned()),
                ("id_annexe", format!("eq.{id_annexe}")),
            ],
        )
        .await
    }

    async fn toutes_annexes(&self) -> StoreResult<Vec<AnnexeIndex>> {
        self.rows(
            "liste_annexes",
            &[
                ("select", "id_annexe,numero,titre".to_owned()),
                ("order", "id_annexe.asc".to_owned()),
            ],
        )
        .await
    }

    async fn toutes_lignes_annexes(&self) -> StoreResult<Vec<AnnexeRow>> {
        self.rows(
            "annexes",
            &[("select", "id_annexe,titre_section,contenu".to_owned())],
        )
        .await
    }
}

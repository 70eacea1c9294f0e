use std::sync::Arc;

use anyhow::Context as _;

use crate::cli::{ConsulterArgs, ServeArgs, SommaireArgs, StoreArgs};
use crate::resolver;
use crate::sommaire;
use crate::store::{DocumentStore, MemoryStore, RestStore, StoreError};
use crate::urlsync::NodeRef;
use crate::app::server;

const ENV_STORE_URL: &str = "RIA_STORE_URL";
const ENV_STORE_KEY: &str = "RIA_STORE_KEY";

pub fn ouvrir_store(args: &StoreArgs) -> anyhow::Result<Arc<dyn DocumentStore>> {
    if let Some(fixture) = &args.fixture {
        let store = MemoryStore::from_json_file(fixture)?;
        return Ok(Arc::new(store));
    }

    let url = match &args.store_url {
        Some(url) => url.clone(),
        None => match std::env::var(ENV_STORE_URL) {
            Ok(url) => url,
            Err(_) => anyhow::bail!(
                "no document store configured; pass --store-url, --fixture or set {ENV_STORE_URL}"
            ),
        },
    };
    let key = args
        .store_key
        .clone()
        .or_else(|| std::env::var(ENV_STORE_KEY).ok());

    Ok(Arc::new(RestStore::new(&url, key)?))
}

fn noeud_de(args: &ConsulterArgs) -> anyhow::Result<NodeRef> {
    let id = || {
        args.id
            .with_context(|| format!("--id is required for type {}", args.kind))
    };
    match args.kind.as_str() {
        "considerant" => Ok(NodeRef::Considerant(id()?)),
        "chapitre" => Ok(NodeRef::Chapitre(id()?)),
        "article" => {
            if let Some(id) = args.id {
                return Ok(NodeRef::Article(id));
            }
            let numero = args
                .numero
                .clone()
                .context("--id or --numero is required for type article")?;
            Ok(NodeRef::ArticleNumero(numero))
        }
        "annexe" => Ok(NodeRef::Annexe(id()?)),
        "section" => Ok(NodeRef::Section(id()?)),
        autre => anyhow::bail!(
            "unknown node type {autre:?}; expected considerant, chapitre, article, annexe or section"
        ),
    }
}

pub async fn consulter(args: &ConsulterArgs) -> anyhow::Result<()> {
    let store = ouvrir_store(&args.store)?;
    let noeud = noeud_de(args)?;
    let selection = match resolver::resoudre_noeud(store.as_ref(), &noeud).await {
        Ok(selection) => selection,
        Err(StoreError::NotFound) => anyhow::bail!("contenu introuvable"),
        Err(err) => return Err(anyhow::Error::new(err)),
    };
    println!("{}", serde_json::to_string_pretty(&selection)?);
    Ok(())
}

pub async fn sommaire(args: &SommaireArgs) -> anyhow::Result<()> {
    let store = ouvrir_store(&args.store)?;
    let arbre = sommaire::construire(store.as_ref())
        .await
        .context("build navigation tree")?;
    println!("{}", serde_json::to_string_pretty(&arbre)?);
    Ok(())
}

pub async fn serve(args: &ServeArgs) -> anyhow::Result<()> {
    let store = ouvrir_store(&args.store)?;
    server::serve(args.addr, store).await
}

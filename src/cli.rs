use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ria-reader", version, about = "Lecteur du règlement IA")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Résout un nœud du document et l'affiche en JSON.
    Consulter(ConsulterArgs),
    /// Affiche l'arbre de navigation complet en JSON.
    Sommaire(SommaireArgs),
    /// Démarre le serveur HTTP de consultation.
    Serve(ServeArgs),
}

/// Store selection shared by every subcommand. Falls back to the
/// RIA_STORE_URL / RIA_STORE_KEY environment variables.
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// URL de base du store de documents (API REST).
    #[arg(long)]
    pub store_url: Option<String>,
    /// Clé d'API du store.
    #[arg(long)]
    pub store_key: Option<String>,
    /// Fichier JSON local servi à la place du store distant.
    #[arg(long)]
    pub fixture: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConsulterArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    /// Type de nœud : considerant, chapitre, article, annexe ou section.
    #[arg(long = "type")]
    pub kind: String,
    /// Clé du nœud (numero pour un considérant, id sinon).
    #[arg(long)]
    pub id: Option<i64>,
    /// Libellé d'article ("Article 6"), accepté à la place de l'id.
    #[arg(long)]
    pub numero: Option<String>,
}

#[derive(Debug, Args)]
pub struct SommaireArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    /// Adresse d'écoute du serveur.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,
}

//! JSON API over the reader: the same deep-link query contract the session
//! uses, served over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::model::Selection;
use crate::resolver;
use crate::sommaire;
use crate::store::{DocumentStore, StoreError};
use crate::urlsync::{self, Decodage, QueryParams};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
}

pub fn router(store: Arc<dyn DocumentStore>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/reglement", get(reglement))
        .route("/api/sommaire", get(sommaire_handler))
        .route("/api/consulter", get(consulter))
        .route("/api/consulter/suivant", get(suivant))
        .route("/api/consulter/precedent", get(precedent))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

pub async fn serve(addr: SocketAddr, store: Arc<dyn DocumentStore>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, router(store))
        .await
        .context("serve http")?;
    Ok(())
}

async fn healthz() -> &'static str {
    "ok\n"
}

async fn reglement(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let reglement = state.store.reglement().await?;
    Ok(Json(json!(reglement)))
}

async fn sommaire_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let arbre = sommaire::construire(state.store.as_ref()).await?;
    Ok(Json(json!(arbre)))
}

/// Without node parameters the default view is returned; with them the node
/// is resolved exactly as a deep link would be. A recognized type with a
/// malformed key is a not-found node.
async fn consulter(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let noeud = match urlsync::decode(&params) {
        Decodage::Aucun => {
            let reglement = state.store.reglement().await?;
            return Ok(Json(json!({ "type": "aucune", "reglement": reglement })));
        }
        Decodage::Introuvable => return Err(StoreError::NotFound.into()),
        Decodage::Noeud(noeud) => noeud,
    };
    let selection = resolver::resoudre_noeud(state.store.as_ref(), &noeud).await?;
    Ok(Json(json!(selection)))
}

async fn suivant(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    pas(state, params, true).await
}

async fn precedent(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    pas(state, params, false).await
}

async fn pas(
    state: AppState,
    params: QueryParams,
    avant: bool,
) -> Result<Json<serde_json::Value>, ApiError> {
    let noeud = match urlsync::decode(&params) {
        Decodage::Aucun => {
            return Err(ApiError::BadRequest(
                "missing node parameters".to_owned(),
            ));
        }
        Decodage::Introuvable => return Err(StoreError::NotFound.into()),
        Decodage::Noeud(noeud) => noeud,
    };
    let courant = resolver::resoudre_noeud(state.store.as_ref(), &noeud).await?;

    let suivant = match &courant {
        Selection::Considerant(c) => {
            let voisin = if avant {
                state.store.considerant_apres(c.numero).await?
            } else {
                state.store.considerant_avant(c.numero).await?
            };
            voisin.map(Selection::Considerant)
        }
        Selection::Article(a) => {
            let voisin = if avant {
                state.store.article_apres(a.article.id_article).await?
            } else {
                state.store.article_avant(a.article.id_article).await?
            };
            match voisin {
                Some(article) => Some(Selection::Article(
                    resolver::vue(state.store.as_ref(), article).await?,
                )),
                None => None,
            }
        }
        _ => {
            return Err(ApiError::BadRequest(
                "sequential navigation only applies to considerants and articles".to_owned(),
            ));
        }
    };

    // At the boundary the current node is returned unchanged.
    Ok(Json(json!(suivant.unwrap_or(courant))))
}

enum ApiError {
    BadRequest(String),
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "contenu introuvable".to_owned())
            }
            ApiError::Store(StoreError::Transport(err)) => {
                tracing::warn!(error = format!("{err:#}"), "store request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "document store unavailable".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Considerant, Reglement};
    use crate::store::{Fixture, MemoryStore};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt as _;

    fn app() -> Router {
        let store = MemoryStore::new(Fixture {
            reglement: Some(Reglement {
                titre: "Règlement (UE) 2024/1689".to_owned(),
                visa: "vu le traité".to_owned(),
            }),
            considerants: vec![
                Considerant {
                    numero: 1,
                    contenu: "un".to_owned(),
                },
                Considerant {
                    numero: 2,
                    contenu: "deux".to_owned(),
                },
            ],
            ..Fixture::default()
        });
        router(Arc::new(store))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn consulter_sans_parametres_rend_le_reglement() {
        let (status, body) = get_json(app(), "/api/consulter").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "aucune");
        assert_eq!(body["reglement"]["titre"], "Règlement (UE) 2024/1689");
    }

    #[tokio::test]
    async fn consulter_resout_un_noeud() {
        let (status, body) = get_json(app(), "/api/consulter?type=considerant&id=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "considerant");
        assert_eq!(body["numero"], 2);
    }

    #[tokio::test]
    async fn consulter_introuvable_en_404() {
        let (status, body) = get_json(app(), "/api/consulter?type=considerant&id=99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "contenu introuvable");
    }

    #[tokio::test]
    async fn consulter_id_malforme_en_404() {
        let (status, _) = get_json(app(), "/api/consulter?type=considerant&id=abc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // An unknown type stays the default view.
        let (status, body) = get_json(app(), "/api/consulter?type=piece&id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "aucune");
    }

    #[tokio::test]
    async fn suivant_au_bout_rend_le_noeud_courant() {
        let (status, body) =
            get_json(app(), "/api/consulter/suivant?type=considerant&id=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["numero"], 2);

        let (_, body) = get_json(app(), "/api/consulter/suivant?type=considerant&id=1").await;
        assert_eq!(body["numero"], 2);
    }

    #[tokio::test]
    async fn suivant_sans_noeud_en_400() {
        let (status, _) = get_json(app(), "/api/consulter/suivant").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

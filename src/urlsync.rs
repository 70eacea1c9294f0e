//! Bidirectional mapping between the displayed node and the
//! `?type=<kind>&id=<key>` deep-link query parameters.

use crate::model::Selection;

/// Decoded query string, order preserved. Unrelated parameters pass through
/// encoding untouched.
pub type QueryParams = Vec<(String, String)>;

/// A node addressed by the deep-link contract, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Considerant(i64),
    Chapitre(i64),
    Article(i64),
    ArticleNumero(String),
    Annexe(i64),
    Section(i64),
}

/// Outcome of reading the deep-link parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decodage {
    /// No node addressed: the `type` parameter is absent or unknown.
    Aucun,
    /// A recognized `type` whose key is missing or unparseable. Treated as
    /// a not-found node, never an error thrown past this boundary.
    Introuvable,
    Noeud(NodeRef),
}

/// Reads a node reference out of the query parameters.
pub fn decode(params: &QueryParams) -> Decodage {
    let valeur = |cle: &str| {
        params
            .iter()
            .find(|(k, _)| k == cle)
            .map(|(_, v)| v.as_str())
    };
    let id = || valeur("id").and_then(|v| v.parse::<i64>().ok());

    let Some(kind) = valeur("type") else {
        return Decodage::Aucun;
    };
    let noeud = match kind {
        "considerant" => id().map(NodeRef::Considerant),
        "chapitre" => id().map(NodeRef::Chapitre),
        "article" => match id() {
            Some(id) => Some(NodeRef::Article(id)),
            None => valeur("numero").map(|n| NodeRef::ArticleNumero(n.to_owned())),
        },
        "annexe" => id().map(NodeRef::Annexe),
        "section" => id().map(NodeRef::Section),
        _ => return Decodage::Aucun,
    };
    match noeud {
        Some(noeud) => Decodage::Noeud(noeud),
        None => Decodage::Introuvable,
    }
}

/// Rewrites the node parameters in place to reflect `selection`, leaving
/// every other parameter as it was. `Aucune` clears them.
pub fn encode(selection: &Selection, params: &mut QueryParams) {
    params.retain(|(k, _)| k != "type" && k != "id" && k != "numero");
    if let Some((kind, id)) = selection.node_ref() {
        params.push(("type".to_owned(), kind.to_owned()));
        params.push(("id".to_owned(), id.to_string()));
    }
}

/// Where the query parameters live. The app server reads them from the
/// request; the session owns a history-like stack.
pub trait UrlState: Send {
    fn read(&self) -> QueryParams;
    /// Pushes a new history entry, or replaces the current one.
    fn write(&mut self, params: QueryParams, replace_current_entry: bool);
}

/// History stack backing for tests and the CLI session.
#[derive(Debug, Default)]
pub struct MemoryUrlState {
    entries: Vec<QueryParams>,
}

impl MemoryUrlState {
    pub fn new(initial: QueryParams) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UrlState for MemoryUrlState {
    fn read(&self) -> QueryParams {
        self.entries.last().cloned().unwrap_or_default()
    }

    fn write(&mut self, params: QueryParams, replace_current_entry: bool) {
        if replace_current_entry && !self.entries.is_empty() {
            *self.entries.last_mut().unwrap() = params;
        } else {
            self.entries.push(params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Considerant, Selection};

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn decode_article_by_id() {
        let p = params(&[("type", "article"), ("id", "42")]);
        assert_eq!(decode(&p), Decodage::Noeud(NodeRef::Article(42)));
    }

    #[test]
    fn decode_article_by_numero_when_id_missing() {
        let p = params(&[("type", "article"), ("numero", "Article 6")]);
        assert_eq!(
            decode(&p),
            Decodage::Noeud(NodeRef::ArticleNumero("Article 6".to_owned()))
        );
    }

    #[test]
    fn decode_without_node_params_is_aucun() {
        assert_eq!(decode(&params(&[("type", "piece"), ("id", "1")])), Decodage::Aucun);
        assert_eq!(decode(&params(&[("id", "3")])), Decodage::Aucun);
        assert_eq!(decode(&params(&[])), Decodage::Aucun);
    }

    #[test]
    fn decode_known_type_with_bad_key_is_introuvable() {
        assert_eq!(
            decode(&params(&[("type", "annexe"), ("id", "abc")])),
            Decodage::Introuvable
        );
        assert_eq!(
            decode(&params(&[("type", "considerant")])),
            Decodage::Introuvable
        );
        assert_eq!(
            decode(&params(&[("type", "article"), ("id", "abc")])),
            Decodage::Introuvable
        );
    }

    #[test]
    fn encode_preserves_unrelated_params() {
        let sel = Selection::Considerant(Considerant {
            numero: 9,
            contenu: String::new(),
        });
        let mut p = params(&[("lang", "fr"), ("type", "article"), ("id", "1")]);
        encode(&sel, &mut p);
        assert_eq!(
            p,
            params(&[("lang", "fr"), ("type", "considerant"), ("id", "9")])
        );
    }

    #[test]
    fn encode_aucune_clears_node_params() {
        let mut p = params(&[("type", "article"), ("id", "1"), ("lang", "fr")]);
        encode(&Selection::Aucune, &mut p);
        assert_eq!(p, params(&[("lang", "fr")]));
    }

    #[test]
    fn memory_url_state_pushes_and_replaces() {
        let mut url = MemoryUrlState::new(params(&[]));
        url.write(params(&[("type", "article"), ("id", "1")]), false);
        assert_eq!(url.len(), 2);
        url.write(params(&[("type", "article"), ("id", "2")]), true);
        assert_eq!(url.len(), 2);
        assert_eq!(decode(&url.read()), Decodage::Noeud(NodeRef::Article(2)));
    }
}

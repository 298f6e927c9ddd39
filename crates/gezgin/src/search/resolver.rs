//! Hybrid place-name resolution: exact substring matching over the
//! gazetteer, backed by nearest-neighbor search over place descriptions.

use std::sync::Arc;

use crate::external::VectorSearch;
use crate::gazetteer::Gazetteer;

/// Descriptive documents read "<name> is <description>"; everything before
/// the first separator is the place name.
const NAME_SEPARATOR: &str = " is ";

/// Resolution of one prompt. `exact` and `fuzzy` are disjoint and each free
/// of duplicates; `exact` follows gazetteer order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub exact: Vec<String>,
    pub fuzzy: Vec<String>,
}

pub struct LocationResolver {
    gazetteer: Arc<Gazetteer>,
    vector: Arc<dyn VectorSearch>,
    top_k: usize,
}

impl LocationResolver {
    pub fn new(gazetteer: Arc<Gazetteer>, vector: Arc<dyn VectorSearch>, top_k: usize) -> Self {
        Self {
            gazetteer,
            vector,
            top_k,
        }
    }

    /// Resolve place names mentioned in a prompt.
    ///
    /// The exact pass is authoritative: normalized substring containment per
    /// gazetteer entry, in gazetteer order. The fuzzy pass queries the
    /// vector index with the raw prompt and keeps known names not already
    /// matched exactly. A failing fuzzy pass degrades to "no fuzzy matches".
    pub async fn resolve(&self, prompt: &str) -> Resolution {
        let exact = self.gazetteer.names_contained_in(prompt);

        let mut fuzzy = Vec::new();
        match self.vector.query(prompt, self.top_k).await {
            Ok(documents) => {
                for document in documents {
                    let Some(name) = leading_place_name(&document) else {
                        continue;
                    };
                    if self.gazetteer.contains(name)
                        && !exact.iter().any(|n| n == name)
                        && !fuzzy.iter().any(|n| n == name)
                    {
                        fuzzy.push(name.to_string());
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Vector search failed ({}), continuing with exact matches only", e);
            }
        }

        tracing::debug!(?exact, ?fuzzy, "resolved locations for prompt");
        Resolution { exact, fuzzy }
    }
}

fn leading_place_name(document: &str) -> Option<&str> {
    let head = document.split(NAME_SEPARATOR).next()?.trim();
    if head.is_empty() {
        None
    } else {
        Some(head)
    }
}

//! Optional language-model relevance filter.
//!
//! The top-ranked candidates are shown to a classifier that answers with the
//! indices of the listings that really are the searched product (not parts,
//! accessories or merely related items). Any failure keeps the ranked list
//! untouched. An explicit empty answer is honored and reported as a warning.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use pricescout_core::SourceWarning;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RelevanceError;
use crate::scorer::ScoredListing;

/// Anthropic Messages API base; requests go to `{base}v1/messages`.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/";

const API_VERSION: &str = "2023-06-01";

/// The answer is a short index array.
const MAX_TOKENS: u32 = 256;

/// Warning label for an honored empty answer.
pub const RELEVANCE_WARNING_SOURCE: &str = "relevance";

static INDEX_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\d,\s]*\]").expect("valid regex"));

/// A text-completion backend.
#[async_trait]
pub trait Llm: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, RelevanceError>;
}

/// Anthropic Messages API client.
#[derive(Debug)]
pub struct Anthropic {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl Anthropic {
    /// # Errors
    ///
    /// Returns [`RelevanceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, RelevanceError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Same as [`Anthropic::new`] against a different host. Used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`RelevanceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, RelevanceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct Response {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Llm for Anthropic {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str) -> Result<String, RelevanceError> {
        let request = Request {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelevanceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let parsed: Response = serde_json::from_slice(&body).map_err(RelevanceError::Deserialize)?;
        Ok(parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

impl Anthropic {
    fn classify(&self, err: reqwest::Error) -> RelevanceError {
        if err.is_timeout() {
            RelevanceError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            RelevanceError::Http(err)
        }
    }
}

/// Classification prompt, in the marketplaces' language.
#[must_use]
pub fn build_prompt(query: &str, candidates: &[ScoredListing]) -> String {
    let mut list = String::new();
    for (i, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(
            list,
            "{i}: {} — R${}",
            candidate.listing.title(),
            candidate.listing.price()
        );
    }
    format!(
        "Busca do usuário: \"{query}\"\n\n\
         Produtos encontrados:\n{list}\n\
         Indique pelos índices quais produtos SÃO de fato o item buscado. \
         Exclua peças, acessórios, refis, tampas, capas, adaptadores, kits de reparo \
         e qualquer item apenas relacionado à busca. \
         Responda SOMENTE com um array JSON de índices, sem nenhum outro texto. \
         Exemplo: [0, 2, 4]"
    )
}

/// Pulls the first index array out of `reply`.
///
/// Out-of-range indices are discarded and duplicates keep their first
/// occurrence. An empty array is a valid answer.
///
/// # Errors
///
/// Returns [`RelevanceError::NoArray`] if no array is present,
/// [`RelevanceError::InvalidArray`] if it is not valid JSON, and
/// [`RelevanceError::NoValidIndices`] if a non-empty array names no
/// candidate.
pub fn extract_indices(reply: &str, candidates: usize) -> Result<Vec<usize>, RelevanceError> {
    let Some(found) = INDEX_ARRAY_RE.find(reply) else {
        return Err(RelevanceError::NoArray {
            excerpt: reply.chars().take(120).collect(),
        });
    };
    let raw: Vec<u64> = serde_json::from_str(found.as_str()).map_err(RelevanceError::InvalidArray)?;

    let mut seen = HashSet::new();
    let indices: Vec<usize> = raw
        .iter()
        .filter_map(|&i| usize::try_from(i).ok())
        .filter(|&i| i < candidates && seen.insert(i))
        .collect();

    if indices.is_empty() && !raw.is_empty() {
        return Err(RelevanceError::NoValidIndices);
    }
    Ok(indices)
}

/// What the filter kept, and the warning to report if it kept nothing.
#[derive(Debug)]
pub struct RelevanceVerdict {
    pub kept: Vec<ScoredListing>,
    pub warning: Option<SourceWarning>,
}

/// Fail-open wrapper around an optional [`Llm`].
#[derive(Clone, Default)]
pub struct RelevanceFilter {
    llm: Option<Arc<dyn Llm>>,
}

impl RelevanceFilter {
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm: Some(llm) }
    }

    /// A filter that passes everything through.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    /// Keeps the candidates the classifier names, in their ranked order.
    pub async fn apply(&self, query: &str, ranked: Vec<ScoredListing>) -> RelevanceVerdict {
        let Some(llm) = &self.llm else {
            tracing::debug!("relevance filter not configured; keeping ranked list");
            return RelevanceVerdict {
                kept: ranked,
                warning: None,
            };
        };
        if ranked.is_empty() {
            return RelevanceVerdict {
                kept: ranked,
                warning: None,
            };
        }

        let prompt = build_prompt(query, &ranked);
        let indices = match llm.complete(&prompt).await {
            Ok(reply) => extract_indices(&reply, ranked.len()),
            Err(e) => Err(e),
        };
        let indices = match indices {
            Ok(indices) => indices,
            Err(e) => {
                tracing::warn!(
                    backend = llm.name(),
                    error = %e,
                    "relevance filter failed; keeping ranked list"
                );
                return RelevanceVerdict {
                    kept: ranked,
                    warning: None,
                };
            }
        };

        if indices.is_empty() {
            tracing::info!(
                backend = llm.name(),
                candidates = ranked.len(),
                "relevance filter rejected every candidate"
            );
            return RelevanceVerdict {
                kept: Vec::new(),
                warning: Some(SourceWarning::new(
                    RELEVANCE_WARNING_SOURCE,
                    format!(
                        "all {} candidates were classified as accessories, parts or unrelated items",
                        ranked.len()
                    ),
                )),
            };
        }

        let keep: HashSet<usize> = indices.into_iter().collect();
        let before = ranked.len();
        let kept: Vec<ScoredListing> = ranked
            .into_iter()
            .enumerate()
            .filter_map(|(i, s)| keep.contains(&i).then_some(s))
            .collect();
        tracing::debug!(
            backend = llm.name(),
            before,
            after = kept.len(),
            "relevance filter applied"
        );
        RelevanceVerdict {
            kept,
            warning: None,
        }
    }
}

#[cfg(test)]
#[path = "relevance_test.rs"]
mod tests;

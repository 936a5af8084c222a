//! Search command implementation
//!
//! embed query → similarity lookup → prompt template → single LLM call

use crate::config::Config;
use crate::embed::{create_embedder, Embedder};
use crate::error::{Error, Result};
use crate::llm::{create_chat_model, ChatModel};
use crate::store::{QdrantStore, SearchResult, VectorStore};
use serde_json::Value;
use tracing::{debug, error, warn};

/// Returned for an empty question
pub const EMPTY_QUERY_MESSAGE: &str = "Por favor, forneça uma pergunta.";

/// Returned when any step of the pipeline fails
pub const SEARCH_ERROR_MESSAGE: &str = "Desculpe, ocorreu um erro ao processar sua pergunta.";

/// Instruction template; `{contexto}` and `{pergunta}` are substituted
pub const PROMPT_TEMPLATE: &str = r#"
CONTEXTO:
{contexto}

REGRAS:
- Responda somente com base no CONTEXTO.
- Se a informação não estiver explicitamente no CONTEXTO, responda:
  "Não tenho informações necessárias para responder sua pergunta."
- Nunca invente ou use conhecimento externo.
- Nunca produza opiniões ou interpretações além do que está escrito.

EXEMPLOS DE PERGUNTAS FORA DO CONTEXTO:
Pergunta: "Qual é a capital da França?"
Resposta: "Não tenho informações necessárias para responder sua pergunta."

Pergunta: "Quantos clientes temos em 2024?"
Resposta: "Não tenho informações necessárias para responder sua pergunta."

Pergunta: "Você acha isso bom ou ruim?"
Resposta: "Não tenho informações necessárias para responder sua pergunta."

PERGUNTA DO USUÁRIO:
{pergunta}

RESPONDA A "PERGUNTA DO USUÁRIO"
"#;

/// Join the stripped text of each result, one per line
pub fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.page_content.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill the instruction template in a single pass, so placeholder-like text
/// inside the context is never substituted again
pub fn render_prompt(context: &str, question: &str) -> String {
    let mut rendered = String::with_capacity(PROMPT_TEMPLATE.len() + context.len() + question.len());
    let mut rest = PROMPT_TEMPLATE;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{contexto}") {
            rendered.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{pergunta}") {
            rendered.push_str(question);
            rest = after;
        } else {
            rendered.push('{');
            rest = &tail[1..];
        }
    }
    rendered.push_str(rest);

    rendered
}

struct Pipeline {
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
    llm: Box<dyn ChatModel>,
}

impl Pipeline {
    fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            embedder: create_embedder(&config.google)?,
            store: Box::new(QdrantStore::connect(config)?),
            llm: create_chat_model(&config.google)?,
        })
    }
}

/// The retrieval-augmented answering pipeline.
///
/// A pipeline that could not be built still answers: every question then
/// fails with the setup error.
pub struct Searcher {
    pipeline: std::result::Result<Pipeline, String>,
    k: usize,
}

impl Searcher {
    pub fn new(
        embedder: Box<dyn Embedder>,
        store: Box<dyn VectorStore>,
        llm: Box<dyn ChatModel>,
        k: usize,
    ) -> Self {
        Self {
            pipeline: Ok(Pipeline {
                embedder,
                store,
                llm,
            }),
            k,
        }
    }

    /// A searcher whose every question fails with `error`
    pub fn unavailable(error: Error, k: usize) -> Self {
        Self {
            pipeline: Err(error.to_string()),
            k,
        }
    }

    /// Build the pipeline against the configured Google models and Qdrant.
    ///
    /// Setup failures (missing API key, bad database URL) surface per
    /// question through [`Searcher::search_prompt`].
    pub fn from_config(config: &Config) -> Self {
        match Pipeline::from_config(config) {
            Ok(pipeline) => Self {
                pipeline: Ok(pipeline),
                k: config.search.k,
            },
            Err(e) => {
                warn!("Search pipeline unavailable: {}", e);
                Self::unavailable(e, config.search.k)
            }
        }
    }

    fn pipeline(&self) -> Result<&Pipeline> {
        self.pipeline
            .as_ref()
            .map_err(|message| Error::Other(message.clone()))
    }

    /// Answer a question; never fails.
    ///
    /// Empty input gets [`EMPTY_QUERY_MESSAGE`] and errors are reported
    /// on stderr and replaced by [`SEARCH_ERROR_MESSAGE`].
    pub async fn search_prompt(&self, query: &str) -> String {
        if query.is_empty() {
            return EMPTY_QUERY_MESSAGE.to_string();
        }

        match self.try_search(query).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Search failed: {}", e);
                eprintln!("Ocorreu um erro durante a busca: {}", e);
                SEARCH_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// The fallible pipeline behind [`Searcher::search_prompt`]
    pub async fn try_search(&self, query: &str) -> Result<String> {
        debug!("Answering question ({} chars)", query.len());

        let llm = &self.pipeline()?.llm;
        let results = self.retrieve(query).await?;
        let context = format_context(&results);
        let prompt = render_prompt(&context, query);

        let answer = llm.complete(&prompt).await?;
        debug!("{} answered with {} chars", llm.model_name(), answer.len());
        Ok(answer)
    }

    /// Top-k chunks most similar to the question
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let pipeline = self.pipeline()?;
        let query_vector = pipeline.embedder.embed_query(query).await?;
        let results = pipeline.store.search(query_vector, self.k).await?;
        debug!(
            "Retrieved {} chunks from '{}'",
            results.len(),
            pipeline.store.collection_name()
        );
        Ok(results)
    }
}

/// Print retrieved context to console
pub fn print_context(results: &[SearchResult]) {
    println!("Contexto recuperado ({} trechos):\n", results.len());

    for (i, r) in results.iter().enumerate() {
        let page = r
            .chunk
            .metadata
            .get("page_label")
            .and_then(Value::as_str)
            .unwrap_or("?");
        println!("{}. [score: {:.3}] página {}", i + 1, r.score, page);

        let text = r.chunk.page_content.trim();
        let preview: String = text.chars().take(200).collect();
        if preview.len() < text.len() {
            println!("   {}...\n", preview.replace('\n', " "));
        } else {
            println!("   {}\n", preview.replace('\n', " "));
        }
    }
}

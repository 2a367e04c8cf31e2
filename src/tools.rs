//! The gazette tool façade.
//!
//! [`GazetteTools`] implements the three operations the LLM loop calls:
//!
//! | Tool | Method |
//! |------|--------|
//! | `listarDiariosRecentes` | [`GazetteTools::list_recent`] |
//! | `lerDiarioOficial` | [`GazetteTools::read_gazette`] |
//! | `buscarPublicacao` | [`GazetteTools::search_publication`] |
//!
//! Every method returns a [`ToolOutput`] and never an error: the consuming
//! loop has no error channel, so failures become `{ "sucesso": false,
//! "mensagem": "..." }` with a Portuguese message.

use serde::Serialize;

use crate::config::{Config, ToolsConfig};
use crate::directory::GazetteDirectory;
use crate::error::{NetworkError, ToolError};
use crate::extract::extract_pdf_text_blocking;
use crate::models::{Gazette, GazetteFilter, GazetteSummary};
use crate::search::{find_occurrences, SnippetWindow};

/// Kind assumed by `lerDiarioOficial` when none is given.
pub const DEFAULT_KIND: &str = "OFICIAL";

/// Tokens in a `numero` argument that mean "the latest edition".
const MOST_RECENT_TOKENS: &[&str] = &["recente", "atual", "último", "ultimo", "latest"];

// ═══════════════════════════════════════════════════════════════════════
// Result shapes
// ═══════════════════════════════════════════════════════════════════════

/// Result of any tool call. Serializes to the flat JSON envelope.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ToolOutput {
    List(ListResult),
    Read(ReadResult),
    Search(SearchResult),
    Failure(ToolFailure),
}

impl ToolOutput {
    pub fn is_success(&self) -> bool {
        !matches!(self, ToolOutput::Failure(_))
    }

    pub fn message(&self) -> &str {
        match self {
            ToolOutput::List(r) => &r.mensagem,
            ToolOutput::Read(r) => &r.mensagem,
            ToolOutput::Search(r) => r.message(),
            ToolOutput::Failure(r) => &r.mensagem,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "sucesso": false, "mensagem": e.to_string() })
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolFailure {
    pub sucesso: bool,
    pub mensagem: String,
}

impl ToolFailure {
    pub fn new(mensagem: impl Into<String>) -> Self {
        Self {
            sucesso: false,
            mensagem: mensagem.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListResult {
    pub sucesso: bool,
    pub quantidade: usize,
    pub diarios: Vec<Gazette>,
    pub mensagem: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReadResult {
    pub sucesso: bool,
    pub diario: GazetteSummary,
    pub conteudo: String,
    #[serde(rename = "conteudoCompleto")]
    pub conteudo_completo: bool,
    /// Length of the full extracted text, in characters.
    #[serde(rename = "tamanhoTotal")]
    pub tamanho_total: usize,
    pub mensagem: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SearchResult {
    /// Keyword search across all editions found matches.
    Global {
        sucesso: bool,
        termo: String,
        quantidade: usize,
        diarios: Vec<Gazette>,
        mensagem: String,
    },
    /// Keyword search across all editions found nothing.
    NoGlobalMatches {
        sucesso: bool,
        mensagem: String,
        ocorrencias: usize,
        diarios: Vec<Gazette>,
    },
    /// Matches inside one edition.
    InGazette {
        sucesso: bool,
        diario: GazetteSummary,
        termo: String,
        ocorrencias: usize,
        trechos: Vec<String>,
        mensagem: String,
    },
    NoMatchesInGazette {
        sucesso: bool,
        mensagem: String,
        ocorrencias: usize,
    },
}

impl SearchResult {
    pub fn message(&self) -> &str {
        match self {
            SearchResult::Global { mensagem, .. }
            | SearchResult::NoGlobalMatches { mensagem, .. }
            | SearchResult::InGazette { mensagem, .. }
            | SearchResult::NoMatchesInGazette { mensagem, .. } => mensagem,
        }
    }

    pub fn occurrences(&self) -> usize {
        match self {
            SearchResult::Global { quantidade, .. } => *quantidade,
            SearchResult::InGazette { ocorrencias, .. } => *ocorrencias,
            SearchResult::NoGlobalMatches { .. } | SearchResult::NoMatchesInGazette { .. } => 0,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Façade
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSettings {
    /// Characters of extracted text returned by `lerDiarioOficial`.
    pub read_limit_chars: usize,
    pub window: SnippetWindow,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            read_limit_chars: 15_000,
            window: SnippetWindow::default(),
        }
    }
}

impl From<&ToolsConfig> for ToolSettings {
    fn from(cfg: &ToolsConfig) -> Self {
        Self {
            read_limit_chars: cfg.read_limit_chars,
            window: SnippetWindow::from(cfg),
        }
    }
}

/// Arguments of `buscarPublicacao`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub termo: String,
    /// Edition to search inside. Absent or blank means a global search.
    pub numero: Option<String>,
    /// Kind to prefer when resolving `numero`. Absent takes the first row.
    pub tipo: Option<String>,
    /// Date range for the global search.
    pub de: Option<String>,
    pub ate: Option<String>,
}

impl SearchRequest {
    pub fn new(termo: impl Into<String>) -> Self {
        Self {
            termo: termo.into(),
            ..Self::default()
        }
    }

    pub fn in_gazette(mut self, numero: impl Into<String>) -> Self {
        self.numero = Some(numero.into());
        self
    }
}

pub struct GazetteTools {
    directory: GazetteDirectory,
    settings: ToolSettings,
}

impl GazetteTools {
    pub fn new(directory: GazetteDirectory, settings: ToolSettings) -> Self {
        Self {
            directory,
            settings,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        let directory = GazetteDirectory::from_config(&config.upstream)?;
        Ok(Self::new(directory, ToolSettings::from(&config.tools)))
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// `listarDiariosRecentes`
    pub async fn list_recent(&self) -> ToolOutput {
        tracing::info!("listing recent gazettes");
        match self.try_list_recent().await {
            Ok(result) => ToolOutput::List(result),
            Err(e) => failure("Erro ao listar os diários oficiais", e),
        }
    }

    /// `lerDiarioOficial`
    pub async fn read_gazette(&self, numero: &str, tipo: Option<&str>) -> ToolOutput {
        let tipo = tipo
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_KIND);
        tracing::info!(numero, tipo, "reading gazette");
        match self.try_read_gazette(numero, tipo).await {
            Ok(result) => ToolOutput::Read(result),
            Err(e) => failure("Erro ao ler o diário oficial", e),
        }
    }

    /// `buscarPublicacao`
    pub async fn search_publication(&self, request: &SearchRequest) -> ToolOutput {
        tracing::info!(
            termo = %request.termo,
            numero = request.numero.as_deref().unwrap_or(""),
            "searching publications"
        );
        match self.try_search_publication(request).await {
            Ok(result) => ToolOutput::Search(result),
            Err(e) => failure("Erro ao buscar publicação", e),
        }
    }

    async fn try_list_recent(&self) -> Result<ListResult, ToolError> {
        let diarios = self.directory.list(&GazetteFilter::recent()).await?;
        let mensagem = format!(
            "Encontrei {} diários oficiais:\n\n{}",
            diarios.len(),
            bullet_list(&diarios)
        );
        Ok(ListResult {
            sucesso: true,
            quantidade: diarios.len(),
            diarios,
            mensagem,
        })
    }

    async fn try_read_gazette(&self, numero: &str, tipo: &str) -> Result<ReadResult, ToolError> {
        let numero = numero.trim();
        if numero.is_empty() {
            return Err(ToolError::InvalidArgument(
                "Informe o número do diário oficial (ex: \"8096\") ou \"mais recente\".".into(),
            ));
        }

        let diario = self.resolve(numero, Some(tipo)).await?.ok_or_else(|| {
            ToolError::NotFound(format!(
                "Não encontrei o diário oficial {} {}. Use a ferramenta \"listarDiariosRecentes\" para ver os diários disponíveis.",
                numero, tipo
            ))
        })?;

        let conteudo = self.fetch_text(&diario).await?;
        let limite = self.settings.read_limit_chars;
        let (conteudo_limitado, tamanho_total) = truncate_chars(&conteudo, limite);
        let completo = tamanho_total <= limite;

        let mut mensagem = format!(
            "📄 Diário Oficial {} {} - {}\n\nConteúdo extraído com sucesso ({} caracteres total). ",
            diario.number(),
            diario.kind(),
            diario.published_date(),
            tamanho_total
        );
        if completo {
            mensagem.push_str("Conteúdo completo incluído.");
        } else {
            mensagem.push_str(&format!(
                "Mostrando os primeiros {} caracteres.\n\nDICA: Use a ferramenta \"buscarPublicacao\" com um termo específico (ex: \"organograma\", \"estrutura\") para encontrar seções específicas do diário.",
                limite
            ));
        }

        Ok(ReadResult {
            sucesso: true,
            diario: diario.summary(),
            conteudo: conteudo_limitado,
            conteudo_completo: completo,
            tamanho_total,
            mensagem,
        })
    }

    async fn try_search_publication(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResult, ToolError> {
        let termo = request.termo.trim();
        if termo.is_empty() {
            return Err(ToolError::InvalidArgument(
                "Informe um termo para buscar nos diários oficiais.".into(),
            ));
        }

        match request.numero.as_deref().map(str::trim) {
            Some(numero) if !numero.is_empty() => {
                self.search_in_gazette(termo, numero, request.tipo.as_deref())
                    .await
            }
            _ => {
                self.search_all(termo, request.de.clone(), request.ate.clone())
                    .await
            }
        }
    }

    async fn search_all(
        &self,
        termo: &str,
        de: Option<String>,
        ate: Option<String>,
    ) -> Result<SearchResult, ToolError> {
        let filter = GazetteFilter::by_keyword(termo).between(de, ate);
        let diarios = self.directory.list(&filter).await?;

        if diarios.is_empty() {
            return Ok(SearchResult::NoGlobalMatches {
                sucesso: true,
                mensagem: format!("Não encontrei nenhum diário oficial contendo \"{}\".", termo),
                ocorrencias: 0,
                diarios: Vec::new(),
            });
        }

        let mensagem = format!(
            "Encontrei {} diário(s) oficial(is) contendo \"{}\":\n\n{}\n\nPara ver o conteúdo detalhado, especifique o número do diário que deseja ler.",
            diarios.len(),
            termo,
            bullet_list(&diarios)
        );
        Ok(SearchResult::Global {
            sucesso: true,
            termo: termo.to_string(),
            quantidade: diarios.len(),
            diarios,
            mensagem,
        })
    }

    async fn search_in_gazette(
        &self,
        termo: &str,
        numero: &str,
        tipo: Option<&str>,
    ) -> Result<SearchResult, ToolError> {
        let diario = self
            .resolve(numero, tipo)
            .await?
            .ok_or_else(|| ToolError::NotFound(format!("Diário {} não encontrado.", numero)))?;

        let conteudo = self.fetch_text(&diario).await?;
        let occ = find_occurrences(&conteudo, termo, &self.settings.window);

        if occ.is_empty() {
            return Ok(SearchResult::NoMatchesInGazette {
                sucesso: true,
                mensagem: format!(
                    "Não encontrei nenhuma publicação contendo \"{}\" no {}.",
                    termo,
                    diario.headline()
                ),
                ocorrencias: 0,
            });
        }

        let mut mensagem = format!(
            "Encontrei {} ocorrência(s) de \"{}\" no {}. Use os trechos fornecidos para responder de forma clara e organizada ao usuário.",
            occ.total_count,
            termo,
            diario.headline()
        );
        if occ.is_truncated() {
            mensagem.push_str(&format!(
                " Mostrando as {} primeiras ocorrências.",
                occ.snippets.len()
            ));
        }

        Ok(SearchResult::InGazette {
            sucesso: true,
            diario: diario.summary(),
            termo: termo.to_string(),
            ocorrencias: occ.total_count,
            trechos: occ.snippets,
            mensagem,
        })
    }

    /// Pick the edition for `numero`, preferring rows whose kind contains
    /// `tipo`. "Most recent" synonyms resolve against the default listing.
    async fn resolve(&self, numero: &str, tipo: Option<&str>) -> Result<Option<Gazette>, ToolError> {
        let filter = if is_most_recent(numero) {
            GazetteFilter::recent()
        } else {
            GazetteFilter::by_number(numero)
        };
        let candidates = self.directory.list(&filter).await?;
        Ok(pick_kind(candidates, tipo))
    }

    async fn fetch_text(&self, diario: &Gazette) -> Result<String, ToolError> {
        let bytes = self
            .directory
            .download(diario)
            .await
            .map_err(ToolError::Fetch)?;
        let text = extract_pdf_text_blocking(bytes).await?;
        tracing::debug!(
            numero = diario.number(),
            chars = text.chars().count(),
            "gazette text extracted"
        );
        Ok(text)
    }
}

/// Log the full error chain; the envelope only carries the short message.
fn failure(context: &str, err: ToolError) -> ToolOutput {
    let detail = std::error::Error::source(&err)
        .map(|e| e.to_string())
        .unwrap_or_default();
    tracing::warn!(error = %err, %detail, "{}", context);
    ToolOutput::Failure(ToolFailure::new(err.to_string()))
}

fn is_most_recent(numero: &str) -> bool {
    let lower = numero.to_lowercase();
    MOST_RECENT_TOKENS.iter().any(|t| lower.contains(t))
}

fn pick_kind(candidates: Vec<Gazette>, tipo: Option<&str>) -> Option<Gazette> {
    let preferred = tipo.map(str::to_lowercase).and_then(|wanted| {
        candidates
            .iter()
            .position(|g| g.kind().to_lowercase().contains(&wanted))
    });
    let index = preferred.unwrap_or(0);
    candidates.into_iter().nth(index)
}

fn bullet_list(diarios: &[Gazette]) -> String {
    diarios
        .iter()
        .map(|d| format!("📄 {}", d.headline()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `limit` characters and the full character count.
fn truncate_chars(text: &str, limit: usize) -> (String, usize) {
    let total = text.chars().count();
    if total <= limit {
        return (text.to_string(), total);
    }
    (text.chars().take(limit).collect(), total)
}

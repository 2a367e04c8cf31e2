//! Gazette data types.
//!
//! [`GazetteRow`] is what the listing endpoint returns; [`Gazette`] is the
//! descriptor every other layer works with. Descriptors are built fresh for
//! each query and are immutable: the display date and the download URL are
//! derived once, in [`Gazette::from_row`], from the row's `dia` and
//! `codigodia`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::directory::download_url;

/// Raw row from `admin-ajax.php?action=edicoes_json`.
///
/// The upstream is inconsistent about strings vs numbers for `numero` and
/// `codigodia`, so every field is normalised to a string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GazetteRow {
    #[serde(default, deserialize_with = "string_or_number")]
    pub numero: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub dia: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub arquivo: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub desctpd: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub codigodia: String,
}

/// Listing response envelope: `{ "data": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingResponse {
    pub data: Vec<GazetteRow>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// One published edition.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Gazette {
    numero: String,
    tipo: String,
    data: String,
    #[serde(rename = "dataISO")]
    data_iso: String,
    arquivo: String,
    codigo: String,
    #[serde(rename = "downloadUrl")]
    download_url: String,
}

impl Gazette {
    /// Build a descriptor, deriving the display date and download URL.
    pub fn from_row(base_url: &str, row: GazetteRow) -> Self {
        let data = display_date(&row.dia);
        let download_url = download_url(base_url, &row.codigodia);
        Self {
            numero: row.numero,
            tipo: row.desctpd,
            data,
            data_iso: row.dia,
            arquivo: row.arquivo,
            codigo: row.codigodia,
            download_url,
        }
    }

    pub fn number(&self) -> &str {
        &self.numero
    }

    pub fn kind(&self) -> &str {
        &self.tipo
    }

    /// `DD/MM/YYYY`, or the raw upstream value when it is not `Y-M-D`.
    pub fn published_date(&self) -> &str {
        &self.data
    }

    pub fn published_date_iso(&self) -> &str {
        &self.data_iso
    }

    pub fn file_label(&self) -> &str {
        &self.arquivo
    }

    pub fn internal_code(&self) -> &str {
        &self.codigo
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// Parsed publication date. Use this, never the display string, to order.
    pub fn published_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.data_iso, "%Y-%m-%d").ok()
    }

    /// `Diário 8096 OFICIAL - 02/01/2025`
    pub fn headline(&self) -> String {
        format!("Diário {} {} - {}", self.numero, self.tipo, self.data)
    }

    pub fn summary(&self) -> GazetteSummary {
        GazetteSummary {
            numero: self.numero.clone(),
            tipo: self.tipo.clone(),
            data: self.data.clone(),
            link: self.download_url.clone(),
        }
    }
}

/// `YYYY-MM-DD` → `DD/MM/YYYY`.
///
/// The value is split on `-` without further validation; anything that does
/// not split into exactly three parts is returned unchanged.
pub fn display_date(dia: &str) -> String {
    let parts: Vec<&str> = dia.split('-').collect();
    match parts.as_slice() {
        [year, month, day] => format!("{}/{}/{}", day, month, year),
        _ => dia.to_string(),
    }
}

/// Compact descriptor echoed back in read and search results.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GazetteSummary {
    pub numero: String,
    pub tipo: String,
    pub data: String,
    pub link: String,
}

/// Listing query parameters. All empty = the upstream's most recent editions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GazetteFilter {
    pub numero: Option<String>,
    pub palavra: Option<String>,
    pub de: Option<String>,
    pub ate: Option<String>,
}

impl GazetteFilter {
    pub fn recent() -> Self {
        Self::default()
    }

    pub fn by_number(numero: impl Into<String>) -> Self {
        Self {
            numero: Some(numero.into()),
            ..Self::default()
        }
    }

    pub fn by_keyword(palavra: impl Into<String>) -> Self {
        Self {
            palavra: Some(palavra.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, de: Option<String>, ate: Option<String>) -> Self {
        self.de = de;
        self.ate = ate;
        self
    }
}

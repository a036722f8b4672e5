// src/models/listing.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::{error::AppError, validation::FieldErrors};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// Parâmetros reservados; todo o resto da query string vira filtro.
const PAGE_KEY: &str = "pagina";
const LIMIT_KEY: &str = "limite";
const SORT_FIELD_KEYS: [&str; 2] = ["ordenarPor", "campo"];
const SORT_DIR_KEYS: [&str; 2] = ["ordem", "direcao"];
const FORMAT_KEY: &str = "formato";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Aceita os tokens da UI (`ascend`/`descend`) e as formas curtas.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "ascend" | "asc" => Some(SortDirection::Asc),
            "descend" | "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// Página (1-indexada), filtros e ordenação de uma listagem.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub sort: Option<Sort>,
    pub filters: BTreeMap<String, String>,
    pub format: Option<ExportFormat>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: None,
            filters: BTreeMap::new(),
            format: None,
        }
    }
}

impl ListParams {
    /// Monta a partir da query string crua. Valores vazios são descartados;
    /// página e limite inválidos caem nos padrões. Formato desconhecido é erro.
    pub fn from_query(query: HashMap<String, String>) -> Result<Self, AppError> {
        let mut params = ListParams::default();
        let mut sort_field = None;
        let mut sort_dir = None;

        for (key, value) in query {
            let value = value.trim().to_string();
            if value.is_empty() || value == "undefined" || value == "null" {
                continue;
            }
            match key.as_str() {
                PAGE_KEY => {
                    params.page = value.parse::<u32>().ok().filter(|p| *p >= 1).unwrap_or(1);
                }
                LIMIT_KEY => {
                    params.limit = value
                        .parse::<u32>()
                        .ok()
                        .filter(|l| *l >= 1)
                        .map(|l| l.min(MAX_PAGE_SIZE))
                        .unwrap_or(DEFAULT_PAGE_SIZE);
                }
                FORMAT_KEY => match ExportFormat::parse(&value) {
                    Some(format) => params.format = Some(format),
                    None => {
                        let mut errors = FieldErrors::new();
                        errors.add(FORMAT_KEY, "invalid_export_format");
                        return Err(AppError::FieldValidation(errors));
                    }
                },
                k if SORT_FIELD_KEYS.contains(&k) => sort_field = Some(value),
                k if SORT_DIR_KEYS.contains(&k) => sort_dir = SortDirection::parse(&value),
                _ => {
                    params.filters.insert(key, value);
                }
            }
        }

        params.sort = sort_field.map(|field| Sort {
            field,
            direction: sort_dir.unwrap_or(SortDirection::Asc),
        });
        Ok(params)
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(params: &ListParams, total: i64) -> Self {
        let limit = params.limit.max(1) as i64;
        Self {
            page: params.page,
            limit: params.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: ToSchema> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T: ToSchema> Page<T> {
    pub fn new(data: Vec<T>, params: &ListParams, total: i64) -> Self {
        Self {
            data,
            pagination: Pagination::new(params, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_empty() {
        let params = ListParams::from_query(HashMap::new()).unwrap();
        assert_eq!(params, ListParams::default());
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn page_two_of_ten() {
        let params = ListParams::from_query(query(&[("pagina", "2"), ("limite", "10")])).unwrap();
        assert_eq!(params.page, 2);
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset(), 10);
    }

    #[test]
    fn invalid_page_and_limit_fall_back() {
        let params = ListParams::from_query(query(&[("pagina", "0"), ("limite", "abc")])).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, DEFAULT_PAGE_SIZE);

        let params = ListParams::from_query(query(&[("limite", "5000")])).unwrap();
        assert_eq!(params.limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn empty_filters_are_stripped() {
        let params = ListParams::from_query(query(&[
            ("status", "ativo"),
            ("name", ""),
            ("city", "  "),
            ("personType", "undefined"),
        ]))
        .unwrap();
        assert_eq!(params.filters.len(), 1);
        assert_eq!(params.filters.get("status").map(String::as_str), Some("ativo"));
    }

    #[test]
    fn ui_sort_tokens_map_to_sql() {
        let params = ListParams::from_query(query(&[("ordenarPor", "name"), ("ordem", "descend")])).unwrap();
        let sort = params.sort.expect("sort");
        assert_eq!(sort.field, "name");
        assert_eq!(sort.direction.as_sql(), "DESC");

        let params = ListParams::from_query(query(&[("campo", "createdAt"), ("direcao", "ascend")])).unwrap();
        assert_eq!(params.sort.unwrap().direction, SortDirection::Asc);
        assert_eq!(SortDirection::parse("sideways"), None);
    }

    #[test]
    fn export_format_is_not_a_filter() {
        let params = ListParams::from_query(query(&[("formato", "XLSX"), ("status", "inativo")])).unwrap();
        assert_eq!(params.format, Some(ExportFormat::Xlsx));
        assert!(!params.filters.contains_key("formato"));
    }

    #[test]
    fn unknown_export_format_is_rejected() {
        match ListParams::from_query(query(&[("formato", "docx")])) {
            Err(AppError::FieldValidation(errors)) => {
                assert_eq!(errors.codes("formato"), ["invalid_export_format".to_string()]);
            }
            other => panic!("esperava erro em formato, veio {:?}", other),
        }
        // ausente continua valendo: o handler usa CSV
        assert_eq!(ListParams::from_query(HashMap::new()).unwrap().format, None);
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = ListParams { page: 2, limit: 10, ..Default::default() };
        let p = Pagination::new(&params, 21);
        assert_eq!(p.total_pages, 3);
        assert_eq!(Pagination::new(&params, 0).total_pages, 0);
    }
}

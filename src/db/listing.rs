// src/db/listing.rs
//
// Montagem das consultas de listagem (filtros, ordenação, página) com QueryBuilder.
// Só parâmetros e colunas declarados no ListTable chegam ao SQL.

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::common::{error::AppError, validation::FieldErrors};
use crate::models::listing::{ListParams, SortDirection};

// Teto de linhas para exportação
pub const EXPORT_LIMIT: i64 = 10_000;

const DATE_FORMAT: &str = "%Y-%m-%d";

// Parâmetros de busca livre
const SEARCH_KEYS: [&str; 2] = ["busca", "q"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// `coluna ILIKE %valor%`
    Contains,
    /// `lower(coluna::text) = lower(valor)` (enums, uuids, códigos)
    Exact,
    /// `coluna >= data` (AAAA-MM-DD)
    DateFrom,
    /// `coluna < data + 1`
    DateTo,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterColumn {
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FilterKind,
}

pub const fn filter(param: &'static str, column: &'static str, kind: FilterKind) -> FilterColumn {
    FilterColumn { param, column, kind }
}

/// Descrição de uma tabela listável.
#[derive(Debug, Clone, Copy)]
pub struct ListTable {
    pub table: &'static str,
    pub filters: &'static [FilterColumn],
    // (parâmetro da UI, coluna)
    pub sorts: &'static [(&'static str, &'static str)],
    pub search: &'static [&'static str],
    pub default_sort: (&'static str, SortDirection),
}

impl ListTable {
    pub fn select(&self, tenant_id: Uuid, params: &ListParams) -> Result<QueryBuilder<'static, Postgres>, AppError> {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", self.table));
        self.push_where(&mut qb, tenant_id, params)?;
        self.push_order(&mut qb, params);
        qb.push(" LIMIT ").push_bind(params.limit as i64);
        qb.push(" OFFSET ").push_bind(params.offset());
        Ok(qb)
    }

    pub fn count(&self, tenant_id: Uuid, params: &ListParams) -> Result<QueryBuilder<'static, Postgres>, AppError> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.table));
        self.push_where(&mut qb, tenant_id, params)?;
        Ok(qb)
    }

    /// Mesma seleção da listagem, sem paginação. Traz uma linha além do teto
    /// para `within_export_limit` perceber o estouro.
    pub fn export(&self, tenant_id: Uuid, params: &ListParams) -> Result<QueryBuilder<'static, Postgres>, AppError> {
        let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", self.table));
        self.push_where(&mut qb, tenant_id, params)?;
        self.push_order(&mut qb, params);
        qb.push(" LIMIT ").push_bind(EXPORT_LIMIT + 1);
        Ok(qb)
    }

    fn push_where(
        &self,
        qb: &mut QueryBuilder<'static, Postgres>,
        tenant_id: Uuid,
        params: &ListParams,
    ) -> Result<(), AppError> {
        qb.push(" WHERE tenant_id = ").push_bind(tenant_id);
        let mut errors = FieldErrors::new();

        for (key, value) in &params.filters {
            if SEARCH_KEYS.contains(&key.as_str()) {
                self.push_search(qb, value);
                continue;
            }
            // Filtro fora da lista: ignorado
            let Some(f) = self.filters.iter().find(|f| f.param == key) else {
                continue;
            };
            match f.kind {
                FilterKind::Contains => {
                    qb.push(format!(" AND {} ILIKE ", f.column))
                        .push_bind(format!("%{}%", value));
                }
                FilterKind::Exact => {
                    qb.push(format!(" AND lower({}::text) = lower(", f.column))
                        .push_bind(value.clone())
                        .push(")");
                }
                FilterKind::DateFrom | FilterKind::DateTo => {
                    let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) else {
                        errors.add(key.as_str(), "invalid_date");
                        continue;
                    };
                    if f.kind == FilterKind::DateFrom {
                        qb.push(format!(" AND {} >= ", f.column)).push_bind(date);
                    } else {
                        qb.push(format!(" AND {} < ", f.column))
                            .push_bind(date)
                            .push(" + 1");
                    }
                }
            }
        }
        errors.into_result()
    }

    fn push_search(&self, qb: &mut QueryBuilder<'static, Postgres>, term: &str) {
        if self.search.is_empty() {
            return;
        }
        let pattern = format!("%{}%", term);
        qb.push(" AND (");
        for (i, column) in self.search.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{} ILIKE ", column)).push_bind(pattern.clone());
        }
        qb.push(")");
    }

    fn push_order(&self, qb: &mut QueryBuilder<'static, Postgres>, params: &ListParams) {
        let (column, direction) = params
            .sort
            .as_ref()
            .and_then(|s| {
                self.sorts
                    .iter()
                    .find(|(param, _)| *param == s.field)
                    .map(|(_, column)| (*column, s.direction))
            })
            .unwrap_or(self.default_sort);

        // id como desempate para a paginação ficar estável
        qb.push(format!(" ORDER BY {} {}, id ASC", column, direction.as_sql()));
    }
}

/// Recusa a exportação que passou do teto em vez de entregar um arquivo cortado.
pub fn within_export_limit<T>(rows: Vec<T>, limit: i64) -> Result<Vec<T>, AppError> {
    if rows.len() as i64 > limit {
        tracing::warn!("📤 Exportação recusada: mais de {} linhas", limit);
        return Err(AppError::ExportTooLarge(limit));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TABLE: ListTable = ListTable {
        table: "clients",
        filters: &[
            filter("name", "name", FilterKind::Contains),
            filter("status", "status", FilterKind::Exact),
            filter("createdFrom", "created_at", FilterKind::DateFrom),
        ],
        sorts: &[("name", "name"), ("createdAt", "created_at")],
        search: &["name", "document"],
        default_sort: ("created_at", SortDirection::Desc),
    };

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let query: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ListParams::from_query(query).unwrap()
    }

    #[test]
    fn select_is_scoped_paginated_and_sorted() {
        let p = params(&[("pagina", "2"), ("limite", "10"), ("ordenarPor", "name"), ("ordem", "descend")]);
        let qb = TABLE.select(Uuid::nil(), &p).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM clients WHERE tenant_id = $1 ORDER BY name DESC, id ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn unknown_filters_and_sorts_are_ignored() {
        let p = params(&[("password_hash", "x"), ("ordenarPor", "1; DROP TABLE clients")]);
        let qb = TABLE.select(Uuid::nil(), &p).unwrap();
        assert!(!qb.sql().contains("password_hash"));
        assert!(!qb.sql().contains("DROP"));
        assert!(qb.sql().contains("ORDER BY created_at DESC"));
    }

    #[test]
    fn filters_are_bound() {
        let p = params(&[("status", "inativo"), ("name", "silva"), ("createdFrom", "2025-01-01")]);
        let qb = TABLE.count(Uuid::nil(), &p).unwrap();
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT COUNT(*) FROM clients WHERE tenant_id = $1"));
        assert!(sql.contains("lower(status::text) = lower($"));
        assert!(sql.contains("name ILIKE $"));
        assert!(sql.contains("created_at >= $"));
        assert!(!sql.contains("inativo"));
    }

    #[test]
    fn search_spans_columns() {
        let p = params(&[("busca", "123")]);
        let qb = TABLE.count(Uuid::nil(), &p).unwrap();
        assert!(qb.sql().ends_with("AND (name ILIKE $2 OR document ILIKE $3)"));
    }

    #[test]
    fn export_has_no_offset() {
        let qb = TABLE.export(Uuid::nil(), &ListParams::default()).unwrap();
        assert!(!qb.sql().contains("OFFSET"));
        assert!(qb.sql().ends_with("LIMIT $2"));
    }

    #[test]
    fn bad_dates_are_field_errors() {
        let p = params(&[("createdFrom", "01/02/2025"), ("status", "ativo")]);
        match TABLE.count(Uuid::nil(), &p) {
            Err(AppError::FieldValidation(errors)) => {
                assert_eq!(errors.codes("createdFrom"), ["invalid_date".to_string()]);
                assert!(!errors.contains("status"));
            }
            other => panic!("esperava erro em createdFrom, veio {:?}", other.map(|qb| qb.sql().to_string())),
        }

        let p = params(&[("createdFrom", "2025-02-30")]);
        assert!(TABLE.select(Uuid::nil(), &p).is_err());
    }

    #[test]
    fn export_reads_one_row_past_the_cap() {
        let qb = TABLE.export(Uuid::nil(), &ListParams::default()).unwrap();
        assert!(qb.sql().ends_with("LIMIT $2"));
        assert_eq!(within_export_limit(vec![1, 2], 2).unwrap(), vec![1, 2]);
        assert!(matches!(within_export_limit(vec![1, 2, 3], 2), Err(AppError::ExportTooLarge(2))));
    }
}

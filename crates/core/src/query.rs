//! Page requests and responses for the `/api/produtos` surface.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column searched by `/api/produtos/search` (`campo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    Id,
    #[default]
    Description,
    SupplierId,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [SearchField::Id, SearchField::Description, SearchField::SupplierId];

    pub fn as_param(&self) -> &'static str {
        match self {
            SearchField::Id => "id",
            SearchField::Description => "descricao",
            SearchField::SupplierId => "fornecedor_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchField::Id => "Código",
            SearchField::Description => "Nome",
            SearchField::SupplierId => "Fornecedor",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SearchField::Id => SearchField::Description,
            SearchField::Description => SearchField::SupplierId,
            SearchField::SupplierId => SearchField::Id,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "codigo" | "item_id" => Some(SearchField::Id),
            "descricao" | "nome" | "description" => Some(SearchField::Description),
            "fornecedor_id" | "fornecedor" | "supplier" => Some(SearchField::SupplierId),
            _ => None,
        }
    }
}

/// Match mode (`modo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    Exact,
    #[default]
    Contains,
    AtLeast,
    StartsWith,
}

impl SearchMode {
    pub const ALL: [SearchMode; 4] = [
        SearchMode::Exact,
        SearchMode::Contains,
        SearchMode::AtLeast,
        SearchMode::StartsWith,
    ];

    pub fn as_param(&self) -> &'static str {
        match self {
            SearchMode::Exact => "exato",
            SearchMode::Contains => "contém",
            SearchMode::AtLeast => "maior_igual",
            SearchMode::StartsWith => "começa_com",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SearchMode::Exact => SearchMode::Contains,
            SearchMode::Contains => SearchMode::AtLeast,
            SearchMode::AtLeast => SearchMode::StartsWith,
            SearchMode::StartsWith => SearchMode::Exact,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "exato" | "exact" => Some(SearchMode::Exact),
            "contém" | "contem" | "contains" => Some(SearchMode::Contains),
            "maior_igual" | "gte" | "at-least" => Some(SearchMode::AtLeast),
            "começa_com" | "comeca_com" | "starts-with" | "prefix" => Some(SearchMode::StartsWith),
            _ => None,
        }
    }
}

/// What the grid is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogQuery {
    #[default]
    All,
    Search {
        term: String,
        field: SearchField,
        mode: SearchMode,
    },
}

impl CatalogQuery {
    /// A search, or `All` when the term is blank.
    pub fn search(term: &str, field: SearchField, mode: SearchMode) -> Self {
        let term = term.trim();
        if term.is_empty() {
            CatalogQuery::All
        } else {
            CatalogQuery::Search { term: term.to_string(), field, mode }
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, CatalogQuery::Search { .. })
    }
}

/// One page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: CatalogQuery,
    /// 1-based
    pub page: u32,
    pub limit: u32,
    pub sort: SortDirection,
}

impl PageRequest {
    pub fn path(&self) -> &'static str {
        match self.query {
            CatalogQuery::All => "/api/produtos",
            CatalogQuery::Search { .. } => "/api/produtos/search",
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if let CatalogQuery::Search { term, field, mode } = &self.query {
            pairs.push(("termo", term.clone()));
            pairs.push(("campo", field.as_param().to_string()));
            pairs.push(("modo", mode.as_param().to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("sort", self.sort.as_str().to_string()));
        pairs
    }
}

/// Pagination block; every field is optional because not every endpoint
/// sends all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub items_per_page: Option<u64>,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub has_next_page: Option<bool>,
}

/// A decoded page. Items stay raw until they go through the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl PageResponse {
    /// Whether another page is expected after this one.
    ///
    /// `hasNextPage` wins when present, then `currentPage < totalPages`.
    /// Without either the page-was-full heuristic is used, which can
    /// misreport when the backend filters or duplicates rows.
    pub fn has_more(&self, limit: u32) -> bool {
        if let Some(p) = &self.pagination {
            if let Some(next) = p.has_next_page {
                return next;
            }
            if let (Some(current), Some(total)) = (p.current_page, p.total_pages) {
                return current < total;
            }
        }
        let full = limit > 0 && self.items.len() >= limit as usize;
        log::warn!(
            "page has no pagination metadata; assuming {} from item count {}",
            if full { "more pages" } else { "last page" },
            self.items.len()
        );
        full
    }

    pub fn total_items(&self) -> Option<u64> {
        self.pagination.as_ref().and_then(|p| p.total_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(query: CatalogQuery) -> PageRequest {
        PageRequest { query, page: 2, limit: 50, sort: SortDirection::Desc }
    }

    #[test]
    fn list_request() {
        let req = request(CatalogQuery::All);
        assert_eq!(req.path(), "/api/produtos");
        assert_eq!(
            req.query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("limit", "50".to_string()),
                ("sort", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn search_request() {
        let req = request(CatalogQuery::search(" prego ", SearchField::Description, SearchMode::StartsWith));
        assert_eq!(req.path(), "/api/produtos/search");
        let pairs = req.query_pairs();
        assert_eq!(pairs[0], ("termo", "prego".to_string()));
        assert_eq!(pairs[1], ("campo", "descricao".to_string()));
        assert_eq!(pairs[2], ("modo", "começa_com".to_string()));
    }

    #[test]
    fn blank_search_is_all() {
        assert_eq!(
            CatalogQuery::search("  ", SearchField::Id, SearchMode::Exact),
            CatalogQuery::All
        );
    }

    #[test]
    fn has_more_prefers_explicit_flag() {
        let page: PageResponse = serde_json::from_value(json!({
            "items": [],
            "pagination": { "currentPage": 1, "totalPages": 5, "hasNextPage": false }
        }))
        .unwrap();
        assert!(!page.has_more(50));
    }

    #[test]
    fn has_more_from_page_counts() {
        let page: PageResponse = serde_json::from_value(json!({
            "items": [{ "item_id": 1 }],
            "pagination": { "currentPage": 1, "itemsPerPage": 50, "totalItems": 51, "totalPages": 2 }
        }))
        .unwrap();
        assert!(page.has_more(50));
        assert_eq!(page.total_items(), Some(51));
    }

    #[test]
    fn has_more_falls_back_to_page_size() {
        let full = PageResponse { items: vec![json!({}); 3], pagination: None };
        assert!(full.has_more(3));
        assert!(!full.has_more(4));
        let partial: PageResponse =
            serde_json::from_value(json!({ "items": [{}], "pagination": { "totalItems": 9 } })).unwrap();
        assert!(!partial.has_more(2));
    }

    #[test]
    fn parse_wire_spellings() {
        assert_eq!(SearchMode::parse("contém"), Some(SearchMode::Contains));
        assert_eq!(SearchMode::parse("comeca_com"), Some(SearchMode::StartsWith));
        assert_eq!(SearchField::parse("fornecedor_id"), Some(SearchField::SupplierId));
        assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
    }
}

//! Parsing of `GET /api/trips` query parameters into a safe list query.

use serde::Deserialize;

use crate::errors::AppError;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Query string as sent by clients: `?page=1&limit=10&search=goa&sort=-createdAt`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
    Budget,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => "title",
            SortField::Budget => "budget",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl ListQuery {
    /// Row offset for the page. `try_from` guarantees this fits in an `i64`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// ILIKE pattern for a case-insensitive substring match on the title.
    pub fn title_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|s| format!("%{}%", escape_like(s)))
    }
}

impl TryFrom<ListParams> for ListQuery {
    type Error = AppError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let page = params.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        if (page - 1).checked_mul(limit).is_none() {
            return Err(AppError::Validation("page is out of range".to_string()));
        }

        let (sort, direction) = parse_sort(params.sort.as_deref().unwrap_or("-createdAt"))?;

        let search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(ListQuery {
            page,
            limit,
            search,
            sort,
            direction,
        })
    }
}

/// `field` sorts ascending, `-field` descending.
fn parse_sort(raw: &str) -> Result<(SortField, SortDirection), AppError> {
    let raw = raw.trim();
    let (name, direction) = match raw.strip_prefix('-') {
        Some(rest) => (rest, SortDirection::Desc),
        None => (raw, SortDirection::Asc),
    };

    let field = match name {
        "createdAt" => SortField::CreatedAt,
        "updatedAt" => SortField::UpdatedAt,
        "title" => SortField::Title,
        "budget" => SortField::Budget,
        other => {
            return Err(AppError::Validation(format!(
                "Unsupported sort field '{other}'"
            )))
        }
    };

    Ok((field, direction))
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>, sort: Option<&str>) -> ListParams {
        ListParams {
            page,
            limit,
            search: None,
            sort: sort.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::try_from(ListParams::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert_eq!(query.sort, SortField::CreatedAt);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_offset_from_page_and_limit() {
        let query = ListQuery::try_from(params(Some(3), Some(20), None)).unwrap();
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(ListQuery::try_from(params(None, Some(0), None)).unwrap().limit, 1);
        assert_eq!(ListQuery::try_from(params(None, Some(5000), None)).unwrap().limit, 100);
    }

    #[test]
    fn test_page_zero_rejected() {
        assert!(matches!(
            ListQuery::try_from(params(Some(0), None, None)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_huge_page_rejected_instead_of_overflowing() {
        assert!(matches!(
            ListQuery::try_from(params(Some(i64::MAX), Some(10), None)),
            Err(AppError::Validation(_))
        ));

        // Largest page whose offset still fits.
        let page = (i64::MAX / 100) + 1;
        let query = ListQuery::try_from(params(Some(page), Some(100), None)).unwrap();
        assert_eq!(query.offset(), (page - 1) * 100);
    }

    #[test]
    fn test_sort_parsing() {
        let query = ListQuery::try_from(params(None, None, Some("title"))).unwrap();
        assert_eq!((query.sort, query.direction), (SortField::Title, SortDirection::Asc));

        let query = ListQuery::try_from(params(None, None, Some("-updatedAt"))).unwrap();
        assert_eq!(query.sort.column(), "updated_at");
        assert_eq!(query.direction.as_sql(), "DESC");
    }

    #[test]
    fn test_unknown_sort_rejected() {
        let result = ListQuery::try_from(params(None, None, Some("-password; DROP TABLE trips")));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_title_pattern_escapes_wildcards() {
        let query = ListQuery::try_from(ListParams {
            search: Some("  100%_goa\\ ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(query.title_pattern().as_deref(), Some("%100\\%\\_goa\\\\%"));
    }

    #[test]
    fn test_blank_search_ignored() {
        let query = ListQuery::try_from(ListParams {
            search: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(query.title_pattern().is_none());
    }
}

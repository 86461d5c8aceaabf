use serde::Deserialize;

use crate::error::FieldError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 5;
pub const MAX_LIMIT: u32 = 100;

/// Raw `?page=&limit=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

impl TryFrom<PageQuery> for Page {
    type Error = Vec<FieldError>;

    fn try_from(query: PageQuery) -> Result<Self, Self::Error> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

        let mut errors = Vec::new();
        if page == 0 {
            errors.push(FieldError::new("page", "Page must be at least 1."));
        }
        if limit == 0 || limit > MAX_LIMIT {
            errors.push(FieldError::new(
                "limit",
                format!("Limit must be between 1 and {MAX_LIMIT}."),
            ));
        }

        if errors.is_empty() {
            Ok(Page { page, limit })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let page = Page::try_from(PageQuery::default()).unwrap();
        assert_eq!(page, Page { page: 1, limit: 5 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn second_page_of_five_skips_five() {
        let page = Page::try_from(PageQuery { page: Some(2), limit: Some(5) }).unwrap();
        assert_eq!(page.offset(), 5);
        assert_eq!(page.limit(), 5);
    }

    #[test]
    fn rejects_zero_page_and_oversized_limit_together() {
        let errors = Page::try_from(PageQuery { page: Some(0), limit: Some(500) }).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["page", "limit"]);
    }
}

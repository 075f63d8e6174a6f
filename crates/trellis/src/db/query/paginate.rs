use crate::{
    db::{element::Element, query::ElementQuery},
    error::{EngineError, ErrorClass, ErrorOrigin},
};

///
/// Page
///

#[derive(Debug)]
pub struct Page {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_results: u64,
    pub results: Vec<Element>,
}

///
/// Paginator
///
/// Stable page windows over a compiled, ordered query. The wrapped
/// query is cloned up front (the caller's limit/offset are never
/// mutated) and the total count is computed once per instance.
///

#[derive(Debug)]
pub struct Paginator<'a> {
    query: ElementQuery<'a>,
    per_page: usize,
    total_results: u64,
}

impl<'a> Paginator<'a> {
    pub fn new(query: &ElementQuery<'a>, per_page: usize) -> Result<Self, EngineError> {
        if per_page == 0 {
            return Err(EngineError::new(
                ErrorClass::InvalidParams,
                ErrorOrigin::Query,
                "page size must be at least 1",
            ));
        }

        let query = query.clone();
        let total_results = query.count()?;

        Ok(Self {
            query,
            per_page,
            total_results,
        })
    }

    #[must_use]
    pub const fn total_results(&self) -> u64 {
        self.total_results
    }

    #[must_use]
    pub const fn total_pages(&self) -> usize {
        (self.total_results as usize).div_ceil(self.per_page)
    }

    ///
    /// Fetch one page window. Page numbers start at 1 and clamp to the
    /// last page; the page query runs against a clone, leaving the
    /// wrapped query untouched.
    ///
    pub fn page(&self, number: usize) -> Result<Page, EngineError> {
        let current_page = number.clamp(1, self.total_pages().max(1));

        let results = self
            .query
            .clone()
            .offset((current_page - 1) * self.per_page)
            .limit(self.per_page)
            .all()?
            .rows();

        Ok(Page {
            current_page,
            total_pages: self.total_pages(),
            total_results: self.total_results,
            results,
        })
    }
}

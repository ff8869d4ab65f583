//! Sorting and offset paging types for list reads.

use super::predicate::quote_ident;

/// Sort direction for one ordering term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// Ordered list of sort terms. Empty means unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::unsorted().then_asc(column)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::unsorted().then_desc(column)
    }

    pub fn then_asc(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction: Direction::Asc,
        });
        self
    }

    pub fn then_desc(mut self, column: impl Into<String>) -> Self {
        self.orders.push(Order {
            column: column.into(),
            direction: Direction::Desc,
        });
        self
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Renders the `ORDER BY` list without the keyword, or `None` when
    /// unsorted.
    pub fn to_sql(&self) -> Option<String> {
        if self.orders.is_empty() {
            return None;
        }

        let terms = self
            .orders
            .iter()
            .map(|order| {
                let direction = match order.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("{} {direction}", quote_ident(&order.column))
            })
            .collect::<Vec<_>>();
        Some(terms.join(", "))
    }
}

/// Zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Rows per page. Must be greater than zero.
    pub size: u32,
    pub sort: Sort,
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: Sort::unsorted(),
        }
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// Row range of a list read: at most `limit` rows after skipping `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Window {
    /// Every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn first(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }
}

impl From<&PageRequest> for Window {
    fn from(request: &PageRequest) -> Self {
        Self {
            limit: Some(u64::from(request.size)),
            offset: request.offset(),
        }
    }
}

/// One page of results plus the total row count of the filtered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

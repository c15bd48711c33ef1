use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("invalid sortBy: {0}")]
    InvalidSort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(Self::Asc),
            "desc" | "descending" | "-1" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Email,
    Role,
    CreatedAt,
    UpdatedAt,
}

impl UserSortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "name" => Some(Self::Name),
            "email" => Some(Self::Email),
            "role" => Some(Self::Role),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: UserSortField,
    pub order: SortOrder,
}

/// Listing options for paginated user queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    pub page: u32,
    pub limit: u32,
    pub sort: Vec<SortKey>,
    /// Relation paths requested for expansion.
    pub populate: Vec<String>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort: vec![SortKey {
                field: UserSortField::CreatedAt,
                order: SortOrder::Asc,
            }],
            populate: Vec::new(),
        }
    }
}

impl PageOptions {
    /// Builds options from raw query values. Zero page/limit fall back to the
    /// defaults; `sort_by` is `field:(asc|desc)` entries joined by commas.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        sort_by: Option<&str>,
        populate: Option<&str>,
    ) -> Result<Self, PageError> {
        let mut options = Self::default();
        if let Some(page) = page.filter(|page| *page > 0) {
            options.page = page;
        }
        if let Some(limit) = limit.filter(|limit| *limit > 0) {
            options.limit = limit;
        }

        if let Some(sort_by) = sort_by.filter(|value| !value.trim().is_empty()) {
            let mut sort = Vec::new();
            for entry in sort_by.split(',') {
                let mut parts = entry.splitn(2, ':');
                let field = parts.next().unwrap_or_default();
                let field = UserSortField::parse(field)
                    .ok_or_else(|| PageError::InvalidSort(sort_by.to_string()))?;
                let order = match parts.next() {
                    Some(order) => SortOrder::parse(order)
                        .ok_or_else(|| PageError::InvalidSort(sort_by.to_string()))?,
                    None => SortOrder::Asc,
                };
                sort.push(SortKey { field, order });
            }
            options.sort = sort;
        }

        if let Some(populate) = populate {
            options.populate = populate
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(options)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Page envelope returned by listing endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub results: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub total_results: u64,
}

impl<T> QueryResult<T> {
    pub fn new(results: Vec<T>, options: &PageOptions, total_results: u64) -> Self {
        Self {
            results,
            page: options.page,
            limit: options.limit,
            total_pages: total_results.div_ceil(u64::from(options.limit.max(1))),
            total_results,
        }
    }

    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            page: 0,
            limit: 0,
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// Page/limit/direction triple for post listings sorted by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostWindow {
    pub page: u32,
    pub limit: u32,
    pub order: SortOrder,
}

impl Default for PostWindow {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            order: SortOrder::Desc,
        }
    }
}

impl PostWindow {
    /// `sort_by` accepts a bare direction (`asc`, `-1`, ...) or `createdAt:<direction>`.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        sort_by: Option<&str>,
    ) -> Result<Self, PageError> {
        let mut window = Self::default();
        if let Some(page) = page.filter(|page| *page > 0) {
            window.page = page;
        }
        if let Some(limit) = limit.filter(|limit| *limit > 0) {
            window.limit = limit;
        }
        if let Some(sort_by) = sort_by.filter(|value| !value.trim().is_empty()) {
            let direction = match sort_by.split_once(':') {
                Some((field, direction)) if field.trim() == "createdAt" => direction,
                Some(_) => return Err(PageError::InvalidSort(sort_by.to_string())),
                None => sort_by,
            };
            window.order = SortOrder::parse(direction)
                .ok_or_else(|| PageError::InvalidSort(sort_by.to_string()))?;
        }
        Ok(window)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported sort expression: {0}")]
pub struct SortError(String);

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Username,
    FullName,
    Role,
    Birthday,
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    const ALL: [SortColumn; 7] = [
        SortColumn::Id,
        SortColumn::Username,
        SortColumn::FullName,
        SortColumn::Role,
        SortColumn::Birthday,
        SortColumn::CreatedAt,
        SortColumn::UpdatedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Username => "username",
            SortColumn::FullName => "full_name",
            SortColumn::Role => "role",
            SortColumn::Birthday => "birthday",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
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
}

/// Whitelisted `<column> [asc|desc]` ordering.
///
/// Only values produced by this type ever reach an `ORDER BY` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            column: SortColumn::Id,
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column.as_str(), self.direction.as_str())
    }
}

impl FromStr for Sort {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SortError(s.to_string());
        let mut parts = s.split_whitespace();

        let column = parts
            .next()
            .map(str::to_ascii_lowercase)
            .and_then(|name| SortColumn::ALL.into_iter().find(|c| c.as_str() == name))
            .ok_or_else(invalid)?;

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Err(invalid()),
        };

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self { column, direction })
    }
}

/// Normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub page: u32,
    pub sort: Sort,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: 1,
            sort: Sort::default(),
        }
    }
}

impl Pagination {
    /// Normalize raw query values.
    ///
    /// Non-positive or absent limits fall back to the default, limits above
    /// the maximum are clamped, and non-positive pages become the first page.
    pub fn new(limit: Option<i64>, page: Option<i64>, sort: Sort) -> Self {
        let limit = match limit {
            Some(limit) if limit > 0 => limit.min(i64::from(MAX_LIMIT)) as u32,
            _ => DEFAULT_LIMIT,
        };
        let page = match page {
            Some(page) if page > 0 => page.min(i64::from(u32::MAX)) as u32,
            _ => 1,
        };

        Self { limit, page, sort }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    pub fn total_pages(&self, total_rows: i64) -> i64 {
        let limit = i64::from(self.limit);
        (total_rows.max(0) + limit - 1) / limit
    }
}

/// One page of results plus the counts needed to render navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub pagination: Pagination,
    pub total_rows: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(pagination: Pagination, total_rows: i64, items: Vec<T>) -> Self {
        Self {
            pagination,
            total_rows,
            total_pages: pagination.total_pages(total_rows),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(Pagination::new(None, None, Sort::default()).limit, 10);
        assert_eq!(Pagination::new(Some(0), None, Sort::default()).limit, 10);
        assert_eq!(Pagination::new(Some(-5), None, Sort::default()).limit, 10);
        assert_eq!(Pagination::new(Some(250), None, Sort::default()).limit, 100);
        assert_eq!(Pagination::new(Some(25), None, Sort::default()).limit, 25);
    }

    #[test]
    fn test_page_and_offset() {
        let pagination = Pagination::new(Some(20), Some(3), Sort::default());
        assert_eq!(pagination.offset(), 40);

        let first = Pagination::new(Some(20), Some(0), Sort::default());
        assert_eq!(first.page, 1);
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let pagination = Pagination::new(Some(10), None, Sort::default());
        assert_eq!(pagination.total_pages(0), 0);
        assert_eq!(pagination.total_pages(10), 1);
        assert_eq!(pagination.total_pages(11), 2);
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(Sort::default().to_string(), "id desc");
        assert_eq!(
            "Username ASC".parse::<Sort>().unwrap(),
            Sort {
                column: SortColumn::Username,
                direction: SortDirection::Asc
            }
        );
        assert_eq!(
            "created_at".parse::<Sort>().unwrap().direction,
            SortDirection::Asc
        );
    }

    #[test]
    fn test_sort_rejects_anything_else() {
        assert!("password_hash desc".parse::<Sort>().is_err());
        assert!("id; DROP TABLE users".parse::<Sort>().is_err());
        assert!("id sideways".parse::<Sort>().is_err());
        assert!("id desc nulls".parse::<Sort>().is_err());
        assert!("".parse::<Sort>().is_err());
    }
}

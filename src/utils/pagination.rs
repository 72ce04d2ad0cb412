use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceResponse;
use crate::model::department::DepartmentResponse;
use crate::model::user::UserResponse;
use crate::model::user_role::UserRoleResponse;
use crate::service::attendance::DetailedAttendance;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn from_query(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    pub fn limit(&self) -> u64 {
        self.per_page as u64
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    UserPage = Paginated<UserResponse>,
    DepartmentPage = Paginated<DepartmentResponse>,
    UserRolePage = Paginated<UserRoleResponse>,
    AttendancePage = Paginated<AttendanceResponse>,
    DetailedAttendancePage = Paginated<DetailedAttendance>
)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total: i64) -> Self {
        Self {
            data,
            page: pagination.page,
            per_page: pagination.per_page,
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        let p = Pagination::from_query(None, None);
        assert_eq!(p, Pagination { page: 1, per_page: DEFAULT_PER_PAGE });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        assert_eq!(Pagination::from_query(Some(0), Some(10)).page, 1);
    }

    #[test]
    fn per_page_is_clamped() {
        assert_eq!(Pagination::from_query(None, Some(0)).per_page, 1);
        assert_eq!(Pagination::from_query(None, Some(5_000)).per_page, MAX_PER_PAGE);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let p = Pagination::from_query(Some(3), Some(25));
        assert_eq!(p.offset(), 50);
        assert_eq!(p.limit(), 25);
    }

    #[test]
    fn map_keeps_paging_metadata() {
        let page = Paginated::new(vec![1, 2, 3], Pagination::from_query(Some(2), Some(3)), 9);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.data, vec![10, 20, 30]);
        assert_eq!((mapped.page, mapped.per_page, mapped.total), (2, 3, 9));
    }
}

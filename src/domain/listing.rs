use super::loan::{LoanTypeId, RequestId};
use super::profile::UserProfile;
use super::status::Status;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Denormalized row for the administrative listing.
///
/// `client_name`, `base_salary` and, for approved rows without a stored value,
/// `monthly_debt` are filled in per query and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListRow {
    pub id: RequestId,
    pub amount: Decimal,
    pub term_months: i32,
    pub email: String,
    pub status: Status,
    pub loan_type_id: LoanTypeId,
    pub interest_rate: Option<Decimal>,
    pub client_name: Option<String>,
    pub base_salary: Option<Decimal>,
    pub monthly_debt: Option<Decimal>,
}

impl AdminListRow {
    pub(crate) fn apply_profile(&mut self, profile: &UserProfile) {
        self.client_name = Some(profile.full_name());
        self.base_salary = Some(profile.base_salary);
    }
}

/// One page of a listing. Page indices are zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: usize, size: usize, total_elements: u64) -> Self {
        let total_pages = match size {
            0 => 0,
            size => total_elements.div_ceil(size as u64),
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

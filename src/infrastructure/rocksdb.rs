use crate::domain::listing::{AdminListRow, Page};
use crate::domain::loan::{LoanRequest, LoanType, LoanTypeId, RequestId};
use crate::domain::ports::{ApprovedDebt, LoanTypeStore, RequestStore};
use crate::domain::status::Status;
use crate::error::{LoanError, Result};
use crate::infrastructure::in_memory::to_row;
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Column Family for the loan type catalog.
pub const CF_LOAN_TYPES: &str = "loan_types";
/// Column Family for loan requests.
pub const CF_REQUESTS: &str = "requests";

/// Request record as written to disk. `sequence` keeps listing order stable
/// across reopen, since request keys are random UUIDs.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRequest {
    sequence: u64,
    request: LoanRequest,
}

/// A persistent store implementation using RocksDB.
///
/// Serves both the loan type catalog and the request store from separate
/// Column Families. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    next_sequence: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating the
    /// "loan_types" and "requests" column families if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_loan_types = ColumnFamilyDescriptor::new(CF_LOAN_TYPES, Options::default());
        let cf_requests = ColumnFamilyDescriptor::new(CF_REQUESTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_loan_types, cf_requests])?;
        let store = Self {
            db: Arc::new(db),
            next_sequence: Arc::default(),
        };

        let next = store
            .stored_requests()?
            .iter()
            .map(|stored| stored.sequence + 1)
            .max()
            .unwrap_or(0);
        store.next_sequence.store(next, Ordering::SeqCst);

        Ok(store)
    }

    /// Writes a catalog entry, replacing any entry with the same id.
    pub fn put_loan_type(&self, loan_type: &LoanType) -> Result<()> {
        let cf = self.cf(CF_LOAN_TYPES)?;
        self.db
            .put_cf(cf, loan_type.id.to_be_bytes(), serde_json::to_vec(loan_type)?)?;
        Ok(())
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LoanError::upstream(format!("{name} column family not found")))
    }

    fn stored_request(&self, id: RequestId) -> Result<Option<StoredRequest>> {
        let cf = self.cf(CF_REQUESTS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every stored request in insertion order.
    fn stored_requests(&self) -> Result<Vec<StoredRequest>> {
        let cf = self.cf(CF_REQUESTS)?;
        let mut stored = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            stored.push(serde_json::from_slice::<StoredRequest>(&value)?);
        }
        stored.sort_by_key(|s| s.sequence);
        Ok(stored)
    }

    fn requests_matching(&self, keep: impl Fn(&LoanRequest) -> bool) -> Result<Vec<LoanRequest>> {
        Ok(self
            .stored_requests()?
            .into_iter()
            .map(|stored| stored.request)
            .filter(|request| keep(request))
            .collect())
    }

    fn interest_rates(&self) -> Result<HashMap<LoanTypeId, Decimal>> {
        let cf = self.cf(CF_LOAN_TYPES)?;
        let mut rates = HashMap::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let loan_type: LoanType = serde_json::from_slice(&value)?;
            rates.insert(loan_type.id, loan_type.interest_rate);
        }
        Ok(rates)
    }
}

#[async_trait]
impl LoanTypeStore for RocksDBStore {
    async fn find_by_id(&self, id: LoanTypeId) -> Result<Option<LoanType>> {
        let cf = self.cf(CF_LOAN_TYPES)?;
        match self.db.get_cf(cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RequestStore for RocksDBStore {
    async fn save(&self, mut request: LoanRequest) -> Result<LoanRequest> {
        let id = *request.id.get_or_insert_with(Uuid::new_v4);
        let sequence = match self.stored_request(id)? {
            Some(existing) => existing.sequence,
            None => self.next_sequence.fetch_add(1, Ordering::SeqCst),
        };

        let stored = StoredRequest {
            sequence,
            request: request.clone(),
        };
        let cf = self.cf(CF_REQUESTS)?;
        self.db
            .put_cf(cf, id.as_bytes(), serde_json::to_vec(&stored)?)?;

        Ok(request)
    }

    async fn find_by_id(&self, id: RequestId) -> Result<Option<LoanRequest>> {
        Ok(self.stored_request(id)?.map(|stored| stored.request))
    }

    async fn sum_monthly_debt_by_email(&self, email: &str) -> Result<Decimal> {
        Ok(self
            .requests_matching(|r| r.email == email)?
            .into_iter()
            .filter_map(|r| r.monthly_debt)
            .sum())
    }

    async fn find_page(
        &self,
        statuses: &BTreeSet<Status>,
        page: usize,
        size: usize,
    ) -> Result<Page<AdminListRow>> {
        let size = size.max(1);
        let matching =
            self.requests_matching(|r| statuses.is_empty() || statuses.contains(&r.status))?;
        let total = matching.len() as u64;
        let rates = self.interest_rates()?;

        let rows = matching
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .map(|r| to_row(r, &rates))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(rows, page, size, total))
    }

    async fn find_approved_by_email(&self, email: &str) -> Result<Vec<ApprovedDebt>> {
        Ok(self
            .requests_matching(|r| r.email == email && r.status == Status::Approved)?
            .into_iter()
            .map(|r| ApprovedDebt {
                id: r.id,
                monthly_debt: r.monthly_debt,
            })
            .collect())
    }
}

use crate::domain::loan::LoanType;
use crate::domain::profile::UserProfile;
use crate::error::{LoanError, Result};
use serde::de::DeserializeOwned;
use std::io::Read;

fn records<R: Read, T: DeserializeOwned>(source: R) -> impl Iterator<Item = Result<T>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
        .into_deserialize()
        .map(|result| result.map_err(LoanError::from))
}

/// Reads the loan type catalog from CSV.
///
/// Expected header: `id,name,minimum_amount,maximum_amount,interest_rate,automatic_validation`.
/// An empty bound leaves that side of the amount range unconstrained.
pub struct LoanTypeReader<R: Read> {
    source: R,
}

impl<R: Read> LoanTypeReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Lazily deserializes one loan type per record.
    pub fn loan_types(self) -> impl Iterator<Item = Result<LoanType>> {
        records(self.source)
    }
}

/// Reads identity profiles from CSV.
///
/// Expected header: `name,surname,base_salary,document_number,email`.
pub struct ProfileReader<R: Read> {
    source: R,
}

impl<R: Read> ProfileReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn profiles(self) -> impl Iterator<Item = Result<UserProfile>> {
        records(self.source)
    }
}

//! Access to the membership database

pub mod member_db;
pub mod transport;

pub use member_db::MemberDb;
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{CertPolicy, HttpRequest, HttpResponse, HttpTransport, Method};

use crate::error::RemoteError;
use crate::record::RemoteRecord;

/// Source of the current members of a group
pub trait RemoteSource {
    fn fetch_group_members(&mut self, group_id: i64) -> Result<Vec<RemoteRecord>, RemoteError>;
}

impl<S: RemoteSource + ?Sized> RemoteSource for Box<S> {
    fn fetch_group_members(&mut self, group_id: i64) -> Result<Vec<RemoteRecord>, RemoteError> {
        (**self).fetch_group_members(group_id)
    }
}

impl<S: RemoteSource + ?Sized> RemoteSource for &mut S {
    fn fetch_group_members(&mut self, group_id: i64) -> Result<Vec<RemoteRecord>, RemoteError> {
        (**self).fetch_group_members(group_id)
    }
}

/// Member list held in memory, for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    members: Vec<RemoteRecord>,
}

impl StaticSource {
    pub fn new(members: Vec<RemoteRecord>) -> Self {
        Self { members }
    }
}

impl RemoteSource for StaticSource {
    fn fetch_group_members(&mut self, _group_id: i64) -> Result<Vec<RemoteRecord>, RemoteError> {
        Ok(self.members.clone())
    }
}

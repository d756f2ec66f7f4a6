//! A [`LocalStore`] backed by RocksDB, one column family per db-type
//! (spec.md §6 "LocalStore").

use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use sigchain_core::error::StorageError;
use sigchain_core::ports::LocalStore;
use sigchain_types::{Link, LinkId, MerkleTriple, Uid};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const CF_TAILS_PUBLIC: &str = "sigchain_tail_public";
const CF_TAILS_PRIVATE: &str = "sigchain_tail_private";
const CF_LINKS: &str = "sigchain_links";

/// RocksDB-backed [`LocalStore`] implementation.
///
/// Keys are `(uid, ...)` byte concatenations, matching the spec's `(db_type,
/// uid)` key shape by putting the db-type in the column family instead of
/// the key prefix — idiomatic for RocksDB, where column families are the
/// natural way to separate concerns that would otherwise need a key prefix.
#[derive(Debug, Clone)]
pub struct RocksLocalStore {
    db: Arc<DB>,
}

impl RocksLocalStore {
    /// Opens (creating if absent) a RocksDB store at `path` with the three
    /// column families this store needs.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_TAILS_PUBLIC, CF_TAILS_PRIVATE, CF_LINKS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db.cf_handle(name).ok_or_else(|| StorageError::Database(format!("missing column family {name}")))
    }

    fn get_tail(&self, cf_name: &str, uid: Uid) -> Result<Option<MerkleTriple>, StorageError> {
        let cf = self.cf(cf_name)?;
        let Some(bytes) = self.db.get_cf(cf, uid.0.as_slice()).map_err(|e| StorageError::Database(e.to_string()))?
        else {
            return Ok(None);
        };
        let triple: MerkleTriple =
            bincode::deserialize(&bytes).map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(Some(triple))
    }

    fn put_tail(&self, cf_name: &str, uid: Uid, tail: MerkleTriple) -> Result<(), StorageError> {
        let cf = self.cf(cf_name)?;
        let bytes = bincode::serialize(&tail).map_err(|e| StorageError::Database(e.to_string()))?;
        self.db.put_cf(cf, uid.0.as_slice(), bytes).map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    fn link_key(uid: Uid, link_id: LinkId) -> Vec<u8> {
        let mut key = Vec::with_capacity(64);
        key.extend_from_slice(uid.0.as_slice());
        key.extend_from_slice(link_id.0.as_slice());
        key
    }
}

#[async_trait]
impl LocalStore for RocksLocalStore {
    async fn public_tail(&self, uid: Uid) -> Result<Option<MerkleTriple>, StorageError> {
        self.get_tail(CF_TAILS_PUBLIC, uid)
    }

    async fn private_tail(&self, uid: Uid) -> Result<Option<MerkleTriple>, StorageError> {
        self.get_tail(CF_TAILS_PRIVATE, uid)
    }

    async fn get_link(&self, uid: Uid, link_id: LinkId) -> Result<Option<Link>, StorageError> {
        let cf = self.cf(CF_LINKS)?;
        let key = Self::link_key(uid, link_id);
        let Some(bytes) = self.db.get_cf(cf, &key).map_err(|e| StorageError::Database(e.to_string()))? else {
            return Ok(None);
        };
        let link: Link = bincode::deserialize(&bytes).map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(Some(link))
    }

    async fn put_link(&self, uid: Uid, link: &Link) -> Result<(), StorageError> {
        let cf = self.cf(CF_LINKS)?;
        let key = Self::link_key(uid, link.link_id);

        // Idempotent re-import (SPEC_FULL.md §4.9): writing identical bytes
        // for an already-present link_id is a no-op.
        if let Some(existing) = self.db.get_cf(cf, &key).map_err(|e| StorageError::Database(e.to_string()))? {
            let new_bytes = bincode::serialize(link).map_err(|e| StorageError::Database(e.to_string()))?;
            if existing == new_bytes {
                debug!(target: "sigchain::storage", link_id = %link.link_id, "idempotent re-import, skipping write");
                return Ok(());
            }
        }

        let bytes = bincode::serialize(link).map_err(|e| StorageError::Database(e.to_string()))?;
        self.db.put_cf(cf, &key, bytes).map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    async fn put_public_tail(&self, uid: Uid, tail: MerkleTriple) -> Result<(), StorageError> {
        self.put_tail(CF_TAILS_PUBLIC, uid, tail)
    }

    async fn put_private_tail(&self, uid: Uid, tail: MerkleTriple) -> Result<(), StorageError> {
        self.put_tail(CF_TAILS_PRIVATE, uid, tail)
    }
}

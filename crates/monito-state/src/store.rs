//! StateStore — redb-backed service catalog.
//!
//! Records live in an in-memory redb database. Each public operation is a
//! single read or write transaction; writes allocate ids from a counter that
//! never goes backwards, so ids are never reused within a process.

use std::sync::Arc;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, WriteTransaction};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::repository::ServiceRepository;
use crate::seed::{SeedService, demo_catalog};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe service store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Create an empty in-memory store.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create an in-memory store pre-populated with the demo catalog.
    pub fn open_seeded() -> StateResult<Self> {
        let store = Self::open_in_memory()?;
        for seed in demo_catalog() {
            store.insert_seed(&seed)?;
        }
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SERVICES).map_err(map_err!(Table))?;
        txn.open_table(SERVICE_IDS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Insert a seed record, keeping its own uptime figure.
    pub fn insert_seed(&self, seed: &SeedService) -> StateResult<Service> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let seq = allocate_seq(&txn)?;
        let service = Service {
            id: seq.to_string(),
            name: seed.name.to_string(),
            kind: seed.kind,
            status: seed.status,
            url: seed.url.map(str::to_string),
            description: Some(seed.description.to_string()),
            last_checked: Utc::now(),
            uptime: seed.uptime,
            response_time: None,
        };
        put_record(&txn, seq, &service)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %service.id, name = %service.name, "seed service stored");
        Ok(service)
    }

    /// Number of stored services.
    pub fn len(&self) -> StateResult<usize> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICE_IDS).map_err(map_err!(Table))?;
        let count = table.len().map_err(map_err!(Read))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> StateResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ServiceRepository for StateStore {
    fn list_services(&self) -> StateResult<Vec<Service>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let service: Service =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(service);
        }
        Ok(results)
    }

    fn get_service(&self, id: &str) -> StateResult<Service> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let ids = txn.open_table(SERVICE_IDS).map_err(map_err!(Table))?;
        let seq = match ids.get(id).map_err(map_err!(Read))? {
            Some(guard) => guard.value(),
            None => return Err(not_found(id)),
        };
        let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        let service: Service = match table.get(seq).map_err(map_err!(Read))? {
            Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?,
            None => return Err(not_found(id)),
        };
        Ok(service)
    }

    fn create_service(&self, draft: ServiceDraft) -> StateResult<Service> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let seq = allocate_seq(&txn)?;
        // A validation failure drops the transaction, so the sequence is not consumed.
        let service = draft.into_service(seq.to_string(), Utc::now())?;
        put_record(&txn, seq, &service)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %service.id, name = %service.name, "service created");
        Ok(service)
    }

    fn update_service(&self, id: &str, patch: ServicePatch) -> StateResult<Service> {
        patch.validate()?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let seq = lookup_seq(&txn, id)?;
        let mut service: Service = {
            let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            let guard = table
                .get(seq)
                .map_err(map_err!(Read))?
                .ok_or_else(|| not_found(id))?;
            serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
        };
        patch.apply(&mut service, Utc::now());
        put_record(&txn, seq, &service)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, status = %service.status, "service updated");
        Ok(service)
    }

    fn delete_service(&self, id: &str) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut ids = txn.open_table(SERVICE_IDS).map_err(map_err!(Table))?;
            let seq = match ids.remove(id).map_err(map_err!(Write))? {
                Some(guard) => guard.value(),
                None => return Err(not_found(id)),
            };
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            table.remove(seq).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, "service deleted");
        Ok(())
    }
}

/// Hand out the next sequence number inside `txn`.
fn allocate_seq(txn: &WriteTransaction) -> StateResult<u64> {
    let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
    let seq = meta
        .get(NEXT_SEQ)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value())
        .unwrap_or(1);
    meta.insert(NEXT_SEQ, seq + 1).map_err(map_err!(Write))?;
    Ok(seq)
}

fn lookup_seq(txn: &WriteTransaction, id: &str) -> StateResult<u64> {
    let ids = txn.open_table(SERVICE_IDS).map_err(map_err!(Table))?;
    let seq = ids
        .get(id)
        .map_err(map_err!(Read))?
        .map(|guard| guard.value());
    seq.ok_or_else(|| not_found(id))
}

/// Write the record and its id index entry. `response_time` is never stored.
fn put_record(txn: &WriteTransaction, seq: u64, service: &Service) -> StateResult<()> {
    let stored = Service {
        response_time: None,
        ..service.clone()
    };
    let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
    {
        let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        table
            .insert(seq, value.as_slice())
            .map_err(map_err!(Write))?;
    }
    let mut ids = txn.open_table(SERVICE_IDS).map_err(map_err!(Table))?;
    ids.insert(service.id.as_str(), seq)
        .map_err(map_err!(Write))?;
    Ok(())
}

fn not_found(id: &str) -> StateError {
    StateError::NotFound(format!("service {id}"))
}

//! redb table definitions for the service store.

use redb::TableDefinition;

/// Service records keyed by insertion sequence (JSON values).
pub const SERVICES: TableDefinition<u64, &[u8]> = TableDefinition::new("services");

/// Public service id to insertion sequence.
pub const SERVICE_IDS: TableDefinition<&str, u64> = TableDefinition::new("service_ids");

/// Store counters. Holds [`NEXT_SEQ`].
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Key of the next sequence number to hand out. Never decremented.
pub const NEXT_SEQ: &str = "next_seq";

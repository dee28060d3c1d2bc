//! Per-project daemon state: the storage engine plus the stores built on
//! top of it. One `DaemonState` is shared (via `Arc`) across every
//! connection the listener accepts — mutating calls still serialize inside
//! `StorageEngine`'s own lock, this just avoids re-opening the database per
//! connection.

use std::sync::Arc;

use swarmcell_cells::CellStore;
use swarmcell_core::config::SwarmConfig;
use swarmcell_mail::MailStore;
use swarmcell_storage::StorageEngine;

pub struct DaemonState {
    pub project_key: String,
    pub config: SwarmConfig,
    pub storage: Arc<StorageEngine>,
    pub cells: CellStore<StorageEngine>,
    pub mail: MailStore<StorageEngine>,
}

impl DaemonState {
    pub fn new(project_key: String, config: SwarmConfig, storage: Arc<StorageEngine>) -> Self {
        let cells = CellStore::new(Arc::clone(&storage));
        let mail = MailStore::new(Arc::clone(&storage));
        Self { project_key, config, storage, cells, mail }
    }
}

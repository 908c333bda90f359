//! Scoped access to an external source connector.

use tracing::debug;

use crate::core::traits::SourceConnector;
use crate::error::Result;
use crate::orchestrator::ReadSpec;

use super::mapper::{MappedRows, SourceRowMapper};

/// Guard that owns an open connector and closes it when dropped.
///
/// Closing happens on every exit path: explicit [`close`](Self::close),
/// early drop of a partially consumed read, or unwinding after an error.
pub struct ScopedConnector<C: SourceConnector> {
    connector: C,
    open: bool,
}

impl<C: SourceConnector> ScopedConnector<C> {
    /// Open the connector. Nothing is closed if opening fails.
    pub fn open(mut connector: C) -> Result<Self> {
        connector.open()?;
        Ok(Self {
            connector,
            open: true,
        })
    }

    /// Execute a planned read and map its rows lazily.
    ///
    /// The returned iterator borrows the guard, so the connector stays open
    /// for as long as rows are being consumed.
    pub fn read<'a>(
        &'a mut self,
        spec: &ReadSpec,
        mapper: &'a SourceRowMapper,
    ) -> Result<MappedRows<'a, C::Cursor>> {
        debug!("Executing read for {}", spec.table_name);
        let cursor = self.connector.execute(&spec.query)?;
        Ok(mapper.map_rows(cursor))
    }

    /// Close the connector now.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.connector.close();
        }
    }
}

impl<C: SourceConnector> Drop for ScopedConnector<C> {
    fn drop(&mut self) {
        self.release();
    }
}

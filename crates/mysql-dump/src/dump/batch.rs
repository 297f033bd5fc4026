//! Multi-row `INSERT` emission for the data section of one table.

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use super::DumpWriter;
use crate::codec::RowEncoder;
use crate::core::identifier::quote_ident;
use crate::core::{ColumnMeta, SqlValue};
use crate::error::Result;
use crate::source::RowSink;

/// What one data section produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTotals {
    pub rows: u64,
    pub statements: u64,
}

/// Groups encoded rows into `INSERT` statements of at most `batch_size`
/// tuples and writes them as they fill.
///
/// Rows are encoded into a scratch buffer before anything is written, so a
/// failing row leaves the output at the previous row boundary.
pub struct RowBatchEmitter<'w, W> {
    out: &'w mut DumpWriter<W>,
    encoder: RowEncoder,
    table: String,
    prefix: String,
    batch_size: usize,
    in_batch: usize,
    rows: u64,
    statements: u64,
    scratch: String,
}

impl<'w, W: AsyncWrite + Unpin + Send> RowBatchEmitter<'w, W> {
    /// Build an emitter for `table`.
    ///
    /// Fails with an unsupported-type error before anything is written if a
    /// column has no formatting rule. `batch_size < 2` emits one row per
    /// statement.
    pub fn new(
        out: &'w mut DumpWriter<W>,
        table: &str,
        columns: &[ColumnMeta],
        batch_size: usize,
    ) -> Result<Self> {
        let encoder = RowEncoder::new(table, columns)?;
        let quoted_table = quote_ident(table)?;
        let column_list = columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Result<Vec<_>>>()?
            .join(",");

        Ok(Self {
            out,
            encoder,
            prefix: format!("INSERT INTO {} ({}) VALUES ", quoted_table, column_list),
            table: quoted_table,
            batch_size: batch_size.max(1),
            in_batch: 0,
            rows: 0,
            statements: 0,
            scratch: String::new(),
        })
    }

    /// Write the `LOCK TABLES` / `DISABLE KEYS` framing.
    pub async fn begin(&mut self) -> Result<()> {
        let framing = format!(
            "LOCK TABLES {t} WRITE;\n/*!40000 ALTER TABLE {t} DISABLE KEYS */;\n",
            t = self.table
        );
        self.out.write_str(&framing).await
    }

    /// Encode and write one row.
    pub async fn push(&mut self, row: &[SqlValue<'_>]) -> Result<()> {
        self.scratch.clear();
        if self.in_batch == 0 {
            self.scratch.push_str(&self.prefix);
        } else {
            self.scratch.push(',');
        }
        self.encoder.encode_row(&mut self.scratch, row)?;

        self.in_batch += 1;
        self.rows += 1;
        if self.in_batch == self.batch_size {
            self.scratch.push_str(";\n");
            self.in_batch = 0;
            self.statements += 1;
        }
        self.out.write_str(&self.scratch).await
    }

    /// Terminate the open batch, if any, and write the closing framing.
    pub async fn finish(mut self) -> Result<BatchTotals> {
        let mut tail = String::new();
        if self.in_batch > 0 {
            tail.push_str(";\n");
            self.statements += 1;
        }
        tail.push_str(&format!(
            "/*!40000 ALTER TABLE {} ENABLE KEYS */;\nUNLOCK TABLES;\n\n",
            self.table
        ));
        self.out.write_str(&tail).await?;
        Ok(BatchTotals {
            rows: self.rows,
            statements: self.statements,
        })
    }
}

#[async_trait]
impl<'w, W: AsyncWrite + Unpin + Send> RowSink for RowBatchEmitter<'w, W> {
    async fn row(&mut self, row: Vec<SqlValue<'static>>) -> Result<()> {
        self.push(&row).await
    }
}

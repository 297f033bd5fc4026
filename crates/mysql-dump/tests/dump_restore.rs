//! Dump then restore through in-memory fakes.
//!
//! The dump side reads from a fake catalog, the restore side records what it
//! would execute; the rows recovered from the recorded INSERT statements must
//! match the rows that went in.

use std::borrow::Cow;
use std::io::Read;

use async_trait::async_trait;
use mysql_dump::codec::literal::{parse_literal, split_fields, split_tuples};
use mysql_dump::compress::compress_file;
use mysql_dump::core::{CatalogEntry, ColumnMeta, SqlValue, TriggerRecord};
use mysql_dump::restore::merge::parse_insert;
use mysql_dump::{
    CompressionLevel, DumpOptions, DumpSource, Dumper, MergeMode, RestoreOptions, Restorer,
    Result, RowSink, SqlExecutor,
};
use tokio_util::sync::CancellationToken;

struct CatalogTable {
    name: &'static str,
    table_type: &'static str,
    ddl: &'static str,
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<SqlValue<'static>>>,
}

struct ShopSource {
    tables: Vec<CatalogTable>,
    triggers: Vec<TriggerRecord>,
}

impl ShopSource {
    fn find(&self, name: &str) -> Option<&CatalogTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[async_trait]
impl DumpSource for ShopSource {
    fn host(&self) -> &str {
        "shop-db:3306"
    }

    async fn server_version(&mut self) -> Result<String> {
        Ok("8.0.36".to_string())
    }

    async fn list_databases(&mut self) -> Result<Vec<String>> {
        Ok(vec!["shop".to_string()])
    }

    async fn use_database(&mut self, _database: &str) -> Result<()> {
        Ok(())
    }

    async fn list_tables(&mut self, _database: &str) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .tables
            .iter()
            .map(|t| CatalogEntry::new(t.name, t.table_type))
            .collect())
    }

    async fn table_entry(&mut self, _database: &str, table: &str) -> Result<Option<CatalogEntry>> {
        Ok(self.find(table).map(|t| CatalogEntry::new(t.name, t.table_type)))
    }

    async fn create_table_sql(&mut self, _database: &str, table: &str) -> Result<String> {
        Ok(self.find(table).map(|t| t.ddl.to_string()).unwrap_or_default())
    }

    async fn create_view_sql(&mut self, _database: &str, view: &str) -> Result<String> {
        Ok(self.find(view).map(|t| t.ddl.to_string()).unwrap_or_default())
    }

    async fn columns(&mut self, _database: &str, table: &str) -> Result<Vec<ColumnMeta>> {
        Ok(self.find(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn read_rows(
        &mut self,
        _database: &str,
        table: &str,
        _columns: &[ColumnMeta],
        sink: &mut dyn RowSink,
    ) -> Result<u64> {
        let rows = self.find(table).map(|t| t.rows.clone()).unwrap_or_default();
        let count = rows.len() as u64;
        for row in rows {
            sink.row(row).await?;
        }
        Ok(count)
    }

    async fn list_triggers(&mut self) -> Result<Vec<TriggerRecord>> {
        Ok(self.triggers.clone())
    }
}

#[derive(Default)]
struct Recorder {
    statements: Vec<String>,
}

#[async_trait]
impl SqlExecutor for Recorder {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        self.statements.push(statement.to_string());
        Ok(())
    }
}

impl Recorder {
    fn inserts_into(&self, table: &str) -> Vec<&str> {
        let prefix = format!("INSERT INTO `{}`", table);
        self.statements
            .iter()
            .map(String::as_str)
            .filter(|s| s.starts_with(&prefix))
            .collect()
    }
}

fn text(s: &str) -> SqlValue<'static> {
    SqlValue::Bytes(Cow::Owned(s.as_bytes().to_vec()))
}

fn blob(b: &[u8]) -> SqlValue<'static> {
    SqlValue::Bytes(Cow::Owned(b.to_vec()))
}

fn product_rows() -> Vec<Vec<SqlValue<'static>>> {
    vec![
        vec![text("1"), text("it's"), text("19.90"), text("2024-01-02 03:04:05"), blob(&[0, 1, 0xFF, b'\''])],
        vec![text("2"), text("semi;colon"), text("0.00"), text("2024-02-29 00:00:00"), blob(b"")],
        vec![text("3"), text("back\\slash \"quoted\""), SqlValue::Null, text("0000-00-00 00:00:00"), SqlValue::Null],
        vec![text("4"), text("line\nbreak\ttab"), text("-5.50"), text("2024-12-31 23:59:59.123456"), blob(b"\r\n")],
        vec![text("5"), text("naïve ünïcode -- not a comment # nor this"), text("1.00"), SqlValue::Null, blob(b"\x1a\0")],
    ]
}

fn shop() -> ShopSource {
    ShopSource {
        tables: vec![
            CatalogTable {
                name: "products",
                table_type: "BASE TABLE",
                ddl: "CREATE TABLE `products` (\n  `id` int NOT NULL,\n  `label` varchar(100),\n  \
                      `price` decimal(10,2),\n  `created` datetime(6),\n  `image` blob,\n  \
                      PRIMARY KEY (`id`)\n) ENGINE=InnoDB",
                columns: vec![
                    ColumnMeta::new("id", "int"),
                    ColumnMeta::new("label", "varchar"),
                    ColumnMeta::new("price", "decimal"),
                    ColumnMeta::new("created", "datetime"),
                    ColumnMeta::new("image", "blob"),
                ],
                rows: product_rows(),
            },
            CatalogTable {
                name: "cheap_products",
                table_type: "VIEW",
                ddl: "CREATE VIEW `cheap_products` AS select `id` from `products` where `price` < 5",
                columns: Vec::new(),
                rows: Vec::new(),
            },
        ],
        triggers: vec![TriggerRecord {
            name: "stamp".to_string(),
            event: "INSERT".to_string(),
            timing: "BEFORE".to_string(),
            statement: "SET NEW.created = IFNULL(NEW.created, NOW()); ".to_string(),
            table: "products".to_string(),
            database: "shop".to_string(),
        }],
    }
}

fn dump_options(rows_per_insert: usize) -> DumpOptions {
    DumpOptions {
        databases: vec!["shop".to_string()],
        drop_objects: true,
        rows_per_insert,
        ..DumpOptions::default()
    }
}

async fn dump_text(rows_per_insert: usize) -> String {
    let mut dumper = Dumper::new(shop(), dump_options(rows_per_insert));
    let mut out = Vec::new();
    dumper.dump(&mut out, &CancellationToken::new()).await.unwrap();
    String::from_utf8(out).unwrap()
}

async fn restore(sql: &str, merge_inserts: usize, merge_mode: MergeMode) -> Recorder {
    let options = RestoreOptions {
        merge_inserts,
        merge_mode,
        ..RestoreOptions::default()
    };
    let mut restorer = Restorer::new(Recorder::default(), options);
    restorer
        .run(sql.as_bytes(), &CancellationToken::new())
        .await
        .unwrap();
    restorer.into_executor()
}

/// Decode the rows carried by a list of INSERT statements, in order.
fn decode_rows(inserts: &[&str]) -> Vec<Vec<SqlValue<'static>>> {
    let mut rows = Vec::new();
    for statement in inserts {
        let parts = parse_insert(statement).unwrap();
        for tuple in split_tuples(parts.values).unwrap() {
            let row = split_fields(tuple)
                .unwrap()
                .into_iter()
                .map(|field| parse_literal(field).unwrap().into_value())
                .collect();
            rows.push(row);
        }
    }
    rows
}

#[tokio::test]
async fn test_rows_survive_dump_and_merged_restore() {
    let sql = dump_text(2).await;
    assert_eq!(sql.matches("INSERT INTO `products`").count(), 3);

    for mode in [MergeMode::Structural, MergeMode::Splice] {
        let recorder = restore(&sql, 10, mode).await;
        let inserts = recorder.inserts_into("products");
        assert_eq!(inserts.len(), 1, "three consecutive inserts merge into one");
        assert_eq!(decode_rows(&inserts), product_rows());
    }
}

#[tokio::test]
async fn test_unmerged_restore_keeps_dump_batches() {
    let sql = dump_text(2).await;
    let recorder = restore(&sql, 1, MergeMode::Structural).await;

    let inserts = recorder.inserts_into("products");
    assert_eq!(inserts.len(), 3);
    assert_eq!(decode_rows(&inserts), product_rows());
}

#[tokio::test]
async fn test_restore_replays_structure_in_dump_order() {
    let sql = dump_text(100).await;
    let recorder = restore(&sql, 1, MergeMode::Structural).await;
    let statements: Vec<&str> = recorder.statements.iter().map(String::as_str).collect();

    let position = |needle: &str| {
        statements
            .iter()
            .position(|s| s.contains(needle))
            .unwrap_or_else(|| panic!("missing statement containing {needle:?}"))
    };

    let drop_table = position("DROP TABLE IF EXISTS `products`");
    let create_table = position("CREATE TABLE `products`");
    let lock = position("LOCK TABLES `products` WRITE");
    let insert = position("INSERT INTO `products`");
    let unlock = position("UNLOCK TABLES");
    let trigger = position("CREATE TRIGGER `stamp`");
    let view = position("CREATE VIEW `cheap_products`");
    let commit = position("COMMIT");

    assert!(drop_table < create_table);
    assert!(create_table < lock && lock < insert && insert < unlock);
    assert!(unlock < trigger);
    assert!(trigger < view);
    assert!(view < commit);

    // the trigger body was executed as one statement despite its inner `;`
    assert!(statements[trigger].contains("IFNULL(NEW.created, NOW());"));
    assert!(!statements.iter().any(|s| s.starts_with("DELIMITER")));
    assert!(!statements.iter().any(|s| s.starts_with("--")));
}

#[tokio::test]
async fn test_compressed_dump_restores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.sql");

    let mut dumper = Dumper::new(shop(), dump_options(3));
    let mut file = tokio::fs::File::create(&path).await.unwrap();
    let summary = dumper.dump(&mut file, &CancellationToken::new()).await.unwrap();
    drop(file);
    assert_eq!(summary.rows, 5);
    assert_eq!(summary.insert_statements, 2);
    assert_eq!(summary.triggers, 1);
    assert_eq!(summary.views, 1);

    let gz = compress_file(&path, CompressionLevel::Best).await.unwrap();
    assert!(!path.exists());

    let mut sql = String::new();
    flate2::read::GzDecoder::new(std::fs::File::open(&gz).unwrap())
        .read_to_string(&mut sql)
        .unwrap();
    assert_eq!(sql.len() as u64, summary.bytes);

    let recorder = restore(&sql, 5, MergeMode::Structural).await;
    assert_eq!(decode_rows(&recorder.inserts_into("products")), product_rows());
}

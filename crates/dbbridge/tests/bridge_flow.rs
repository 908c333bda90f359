//! End-to-end flow: plan a read, map driver rows, convert, dead-letter failures.

use dbbridge::source::NamedRow;
use dbbridge::telemetry::Telemetry;
use dbbridge::{
    BridgeConfig, DatabaseSchema, DeadLetterRecord, FailsafeRecord, FailsafeStage, JsonToRow,
    ReadPlanner, Result, RowToJson, RowToTargetRow, ScopedConnector, SourceConnector, SourceRow,
    SourceRowMapper, SqlValue, UnifiedTypeMapper,
};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CONFIG: &str = r#"
source:
  kind: googlesql
  name: shop
export:
  tables: "orders"
"#;

const SCHEMA: &str = r#"{
  "reference": {"name": "shop", "kind": "googlesql"},
  "tables": [
    {"name": "users", "columns": [
      {"name": "id", "raw_type": "INT64", "source_kind": "googlesql"}
    ]},
    {"name": "orders", "columns": [
      {"name": "id", "raw_type": "INT64", "source_kind": "googlesql"},
      {"name": "total", "raw_type": "NUMERIC", "source_kind": "googlesql"},
      {"name": "meta", "raw_type": "JSON", "source_kind": "googlesql"},
      {"name": "total_x2", "raw_type": "NUMERIC", "source_kind": "googlesql", "is_generated": true}
    ]}
  ]
}"#;

struct VecConnector {
    rows: Vec<NamedRow>,
    queries: Vec<String>,
}

impl SourceConnector for VecConnector {
    type Row = NamedRow;
    type Cursor = std::vec::IntoIter<NamedRow>;

    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self, query: &str) -> Result<Self::Cursor> {
        self.queries.push(query.to_string());
        Ok(std::mem::take(&mut self.rows).into_iter())
    }

    fn close(&mut self) {}
}

fn driver_rows() -> Vec<NamedRow> {
    vec![
        NamedRow::new()
            .with("id", 1i64)
            .with("total", "12.50")
            .with("meta", SqlValue::json_owned(json!({"gift": true}))),
        NamedRow::new()
            .with("id", 2i64)
            .with("total", "3")
            .with_unreadable("meta", "invalid JSON payload"),
        NamedRow::new().with("id", "oops").with("total", "1"),
    ]
}

#[test]
fn test_plan_map_convert_and_dead_letter() {
    let config = BridgeConfig::from_yaml(CONFIG).unwrap();
    let schema = DatabaseSchema::from_json(SCHEMA).unwrap();

    let reads = ReadPlanner::new(config.export_dialect().unwrap())
        .plan(&schema, &config.table_list())
        .unwrap();
    assert_eq!(reads.len(), 1);
    assert_eq!(
        reads[0].query,
        "SELECT \"orders\" AS _source_table, t.`id`,t.`total`,\
         CASE WHEN t.`meta` IS NULL THEN NULL ELSE TO_JSON_STRING(t.`meta`) END AS `meta` \
         FROM `orders` AS t"
    );

    let orders = schema.table("orders").unwrap().clone();
    let mapper = SourceRowMapper::new(config.schema_reference().unwrap(), orders.clone());
    let connector = VecConnector {
        rows: driver_rows(),
        queries: Vec::new(),
    };

    let mapped: Vec<SourceRow> = {
        let mut scoped = ScopedConnector::open(connector).unwrap();
        let rows = scoped.read(&reads[0], &mapper).unwrap().collect();
        scoped.close();
        rows
    };
    assert_eq!(mapped.len(), 3);
    assert_eq!(mapped[1].get("meta"), Some(SqlValue::Null));
    assert_eq!(mapped[1].diagnostics()[0].field, "meta");
    assert_eq!(mapped[2].diagnostics()[0].reason, "column absent from row");

    let to_target = FailsafeStage::new(RowToTargetRow::new(orders, &UnifiedTypeMapper::with_builtins()));
    let to_json = FailsafeStage::new(RowToJson);
    let mut telemetry = Telemetry::new();
    telemetry.track(&to_target);
    telemetry.track(&to_json);

    let target = to_target.process_all(mapped.into_iter().map(FailsafeRecord::of));
    let rendered = to_json.process_all(target.successes);

    let lines: Vec<serde_json::Value> = rendered
        .successes
        .iter()
        .map(|r| serde_json::from_str(r.payload()).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            json!({"id": 1, "total": "12.50", "meta": {"gift": true}}),
            json!({"id": 2, "total": "3", "meta": null}),
        ]
    );

    assert_eq!(target.failures.len(), 1);
    let dlq = DeadLetterRecord::from_failure(&target.failures[0], to_target.name(), true).unwrap();
    assert_eq!(dlq.original, r#"{"id":"oops","total":"1","meta":null}"#);
    assert_eq!(dlq.stage, "row_to_target_row");
    assert!(dlq.error_message.contains("'id'"));
    assert!(dlq.stacktrace.is_some());

    let snapshot = telemetry.snapshot(&[&mapper]);
    assert_eq!(snapshot.rows_mapped, 3);
    assert_eq!(snapshot.degraded_fields, 2);
    assert_eq!(snapshot.total_failed(), 1);
}

#[test]
fn test_cdc_documents_keep_original_line_on_failure() {
    let config = BridgeConfig::from_yaml(CONFIG).unwrap();
    let schema = DatabaseSchema::from_json(SCHEMA).unwrap();
    let orders = schema.table("orders").unwrap().clone();

    let parse = FailsafeStage::new(JsonToRow::new(config.schema_reference().unwrap(), "unknown"));
    let coerce = FailsafeStage::new(RowToTargetRow::new(orders, &UnifiedTypeMapper::with_builtins()));

    let lines = vec![
        r#"{"_metadata_table":"orders","id":"7","total":"1.5"}"#.to_string(),
        "{not json".to_string(),
        r#"{"_metadata_table":"orders","id":"7.5"}"#.to_string(),
    ];

    let parsed = parse.process_all(lines.into_iter().map(FailsafeRecord::of));
    assert_eq!(parsed.failures.len(), 1);
    assert_eq!(parsed.failures[0].original(), "{not json");

    let coerced = coerce.process_all(parsed.successes);
    assert_eq!(coerced.successes.len(), 1);
    let row = coerced.successes[0].payload();
    assert_eq!(row.table_name(), "orders");
    assert_eq!(row.get("id"), Some(SqlValue::I64(7)));

    assert_eq!(coerced.failures.len(), 1);
    assert_eq!(
        coerced.failures[0].original(),
        r#"{"_metadata_table":"orders","id":"7.5"}"#
    );

    let dead: Vec<DeadLetterRecord> = parsed
        .failures
        .iter()
        .filter_map(|r| DeadLetterRecord::from_failure(r, parse.name(), false))
        .chain(
            coerced
                .failures
                .iter()
                .filter_map(|r| DeadLetterRecord::from_failure(r, coerce.name(), false)),
        )
        .collect();
    assert_eq!(dead.len(), 2);
    assert_eq!(dead[0].stage, "json_to_row");
    assert_eq!(dead[1].stage, "row_to_target_row");
    assert!(dead.iter().all(|d| d.stacktrace.is_none()));
}

#[tokio::test]
async fn test_stages_over_channels() {
    let config = BridgeConfig::from_yaml(CONFIG).unwrap();
    let parse = FailsafeStage::new(JsonToRow::new(config.schema_reference().unwrap(), "orders"));

    let (in_tx, in_rx) = mpsc::channel(4);
    let (ok_tx, mut ok_rx) = mpsc::channel(4);
    let (err_tx, mut err_rx) = mpsc::channel(4);

    let feeder = tokio::spawn(async move {
        for line in [r#"{"id":1}"#, "[]", r#"{"id":2}"#] {
            in_tx.send(FailsafeRecord::of(line.to_string())).await.unwrap();
        }
    });

    let counts = parse.run(in_rx, ok_tx, err_tx, CancellationToken::new()).await;
    feeder.await.unwrap();
    assert_eq!(counts.success, 2);
    assert_eq!(counts.failed, 1);

    let mut ids = Vec::new();
    while let Some(rec) = ok_rx.recv().await {
        ids.push(rec.payload().get("id").map(SqlValue::into_owned));
    }
    assert_eq!(ids, vec![Some(SqlValue::I64(1)), Some(SqlValue::I64(2))]);

    match err_rx.recv().await {
        Some(rec) => {
            assert_eq!(rec.original(), "[]");
            assert!(rec.error().unwrap().message.contains("expected a JSON object"));
        }
        None => panic!("expected one failed record"),
    }
}

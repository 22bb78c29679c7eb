//! Builder tests against an in-memory client.

use super::*;
use crate::client::GenericClient;
use crate::config::IdCap;
use crate::error::{OrmError, OrmResult};
use crate::processor::{DbMakerProcessor, FetchMode};
use crate::grammar::DbMakerGrammar;
use crate::row::{Row, RowSet};
use crate::value::Value;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&str, &[Value]) -> Vec<Row> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Query { sql: String, params: Vec<Value> },
    Select { sql: String, params: Vec<Value>, use_read: bool },
    Execute { sql: String, params: Vec<Value> },
}

impl Call {
    fn sql(&self) -> &str {
        match self {
            Call::Query { sql, .. } | Call::Select { sql, .. } | Call::Execute { sql, .. } => sql,
        }
    }
}

struct MockClient {
    id_cap: IdCap,
    responder: Responder,
    calls: Mutex<Vec<Call>>,
}

impl MockClient {
    fn new() -> Self {
        Self::responding(|_, _| Vec::new())
    }

    fn responding(f: impl Fn(&str, &[Value]) -> Vec<Row> + Send + Sync + 'static) -> Self {
        Self {
            id_cap: IdCap::On,
            responder: Box::new(f),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_id_cap(mut self, cap: IdCap) -> Self {
        self.id_cap = cap;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn selects(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Select { .. }))
            .count()
    }
}

impl GenericClient for MockClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.calls.lock().unwrap().push(Call::Query {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok((self.responder)(sql, params))
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.calls.lock().unwrap().push(Call::Execute {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(1)
    }

    async fn select(&self, sql: &str, params: &[Value], use_read_connection: bool) -> OrmResult<Vec<Row>> {
        self.calls.lock().unwrap().push(Call::Select {
            sql: sql.to_string(),
            params: params.to_vec(),
            use_read: use_read_connection,
        });
        Ok((self.responder)(sql, params))
    }

    fn id_cap(&self) -> IdCap {
        self.id_cap
    }
}

/// A table of `rows` rows with IDs `1..=rows`, paged by `ID > ?` and `LIMIT n`.
fn id_table(rows: i64) -> MockClient {
    MockClient::responding(move |sql, params| {
        let after = if sql.contains("ID > ?") {
            params.last().and_then(Value::as_i64).unwrap_or(0)
        } else {
            0
        };
        let limit: usize = sql
            .rsplit("LIMIT ")
            .next()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(usize::MAX);
        (after + 1..=rows)
            .take(limit)
            .map(|id| Row::from_pairs([("ID", Value::Int(id)), ("LAST_KEY", Value::Int(id))]))
            .collect()
    })
}

fn ids(page: &RowSet) -> Vec<i64> {
    page.clone()
        .into_rows()
        .iter()
        .map(|r| r.try_get::<i64>("ID").unwrap())
        .collect()
}

// ==================== construction ====================

#[test]
fn builder_reads_id_cap_once() {
    let client = MockClient::new().with_id_cap(IdCap::Off);
    let users = Builder::new(&client, "USERS");
    assert_eq!(users.id_cap(), IdCap::Off);
    assert_eq!(Builder::new(&MockClient::new(), "USERS").id_cap(), IdCap::On);
}

#[test]
fn generic_surface_compiles() {
    let client = MockClient::new();
    let q = table(&client, "USERS")
        .select(["ID", "NAME"])
        .where_eq("STATUS", "active")
        .where_ne("ROLE", "guest")
        .where_gte("AGE", 18)
        .where_lt("AGE", 65)
        .where_in("DEPT", [1, 2])
        .where_not_null("EMAIL")
        .where_raw("SCORE > ? + 1", [10])
        .order_by_desc("ID")
        .limit(10)
        .offset(20);
    assert_eq!(
        q.to_sql(),
        "SELECT ID, NAME FROM USERS WHERE STATUS = ? AND ROLE <> ? AND AGE >= ? AND AGE < ? \
         AND DEPT IN (?, ?) AND EMAIL IS NOT NULL AND SCORE > ? + 1 ORDER BY ID DESC LIMIT 10 OFFSET 20"
    );
    assert_eq!(q.bindings().len(), 7);
}

// ==================== insert ====================

#[tokio::test]
async fn insert_sorts_keys_of_every_batch_row() {
    let client = MockClient::new();
    let ok = Builder::new(&client, "USERS")
        .insert(vec![
            InsertRow::new().set("name", "b").set("id", 2),
            InsertRow::new().set("id", 1).set("name", "a"),
        ])
        .await
        .unwrap();
    assert!(ok);
    assert_eq!(
        client.calls(),
        vec![Call::Execute {
            sql: "INSERT INTO USERS (id, name) VALUES (?, ?), (?, ?)".into(),
            params: vec![
                Value::Int(2),
                Value::from("b"),
                Value::Int(1),
                Value::from("a"),
            ],
        }]
    );
}

#[tokio::test]
async fn insert_single_row_keeps_order() {
    let client = MockClient::new();
    Builder::new(&client, "USERS")
        .insert(InsertRow::new().set("NAME", "a").set("ID", 1))
        .await
        .unwrap();
    assert_eq!(
        client.calls()[0].sql(),
        "INSERT INTO USERS (NAME, ID) VALUES (?, ?)"
    );
}

#[tokio::test]
async fn empty_insert_touches_nothing() {
    let client = MockClient::new();
    let users = Builder::new(&client, "USERS");
    assert!(users.insert(Vec::<InsertRow>::new()).await.unwrap());
    assert!(users.insert(InsertRow::new()).await.unwrap());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn insert_strips_raw_values_from_bindings() {
    let client = MockClient::new();
    Builder::new(&client, "LOGS")
        .insert(vec![
            InsertRow::new()
                .set("AT", Value::raw("CURRENT_TIMESTAMP"))
                .set("MSG", "x"),
        ])
        .await
        .unwrap();
    assert_eq!(
        client.calls(),
        vec![Call::Execute {
            sql: "INSERT INTO LOGS (AT, MSG) VALUES (CURRENT_TIMESTAMP, ?)".into(),
            params: vec![Value::from("x")],
        }]
    );
}

#[tokio::test]
async fn malformed_batch_is_an_execution_error() {
    let client = MockClient::new();
    let err = Builder::new(&client, "USERS")
        .insert(vec![
            InsertRow::new().set("ID", 1),
            InsertRow::new().set("NAME", "x"),
        ])
        .await
        .unwrap_err();
    assert!(err.is_execution());
    assert!(client.calls().is_empty());
}

// ==================== insert_get_id ====================

#[tokio::test]
async fn insert_get_id_reads_last_serial() {
    let client = MockClient::responding(|sql, _| {
        if sql == "SELECT LAST_SERIAL FROM SYSCONINFO" {
            vec![Row::from_pairs([("LAST_SERIAL", 42)])]
        } else {
            Vec::new()
        }
    });
    let id = Builder::new(&client, "USERS")
        .insert_get_id(InsertRow::new().set("NAME", "a"), None)
        .await
        .unwrap();
    assert_eq!(id, 42);

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        Call::Execute {
            sql: "INSERT INTO USERS (NAME) VALUES (?)".into(),
            params: vec![Value::from("a")],
        }
    );
    assert_eq!(calls[1].sql(), "SELECT LAST_SERIAL FROM SYSCONINFO");
}

#[tokio::test]
async fn insert_get_id_with_sequence() {
    let client = MockClient::responding(|sql, _| {
        if sql.contains("CURRVAL") {
            vec![Row::from_pairs([("CURRVAL", Value::from("7"))])]
        } else {
            Vec::new()
        }
    });
    let id = Builder::new(&client, "ORDERS")
        .insert_get_id(InsertRow::new().set("TOTAL", 10), Some("ORDER_SEQ"))
        .await
        .unwrap();
    assert_eq!(id, 7);
    assert_eq!(client.calls()[1].sql(), "SELECT ORDER_SEQ.CURRVAL FROM SYSCONINFO");
}

#[tokio::test]
async fn insert_get_id_without_key_is_a_processor_error() {
    let client = MockClient::new();
    let err = Builder::new(&client, "USERS")
        .insert_get_id(InsertRow::new().set("NAME", "a"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Processor(_)));
}

#[tokio::test]
async fn insert_get_id_requires_columns() {
    let client = MockClient::new();
    let err = Builder::new(&client, "USERS")
        .insert_get_id(InsertRow::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

// ==================== exists ====================

#[tokio::test]
async fn exists_is_false_without_rows() {
    let client = MockClient::new();
    let users = Builder::new(&client, "USERS").where_eq("ID", 1);
    assert!(!users.exists().await.unwrap());
    assert_eq!(
        client.calls(),
        vec![Call::Select {
            sql: "SELECT 1 FROM USERS WHERE ID = ? LIMIT 1".into(),
            params: vec![Value::Int(1)],
            use_read: true,
        }]
    );
}

#[tokio::test]
async fn exists_uses_first_column_of_first_row() {
    let yes = MockClient::responding(|_, _| vec![Row::from_pairs([("1", 1)])]);
    assert!(Builder::new(&yes, "USERS").exists().await.unwrap());

    let no = MockClient::responding(|_, _| vec![Row::from_pairs([("1", 0)]), Row::from_pairs([("1", 1)])]);
    assert!(!Builder::new(&no, "USERS").exists().await.unwrap());
}

#[tokio::test]
async fn exists_reads_record_shaped_results() {
    let client = MockClient::responding(|_, _| vec![Row::from_pairs([("1", 1)])]);
    let records = Builder::with_parts(
        &client,
        "USERS",
        DbMakerGrammar,
        DbMakerProcessor::new().fetch_mode(FetchMode::Records),
    );
    assert!(records.exists().await.unwrap());
}

#[tokio::test]
async fn exists_honors_write_connection_flag() {
    let client = MockClient::new();
    Builder::new(&client, "USERS")
        .use_write_connection()
        .exists()
        .await
        .unwrap();
    assert!(matches!(client.calls()[0], Call::Select { use_read: false, .. }));
}

// ==================== chunk_by_id ====================

#[tokio::test]
async fn chunk_invokes_callback_ceil_m_over_n_times() {
    for (m, n) in [(0_i64, 3_u64), (1, 5), (7, 3), (10, 4), (5, 1), (9, 3)] {
        let client = id_table(m);
        let users = Builder::new(&client, "USERS");
        let mut pages = 0;
        let mut last_seen = None;

        let outcome = users
            .chunk_by_id(n, |page| {
                pages += 1;
                last_seen = ids(&page).last().copied();
            })
            .await
            .unwrap();

        assert_eq!(outcome, ChunkOutcome::Completed);
        let expected = (m as u64).div_ceil(n);
        assert_eq!(pages, expected, "m={m} n={n}");
        assert_eq!(last_seen, (m > 0).then_some(m), "m={m} n={n}");
    }
}

#[tokio::test]
async fn chunk_pages_are_disjoint_and_ordered() {
    let client = id_table(7);
    let mut seen = Vec::new();
    Builder::new(&client, "USERS")
        .chunk_by_id(3, |page| seen.extend(ids(&page)))
        .await
        .unwrap();
    assert_eq!(seen, (1..=7).collect::<Vec<_>>());
}

#[tokio::test]
async fn chunk_upper_cases_column_and_isolates_pages() {
    let client = id_table(4);
    let users = Builder::new(&client, "USERS");
    users.chunk_by_id_with(3, "id", None, |_| true).await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].sql(), "SELECT * FROM USERS ORDER BY ID ASC LIMIT 3");
    assert_eq!(
        calls[1],
        Call::Select {
            sql: "SELECT * FROM USERS WHERE ID > ? ORDER BY ID ASC LIMIT 3".into(),
            params: vec![Value::Int(3)],
            use_read: true,
        }
    );
    // paging never leaks into the builder
    assert_eq!(users.to_sql(), "SELECT * FROM USERS");
}

#[tokio::test]
async fn chunk_replaces_caller_ordering_on_folded_column() {
    let client = id_table(5);
    let mut seen = Vec::new();
    Builder::new(&client, "USERS")
        .order_by_desc("id")
        .chunk_by_id(2, |page| seen.extend(ids(&page)))
        .await
        .unwrap();

    assert_eq!(seen, (1..=5).collect::<Vec<_>>());
    let calls = client.calls();
    assert_eq!(
        calls[0].sql(),
        "SELECT * FROM USERS ORDER BY ID ASC LIMIT 2"
    );
    assert_eq!(
        calls[1].sql(),
        "SELECT * FROM USERS WHERE ID > ? ORDER BY ID ASC LIMIT 2"
    );
}

#[tokio::test]
async fn chunk_keeps_differently_cased_ordering_without_folding() {
    let client = id_table(1).with_id_cap(IdCap::Off);
    Builder::new(&client, "USERS")
        .order_by_desc("id")
        .chunk_by_id(2, |_| ())
        .await
        .unwrap();
    assert_eq!(
        client.calls()[0].sql(),
        "SELECT * FROM USERS ORDER BY id DESC, ID ASC LIMIT 2"
    );
}

#[tokio::test]
async fn chunk_stops_when_callback_says_so() {
    let client = id_table(10);
    let mut pages = 0;
    let outcome = Builder::new(&client, "USERS")
        .chunk_by_id(2, |_| {
            pages += 1;
            pages < 2
        })
        .await
        .unwrap();
    assert_eq!(outcome, ChunkOutcome::Stopped);
    assert_eq!(pages, 2);
    assert_eq!(client.selects(), 2);
}

#[tokio::test]
async fn chunk_reads_cursor_from_alias() {
    let client = id_table(5);
    let mut pages = 0;
    Builder::new(&client, "USERS")
        .chunk_by_id_with(2, "id", Some("LAST_KEY"), |_| pages += 1)
        .await
        .unwrap();
    assert_eq!(pages, 3);
}

#[tokio::test]
async fn chunk_with_missing_alias_on_full_page_fails() {
    let client = id_table(5);
    let err = Builder::new(&client, "USERS")
        .chunk_by_id_with(2, "id", Some("NOPE"), |_| ())
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Decode { .. }));
}

#[tokio::test]
async fn chunk_keeps_existing_predicates() {
    let client = id_table(3);
    Builder::new(&client, "USERS")
        .where_eq("ACTIVE", 1)
        .chunk_by_id(2, |_| ())
        .await
        .unwrap();
    assert_eq!(
        client.calls()[1],
        Call::Select {
            sql: "SELECT * FROM USERS WHERE ACTIVE = ? AND ID > ? ORDER BY ID ASC LIMIT 2".into(),
            params: vec![Value::Int(1), Value::Int(2)],
            use_read: true,
        }
    );
}

#[tokio::test]
async fn chunk_rejects_zero_page_size() {
    let client = id_table(3);
    let err = Builder::new(&client, "USERS")
        .chunk_by_id(0, |_| ())
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
    assert!(client.calls().is_empty());
}

// ==================== pluck ====================

fn people() -> MockClient {
    MockClient::responding(|_, _| {
        vec![
            Row::from_pairs([("NAME", Value::from("a")), ("ID", Value::Int(1))]),
            Row::from_pairs([("NAME", Value::from("b")), ("ID", Value::Int(2))]),
            Row::from_pairs([("NAME", Value::from("c")), ("ID", Value::Int(1))]),
        ]
    })
}

#[tokio::test]
async fn pluck_values_in_row_order() {
    let client = people();
    let users = Builder::new(&client, "USERS").select(["ID", "NAME", "EMAIL"]);
    let names = users.pluck("users.name", None).await.unwrap();
    assert_eq!(
        names,
        Plucked::Values(vec![Value::from("a"), Value::from("b"), Value::from("c")])
    );
    assert_eq!(client.calls()[0].sql(), "SELECT users.name FROM USERS");
    // own column list untouched
    assert_eq!(users.snapshot().columns().len(), 3);
}

#[tokio::test]
async fn pluck_keyed_last_row_wins() {
    let client = people();
    let plucked = Builder::new(&client, "USERS")
        .pluck("NAME", Some("ID"))
        .await
        .unwrap();
    let keyed = plucked.as_keyed().unwrap();
    assert_eq!(keyed.len(), 2);
    assert_eq!(keyed.get(&Value::Int(1)), Some(&Value::from("c")));
    assert_eq!(keyed.get(&Value::Int(2)), Some(&Value::from("b")));
    assert_eq!(
        client.calls()[0].sql(),
        "SELECT NAME, ID FROM USERS"
    );
}

#[tokio::test]
async fn pluck_object_rows_match_array_rows() {
    let client = people();
    let arrays = Builder::new(&client, "USERS")
        .pluck("NAME", Some("ID"))
        .await
        .unwrap();
    let records = Builder::with_parts(
        &client,
        "USERS",
        DbMakerGrammar,
        DbMakerProcessor::new().fetch_mode(FetchMode::Records),
    )
    .pluck("NAME", Some("ID"))
    .await
    .unwrap();
    assert_eq!(arrays, records);
}

#[tokio::test]
async fn pluck_lookup_follows_id_cap() {
    let folded = people();
    let values = Builder::new(&folded, "USERS")
        .pluck("name", None)
        .await
        .unwrap();
    assert_eq!(values.into_values()[0], Value::from("a"));

    let exact = people().with_id_cap(IdCap::Off);
    let values = Builder::new(&exact, "USERS")
        .pluck("name", None)
        .await
        .unwrap();
    assert_eq!(values.into_values()[0], Value::Null);
}

#[tokio::test]
async fn pluck_of_nothing_is_empty() {
    let client = MockClient::new();
    let users = Builder::new(&client, "USERS");
    assert_eq!(
        users.pluck("NAME", None).await.unwrap(),
        Plucked::Values(Vec::new())
    );
    let keyed = users.pluck("NAME", Some("ID")).await.unwrap();
    assert!(keyed.is_empty());
    assert!(keyed.as_keyed().is_some());
}

// ==================== find / first / get ====================

#[tokio::test]
async fn find_returns_row_or_none() {
    let client = MockClient::responding(|_, params| {
        if params == [Value::Int(5)] {
            vec![Row::from_pairs([("ID", 5)])]
        } else {
            Vec::new()
        }
    });
    let users = Builder::new(&client, "USERS");

    let found = users.find(5, &["*"]).await.unwrap().unwrap();
    assert_eq!(ids(&found), vec![5]);
    assert_eq!(
        client.calls()[0].sql(),
        "SELECT * FROM USERS WHERE id = ? LIMIT 1"
    );

    assert!(users.find(6, &["*"]).await.unwrap().is_none());
}

#[tokio::test]
async fn find_with_columns() {
    let client = MockClient::new();
    Builder::new(&client, "USERS")
        .find(1, &["ID", "NAME"])
        .await
        .unwrap();
    assert_eq!(
        client.calls()[0].sql(),
        "SELECT ID, NAME FROM USERS WHERE id = ? LIMIT 1"
    );
}

#[tokio::test]
async fn first_and_get() {
    let client = id_table(3);
    let users = Builder::new(&client, "USERS");
    assert_eq!(users.get().await.unwrap().len(), 3);
    let first = users.first(&["*"]).await.unwrap().unwrap();
    assert_eq!(ids(&first), vec![1]);
}

// ==================== in_random_order ====================

#[test]
fn in_random_order_leaves_sql_unchanged() {
    let client = MockClient::new();
    let users = Builder::new(&client, "USERS").where_eq("ID", 1).order_by("NAME");
    let before = users.to_sql();
    let users = users.in_random_order("");
    assert_eq!(users.to_sql(), before);
    assert_eq!(
        users.unsupported(),
        &[Unsupported::RandomOrder {
            seed: String::new()
        }]
    );
}

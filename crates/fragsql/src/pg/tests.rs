use super::placeholder::{Segment, Template};
use super::*;
use crate::engine::{Dialect, QueryEngine, QueryHandle};
use crate::param::{IntoParam, Param};

fn named(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn placeholder_names(text: &str) -> Vec<String> {
    Template::parse(text)
        .unwrap()
        .segments()
        .iter()
        .filter_map(|seg| match seg {
            Segment::Named(n) => Some(n.clone()),
            Segment::Raw(_) => None,
        })
        .collect()
}

#[test]
fn finds_named_placeholders() {
    assert_eq!(
        placeholder_names("select * from t where a = :a and b in (:b_list)"),
        named(&["a", "b_list"])
    );
}

#[test]
fn skips_casts_literals_and_comments() {
    let text = "select ':x', \"col:y\", a::text -- :z\n /* :w */ from t where c = :c";
    assert_eq!(placeholder_names(text), named(&["c"]));
}

#[test]
fn skips_dollar_quoted_bodies() {
    let text = "select $$ :a $$, $fn$ :b $fn$ where x = :x";
    assert_eq!(placeholder_names(text), named(&["x"]));
}

#[test]
fn doubled_quote_is_escaped() {
    assert_eq!(
        placeholder_names("select 'it''s :not' where x = :x"),
        named(&["x"])
    );
}

#[test]
fn colon_without_identifier_is_raw() {
    assert!(placeholder_names("select arr[1:2], ': ' from t").is_empty());
}

#[test]
fn unterminated_literal_fails_to_compile() {
    let err = Template::parse("select 'oops").unwrap_err();
    assert!(err.is_compilation());
    let err = Template::parse("select 1 /* never closed").unwrap_err();
    assert!(err.is_compilation());
    let err = Template::parse("select $body$ never closed").unwrap_err();
    assert!(err.is_compilation());
}

#[test]
fn positional_placeholders_are_rejected() {
    let err = Template::parse("select * from t where id = $1").unwrap_err();
    assert!(err.is_compilation());
    assert!(err.to_string().contains("$1"));
}

#[test]
fn dollar_inside_identifier_is_raw() {
    assert_eq!(placeholder_names("select col$1 from t where a = :a"), named(&["a"]));
}

#[test]
fn managed_expands_collections() {
    let q = PgEngine::new()
        .compile_managed("select * from t where id in (:ids) and k = :k")
        .unwrap()
        .bind("ids", vec![10_i64, 20, 30].into_param())
        .unwrap()
        .bind("k", "x".into_param())
        .unwrap();

    assert_eq!(
        q.to_sql().unwrap(),
        "select * from t where id in ($1, $2, $3) and k = $4"
    );
    assert_eq!(q.params_ref().unwrap().len(), 4);
    assert_eq!(q.dialect(), Dialect::Managed);
}

#[test]
fn managed_empty_collection_renders_null() {
    let q = PgEngine::new()
        .compile_managed("select * from t where id in (:ids)")
        .unwrap()
        .bind("ids", Vec::<i64>::new().into_param())
        .unwrap();

    assert_eq!(q.to_sql().unwrap(), "select * from t where id in (NULL)");
    assert!(q.params_ref().unwrap().is_empty());
}

#[test]
fn native_sends_collections_as_arrays() {
    let q = PgEngine::new()
        .compile_native("select * from t where id = any(:ids)")
        .unwrap()
        .bind("ids", vec![1_i32, 2].into_param())
        .unwrap();

    assert_eq!(q.to_sql().unwrap(), "select * from t where id = any($1)");
    let params = q.params_ref().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(format!("{:?}", params[0]), "[1, 2]");
}

#[test]
fn repeated_placeholder_reuses_position() {
    let q = PgEngine::new()
        .compile_managed("select :a, :b, :a")
        .unwrap()
        .bind("a", 1_i32.into_param())
        .unwrap()
        .bind("b", 2_i32.into_param())
        .unwrap();

    assert_eq!(q.to_sql().unwrap(), "select $1, $2, $1");
    assert_eq!(q.params_ref().unwrap().len(), 2);
    assert_eq!(q.placeholders(), vec!["a", "b"]);
}

#[test]
fn null_binds_a_single_placeholder() {
    let q = PgEngine::new()
        .compile_managed("update t set note = :note")
        .unwrap()
        .bind("note", None::<String>.into_param())
        .unwrap();

    assert_eq!(q.to_sql().unwrap(), "update t set note = $1");
    assert_eq!(format!("{:?}", q.params_ref().unwrap()[0]), "None");
}

#[test]
fn binding_unknown_name_fails() {
    let err = PgEngine::new()
        .compile_managed("select * from t where a = :a")
        .unwrap()
        .bind("b", 1_i32.into_param())
        .unwrap_err();

    assert!(err.is_unknown_parameter());
    assert_eq!(err.to_string(), "Unknown parameter: b");
}

#[test]
fn missing_binding_fails_at_render() {
    let q = PgEngine::new()
        .compile_managed("select * from t where a = :a")
        .unwrap();

    let err = q.to_sql().unwrap_err();
    assert!(matches!(err, crate::FragError::UnboundParameter(ref n) if n == "a"));
}

#[test]
fn detached_binding_is_retained_not_sent() {
    let q = PgEngine::new()
        .compile_managed("select * from t where 1 = 0")
        .unwrap()
        .bind_detached("ids", Vec::<i32>::new().into_param())
        .unwrap();

    assert!(q.param("ids").is_none());
    assert!(q.retained("ids").is_some_and(Param::is_absent));
    assert_eq!(q.to_sql().unwrap(), "select * from t where 1 = 0");
    assert!(q.params_ref().unwrap().is_empty());
}

#[test]
fn detached_binding_with_placeholder_is_bound() {
    let q = PgEngine::new()
        .compile_managed("select :ids")
        .unwrap()
        .bind_detached("ids", Vec::<i32>::new().into_param())
        .unwrap();

    assert!(q.param("ids").is_some());
    assert!(q.retained("ids").is_none());
}

#[test]
fn truncate_respects_char_boundaries() {
    assert_eq!(truncate_sql_bytes("select", 10), "select");
    assert_eq!(truncate_sql_bytes("select", 3), "sel");
    assert_eq!(truncate_sql_bytes("héllo", 2), "h");
}

#[test]
fn engine_config_builder_and_serde() {
    let config = EngineConfig::new()
        .query_timeout(std::time::Duration::from_secs(5))
        .log_sql(false)
        .no_truncate();
    assert_eq!(config.query_timeout, Some(std::time::Duration::from_secs(5)));
    assert!(!config.log_sql);
    assert_eq!(config.max_sql_length, None);

    let config: EngineConfig = serde_json::from_str(r#"{"max_sql_length": 80}"#).unwrap();
    assert!(config.log_sql);
    assert_eq!(config.max_sql_length, Some(80));
    assert_eq!(config.query_timeout, None);

    let engine = PgEngine::with_config(config.max_sql_length(40));
    assert_eq!(engine.config().max_sql_length, Some(40));
}

#[test]
fn escape_string_backslash_quote_stays_inside_literal() {
    assert_eq!(
        placeholder_names(r"select E'it\'s :no' where a = :a"),
        named(&["a"])
    );
    assert_eq!(
        placeholder_names(r"select e'a\\' , :b"),
        named(&["b"])
    );

    let q = PgEngine::new()
        .compile_native(r"select E'it\'s' where a = :a")
        .unwrap()
        .bind("a", 1_i32.into_param())
        .unwrap();
    assert_eq!(q.to_sql().unwrap(), r"select E'it\'s' where a = $1");
}

#[test]
fn backslash_is_literal_in_standard_strings() {
    // `name'...'` is not an escape string; `\` does not escape there
    assert_eq!(
        placeholder_names(r"select 'a\', :b, name'x'"),
        named(&["b"])
    );
}

#[test]
fn sql_for_log_truncates_only_past_limit() {
    assert_eq!(sql_for_log("select 1", Some(8)), "select 1");
    assert_eq!(sql_for_log("select 1", Some(3)), "sel...");
    assert_eq!(sql_for_log("select 1", None), "select 1");
    assert_eq!(sql_for_log("héllo", Some(2)), "h...");
}

/// Client whose queries never finish before `delay`.
struct SlowClient {
    delay: std::time::Duration,
}

impl GenericClient for SlowClient {
    async fn query(
        &self,
        _sql: &str,
        _params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> crate::FragResult<Vec<tokio_postgres::Row>> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn execute(
        &self,
        _sql: &str,
        _params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> crate::FragResult<u64> {
        tokio::time::sleep(self.delay).await;
        Ok(0)
    }
}

#[tokio::test]
async fn query_timeout_is_reported() {
    let engine = PgEngine::with_config(
        EngineConfig::new().query_timeout(std::time::Duration::from_millis(10)),
    );
    let client = SlowClient {
        delay: std::time::Duration::from_secs(5),
    };
    let q = engine
        .compile_managed("select * from t where a = :a")
        .unwrap()
        .bind("a", 1_i32.into_param())
        .unwrap();

    let err = q.fetch_all(&client).await.unwrap_err();
    assert!(err.is_timeout());
    let err = q.execute(&client).await.unwrap_err();
    assert!(matches!(
        err,
        crate::FragError::Timeout(d) if d == std::time::Duration::from_millis(10)
    ));
}

#[tokio::test]
async fn without_timeout_slow_query_completes() {
    let client = SlowClient {
        delay: std::time::Duration::from_millis(5),
    };
    let rows = PgEngine::new()
        .compile_native("select 1")
        .unwrap()
        .fetch_all(&client)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn malformed_sql_compiles_without_syntax_check() {
    let q = PgEngine::new()
        .compile_managed("selec * frm t where a = :a")
        .unwrap()
        .bind("a", 1_i32.into_param())
        .unwrap();
    assert_eq!(q.to_sql().unwrap(), "selec * frm t where a = $1");
}

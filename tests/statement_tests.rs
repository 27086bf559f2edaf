use pgaccess::db::{build_insert, PlaceholderStyle, StatementError, Value};

#[test]
fn test_thing_insert_scenario() {
    let stmt = build_insert("thing", &["code", "name"], [Value::Integer(123), "alpha".into()]).unwrap();

    assert_eq!(
        stmt.sql(PlaceholderStyle::Format),
        "INSERT INTO thing (code,name) VALUES (%s,%s);"
    );
    assert_eq!(
        stmt.sql(PlaceholderStyle::Numbered),
        "INSERT INTO thing (code,name) VALUES ($1,$2);"
    );
    assert_eq!(
        stmt.into_params(),
        vec![Value::Integer(123), Value::String("alpha".to_string())]
    );
}

#[test]
fn test_columns_keep_input_order() {
    let columns = ["zeta", "alpha", "mid"];
    let stmt = build_insert("t", &columns, [Value::Null, true.into(), 2.5.into()]).unwrap();

    assert_eq!(stmt.columns(), &["zeta", "alpha", "mid"]);
    assert_eq!(
        stmt.sql(PlaceholderStyle::Numbered),
        "INSERT INTO t (zeta,alpha,mid) VALUES ($1,$2,$3);"
    );
    assert_eq!(stmt.params()[0], Value::Null);
    assert_eq!(stmt.params()[2], Value::Float(2.5));
}

#[test]
fn test_numbered_placeholders_are_sequential() {
    let columns: Vec<String> = (1..=20).map(|i| format!("col_{}", i)).collect();
    let stmt = build_insert("wide", &columns, 1..=20i64).unwrap();
    let sql = stmt.sql(PlaceholderStyle::Numbered);

    let expected: Vec<String> = (1..=20).map(|i| format!("${}", i)).collect();
    assert!(sql.ends_with(&format!("VALUES ({});", expected.join(","))));
}

#[test]
fn test_mismatch_rejected_before_driver() {
    let err = build_insert("thing", &["code", "name"], [Value::Integer(1)]).unwrap_err();
    assert_eq!(err, StatementError::ArityMismatch { columns: 2, values: 1 });
    assert_eq!(err.to_string(), "Got 1 values for 2 columns");
}

#[test]
fn test_optional_values_become_null() {
    let values: Vec<Value> = vec![Some(7i64).into(), None::<i64>.into()];
    let stmt = build_insert("thing", &["code", "name"], values).unwrap();
    assert_eq!(stmt.params(), &[Value::Integer(7), Value::Null]);
}

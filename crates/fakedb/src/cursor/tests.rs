use super::*;
use serde_json::json;

fn cursor(rows: Vec<Value>) -> ResultSet {
    ResultSet::new("SELECT * FROM test", FakeResult::with_rows(rows).unwrap())
}

fn three_rows() -> ResultSet {
    cursor(vec![
        json!({"id": 30, "name": "a"}),
        json!({"id": 10, "name": "b"}),
        json!({"id": 20, "name": "c"}),
    ])
}

#[test]
fn test_fetch_assoc_single_row() {
    let result = cursor(vec![json!({"id": 1, "tstamp": 343094400})]);

    let row = result.fetch_assoc().unwrap();
    assert_eq!(Value::Object(row), json!({"id": 1, "tstamp": 343094400}));
    assert!(result.fetch_assoc().is_none());
    assert!(result.is_exhausted());
    assert!(result.fetch_assoc().is_none());
}

#[test]
fn test_fetch_row_returns_values_in_column_order() {
    let result = cursor(vec![json!({"z": 1, "a": "x", "m": null})]);
    assert_eq!(
        result.fetch_row().unwrap(),
        vec![json!(1), json!("x"), Value::Null]
    );
    assert!(result.fetch_row().is_none());
}

#[test]
fn test_exhausted_until_reset() {
    let result = three_rows();
    assert_eq!(result.fetch_all_assoc().len(), 3);
    assert!(result.prev());
    assert!(result.fetch_assoc().is_none());

    result.reset();
    assert_eq!(result.position(), None);
    assert_eq!(result.fetch_assoc().unwrap()["name"], json!("a"));
}

#[test]
fn test_fetch_all_is_idempotent() {
    let result = three_rows();
    result.fetch_assoc();
    let all = result.fetch_all_assoc();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["name"], json!("a"));
    assert_eq!(result.fetch_all_assoc(), all);
}

#[test]
fn test_fetch_each() {
    let result = cursor(vec![json!({"id": 1, "v": "x"}), json!({"id": 2})]);
    assert_eq!(result.fetch_each("v"), vec![json!("x"), Value::Null]);
    assert_eq!(result.fetch_each("id"), vec![json!(1), json!(2)]);
}

#[test]
fn test_row_calls_first_implicitly() {
    let result = three_rows();
    assert_eq!(result.position(), None);
    assert_eq!(result.row().unwrap()["name"], json!("a"));
    assert_eq!(result.position(), Some(0));
    assert_eq!(
        result.row_values().unwrap(),
        vec![json!(30), json!("a")]
    );
}

#[test]
fn test_row_on_empty_result_is_out_of_bounds() {
    let result = cursor(vec![]);
    assert!(result.row().unwrap_err().is_out_of_bounds());
    assert!(result.get("id").is_none());
    assert!(!result.first());
}

#[test]
fn test_first_on_empty_result_keeps_position() {
    let result = ResultSet::new("SELECT 1", FakeResult::new());
    assert!(!result.first());
    assert_eq!(result.position(), None);
    assert_eq!(result.row_index(), None);
    assert!(!result.next());
    assert_eq!(result.position(), None);
}

#[test]
fn test_next_prev_navigation() {
    let result = three_rows();
    let mut names = Vec::new();
    while result.next() {
        names.push(result.get("name").unwrap());
    }
    assert_eq!(names, vec![json!("a"), json!("b"), json!("c")]);
    assert!(!result.next());

    assert!(result.prev());
    assert_eq!(result.get("name").unwrap(), json!("b"));
    assert!(result.prev());
    assert!(!result.prev());
    assert_eq!(result.get("name").unwrap(), json!("a"));
}

#[test]
fn test_first_reloads_position_zero() {
    let result = three_rows();
    result.fetch_assoc();
    result.fetch_assoc();
    assert!(result.first());
    assert_eq!(result.position(), Some(0));
    assert_eq!(result.row().unwrap()["id"], json!(30));
}

#[test]
fn test_last_positions_at_final_row() {
    let result = three_rows();
    assert!(result.last());
    assert_eq!(result.num_rows(), 3);
    assert_eq!(result.row().unwrap()["name"], json!("c"));
    assert_eq!(result.position(), Some(2));
    assert_eq!(result.row_index(), Some(2));
    assert!(!result.next());
}

#[test]
fn test_last_on_empty_result() {
    let result = cursor(vec![]);
    assert!(!result.last());
    assert_eq!(result.position(), None);
}

#[test]
fn test_seek() {
    let result = three_rows();
    result.seek(2).unwrap();
    assert_eq!(result.fetch_assoc().unwrap()["name"], json!("c"));

    result.seek(0).unwrap();
    assert_eq!(result.fetch_assoc().unwrap()["name"], json!("a"));
    assert_eq!(result.fetch_assoc().unwrap()["name"], json!("b"));
}

#[test]
fn test_seek_out_of_bounds() {
    let result = three_rows();
    assert!(result.seek(5).unwrap_err().is_out_of_bounds());
    assert!(result.seek(3).unwrap_err().is_out_of_bounds());
    assert!(result.seek(-1).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_seek_on_empty_result_is_noop() {
    let result = cursor(vec![]);
    result.seek(0).unwrap();
    result.seek(5).unwrap();
    assert!(result.seek(-1).is_err());
}

#[test]
fn test_seek_clears_exhaustion() {
    let result = three_rows();
    result.fetch_all_assoc();
    assert!(result.is_exhausted());
    result.seek(1).unwrap();
    assert!(!result.is_exhausted());
    assert_eq!(result.fetch_assoc().unwrap()["name"], json!("b"));
}

#[test]
fn test_counts() {
    let result = three_rows();
    assert_eq!(result.num_rows(), 3);
    assert_eq!(result.num_fields(), 2);
    assert_eq!(result.query(), "SELECT * FROM test");

    let empty = cursor(vec![]);
    assert_eq!(empty.num_rows(), 0);
    assert_eq!(empty.num_fields(), 0);
}

#[test]
fn test_fetch_field() {
    let result = three_rows();
    result.next();
    result.next();
    assert_eq!(result.fetch_field(0).unwrap(), json!(10));
    assert_eq!(result.fetch_field(1).unwrap(), json!("b"));
    assert!(result.fetch_field(2).unwrap_err().is_out_of_bounds());
}

#[test]
fn test_set_marks_modified_and_touches_only_current_row() {
    let result = three_rows();
    assert!(!result.is_modified());

    result.next();
    result.next();
    result.set("name", json!("changed")).unwrap();
    assert!(result.is_modified());
    assert_eq!(result.get("name").unwrap(), json!("changed"));

    let all = result.fetch_all_assoc();
    assert_eq!(all[0]["name"], json!("a"));
    assert_eq!(all[1]["name"], json!("changed"));
    assert_eq!(all[2]["name"], json!("c"));

    // The registered buffer is untouched.
    assert_eq!(result.source().get_row(1).unwrap()["name"], json!("b"));
}

#[test]
fn test_set_before_fetch_targets_first_row() {
    let result = three_rows();
    result.set("extra", json!(true)).unwrap();
    assert_eq!(result.position(), Some(0));
    assert_eq!(result.row().unwrap()["extra"], json!(true));
    assert_eq!(result.num_fields(), 2);
}

#[test]
fn test_set_on_empty_result_fails() {
    let result = cursor(vec![]);
    assert!(result.set("a", json!(1)).unwrap_err().is_out_of_bounds());
    assert!(!result.is_modified());
}

#[test]
fn test_reset_keeps_modifications() {
    let result = three_rows();
    result.set("name", json!("z")).unwrap();
    result.reset();
    assert_eq!(result.fetch_assoc().unwrap()["name"], json!("z"));
    assert!(result.is_modified());
}

#[test]
fn test_rows_added_after_open_are_visible() {
    let source = FakeResult::new();
    let result = ResultSet::new("SELECT 1", source.clone());
    source.add_row(json!({"id": 1})).unwrap();
    assert_eq!(result.num_rows(), 1);
    assert_eq!(result.fetch_assoc().unwrap()["id"], json!(1));
}

#[test]
fn test_clones_share_position() {
    let result = three_rows();
    let handle = result.clone();
    result.fetch_assoc();
    assert_eq!(handle.position(), Some(0));
    assert!(handle.ptr_eq(&result));
}

use super::*;
use serde_json::json;

fn sample_box() -> BoxItem {
    BoxItem {
        id: "box-1".to_owned(),
        color: "#FF6B6B".to_owned(),
        text: "hi".to_owned(),
        position: Position::new(10.0, 20.0),
        created_by: "u1".to_owned(),
    }
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn decode_add_box_reads_camel_case_fields() {
    let text = r##"{"type":"add_box","userId":"u1","text":"hi","color":"#FF6B6B","position":{"x":10,"y":20}}"##;
    let command = decode_command(text).expect("add_box should decode");
    assert_eq!(
        command,
        Command::AddBox {
            user_id: "u1".into(),
            text: "hi".into(),
            color: "#FF6B6B".into(),
            position: Position::new(10.0, 20.0),
        }
    );
    assert_eq!(command.kind(), "add_box");
}

#[test]
fn decode_move_and_delete() {
    let moved = decode_command(r#"{"type":"move_box","boxId":"box-3","position":{"x":1.5,"y":-2}}"#)
        .expect("move_box should decode");
    assert_eq!(moved, Command::MoveBox { box_id: "box-3".into(), position: Position::new(1.5, -2.0) });

    let deleted = decode_command(r#"{"type":"delete_box","boxId":"box-3"}"#).expect("delete_box should decode");
    assert_eq!(deleted, Command::DeleteBox { box_id: "box-3".into() });
}

#[test]
fn decode_unknown_type_is_unrecognized_not_error() {
    let command = decode_command(r#"{"type":"resize_box","boxId":"box-1"}"#).expect("unknown type is not an error");
    assert_eq!(command, Command::Unrecognized { kind: "resize_box".into() });
    assert_eq!(command.kind(), "resize_box");
}

#[test]
fn decode_rejects_invalid_json() {
    let err = decode_command("{not json").expect_err("should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn decode_rejects_non_object_frames() {
    let err = decode_command("[1,2,3]").expect_err("should fail");
    assert!(matches!(err, CodecError::NotAnObject));
}

#[test]
fn decode_rejects_missing_or_non_string_type() {
    assert!(matches!(decode_command(r#"{"boxId":"box-1"}"#), Err(CodecError::MissingType)));
    assert!(matches!(decode_command(r#"{"type":7}"#), Err(CodecError::MissingType)));
}

#[test]
fn decode_known_type_with_bad_fields_is_schema_error() {
    let err = decode_command(r#"{"type":"move_box","boxId":"box-1","position":"here"}"#).expect_err("should fail");
    match err {
        CodecError::Schema { kind, .. } => assert_eq!(kind, "move_box"),
        other => panic!("expected schema error, got {other:?}"),
    }

    let err = decode_command(r#"{"type":"delete_box"}"#).expect_err("missing boxId");
    assert!(matches!(err, CodecError::Schema { .. }));
}

#[test]
fn encode_command_uses_wire_names() {
    let text = encode_command(&Command::MoveBox { box_id: "box-1".into(), position: Position::new(50.0, 60.0) })
        .expect("encode");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value, json!({"type": "move_box", "boxId": "box-1", "position": {"x": 50.0, "y": 60.0}}));
}

#[test]
fn encode_unrecognized_command_fails() {
    let err = encode_command(&Command::Unrecognized { kind: "x".into() }).expect_err("no wire form");
    assert!(matches!(err, CodecError::Encode(_)));
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn encode_box_added_nests_box_with_created_by() {
    let text = encode_event(&Event::BoxAdded { item: sample_box() }).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(
        value,
        json!({
            "type": "box_added",
            "box": {
                "id": "box-1",
                "color": "#FF6B6B",
                "text": "hi",
                "position": {"x": 10.0, "y": 20.0},
                "createdBy": "u1"
            }
        })
    );
}

#[test]
fn encode_init_keys_boxes_by_id() {
    let mut boxes = BoxMap::new();
    boxes.insert("box-1".into(), sample_box());
    let text = encode_event(&Event::Init { boxes }).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["type"], "init");
    assert_eq!(value["boxes"]["box-1"]["text"], "hi");
}

#[test]
fn encode_box_moved_and_deleted_use_box_id() {
    let moved = encode_event(&Event::BoxMoved { box_id: "box-1".into(), position: Position::new(50.0, 60.0) })
        .expect("encode");
    let value: serde_json::Value = serde_json::from_str(&moved).expect("json");
    assert_eq!(value, json!({"type": "box_moved", "boxId": "box-1", "position": {"x": 50.0, "y": 60.0}}));

    let deleted = encode_event(&Event::BoxDeleted { box_id: "box-1".into() }).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&deleted).expect("json");
    assert_eq!(value, json!({"type": "box_deleted", "boxId": "box-1"}));
}

#[test]
fn decode_event_accepts_server_frames() {
    let event = decode_event(r##"{"type":"init","boxes":{"box-1":{"id":"box-1","color":"#FF6B6B","text":"hi","position":{"x":10,"y":20},"createdBy":"u1"}}}"##)
        .expect("init should decode");
    let Event::Init { boxes } = event else {
        panic!("expected init");
    };
    assert_eq!(boxes.get("box-1"), Some(&sample_box()));
}

#[test]
fn decode_event_unknown_type_is_unrecognized() {
    let event = decode_event(r#"{"type":"cursor_moved"}"#).expect("unknown is not an error");
    assert_eq!(event.kind(), "cursor_moved");
}

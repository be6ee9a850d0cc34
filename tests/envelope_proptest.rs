//! Property-based tests for the envelope codec

use proptest::prelude::*;
use serde_json::{Map, Value};
use social_realtime::shared::codec::{decode, encode_envelope, encode_frame, decode_frame};
use social_realtime::shared::{Envelope, NotificationBody, Recipients, ServerFrame};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |v| v.is_finite())
            .prop_map(Value::from),
        ".{0,12}".prop_map(Value::String),
        Just(Value::Null),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

fn recipients() -> impl Strategy<Value = Recipients> {
    prop_oneof![
        "[a-z0-9]{1,10}".prop_map(Recipients::One),
        prop::collection::vec("[a-z0-9]{1,10}", 1..4).prop_map(Recipients::Many),
    ]
}

fn envelope() -> impl Strategy<Value = Envelope> {
    let chat = ".*".prop_map(Envelope::chat);
    let notification = (
        recipients(),
        proptest::option::of(".*"),
        proptest::option::of(json_value()),
    )
        .prop_map(|(to, text, data)| Envelope::notification(to, text, data));
    let other = (
        "[A-Z_]{1,12}".prop_filter("known type", |kind| kind != "CHAT" && kind != "NOTIFICATION"),
        prop::collection::btree_map("[a-z]{1,6}", json_value(), 0..4),
    )
        .prop_map(|(kind, fields)| {
            let fields: Map<String, Value> = fields.into_iter().collect();
            Envelope::custom(&kind, fields).expect("unknown types accept any fields")
        });

    prop_oneof![chat, notification, other]
}

proptest! {
    #[test]
    fn test_envelope_round_trip(envelope in envelope()) {
        let encoded = encode_envelope(&envelope).unwrap();
        prop_assert_eq!(decode(encoded.as_bytes()).unwrap(), envelope);
    }

    #[test]
    fn test_encoding_is_deterministic(envelope in envelope()) {
        prop_assert_eq!(encode_envelope(&envelope).unwrap(), encode_envelope(&envelope).unwrap());
    }

    #[test]
    fn test_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode(&bytes);
    }

    #[test]
    fn test_chat_frame_round_trip(user in "[a-z]{1,10}", text in ".*") {
        let frame = ServerFrame::chat(user, text);
        let encoded = encode_frame(&frame).unwrap();
        prop_assert_eq!(decode_frame(encoded.as_bytes()).unwrap(), frame);
    }

    #[test]
    fn test_notification_frame_round_trip(
        from in "[a-z]{1,10}",
        text in proptest::option::of(".*"),
        data in proptest::option::of(json_value()),
    ) {
        let frame = ServerFrame::Notification {
            notification: NotificationBody::new(from, text, data),
        };
        let encoded = encode_frame(&frame).unwrap();
        prop_assert_eq!(decode_frame(encoded.as_bytes()).unwrap(), frame);
    }
}

use bytes::Bytes;
use pulsewire_codec::{
    Array, ArrayData, ByteOrder, ChannelOptions, CompressionId, Data, DataHeader, Decoder,
    EncodedPulse, Encoder, EncoderConfig, Message, PulseFrames, Scalar, Timestamp,
};

fn decode(decoder: &mut Decoder, pulse: &EncodedPulse) -> Message {
    let mut frames = PulseFrames::from(pulse.frames.clone());
    decoder
        .decode(&mut frames)
        .expect("decode")
        .expect("message present")
}

fn samples() -> Vec<Data> {
    vec![
        Data::Scalar(Scalar::Int8(-3)),
        Data::Scalar(Scalar::UInt8(250)),
        Data::Scalar(Scalar::Int16(-12_000)),
        Data::Scalar(Scalar::UInt16(60_000)),
        Data::Scalar(Scalar::Int32(-70_000)),
        Data::Scalar(Scalar::UInt32(4_000_000_000)),
        Data::from(-9_000_000_000i64),
        Data::Scalar(Scalar::UInt64(u64::MAX - 1)),
        Data::Scalar(Scalar::Float32(1.25)),
        Data::from(std::f64::consts::PI),
        Data::from("beam current nominal"),
        Data::from(vec![1i8, -2, 3]),
        Data::from((0..100u16).collect::<Vec<_>>()),
        Data::from((0..37).map(|i| i * 1_000_003).collect::<Vec<i64>>()),
        Data::from((0..1000).map(|i| i as f32 / 3.0).collect::<Vec<f32>>()),
        Data::Array(Array::from_rows(vec![vec![1u32, 2, 3], vec![4, 5, 6]]).unwrap()),
        Data::Array(
            Array::new(
                vec![2, 3, 4],
                ArrayData::Float64((0..24u32).map(f64::from).collect()),
            )
            .unwrap(),
        ),
    ]
}

#[test]
fn every_type_and_shape_round_trips() {
    for compression in [CompressionId::None, CompressionId::BitshuffleLz4] {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let mut encoder = Encoder::default();
            let options = ChannelOptions::default()
                .with_encoding(order)
                .with_compression(compression);
            let values = samples();
            for index in 0..values.len() {
                encoder.add_channel(format!("ch{index}"), options).unwrap();
            }

            let ts = Timestamp::new(1_700_000_000, 123_456_789);
            let pulse = encoder
                .encode(
                    values
                        .iter()
                        .enumerate()
                        .map(|(index, value)| (format!("ch{index}"), Some(value.clone()))),
                    Some(77),
                    Some(ts),
                )
                .unwrap();

            let message = decode(&mut Decoder::new(), &pulse);
            assert_eq!(message.pulse_id(), 77);
            assert_eq!(message.global_timestamp(), ts);
            for (index, expected) in values.iter().enumerate() {
                let value = message.data.get(&format!("ch{index}")).unwrap();
                assert_eq!(
                    value.value.as_ref(),
                    Some(expected),
                    "channel {index} with {compression} / {order:?}"
                );
                assert_eq!(value.timestamp, Some(ts));
            }
        }
    }
}

#[test]
fn unchanged_channel_set_reuses_schema() {
    let mut encoder = Encoder::default();
    let mut decoder = Decoder::new();

    let first = encoder.encode([("x", Some(Data::from(1.0f64)))], None, None).unwrap();
    encoder.mark_sent(first.pulse_id);
    let second = encoder.encode([("x", Some(Data::from(2.0f64)))], None, None).unwrap();

    assert!(decode(&mut decoder, &first).format_changed);
    let message = decode(&mut decoder, &second);
    assert!(!message.format_changed);
    assert_eq!(message.pulse_id(), first.pulse_id + 1);
    assert_eq!(message.value("x"), Some(&Data::from(2.0f64)));
}

#[test]
fn channel_set_change_is_reported() {
    let mut encoder = Encoder::default();
    let mut decoder = Decoder::new();

    let first = encoder.encode([("x", Some(Data::from(1i64)))], Some(1), None).unwrap();
    decode(&mut decoder, &first);

    let second = encoder
        .encode(
            [("x", Some(Data::from(1i64))), ("y", Some(Data::from(2i64)))],
            Some(2),
            None,
        )
        .unwrap();
    assert_ne!(first.header.hash, second.header.hash);
    let message = decode(&mut decoder, &second);
    assert!(message.format_changed);
    assert_eq!(message.data.names().collect::<Vec<_>>(), vec!["x", "y"]);

    encoder.remove_channel("y");
    let third = encoder.encode([("x", Some(Data::from(1i64)))], Some(3), None).unwrap();
    assert_eq!(third.header.hash, first.header.hash);
    assert!(decode(&mut decoder, &third).format_changed);
}

#[test]
fn absent_values_propagate_without_disturbing_neighbours() {
    let mut encoder = Encoder::default();
    let pulse = encoder
        .encode(
            [
                ("a", Some(Data::from(1i64))),
                ("b", None),
                ("c", Some(Data::from("ok"))),
            ],
            Some(5),
            None,
        )
        .unwrap();

    // header, data header, then value/timestamp pairs
    assert_eq!(pulse.frames.len(), 8);
    assert!(pulse.frames[4].is_empty());
    assert!(pulse.frames[5].is_empty());

    let message = decode(&mut Decoder::new(), &pulse);
    let b = message.data.get("b").unwrap();
    assert_eq!(b.value, None);
    assert_eq!(b.timestamp, None);
    assert_eq!(message.value("a"), Some(&Data::from(1i64)));
    assert_eq!(message.value("c"), Some(&Data::from("ok")));
}

#[test]
fn passthrough_and_block_codec_agree() {
    let array = Data::Array(
        Array::from_rows((0..64).map(|row| (0..48).map(|col| row * col).collect()).collect::<Vec<Vec<u16>>>())
            .unwrap(),
    );

    let mut decoded = Vec::new();
    for compression in [CompressionId::None, CompressionId::BitshuffleLz4] {
        let mut encoder = Encoder::default();
        encoder
            .add_channel("img", ChannelOptions::default().with_compression(compression))
            .unwrap();
        let pulse = encoder
            .encode([("img", Some(array.clone()))], Some(1), None)
            .unwrap();
        decoded.push(decode(&mut Decoder::new(), &pulse).value("img").cloned());
    }

    assert_eq!(decoded[0], decoded[1]);
    assert_eq!(decoded[0], Some(array));
}

#[test]
fn two_by_three_array_is_declared_three_by_two() {
    let mut encoder = Encoder::default();
    let array = Array::from_rows(vec![vec![1.0f64, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    let pulse = encoder
        .encode([("m", Some(Data::Array(array.clone())))], Some(1), None)
        .unwrap();

    let header: DataHeader = serde_json::from_slice(&pulse.frames[1]).unwrap();
    assert_eq!(header.channels[0].shape, Some(vec![3, 2]));

    let message = decode(&mut Decoder::new(), &pulse);
    let decoded = message.value("m").and_then(Data::as_array).unwrap();
    assert_eq!(decoded.shape(), &[2, 3]);
    assert_eq!(decoded, &array);
}

#[test]
fn big_endian_channel_decodes_on_any_host() {
    for order in [ByteOrder::Big, ByteOrder::Little] {
        let mut encoder = Encoder::default();
        encoder
            .add_channel("v", ChannelOptions::default().with_encoding(order))
            .unwrap();
        let pulse = encoder
            .encode([("v", Some(Data::Scalar(Scalar::UInt32(0x0102_0304))))], Some(1), None)
            .unwrap();

        let expected = match order {
            ByteOrder::Big => [1u8, 2, 3, 4],
            ByteOrder::Little => [4, 3, 2, 1],
        };
        assert_eq!(pulse.frames[2].as_ref(), &expected);

        let message = decode(&mut Decoder::new(), &pulse);
        assert_eq!(
            message.value("v"),
            Some(&Data::Scalar(Scalar::UInt32(0x0102_0304)))
        );
    }
}

#[test]
fn corrupt_middle_channel_is_isolated() {
    let mut encoder = Encoder::default();
    encoder.add_channel("one", ChannelOptions::default()).unwrap();
    encoder
        .add_channel(
            "two",
            ChannelOptions::default().with_compression(CompressionId::BitshuffleLz4),
        )
        .unwrap();
    encoder.add_channel("three", ChannelOptions::default()).unwrap();

    let pulse = encoder
        .encode(
            [
                ("one", Some(Data::from(1i64))),
                ("two", Some(Data::from((0..500u32).map(f64::from).collect::<Vec<_>>()))),
                ("three", Some(Data::from(3i64))),
            ],
            Some(1),
            None,
        )
        .unwrap();

    let mut frames = PulseFrames::from(pulse.frames);
    let corrupted = frames.get_mut(4).unwrap();
    let mut bytes = corrupted.to_vec();
    bytes.truncate(bytes.len() / 2);
    *corrupted = Bytes::from(bytes);

    let message = Decoder::new().decode(&mut frames).unwrap().unwrap();
    assert_eq!(message.value("one"), Some(&Data::from(1i64)));
    assert_eq!(message.value("two"), None);
    assert_eq!(message.value("three"), Some(&Data::from(3i64)));
}

#[test]
fn compressed_data_header_round_trips() {
    let mut encoder = Encoder::new(
        EncoderConfig::default().with_data_header_compression(CompressionId::BitshuffleLz4),
    );
    let mut decoder = Decoder::new();
    let first = encoder.encode([("x", Some(Data::from(1i64)))], Some(1), None).unwrap();
    let second = encoder.encode([("x", Some(Data::from(2i64)))], Some(2), None).unwrap();

    assert!(decode(&mut decoder, &first).format_changed);
    let message = decode(&mut decoder, &second);
    assert!(!message.format_changed);
    assert_eq!(message.value("x"), Some(&Data::from(2i64)));
}

#[test]
fn heartbeat_does_not_evict_schema() {
    let mut encoder = Encoder::default();
    let mut decoder = Decoder::new();
    let first = encoder.encode([("x", Some(Data::from(1i64)))], Some(1), None).unwrap();
    decode(&mut decoder, &first);

    let heartbeat = Encoder::default()
        .encode(Vec::<(String, Option<Data>)>::new(), Some(2), None)
        .unwrap();
    assert_eq!(heartbeat.frames.len(), 2);
    assert!(decode(&mut decoder, &heartbeat).is_heartbeat());

    let third = encoder.encode([("x", Some(Data::from(3i64)))], Some(3), None).unwrap();
    assert!(!decode(&mut decoder, &third).format_changed);
}

use bincraft::{
    ArrayOptions, BufferOptions, Bytes, ChoiceOptions, Encoding, Endian, ErrorKind, Parser,
    PointerOptions, Primitive, Record, SchemaError, StringOptions, Value,
};

fn hex(s: &str) -> Vec<u8> {
    let s: String = s.split_whitespace().collect();
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn binary(s: &str) -> Vec<u8> {
    let s: String = s.split_whitespace().collect();
    (0..s.len())
        .step_by(8)
        .map(|i| u8::from_str_radix(&s[i..i + 8], 2).unwrap())
        .collect()
}

fn u(v: u64) -> Value {
    Value::U64(v)
}

#[test]
fn empty_schema_yields_empty_record() {
    let parser = Parser::start().build().unwrap();
    assert_eq!(parser.parse(&[0x0a, 0x14, 0x1e]).unwrap(), Record::new());
    assert_eq!(parser.parse(&[]).unwrap(), Record::new());
}

#[test]
fn parses_integer_types() {
    let parser = Parser::start()
        .uint8("a")
        .int16le("b")
        .uint32be("c")
        .build()
        .unwrap();

    let record = parser.parse(&hex("00 d2 04 00 bc 61 4e")).unwrap();
    assert_eq!(
        record,
        Record::from([("a", u(0)), ("b", Value::I64(1234)), ("c", u(12345678))])
    );
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn parses_64_bit_integers_exactly() {
    let parser = Parser::start()
        .uint64be("a")
        .uint64le("b")
        .int64be("c")
        .int64le("d")
        .build()
        .unwrap();

    let data = hex(
        "00000000ffffffff 00000000ffffffff 00000000ffffffff 01000000ffffffff",
    );
    let record = parser.parse(&data).unwrap();
    assert_eq!(record["a"], u(4294967295));
    assert_eq!(record["b"], u(18446744069414584320));
    assert_eq!(record["c"], Value::I64(4294967295));
    assert_eq!(record["d"], Value::I64(-4294967295));
}

#[test]
fn formatter_transforms_values() {
    let parser = Parser::start()
        .uint8("a")
        .formatter(|v| Ok(Value::U64(v.as_u64().unwrap_or(0) * 2)))
        .int16le("b")
        .formatter(|v| Ok(Value::Str(format!("test{}", v.as_i64().unwrap_or(0)))))
        .build()
        .unwrap();

    let record = parser.parse(&[0x01, 0xd2, 0x04]).unwrap();
    assert_eq!(record["a"], u(2));
    assert_eq!(record["b"], Value::from("test1234"));
}

#[test]
fn formatter_errors_propagate() {
    let parser = Parser::start()
        .uint8("a")
        .formatter(|_| Err("not today".into()))
        .build()
        .unwrap();

    let err = parser.parse(&[0x01]).unwrap_err();
    assert_eq!(err.field, "a");
    let ErrorKind::Callback(source) = err.kind() else {
        panic!("expected callback error, got {err}");
    };
    assert_eq!(source.to_string(), "not today");
}

#[test]
fn parses_floats() {
    let parser = Parser::start().floatbe("a").doublele("b").build().unwrap();
    let record = parser
        .parse(&hex("4145851f 7a36ab3e575bb1bf"))
        .unwrap();

    assert!((record["a"].as_f64().unwrap() - 12.345).abs() < 0.00001);
    assert!((record["b"].as_f64().unwrap() - -0.0678).abs() < 0.00001);
}

#[test]
fn handles_endianness() {
    let parser = Parser::start()
        .int32le("little")
        .int32be("big")
        .build()
        .unwrap();

    let record = parser.parse(&hex("4e61bc00 00bc614e")).unwrap();
    assert_eq!(record["little"], Value::I64(12345678));
    assert_eq!(record["big"], Value::I64(12345678));
}

#[test]
fn default_endianness_applies_to_later_fields() {
    let parser = Parser::start()
        .uint16("a")
        .endianess(Endian::Little)
        .uint16("b")
        .build()
        .unwrap();

    let record = parser.parse(&[0x00, 0x01, 0x01, 0x00]).unwrap();
    assert_eq!(record["a"], u(1));
    assert_eq!(record["b"], u(1));
}

#[test]
fn seeks_forward_and_back() {
    let parser = Parser::start()
        .uint8("a")
        .seek(3)
        .uint16le("b")
        .uint32be("c")
        .build()
        .unwrap();

    let record = parser.parse(&hex("00 fffffe d204 00bc614e")).unwrap();
    assert_eq!(record, Record::from([("a", u(0)), ("b", u(1234)), ("c", u(12345678))]));

    let parser = Parser::start()
        .uint8("a")
        .seek(-1)
        .uint8("again")
        .build()
        .unwrap();
    let record = parser.parse(&[0x07]).unwrap();
    assert_eq!(record["again"], u(7));
}

#[test]
fn seek_past_end_is_out_of_bounds() {
    let parser = Parser::start().uint8("a").seek(2).build().unwrap();
    let err = parser.parse(&[0x00, 0x01]).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::OutOfBounds { .. }));
}

#[test]
fn short_input_is_out_of_bounds() {
    let parser = Parser::start().uint8("a").uint32le("b").build().unwrap();
    let err = parser.parse(&[0x01, 0x02, 0x03]).unwrap_err();
    assert_eq!(err.field, "b");
    assert_eq!(err.position.offset, 1);
    assert!(matches!(
        err.kind(),
        ErrorKind::OutOfBounds {
            needed: 4,
            available: 2
        }
    ));
}

#[test]
fn parses_1_byte_bit_field_sequence() {
    let buf = binary("1 10 1010 0");
    assert_eq!(buf, vec![0xd4]);

    let parser = Parser::start()
        .bit1("a")
        .bit2("b")
        .bit4("c")
        .bit1("d")
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(&buf).unwrap(),
        Record::from([("a", u(1)), ("b", u(2)), ("c", u(10)), ("d", u(0))])
    );

    let parser = Parser::start()
        .endianess(Endian::Little)
        .bit1("a")
        .bit2("b")
        .bit4("c")
        .bit1("d")
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(&buf).unwrap(),
        Record::from([("a", u(0)), ("b", u(2)), ("c", u(10)), ("d", u(1))])
    );
}

#[test]
fn parses_2_byte_bit_field_sequence() {
    let buf = binary("101 111000111 0111");

    let parser = Parser::start().bit3("a").bit9("b").bit4("c").build().unwrap();
    assert_eq!(
        parser.parse(&buf).unwrap(),
        Record::from([("a", u(5)), ("b", u(455)), ("c", u(7))])
    );

    let parser = Parser::start()
        .endianess(Endian::Little)
        .bit3("a")
        .bit9("b")
        .bit4("c")
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(&buf).unwrap(),
        Record::from([("a", u(7)), ("b", u(398)), ("c", u(11))])
    );
}

#[test]
fn parses_4_byte_bit_field_sequence() {
    let buf = binary("1 101010101010101010101010 1111 01 1");

    let parser = Parser::start()
        .bit1("a")
        .bit24("b")
        .bit4("c")
        .bit2("d")
        .bit1("e")
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(&buf).unwrap(),
        Record::from([
            ("a", u(1)),
            ("b", u(11184810)),
            ("c", u(15)),
            ("d", u(1)),
            ("e", u(1))
        ])
    );

    let parser = Parser::start()
        .endianess(Endian::Little)
        .bit1("a")
        .bit24("b")
        .bit4("c")
        .bit2("d")
        .bit1("e")
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(&buf).unwrap(),
        Record::from([
            ("a", u(1)),
            ("b", u(11184829)),
            ("c", u(10)),
            ("d", u(2)),
            ("e", u(1))
        ])
    );
}

#[test]
fn parses_nested_bit_fields() {
    let inner = Parser::start().bit2("b").bit4("c").bit1("d").build().unwrap();
    let parser = Parser::start().bit1("a").nest("x", inner).build().unwrap();

    let record = parser.parse(&binary("11010100")).unwrap();
    assert_eq!(record["a"], u(1));
    assert_eq!(
        record["x"],
        Value::Record(Record::from([("b", u(2)), ("c", u(10)), ("d", u(0))]))
    );
}

#[test]
fn little_endian_run_is_one_integer_past_32_bits() {
    let parser = Parser::start()
        .endianess(Endian::Little)
        .bit32("a")
        .bit8("b")
        .save_offset("end")
        .build()
        .unwrap();

    let record = parser.parse(&[0x01, 0x02, 0x03, 0x04, 0x05]).unwrap();
    assert_eq!(
        record,
        Record::from([("a", u(0x0203_0405)), ("b", u(0x01)), ("end", u(5))])
    );
}

#[test]
fn partial_bit_run_skips_to_next_byte() {
    let parser = Parser::start()
        .bit3("flags")
        .uint8("next")
        .build()
        .unwrap();

    let record = parser.parse(&[0b1010_1111, 0x2a]).unwrap();
    assert_eq!(record["flags"], u(5));
    assert_eq!(record["next"], u(0x2a));
}

#[test]
fn full_width_bit_field() {
    let parser = Parser::start()
        .endianess(Endian::Little)
        .bit32("all")
        .build()
        .unwrap();
    let record = parser.parse(&[0xff, 0xff, 0xff, 0xff]).unwrap();
    assert_eq!(record["all"], u(0xffff_ffff));
}

#[test]
fn bit_run_out_of_bounds() {
    let parser = Parser::start().bit4("a").bit12("b").build().unwrap();
    let err = parser.parse(&[0xff]).unwrap_err();
    assert_eq!(err.field, "a");
    assert!(matches!(err.kind(), ErrorKind::OutOfBounds { needed: 2, .. }));
}

#[test]
fn parses_utf8_strings() {
    let text = "こんにちは、せかい。";
    let parser = Parser::start()
        .string("msg", StringOptions::new().length(text.len()).encoding(Encoding::Utf8))
        .build()
        .unwrap();
    assert_eq!(parser.parse(text.as_bytes()).unwrap()["msg"], Value::from(text));
}

#[test]
fn parses_hex_strings() {
    let parser = Parser::start()
        .string("msg", StringOptions::new().length(4).encoding(Encoding::Hex))
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(&hex("cafebabe")).unwrap()["msg"],
        Value::from("cafebabe")
    );
}

#[test]
fn parses_variable_length_string() {
    let parser = Parser::start()
        .uint8("length")
        .string(
            "msg",
            StringOptions::new().length("length").encoding(Encoding::Utf8),
        )
        .build()
        .unwrap();

    let record = parser.parse(&hex("0c68656c6c6f2c20776f726c64")).unwrap();
    assert_eq!(
        record,
        Record::from([("length", u(12)), ("msg", Value::from("hello, world"))])
    );
}

#[test]
fn parses_zero_terminated_string() {
    let parser = Parser::start()
        .string(
            "msg",
            StringOptions::new().zero_terminated().encoding(Encoding::Utf8),
        )
        .build()
        .unwrap();

    let record = parser.parse(&hex("68656c6c6f2c20776f726c6400")).unwrap();
    assert_eq!(record, Record::from([("msg", "hello, world")]));
}

#[test]
fn zero_terminated_fixed_slots() {
    let slot = || StringOptions::new().length(5).zero_terminated();
    let parser = Parser::start()
        .string("a", slot())
        .string("b", slot())
        .string("c", slot())
        .build()
        .unwrap();

    let record = parser.parse(b"abc\0\0defghij\0\0\0").unwrap();
    assert_eq!(
        record,
        Record::from([("a", "abc"), ("b", "defgh"), ("c", "ij")])
    );
}

#[test]
fn strips_trailing_nulls() {
    let data = hex("74657374000000");
    let keep = Parser::start()
        .string("str", StringOptions::new().length(7))
        .build()
        .unwrap();
    let strip = Parser::start()
        .string("str", StringOptions::new().length(7).strip_null())
        .build()
        .unwrap();

    assert_eq!(keep.parse(&data).unwrap()["str"], Value::from("test\0\0\0"));
    assert_eq!(strip.parse(&data).unwrap()["str"], Value::from("test"));
}

#[test]
fn greedy_string_keeps_interior_zero_bytes() {
    let parser = Parser::start()
        .string("a", StringOptions::new().greedy())
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(b"abc\0defghij\0").unwrap()["a"],
        Value::from("abc\0defghij\0")
    );
}

#[test]
fn unresolved_length_reference() {
    let parser = Parser::start()
        .string("msg", StringOptions::new().length("len"))
        .uint8("len")
        .build()
        .unwrap();

    let err = parser.parse(&[0x01, 0x41]).unwrap_err();
    assert_eq!(err.field, "msg");
    assert!(matches!(
        err.kind(),
        ErrorKind::UnresolvedReference { reference } if reference == "len"
    ));
}

#[test]
fn parses_buffer_with_referenced_length() {
    let parser = Parser::start()
        .uint8("len")
        .buffer("raw", BufferOptions::new().length("len"))
        .build()
        .unwrap();

    let mut data = vec![8];
    data.extend(hex("deadbeefdeadbeef"));
    let record = parser.parse(&data).unwrap();
    assert_eq!(record["raw"], Value::from(hex("deadbeefdeadbeef")));
}

#[test]
fn buffer_views_share_input_unless_cloned() {
    let data = Bytes::from(hex("deadbeefdeadbeef"));

    let view = Parser::start()
        .buffer("raw", BufferOptions::new().length(8))
        .build()
        .unwrap();
    let record = view.parse_bytes(data.clone()).unwrap();
    let raw = record["raw"].as_bytes().unwrap();
    assert_eq!(raw, &data);
    assert_eq!(raw.as_ptr(), data.as_ptr());

    let copy = Parser::start()
        .buffer("raw", BufferOptions::new().length(8).clone_bytes())
        .build()
        .unwrap();
    let record = copy.parse_bytes(data.clone()).unwrap();
    let raw = record["raw"].as_bytes().unwrap();
    assert_eq!(raw, &data);
    assert_ne!(raw.as_ptr(), data.as_ptr());
}

#[test]
fn buffer_read_until_predicate() {
    let parser = Parser::start()
        .endianess(Endian::Big)
        .uint8("cmd")
        .buffer("data", BufferOptions::new().read_until(|b| b == 2))
        .build()
        .unwrap();

    for (input, data) in [
        ("aa", ""),
        ("aabbcc", "bbcc"),
        ("aa02bbcc", ""),
        ("aabbcc02", "bbcc"),
        ("aabbcc02dd", "bbcc"),
    ] {
        let record = parser.parse(&hex(input)).unwrap();
        assert_eq!(
            record,
            Record::from([("cmd", u(0xaa)), ("data", Value::from(hex(data)))]),
            "input {input}"
        );
    }
}

#[test]
fn buffer_read_until_consumes_terminator() {
    let parser = Parser::start()
        .buffer("head", BufferOptions::new().read_until(|b| b == 0))
        .uint8("after")
        .build()
        .unwrap();

    let record = parser.parse(&[0x01, 0x02, 0x00, 0x09]).unwrap();
    assert_eq!(record["head"], Value::from(vec![1u8, 2]));
    assert_eq!(record["after"], u(9));
}

#[test]
fn buffer_read_until_eof_keeps_every_byte() {
    let parser = Parser::start()
        .buffer("buf", BufferOptions::new().read_until_eof())
        .build()
        .unwrap();
    assert_eq!(
        parser.parse(b"John\0Doe\0").unwrap()["buf"],
        Value::from(b"John\0Doe\0".to_vec())
    );
}

#[test]
fn nests_named_and_inline() {
    let point = Parser::start().uint8("x").uint8("y").build().unwrap();
    let parser = Parser::start()
        .nest("start", point.clone())
        .nest("end", point.clone())
        .build()
        .unwrap();

    let record = parser.parse(&[1, 2, 3, 4]).unwrap();
    assert_eq!(record["end"].as_record().unwrap()["y"], u(4));

    let parser = Parser::start()
        .uint8("id")
        .nest_inline(point)
        .build()
        .unwrap();
    let record = parser.parse(&[9, 1, 2]).unwrap();
    assert_eq!(record, Record::from([("id", 9u8), ("x", 1u8), ("y", 2u8)]));
}

#[test]
fn nested_references_stay_in_scope() {
    let inner = Parser::start()
        .buffer("data", BufferOptions::new().length("len"))
        .build()
        .unwrap();
    let parser = Parser::start().uint8("len").nest("body", inner).build().unwrap();

    let err = parser.parse(&[0x01, 0xff]).unwrap_err();
    assert_eq!(err.field, "body.data");
    assert!(matches!(err.kind(), ErrorKind::UnresolvedReference { .. }));
}

#[test]
fn inline_nest_shares_parent_scope() {
    let inner = Parser::start()
        .buffer("data", BufferOptions::new().length("len"))
        .build()
        .unwrap();
    let parser = Parser::start().uint8("len").nest_inline(inner).build().unwrap();

    let record = parser.parse(&[0x01, 0xff]).unwrap();
    assert_eq!(record["data"], Value::from(vec![0xffu8]));
}

#[test]
fn references_into_decoded_nested_records() {
    let header = Parser::start().uint8("count").build().unwrap();
    let parser = Parser::start()
        .nest("header", header)
        .array("items", ArrayOptions::new(Primitive::U8).length("header.count"))
        .build()
        .unwrap();

    let record = parser.parse(&[2, 10, 20, 30]).unwrap();
    assert_eq!(record["items"], Value::Array(vec![u(10), u(20)]));
}

#[test]
fn choice_selects_by_tag() {
    let text = Parser::start()
        .uint8("len")
        .string("text", StringOptions::new().length("len"))
        .build()
        .unwrap();
    let parser = Parser::start()
        .uint8("tag")
        .choice(
            "body",
            ChoiceOptions::new("tag")
                .choice(1, Primitive::U16)
                .choice(2, text)
                .default_choice(Primitive::U8),
        )
        .build()
        .unwrap();

    assert_eq!(parser.parse(&[1, 0x01, 0x02]).unwrap()["body"], u(0x0102));
    assert_eq!(
        parser.parse(&[2, 2, b'o', b'k']).unwrap()["body"],
        Value::Record(Record::from([("len", u(2)), ("text", Value::from("ok"))]))
    );
    assert_eq!(parser.parse(&[7, 0x33]).unwrap()["body"], u(0x33));
}

#[test]
fn choice_without_match_fails() {
    let parser = Parser::start()
        .uint8("tag")
        .choice("body", ChoiceOptions::new("tag").choice(1, Primitive::U8))
        .build()
        .unwrap();

    let err = parser.parse(&[3, 0]).unwrap_err();
    assert_eq!(err.field, "body");
    assert!(matches!(err.kind(), ErrorKind::UnknownChoice { tag: 3 }));
}

#[test]
fn inline_choice_merges_fields() {
    let a = Parser::start().uint8("a").build().unwrap();
    let b = Parser::start().uint16le("b").build().unwrap();
    let parser = Parser::start()
        .uint8("tag")
        .choice_inline(ChoiceOptions::new("tag").choice(0, a).choice(1, b))
        .build()
        .unwrap();

    assert_eq!(
        parser.parse(&[1, 0x34, 0x12]).unwrap(),
        Record::from([("tag", u(1)), ("b", u(0x1234))])
    );
}

#[test]
fn inline_choice_needs_parser_alternatives() {
    let err = Parser::start()
        .uint8("tag")
        .choice_inline(ChoiceOptions::new("tag").choice(1, Primitive::U16))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidSchema { .. }));

    let parser = Parser::start()
        .uint8("tag")
        .choice("body", ChoiceOptions::new("tag").choice(1, Primitive::U16))
        .build()
        .unwrap();
    assert_eq!(parser.parse(&[1, 0xab, 0xcd]).unwrap()["body"], u(0xabcd));
}

#[test]
fn choice_tag_from_callback() {
    let parser = Parser::start()
        .uint8("raw")
        .choice(
            "body",
            ChoiceOptions::new(bincraft::Arg::callback(|r| {
                r.int("raw").map(|v| v >> 4).ok_or_else(|| "raw missing".into())
            }))
            .choice(1, Primitive::U8)
            .choice(2, Primitive::U16),
        )
        .build()
        .unwrap();

    assert_eq!(parser.parse(&[0x21, 0x00, 0x05]).unwrap()["body"], u(5));
}

#[test]
fn array_with_count() {
    let element = Parser::start().uint8("id").uint8("value").build().unwrap();
    let parser = Parser::start()
        .uint8("n")
        .array("items", ArrayOptions::new(element).length("n"))
        .build()
        .unwrap();

    let record = parser.parse(&[2, 1, 10, 2, 20]).unwrap();
    let items = record["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].as_record().unwrap()["value"], u(20));
}

#[test]
fn array_element_errors_carry_the_index() {
    let element = Parser::start().uint16le("v").build().unwrap();
    let parser = Parser::start()
        .array("items", ArrayOptions::new(element).length(3))
        .build()
        .unwrap();

    let err = parser.parse(&[1, 0, 2, 0, 3]).unwrap_err();
    assert_eq!(err.field, "items[2].v");
    assert_eq!(err.position.offset, 4);
}

#[test]
fn array_with_length_in_bytes() {
    let parser = Parser::start()
        .array("words", ArrayOptions::new(Primitive::U16).length_in_bytes(4))
        .uint8("tail")
        .build()
        .unwrap();

    let record = parser.parse(&[0, 1, 0, 2, 3]).unwrap();
    assert_eq!(record["words"], Value::Array(vec![u(1), u(2)]));
    assert_eq!(record["tail"], u(3));
}

#[test]
fn array_read_until_keeps_last_element() {
    let parser = Parser::start()
        .array(
            "values",
            ArrayOptions::new(Primitive::U8).read_until(|item, _| item.as_u64() == Some(0)),
        )
        .uint8("after")
        .build()
        .unwrap();

    let record = parser.parse(&[5, 6, 0, 9]).unwrap();
    assert_eq!(record["values"], Value::Array(vec![u(5), u(6), u(0)]));
    assert_eq!(record["after"], u(9));
}

#[test]
fn array_read_until_eof() {
    let parser = Parser::start()
        .array("values", ArrayOptions::new(Primitive::I8).read_until_eof())
        .build()
        .unwrap();

    let record = parser.parse(&[0xff, 0x01]).unwrap();
    assert_eq!(record["values"], Value::Array(vec![Value::I64(-1), Value::I64(1)]));
}

#[test]
fn keyed_array() {
    let entry = Parser::start()
        .uint8("id")
        .uint8("value")
        .build()
        .unwrap();
    let parser = Parser::start()
        .array("entries", ArrayOptions::new(entry).length(2).key("id"))
        .build()
        .unwrap();

    let record = parser.parse(&[7, 70, 9, 90]).unwrap();
    let entries = record["entries"].as_record().unwrap();
    assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["7", "9"]);
    assert_eq!(entries["9"].as_record().unwrap()["value"], u(90));
}

#[test]
fn pointer_and_save_offset() {
    let parser = Parser::start()
        .uint8("at")
        .pointer("target", PointerOptions::new("at", Primitive::U16))
        .save_offset("here")
        .uint8("next")
        .build()
        .unwrap();

    let record = parser.parse(&[3, 0x11, 0xff, 0x12, 0x34]).unwrap();
    assert_eq!(record["target"], u(0x1234));
    assert_eq!(record["here"], u(1));
    assert_eq!(record["next"], u(0x11));
}

#[test]
fn assertions() {
    let parser = Parser::start()
        .uint16be("magic")
        .assert_eq(0xcafeu16)
        .uint8("version")
        .assert(|v, _| v.as_u64().is_some_and(|v| v < 3))
        .build()
        .unwrap();

    assert!(parser.parse(&[0xca, 0xfe, 0x02]).is_ok());

    let err = parser.parse(&[0xca, 0xfe, 0x05]).unwrap_err();
    assert_eq!(err.field, "version");
    assert_eq!(err.position.offset, 2);
    assert!(matches!(err.kind(), ErrorKind::AssertionFailed { value } if *value == u(5)));

    let err = parser.parse(&[0xbe, 0xef, 0x01]).unwrap_err();
    assert_eq!(err.field, "magic");
}

#[test]
fn assert_eq_compares_integers_by_value() {
    let parser = Parser::start()
        .uint8("magic")
        .assert_eq(0x42)
        .int8("delta")
        .assert_eq(-1)
        .bit4("flags")
        .assert_eq(5)
        .build()
        .unwrap();

    let record = parser.parse(&[0x42, 0xff, 0x5a]).unwrap();
    assert_eq!(record["magic"], u(0x42));
    assert_eq!(record["delta"], Value::I64(-1));

    let err = parser.parse(&[0x43, 0xff, 0x5a]).unwrap_err();
    assert_eq!(err.field, "magic");

    let err = parser.parse(&[0x42, 0x01, 0x5a]).unwrap_err();
    assert_eq!(err.field, "delta");

    let err = parser.parse(&[0x42, 0xff, 0x6a]).unwrap_err();
    assert_eq!(err.field, "flags");
    assert!(matches!(err.kind(), ErrorKind::AssertionFailed { value } if *value == u(6)));
}

#[test]
fn assertion_sees_formatted_value() {
    let parser = Parser::start()
        .uint8("kind")
        .formatter(|v| Ok(Value::from(if v == Value::U64(1) { "ping" } else { "other" })))
        .assert_eq("ping")
        .build()
        .unwrap();

    assert_eq!(parser.parse(&[1]).unwrap()["kind"], Value::from("ping"));
    assert!(parser.parse(&[2]).is_err());
}

#[test]
fn duplicate_names_are_rejected() {
    let err = Parser::start().uint8("a").uint16le("a").build().unwrap_err();
    assert!(matches!(err, SchemaError::InvalidSchema { .. }));
}

#[test]
fn unsupported_bit_width() {
    let err = Parser::start().bits("wide", 33).build().unwrap_err();
    assert!(matches!(err, SchemaError::UnsupportedType { .. }));
}

#[test]
fn command_with_terminated_payload() {
    let parser = Parser::start()
        .uint8("cmd")
        .buffer("data", BufferOptions::new().read_until(|b| b == 2))
        .build()
        .unwrap();

    let record = parser.parse(&hex("aa bb cc 02 dd")).unwrap();
    assert_eq!(
        record,
        Record::from([("cmd", u(0xaa)), ("data", Value::from(vec![0xbbu8, 0xcc]))])
    );
}

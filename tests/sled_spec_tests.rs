use serde_sled::{
    parse, to_string, to_string_minified, to_string_with_options, ErrorCategory, LineSeparator,
    QuoteMark, SerializeOptions, Value,
};

const SETTINGS: &str = "\
# settings
title = 'Sled \"demo\"'
count = 1_024
ratio = 0.25
huge = 1.5e300
enabled = @true
missing = @nil
digest = @hex(00ff)
greeting = @concat(
  \"hello \"
  'world'
)
servers = [
  alpha
  { host = beta; port = 8080 }
]
codes = { 1 = one; 2 = two }
";

#[test]
fn test_every_entity_kind() {
    let doc = parse(SETTINGS).unwrap();
    let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "title", "count", "ratio", "huge", "enabled", "missing", "digest", "greeting",
            "servers", "codes"
        ]
    );

    assert_eq!(doc.get("title"), Some(&Value::from("Sled \"demo\"")));
    assert_eq!(doc.get("count"), Some(&Value::Integer(1024)));
    assert_eq!(doc.get("ratio"), Some(&Value::Float(0.25)));
    assert_eq!(doc.get("huge"), Some(&Value::Float(1.5e300)));
    assert_eq!(doc.get("enabled"), Some(&Value::Boolean(true)));
    assert_eq!(doc.get("missing"), Some(&Value::Nil));
    assert_eq!(doc.get("digest"), Some(&Value::bytes(vec![0x00, 0xff])));
    assert_eq!(doc.get("greeting"), Some(&Value::from("hello world")));

    let servers = doc.get("servers").and_then(Value::as_list).unwrap();
    assert_eq!(servers[0], Value::from("alpha"));
    let beta = servers[1].as_string_map().unwrap();
    assert_eq!(beta.get("port"), Some(&Value::Integer(8080)));

    let codes = doc.get("codes").and_then(Value::as_int_map).unwrap();
    assert_eq!(codes.get(&1_i64), Some(&Value::from("one")));
    assert_eq!(codes.get(&2_i64), Some(&Value::from("two")));
}

#[test]
fn test_canonical_rendering() {
    let doc = Value::StringMap(parse(SETTINGS).unwrap());
    let expected = "\
title = \"Sled \\\"demo\\\"\"
count = 1_024
ratio = 0.25
huge = 1.5e300
enabled = @true
missing = @nil
digest = @hex(00ff)
greeting = \"hello world\"
servers = [
  alpha
  {
    host = beta
    port = 8_080
  }
]
codes = {
  1 = one
  2 = two
}
";
    assert_eq!(to_string(&doc).unwrap(), expected);
}

#[test]
fn test_minified_rendering() {
    let doc = Value::StringMap(parse(SETTINGS).unwrap());
    let options = SerializeOptions::minified().with_quote_mark(QuoteMark::Single);
    assert_eq!(
        to_string_with_options(&doc, options).unwrap(),
        "title='Sled \"demo\"';count=1024;ratio=0.25;huge=1.5e300;enabled=@true;missing=@nil;\
         digest=@hex(00ff);greeting='hello world';servers=[alpha;{host=beta;port=8080}];\
         codes={1=one;2=two}"
    );
}

#[test]
fn test_layouts_agree() {
    let doc = Value::StringMap(parse(SETTINGS).unwrap());
    let canonical = to_string(&doc).unwrap();
    let minified = to_string_minified(&doc).unwrap();
    assert_eq!(parse(&canonical).unwrap(), parse(&minified).unwrap());
    assert_eq!(Value::StringMap(parse(&canonical).unwrap()), doc);
}

#[test]
fn test_serializing_twice_is_stable() {
    let doc = Value::StringMap(parse(SETTINGS).unwrap());
    let once = to_string(&doc).unwrap();
    let twice = to_string(&Value::StringMap(parse(&once).unwrap())).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_crlf_output() {
    let value = serde_sled::sled!({ "s": "a\r\nb", "n": 1 });
    let options = SerializeOptions::canonical().with_line_separator(LineSeparator::CrLf);
    let text = to_string_with_options(&value, options).unwrap();
    assert_eq!(text, "s = @concat(\r\n  \"a\\r\\n\"\r\n  \"b\"\r\n)\r\nn = 1\r\n");
    assert_eq!(Value::StringMap(parse(&text).unwrap()), value);
}

#[test]
fn test_empty_document() {
    let empty = Value::StringMap(serde_sled::StringMap::new());
    assert_eq!(to_string(&empty).unwrap(), "\n");
    assert_eq!(to_string_minified(&empty).unwrap(), "");
    assert!(parse("\n").unwrap().is_empty());
}

#[test]
fn test_error_reason_is_first_line() {
    let err = parse("a = 1\nb = [1 2]").unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::Syntax));
    assert_eq!(err.line(), Some(2));
    let message = err.to_string();
    assert_eq!(message.lines().next(), err.reason());
    assert!(message.contains("\nLine 2, column "));
}

#[test]
fn test_long_lines_are_shortened_in_errors() {
    let text = format!("v = (oops{}", "x".repeat(200));
    let err = parse(&text).unwrap_err();
    let message = err.to_string();
    let context = message.lines().nth(2).unwrap();
    assert!(context.starts_with("v = (oops"));
    assert!(context.ends_with("..."));
    assert!(context.chars().count() < text.chars().count());
}

#[test]
fn test_every_duplicate_is_reported() {
    let err = parse("m = {\n  a = 1\n  b = 2\n  a = 3\n  b = 4\n  a = 5\n}").unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::DuplicateMapKey));
    assert_eq!(err.line(), Some(1));
    assert_eq!(
        err.to_string(),
        "Sled map starting on line 1 at column 5 contains duplicate keys.\n\
         \"a\": line 2 column 3, line 4 column 3, line 6 column 3\n\
         \"b\": line 3 column 3, line 5 column 3"
    );
}

#[test]
fn test_duplicate_integer_keys() {
    let err = parse("m = {1 = a; 01 = b}").unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::DuplicateMapKey));
    assert!(err.to_string().contains("\n1: line 1 column 6, line 1 column 13"));
}

#[test]
fn test_invalid_map_keys() {
    let err = parse("m = {1.5 = a}").unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::MapKeyTypeMismatch));

    let err = parse("m = {@nil = a}").unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::MapKeyTypeMismatch));
}

#[test]
fn test_float_overflow() {
    let err = parse("x = 1e400").unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::NumberRangeOverflow));
    assert_eq!(err.line(), Some(1));
}

#[test]
fn test_deep_nesting_is_an_error() {
    for depth in [2_000, 200_000] {
        let text = format!("a = {}{}", "[".repeat(depth), "]".repeat(depth));
        let err = parse(&text).unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Syntax));
    }
}

/// Builds a [`Value`](crate::Value) with JSON-like syntax.
///
/// Map keys must be string literals. Any other expression goes through
/// [`to_value`](crate::to_value); wrap multi-token expressions such as
/// negative numbers in parentheses.
///
/// ```rust
/// use serde_sled::{sled, Value};
///
/// let value = sled!({
///     "name": "John Doe",
///     "age": 50,
///     "offset": (-3),
///     "children": ["Jane", "Jimmy"],
///     "spouse": nil
/// });
/// assert_eq!(value.as_string_map().unwrap().get("offset"), Some(&Value::Integer(-3)));
/// ```
#[macro_export]
macro_rules! sled {
    (null) => {
        $crate::Value::Nil
    };

    (nil) => {
        $crate::Value::Nil
    };

    (true) => {
        $crate::Value::Boolean(true)
    };

    (false) => {
        $crate::Value::Boolean(false)
    };

    ([]) => {
        $crate::Value::List(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(vec![$($crate::sled!($elem)),*])
    };

    ({}) => {
        $crate::Value::StringMap($crate::StringMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::StringMap::new();
        $(
            map.insert($key.to_string(), $crate::sled!($value));
        )*
        $crate::Value::StringMap(map)
    }};

    // Anything serializable
    ($e:expr) => {
        $crate::to_value(&$e).unwrap_or($crate::Value::Nil)
    };
}

#[cfg(test)]
mod tests {
    use crate::{StringMap, Value};

    #[test]
    fn test_sled_macro_primitives() {
        assert_eq!(sled!(null), Value::Nil);
        assert_eq!(sled!(nil), Value::Nil);
        assert_eq!(sled!(true), Value::Boolean(true));
        assert_eq!(sled!(false), Value::Boolean(false));
        assert_eq!(sled!(42), Value::Integer(42));
        assert_eq!(sled!(3.5), Value::Float(3.5));
        assert_eq!(sled!("hello"), Value::String("hello".to_string()));
        assert_eq!(sled!((-7)), Value::Integer(-7));
    }

    #[test]
    fn test_sled_macro_lists() {
        assert_eq!(sled!([]), Value::List(vec![]));
        assert_eq!(
            sled!([1, "two", [null]]),
            Value::List(vec![
                Value::Integer(1),
                Value::from("two"),
                Value::List(vec![Value::Nil]),
            ])
        );
    }

    #[test]
    fn test_sled_macro_maps() {
        assert_eq!(sled!({}), Value::StringMap(StringMap::new()));

        let map = sled!({
            "name": "Alice",
            "age": 30,
        });
        let map = map.as_string_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().next().map(String::as_str), Some("name"));
        assert_eq!(map.get("age"), Some(&Value::Integer(30)));
    }

    #[test]
    fn test_sled_macro_expressions() {
        let bytes = Value::bytes(vec![1, 2]);
        assert_eq!(sled!((bytes.clone())), bytes);
        assert!(sled!((f64::NAN)).as_f64().is_some_and(f64::is_nan));
        assert_eq!(sled!((u64::MAX)), Value::Nil);
    }
}

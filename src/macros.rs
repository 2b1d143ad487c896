/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Arrays and objects each get a fresh handle. Anything that is not a
/// literal keyword, array or object goes through `Value::from`.
///
/// # Examples
///
/// ```rust
/// use dson::{dson, Value};
///
/// let user = dson!({
///     "name": "Alice",
///     "tags": ["admin", "ops"],
///     "manager": null,
///     "left": undefined
/// });
///
/// assert_eq!(user.get("name"), Some(Value::from("Alice")));
/// assert_eq!(user.get("left"), Some(Value::Undefined));
/// assert!(user.get("tags").unwrap().is_array());
/// ```
#[macro_export]
macro_rules! dson {
    (null) => {
        $crate::Value::Null
    };

    (undefined) => {
        $crate::Value::Undefined
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::array(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::array(vec![$($crate::dson!($elem)),*])
    };

    ({}) => {
        $crate::Value::empty_object()
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut properties = $crate::Properties::new();
        $(
            properties.insert($key.to_string(), $crate::dson!($value));
        )*
        $crate::Value::object(properties)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

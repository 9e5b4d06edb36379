/// Builds a [`Row`](crate::Row) from `column => value` pairs, preserving
/// the written order.
///
/// Keys and values accept anything `String: From` — string literals and
/// owned strings alike.
///
/// # Examples
///
/// ```rust
/// use tabcase::row;
///
/// let step = row! {"Action" => "Quote", "Price" => "100"};
/// assert_eq!(step["Action"], "Quote");
///
/// let empty = row! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::new()
    };

    ( $($column:expr => $value:expr),+ $(,)? ) => {{
        let mut row = $crate::Row::new();
        $(
            row.insert(
                ::std::string::String::from($column),
                ::std::string::String::from($value),
            );
        )+
        row
    }};
}

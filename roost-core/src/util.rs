use std::{
    cmp,
    fmt::{self, Display},
};

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Displays at most the first 497 bytes of a (possibly long) query, followed by `...` when cut.
pub struct Truncated<'a>(pub &'a str);

impl Display for Truncated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut end = cmp::min(self.0.len(), 497);
        while !self.0.is_char_boundary(end) {
            end -= 1;
        }
        write!(
            f,
            "{}{}",
            self.0[..end].trim_end(),
            if self.0.len() > 497 { "..." } else { "" }
        )
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::Truncated(::std::convert::AsRef::<str>::as_ref(&$query))
    };
}

/// Builds a [`Record`](crate::Record) from `key => value` pairs.
///
/// ```rust
/// use roost_core::{Value, record};
/// let record = record! { "title" => "First post", "views" => 3 };
/// assert_eq!(record["views"], Value::Int64(3));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        record
    }};
}

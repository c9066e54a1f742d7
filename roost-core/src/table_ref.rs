use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// Table name, optionally qualified by the database (schema) holding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: Cow<'static, str>,
    pub schema: Cow<'static, str>,
}

impl TableRef {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            schema: Cow::Borrowed(""),
        }
    }

    /// Same table inside database `schema`, or unqualified when `None`.
    pub fn qualified(&self, schema: Option<&str>) -> Self {
        Self {
            name: self.name.clone(),
            schema: schema.map_or(Cow::Borrowed(""), |v| Cow::Owned(v.to_owned())),
        }
    }

    pub fn full_name(&self) -> String {
        let mut result = String::new();
        if !self.schema.is_empty() {
            result.push_str(&self.schema);
            result.push('.');
        }
        result.push_str(&self.name);
        result
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

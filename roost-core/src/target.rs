use crate::{Error, Result, RoostError};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
};
use url::form_urlencoded;

/// Parsed connection URL: `<driver>://<location>?<params>`.
///
/// The `database` parameter is the default selection, every other parameter is left to the
/// driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectTarget {
    pub driver: String,
    pub location: String,
    pub database: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl ConnectTarget {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |message: &str| -> Error {
            let error = RoostError::Connection(format!("{} in `{}`", message, url));
            log::error!("{}", error);
            error.into()
        };
        let Some((driver, rest)) = url.split_once("://") else {
            return Err(invalid("Missing `<driver>://` prefix"));
        };
        if driver.is_empty() || !driver.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(invalid("Invalid driver name"));
        }
        let (location, query) = rest.split_once('?').unwrap_or((rest, ""));
        let location = urlencoding::decode(location)
            .map_err(|_| invalid("Location is not valid percent encoded UTF-8"))?
            .into_owned();
        let mut database = None;
        let mut options = BTreeMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == "database" {
                database = Some(value.into_owned()).filter(|v| !v.is_empty());
            } else {
                options.insert(key.into_owned(), value.into_owned());
            }
        }
        Ok(Self {
            driver: driver.to_ascii_lowercase(),
            location,
            database,
            options,
        })
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

impl FromStr for ConnectTarget {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}",
            self.driver,
            urlencoding::encode(&self.location)
        )?;
        let mut params = form_urlencoded::Serializer::new(String::new());
        if let Some(database) = &self.database {
            params.append_pair("database", database);
        }
        params.extend_pairs(&self.options);
        let params = params.finish();
        if !params.is_empty() {
            write!(f, "?{}", params)?;
        }
        Ok(())
    }
}

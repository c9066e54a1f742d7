use crate::{Error, Result, RoostError};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Structured form of a property option string such as `"primary auto_increment"`.
///
/// The grammar is a whitespace separated list of flags (`primary`, `required`, `auto_increment`,
/// `unique`, `unsigned`) and `key=value` pairs (`default=<literal>`, `width=<number>`). Each
/// entry may appear once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub primary: bool,
    pub required: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub unsigned: bool,
    pub default: Option<String>,
    pub width: Option<u32>,
}

impl Options {
    pub fn parse(input: &str) -> Result<Self> {
        let mut options = Options::default();
        for token in input.split_whitespace() {
            let invalid = |reason: &str| -> Error {
                RoostError::SchemaDefinition(format!(
                    "{} `{}` in the options `{}`",
                    reason, token, input
                ))
                .into()
            };
            match token.split_once('=') {
                None => {
                    let flag = match token {
                        "primary" => &mut options.primary,
                        "required" => &mut options.required,
                        "auto_increment" => &mut options.auto_increment,
                        "unique" => &mut options.unique,
                        "unsigned" => &mut options.unsigned,
                        _ => return Err(invalid("Unknown option")),
                    };
                    if *flag {
                        return Err(invalid("Duplicated option"));
                    }
                    *flag = true;
                }
                Some((key, value)) => {
                    if key.is_empty() || value.is_empty() {
                        return Err(invalid("Malformed option"));
                    }
                    match key {
                        "default" => {
                            if options.default.is_some() {
                                return Err(invalid("Duplicated option"));
                            }
                            options.default = Some(value.to_owned());
                        }
                        "width" => {
                            if options.width.is_some() {
                                return Err(invalid("Duplicated option"));
                            }
                            options.width =
                                Some(value.parse().map_err(|_| invalid("Invalid width"))?);
                        }
                        _ => return Err(invalid("Unknown option")),
                    }
                }
            }
        }
        Ok(options)
    }
}

impl FromStr for Options {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Options::parse(s)
    }
}

impl Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.primary, "primary"),
            (self.required, "required"),
            (self.auto_increment, "auto_increment"),
            (self.unique, "unique"),
            (self.unsigned, "unsigned"),
        ];
        let mut separate = false;
        for (_, name) in flags.iter().filter(|(set, _)| *set) {
            if separate {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
            separate = true;
        }
        if let Some(default) = &self.default {
            if separate {
                f.write_str(" ")?;
            }
            write!(f, "default={}", default)?;
            separate = true;
        }
        if let Some(width) = self.width {
            if separate {
                f.write_str(" ")?;
            }
            write!(f, "width={}", width)?;
        }
        Ok(())
    }
}

//! srsRAN INI config files.
//!
//! A node config is the operator's template with one section overwritten.

use std::path::Path;
use std::str::FromStr;

use ini::{Ini, Properties};

use crate::error::{Error, Result};

/// Load the template at `path`. A missing template gives an empty file.
pub(crate) async fn load_template(path: &Path) -> Result<Ini> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => parse(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "srsRAN template not found, starting empty");
            Ok(Ini::new())
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn parse(text: &str) -> Result<Ini> {
    Ini::load_from_str(text).map_err(|e| Error::Ini(ini::Error::Parse(e)))
}

pub(crate) fn render(ini: &Ini) -> Result<String> {
    let mut buf = Vec::new();
    ini.write_to(&mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::Parse(format!("INI output is not UTF-8: {}", e)))
}

/// Read and parse `key` of `section`.
pub(crate) fn field<T: FromStr>(props: &Properties, section: &str, key: &str) -> Result<T> {
    let raw = props
        .get(key)
        .ok_or_else(|| Error::Parse(format!("[{}] has no {}", section, key)))?;
    raw.trim()
        .parse()
        .map_err(|_| Error::Parse(format!("[{}] {} = {:?} is invalid", section, key, raw)))
}

/// Every key of `section` not in `known`.
pub(crate) fn extra_fields(
    props: &Properties,
    known: &[&str],
) -> std::collections::BTreeMap<String, String> {
    props
        .iter()
        .filter(|(k, _)| !known.contains(k))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

use crate::proto::StringStringEntryProto;
use crate::{Error, Result};

/// Where an externally stored tensor payload lives
///
/// Only the reference is kept; reading the file is left to the caller, who
/// can hand its bytes to [`ExternalDataRef::slice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDataRef {
    pub location: String,
    pub offset: Option<u64>,
    pub length: Option<u64>,
    pub checksum: Option<String>,
}

impl ExternalDataRef {
    /// Parse external data info from key-value pairs
    pub(crate) fn from_key_value_pairs(pairs: &[StringStringEntryProto]) -> Result<Self> {
        let mut location: Option<String> = None;
        let mut offset: Option<u64> = None;
        let mut length: Option<u64> = None;
        let mut checksum: Option<String> = None;

        for pair in pairs {
            let key = pair.key.as_deref().unwrap_or("");
            let value = pair.value.as_deref().unwrap_or("");

            match key {
                "location" => location = Some(value.to_string()),
                "offset" => offset = Some(parse_u64("offset", value)?),
                "length" => length = Some(parse_u64("length", value)?),
                "checksum" => checksum = Some(value.to_string()),
                _ => {} // ignore unknown keys
            }
        }

        let location = location
            .filter(|l| !l.is_empty())
            .ok_or_else(|| Error::missing_field("location", "TensorProto.external_data"))?;

        Ok(ExternalDataRef {
            location,
            offset,
            length,
            checksum,
        })
    }

    /// Extract this tensor's byte range from the contents of `location`
    pub fn slice<'a>(&self, file: &'a [u8]) -> Result<&'a [u8]> {
        let start = usize::try_from(self.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let end = match self.length {
            Some(len) => start.saturating_add(usize::try_from(len).unwrap_or(usize::MAX)),
            None => file.len(),
        };

        if start > file.len() {
            return Err(Error::corrupted_data(
                format!(
                    "external data offset {} exceeds file size {}",
                    start,
                    file.len()
                ),
                None,
            ));
        }

        if end > file.len() || end < start {
            return Err(Error::corrupted_data(
                format!(
                    "external data range {}..{} exceeds file size {}",
                    start,
                    end,
                    file.len()
                ),
                None,
            ));
        }

        Ok(&file[start..end])
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| Error::type_conversion("string", "u64", format!("{key}={value}")))
}

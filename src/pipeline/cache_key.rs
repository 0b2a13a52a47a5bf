//! Edge cache key construction.

use std::fmt;

use url::Url;

use crate::pipeline::negotiate::FormatPreference;
use crate::pipeline::SourceDescriptor;

/// Key under which an assembled response is cached.
///
/// The key is the inbound request URL, untouched, with the negotiated
/// format appended as one more query parameter. Equal keys mean equal
/// responses, so everything that changes the output bytes must be in here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn build(inbound: &Url, preference: FormatPreference) -> Self {
        let (name, value) = preference.cache_key_param();
        Self::append(inbound, &[(name, value)])
    }

    /// Key for a resolved request.
    ///
    /// The raw query does not pin down what reloadable settings feed into the
    /// rendition (fallback origin, quality policy), so the resolved source URL
    /// and effective quality follow the format parameter.
    pub fn for_request(inbound: &Url, descriptor: &SourceDescriptor) -> Self {
        let (name, value) = descriptor.format.cache_key_param();
        let quality = descriptor.quality.map(|q| q.to_string());

        let mut params = vec![(name, value), ("source", descriptor.absolute_url.as_str())];
        if let Some(quality) = quality.as_deref() {
            params.push(("quality", quality));
        }
        Self::append(inbound, &params)
    }

    fn append(inbound: &Url, params: &[(&str, &str)]) -> Self {
        let mut url = inbound.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

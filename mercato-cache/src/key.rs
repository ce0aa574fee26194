use sha2::{Digest, Sha256};

use mercato_core::DataRequest;

/// Deterministic cache key for a request.
///
/// The key hashes a canonical rendering of the request's logical content:
/// symbols, fields, and extra parameters are sorted first, so two requests
/// that differ only in input ordering derive the same key.
#[must_use]
pub fn cache_key(request: &DataRequest) -> String {
    let mut symbols: Vec<&str> = request
        .symbols
        .symbols()
        .iter()
        .map(String::as_str)
        .collect();
    symbols.sort_unstable();

    let mut fields: Vec<&str> = request.fields.iter().map(String::as_str).collect();
    fields.sort_unstable();

    // BTreeMap already iterates params in key order.
    let params: Vec<String> = request
        .params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();

    let canonical = format!(
        "{}|{}|{}|{}|{}|{}",
        request.kind.as_str(),
        symbols.join(","),
        request.start.map_or_else(String::new, |d| d.to_string()),
        request.end.map_or_else(String::new, |d| d.to_string()),
        fields.join(","),
        params.join(","),
    );

    let digest = Sha256::digest(canonical.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

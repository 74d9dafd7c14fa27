use atproto_client::AtprotoClient;
use tracing::info;

use skylens_common::{Identity, SkylensError};

/// Strip a leading `@` and lowercase; the resolution endpoint is strict
/// about both.
pub(crate) fn normalize_handle(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_ascii_lowercase()
}

/// Resolve a handle to a DID and the personal data server hosting it.
/// No retries: a failure at any hop aborts the whole run.
pub(crate) async fn resolve_identity(
    client: &AtprotoClient,
    raw_handle: &str,
) -> Result<Identity, SkylensError> {
    let handle = normalize_handle(raw_handle);

    let did = client
        .resolve_handle(&handle)
        .await
        .map_err(|err| SkylensError::Resolution(err.to_string()))?;

    let document = client
        .fetch_did_document(&did)
        .await
        .map_err(|err| SkylensError::Resolution(err.to_string()))?;

    let pds_endpoint = AtprotoClient::pds_endpoint(&document)
        .map_err(|err| SkylensError::Resolution(err.to_string()))?;

    info!(%handle, %did, %pds_endpoint, "Resolved identity");
    Ok(Identity {
        handle,
        did,
        pds_endpoint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_at_prefix_and_case() {
        assert_eq!(normalize_handle("@Alice.bsky.social"), "alice.bsky.social");
        assert_eq!(normalize_handle("  bob.example.com "), "bob.example.com");
    }
}

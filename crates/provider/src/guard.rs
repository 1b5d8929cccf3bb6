use std::net::{IpAddr, Ipv4Addr};

use tracing::warn;

use crate::error::ProviderError;

/// Cloud metadata endpoint used by AWS, GCP, and Azure alike.
const METADATA_ADDR: Ipv4Addr = Ipv4Addr::new(169, 254, 169, 254);

/// Rejects delivery to loopback, private, link-local, and cloud metadata
/// addresses unless the integration has explicitly opted in via
/// `allow_private`.
///
/// `host` may be a hostname or a literal IP; hostnames are resolved through
/// the system resolver and every resolved address is checked, since a DNS
/// answer under attacker control is exactly the rebinding case this guard
/// exists to stop.
pub async fn ensure_allowed_host(host: &str, allow_private: bool) -> Result<(), ProviderError> {
    if allow_private {
        return Ok(());
    }

    let addrs = resolve(host).await?;
    if addrs.is_empty() {
        return Err(ProviderError::Configuration(format!(
            "host {host} did not resolve to any address"
        )));
    }

    for addr in addrs {
        if is_blocked(addr) {
            warn!(host, %addr, "blocked outbound delivery to disallowed address");
            return Err(ProviderError::Blocked(format!(
                "{host} resolves to disallowed address {addr}"
            )));
        }
    }
    Ok(())
}

async fn resolve(host: &str) -> Result<Vec<IpAddr>, ProviderError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }
    tokio::net::lookup_host((host, 0))
        .await
        .map(|iter| iter.map(|addr| addr.ip()).collect())
        .map_err(|e| ProviderError::Connection(format!("failed to resolve {host}: {e}")))
}

fn is_blocked(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4 == METADATA_ADDR
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00 // unique local fc00::/7
                || (v6.segments()[0] & 0xffc0) == 0xfe80 // link-local fe80::/10
        }
    }
}

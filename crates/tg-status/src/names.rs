//! Tailnet name resolution.

use serde::Serialize;
use tg_tailscale::{LoginProfile, TailscaleClient, TailscaleStatus};
use tokio::time::Instant;
use tracing::debug;

use crate::deadline::within;

/// Display names of the tailnet this node belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TailnetNames {
    /// MagicDNS suffix, also the TLS certificate domain.
    pub tailnet_name: String,
    /// Human-facing tailnet name.
    pub domain_name: String,
}

impl TailnetNames {
    /// Names from the live login profile.
    #[must_use]
    pub fn from_profile(profile: &LoginProfile) -> Self {
        let network = &profile.network_profile;
        Self {
            tailnet_name: network.magic_dns_name.clone(),
            domain_name: network.display_name_or_default().to_string(),
        }
    }

    /// Names cached in the status snapshot, or empty strings.
    #[must_use]
    pub fn from_snapshot(status: &TailscaleStatus) -> Self {
        status
            .current_tailnet
            .as_ref()
            .map(|tailnet| Self {
                tailnet_name: tailnet.magic_dns_suffix.clone(),
                domain_name: tailnet.name.clone(),
            })
            .unwrap_or_default()
    }
}

/// Resolve the tailnet names, preferring the live profile.
pub async fn resolve_names(
    client: &dyn TailscaleClient,
    status: &TailscaleStatus,
    deadline: Instant,
) -> TailnetNames {
    match within(deadline, "profile status", client.profile_status()).await {
        Ok(profile) => TailnetNames::from_profile(&profile),
        Err(err) => {
            debug!(error = %err, "profile fetch failed, using cached tailnet");
            TailnetNames::from_snapshot(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tg_tailscale::{MockTailscaleClient, TailnetStatus};

    use super::*;

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(1)
    }

    #[tokio::test]
    async fn live_profile_wins() {
        let client = MockTailscaleClient::new();
        client
            .set_profile(Some(MockTailscaleClient::mock_profile(
                "example.ts.net",
                "example.com",
                "Example Corp",
            )))
            .await;
        let status = client.status().await.unwrap();

        let names = resolve_names(&client, &status, deadline()).await;
        assert_eq!(names.tailnet_name, "example.ts.net");
        assert_eq!(names.domain_name, "Example Corp");
    }

    #[tokio::test]
    async fn profile_without_display_name_uses_domain() {
        let client = MockTailscaleClient::new();
        client
            .set_profile(Some(MockTailscaleClient::mock_profile(
                "example.ts.net",
                "example.com",
                "",
            )))
            .await;
        let status = client.status().await.unwrap();

        let names = resolve_names(&client, &status, deadline()).await;
        assert_eq!(names.domain_name, "example.com");
    }

    #[tokio::test]
    async fn failed_profile_uses_cached_tailnet() {
        let client = MockTailscaleClient::new();
        client
            .set_current_tailnet(Some(TailnetStatus {
                name: "cached-tailnet".to_string(),
                magic_dns_suffix: "cached.ts.net".to_string(),
                magic_dns_enabled: true,
            }))
            .await;
        let status = client.status().await.unwrap();

        let names = resolve_names(&client, &status, deadline()).await;
        assert_eq!(names.tailnet_name, "cached.ts.net");
        assert_eq!(names.domain_name, "cached-tailnet");
    }

    #[tokio::test]
    async fn nothing_known_gives_empty_names() {
        let client = MockTailscaleClient::new();
        client.set_current_tailnet(None).await;
        let status = client.status().await.unwrap();

        let names = resolve_names(&client, &status, deadline()).await;
        assert_eq!(names, TailnetNames::default());
    }
}

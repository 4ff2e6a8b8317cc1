//! HTML rendering of the status page.
//!
//! All dynamic text goes through [`Escaped`]; only static labels and the
//! embedded assets are written raw.

use std::fmt::{self, Display, Formatter, Write};

use chrono::{DateTime, Utc};
use tg_status::format::format_timestamp;
use tg_status::{PeerView, RouteInfo, SelfStatus, StatusReport, TunnelStatus};

use crate::config::TailGuardConfig;

/// Page title.
pub const TITLE: &str = "TailGuard Status";

/// Favicon served at `/favicon.svg`.
pub const FAVICON: &str = include_str!("../assets/favicon.svg");

const LOGO: &str = include_str!("../assets/logo.svg");
const STYLE: &str = include_str!("../assets/style.css");

/// Text escaped for HTML element and attribute content.
#[derive(Debug, Clone, Copy)]
pub struct Escaped<'a>(pub &'a str);

impl Display for Escaped<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                '\'' => f.write_str("&#39;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// Escape `text` for HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    Escaped(text).to_string()
}

/// An optional value, or a muted dash.
struct OrDash<T>(Option<T>);

impl<T: Display> Display for OrDash<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => write!(f, "{}", Escaped(&value.to_string())),
            None => f.write_str(r#"<span class="muted">-</span>"#),
        }
    }
}

struct YesNo(bool);

impl Display for YesNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "Yes" } else { "No" })
    }
}

/// Everything shown on one page load.
#[derive(Debug, Clone, Copy)]
pub struct StatusPage<'a> {
    /// Container configuration.
    pub config: &'a TailGuardConfig,
    /// Container start time.
    pub startup_time: Option<DateTime<Utc>>,
    /// Last successful health check.
    pub healthy_time: Option<DateTime<Utc>>,
    /// Both status sections.
    pub report: &'a StatusReport,
}

impl Display for StatusPage<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, r#"<html lang="en">"#)?;
        writeln!(f, "<head>")?;
        writeln!(f, r#"<meta charset="utf-8">"#)?;
        writeln!(f, r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#)?;
        writeln!(f, "<title>{TITLE}</title>")?;
        writeln!(f, r#"<link rel="icon" href="/favicon.svg" type="image/svg+xml">"#)?;
        writeln!(f, "<style>\n{STYLE}</style>")?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;
        writeln!(f, "<header>{LOGO}<h1>{TITLE}</h1></header>")?;

        self.tailguard_section(f)?;

        writeln!(f, "<h2>Tailscale</h2>")?;
        match &self.report.tailscale {
            Ok(status) => tailscale_section(f, status)?,
            Err(err) => error_box(f, err)?,
        }

        writeln!(f, "<h2>WireGuard</h2>")?;
        match &self.report.wireguard {
            Ok(status) => wireguard_section(f, status)?,
            Err(err) => error_box(f, err)?,
        }

        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

impl StatusPage<'_> {
    fn tailguard_section(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let config = self.config;
        writeln!(f, "<h2>TailGuard</h2>")?;
        writeln!(f, "<table>")?;
        row(f, "Expose host", YesNo(config.expose_host))?;
        row(f, "Client mode", YesNo(config.client_mode))?;
        row(f, "Nameservers", Escaped(&config.nameservers))?;
        row(f, "WireGuard device", Escaped(&config.wireguard_device))?;
        row(f, "Isolate peers", YesNo(config.wireguard_isolate_peers))?;
        row(f, "Tailscale device", Escaped(&config.tailscale_device))?;
        row(f, "Tailscale port", config.tailscale_port)?;
        row(f, "Started", OrDash(self.startup_time.map(format_timestamp)))?;
        row(f, "Last healthy", OrDash(self.healthy_time.map(format_timestamp)))?;
        writeln!(f, "</table>")
    }
}

fn row(f: &mut Formatter<'_>, label: &str, value: impl Display) -> fmt::Result {
    writeln!(f, "<tr><th>{label}</th><td>{value}</td></tr>")
}

fn error_box(f: &mut Formatter<'_>, err: &str) -> fmt::Result {
    writeln!(f, r#"<p class="error">{}</p>"#, Escaped(err))
}

fn tailscale_section(f: &mut Formatter<'_>, status: &SelfStatus) -> fmt::Result {
    writeln!(f, "<table>")?;
    row(f, "Device name", Escaped(&status.device_name))?;
    row(f, "Status", Escaped(&status.state))?;
    row(f, "Tailnet", Escaped(&status.tailnet_name))?;
    row(f, "Domain", Escaped(&status.domain_name))?;
    row(f, "IPv4", OrDash(status.ipv4))?;
    row(f, "IPv6", OrDash(status.ipv6))?;
    row(f, "Operating system", Escaped(&status.operating_system))?;
    row(f, "Version", Escaped(&status.version))?;

    let owner = if status.is_tagged {
        status.tags.join(", ")
    } else {
        let profile = &status.user_profile;
        format!("{} ({})", profile.display_name, profile.login_name)
    };
    row(f, "Owner", Escaped(&owner))?;

    let expiry = status.key_expiry.as_deref().map(|at| {
        if status.key_expired {
            format!("{at} (expired)")
        } else {
            at.to_string()
        }
    });
    row(f, "Key expiry", OrDash(expiry))?;
    row(f, "TUN mode", YesNo(status.tun_mode))?;
    writeln!(f, "</table>")?;

    writeln!(f, "<h3>Routing</h3>")?;
    match &status.route_info {
        Some(routes) => routing_table(f, routes),
        None => writeln!(f, r#"<p class="muted">Route information unavailable.</p>"#),
    }
}

fn approval(approved: bool) -> &'static str {
    if approved {
        r#"<span class="ok">approved</span>"#
    } else {
        r#"<span class="pending">pending approval</span>"#
    }
}

fn routing_table(f: &mut Formatter<'_>, routes: &RouteInfo) -> fmt::Result {
    writeln!(f, "<table>")?;

    if routes.advertising_exit_node {
        row(
            f,
            "Offers exit node",
            format_args!("Yes, {}", approval(routes.advertising_exit_node_approved)),
        )?;
    } else {
        row(f, "Offers exit node", YesNo(false))?;
    }

    match &routes.using_exit_node {
        Some(exit) => row(
            f,
            "Using exit node",
            format_args!(
                "{} ({})",
                Escaped(&exit.name),
                if exit.online { "online" } else { "offline" }
            ),
        )?,
        None => row(f, "Using exit node", OrDash(None::<&str>))?,
    }

    if routes.advertised_routes.is_empty() {
        row(f, "Subnet routes", OrDash(None::<&str>))?;
    } else {
        writeln!(f, "<tr><th>Subnet routes</th><td><ul>")?;
        for route in &routes.advertised_routes {
            writeln!(
                f,
                "<li><code>{}</code> {}</li>",
                route.prefix,
                approval(route.approved)
            )?;
        }
        writeln!(f, "</ul></td></tr>")?;
    }

    writeln!(f, "</table>")
}

fn wireguard_section(f: &mut Formatter<'_>, status: &TunnelStatus) -> fmt::Result {
    writeln!(f, "<table>")?;
    row(f, "Device", Escaped(&status.device_name))?;
    row(
        f,
        "Public key",
        format_args!("<code>{}</code>", OrDash(status.public_key.as_deref())),
    )?;
    row(f, "Listen port", OrDash(status.listen_port))?;
    row(f, "Firewall mark", OrDash(status.firewall_mark))?;
    writeln!(f, "</table>")?;

    writeln!(f, "<h3>Peers</h3>")?;
    if status.peers.is_empty() {
        return writeln!(f, r#"<p class="muted">No peers configured.</p>"#);
    }
    for peer in &status.peers {
        peer_table(f, peer)?;
    }
    Ok(())
}

fn peer_table(f: &mut Formatter<'_>, peer: &PeerView) -> fmt::Result {
    writeln!(f, "<table>")?;
    row(f, "Public key", format_args!("<code>{}</code>", Escaped(&peer.public_key)))?;
    row(f, "Endpoint", OrDash(peer.endpoint.as_deref()))?;
    row(
        f,
        "Allowed IPs",
        Escaped(&peer.allowed_prefixes.join(", ")),
    )?;

    match (&peer.last_handshake_ago, &peer.last_handshake_time) {
        (Some(ago), Some(at)) => row(
            f,
            "Latest handshake",
            format_args!("{} ago ({})", Escaped(ago), Escaped(at)),
        )?,
        _ => row(f, "Latest handshake", "Never")?,
    }

    row(
        f,
        "Transfer",
        format_args!(
            "{} received, {} sent",
            Escaped(&peer.receive_bytes.formatted),
            Escaped(&peer.transmit_bytes.formatted)
        ),
    )?;
    row(
        f,
        "Persistent keepalive",
        OrDash(peer.keepalive_interval.as_ref().map(|every| format!("every {every}"))),
    )?;
    writeln!(f, "</table>")
}

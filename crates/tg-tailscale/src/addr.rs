//! Well-known Tailscale prefixes.

use ipnet::IpNet;

/// Whether `prefix` is the IPv4 default route, `0.0.0.0/0`.
#[must_use]
pub fn is_all_ipv4(prefix: &IpNet) -> bool {
    matches!(prefix, IpNet::V4(net) if net.prefix_len() == 0 && net.addr().is_unspecified())
}

/// Whether `prefix` is the IPv6 default route, `::/0`.
#[must_use]
pub fn is_all_ipv6(prefix: &IpNet) -> bool {
    matches!(prefix, IpNet::V6(net) if net.prefix_len() == 0 && net.addr().is_unspecified())
}

/// Whether `prefix` is one of the two exit-node default routes.
#[must_use]
pub fn is_exit_route(prefix: &IpNet) -> bool {
    is_all_ipv4(prefix) || is_all_ipv6(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    #[test]
    fn default_routes_are_family_specific() {
        assert!(is_all_ipv4(&net("0.0.0.0/0")));
        assert!(!is_all_ipv4(&net("::/0")));
        assert!(is_all_ipv6(&net("::/0")));
        assert!(!is_all_ipv6(&net("0.0.0.0/0")));
    }

    #[test]
    fn only_default_routes_are_exit_routes() {
        assert!(is_exit_route(&net("0.0.0.0/0")));
        assert!(is_exit_route(&net("::/0")));
        assert!(!is_exit_route(&net("192.168.1.0/24")));
        assert!(!is_exit_route(&net("0.0.0.0/1")));
        assert!(!is_exit_route(&net("fd7a:115c:a1e0::/48")));
    }
}

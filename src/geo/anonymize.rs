use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Truncate an address before it leaves the site: the last IPv4 octet is
/// zeroed, IPv6 keeps only its /48 prefix. Country and region survive the
/// truncation for every mainstream geo database.
pub fn anonymize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            IpAddr::V4(Ipv4Addr::new(a, b, c, 0))
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return anonymize_ip(IpAddr::V4(mapped));
            }
            let s = v6.segments();
            IpAddr::V6(Ipv6Addr::new(s[0], s[1], s[2], 0, 0, 0, 0, 0))
        }
    }
}

//! IPv6 address synthesis from an ISP prefix and an interface identifier

use std::net::Ipv6Addr;

use ipnetwork::Ipv6Network;

use crate::error::{Error, Result};

/// Combine a LAN prefix with an interface identifier
///
/// The identifier must only carry host bits: any bit that falls inside
/// the prefix's network part is rejected with
/// [`Error::InterfaceIdOverlap`]. The result keeps the network bits of
/// `network` and the host bits of `interface_id`. Host bits the caller left
/// set on `network` (e.g. `2001:db8::5/64`) are cleared first.
pub fn combine(network: &Ipv6Network, interface_id: Ipv6Addr) -> Result<Ipv6Addr> {
    let mask = u128::from(network.mask());
    let iid = u128::from(interface_id);

    if iid & mask != 0 {
        return Err(Error::InterfaceIdOverlap {
            interface_id,
            network: *network,
        });
    }

    Ok(Ipv6Addr::from(u128::from(network.network()) | iid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv6Network {
        s.parse().unwrap()
    }

    fn addr(s: &str) -> Ipv6Addr {
        s.parse().unwrap()
    }

    #[test]
    fn combines_slash_64_with_short_iid() {
        let result = combine(&net("2001:db8::/64"), addr("::1")).unwrap();
        assert_eq!(result, addr("2001:db8::1"));
    }

    #[test]
    fn combines_full_host_part() {
        let result = combine(
            &net("cafe:babe:dead:beef::/64"),
            addr("::1:2:3:4"),
        )
        .unwrap();
        assert_eq!(result, addr("cafe:babe:dead:beef:1:2:3:4"));
    }

    #[test]
    fn host_bits_on_the_prefix_are_cleared() {
        let result = combine(&net("2001:db8:0:7::5/64"), addr("::42")).unwrap();
        assert_eq!(result, addr("2001:db8:0:7::42"));
    }

    #[test]
    fn non_byte_aligned_prefix() {
        let result = combine(&net("2001:db8:abcd:12f0::/60"), addr("::f:0:0:0:9")).unwrap();
        assert_eq!(result, addr("2001:db8:abcd:12ff::9"));
    }

    #[test]
    fn network_and_host_bits_are_preserved() {
        let network = net("2001:db8:1234::/48");
        let iid = addr("::5678:9abc:def0:1234:5678");
        let result = u128::from(combine(&network, iid).unwrap());
        let mask = u128::from(network.mask());

        assert_eq!(result & mask, u128::from(network.network()));
        assert_eq!(result & !mask, u128::from(iid));
    }

    #[test]
    fn overlap_inside_network_bits_is_rejected() {
        let err = combine(&net("2001:db8::/48"), addr("::1:0:0:0:0:0")).unwrap_err();
        assert!(matches!(err, Error::InterfaceIdOverlap { .. }));
    }

    #[test]
    fn overlap_on_last_network_bit_is_rejected() {
        // /60 ends inside the fourth group; 0x10 sits on bit 59
        let err = combine(&net("2001:db8::/60"), addr("::10:0:0:0:0")).unwrap_err();
        assert!(matches!(err, Error::InterfaceIdOverlap { .. }));
    }

    #[test]
    fn slash_128_accepts_only_zero_iid() {
        let network = net("2001:db8::7/128");
        assert_eq!(combine(&network, Ipv6Addr::UNSPECIFIED).unwrap(), addr("2001:db8::7"));
        assert!(combine(&network, addr("::1")).is_err());
    }
}

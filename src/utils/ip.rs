//! IP 地址处理工具
//!
//! 内部统计接口只对可信子网开放：调用方通过 `X-Real-IP` 头声明自身地址，
//! 该地址必须落在配置的 CIDR 网段内。

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// 已解析的 CIDR 网段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustedSubnet {
    network: IpAddr,
    prefix_len: u8,
}

impl TrustedSubnet {
    pub fn new(network: IpAddr, prefix_len: u8) -> Option<Self> {
        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        (prefix_len <= max).then_some(Self {
            network,
            prefix_len,
        })
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (ip, self.network) {
            (IpAddr::V4(ip), IpAddr::V4(net)) => {
                let mask = u32::MAX
                    .checked_shl(32 - self.prefix_len as u32)
                    .unwrap_or(0);
                let ip_bits = u32::from_be_bytes(ip.octets());
                let net_bits = u32::from_be_bytes(net.octets());
                (ip_bits & mask) == (net_bits & mask)
            }
            (IpAddr::V6(ip), IpAddr::V6(net)) => {
                let mask = u128::MAX
                    .checked_shl(128 - self.prefix_len as u32)
                    .unwrap_or(0);
                let ip_bits = u128::from_be_bytes(ip.octets());
                let net_bits = u128::from_be_bytes(net.octets());
                (ip_bits & mask) == (net_bits & mask)
            }
            _ => false, // IPv4 vs IPv6 不匹配
        }
    }

    /// 检查调用方声明的地址（`X-Real-IP` 头的原始值）是否可信
    pub fn allows(&self, real_ip: Option<&str>) -> bool {
        real_ip
            .map(str::trim)
            .and_then(|raw| raw.parse::<IpAddr>().ok())
            .is_some_and(|ip| self.contains(&ip))
    }
}

impl FromStr for TrustedSubnet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((network, prefix_len)) = s.trim().split_once('/') else {
            return Err(format!("'{}' is not in CIDR notation (addr/prefix)", s));
        };
        let network: IpAddr = network
            .parse()
            .map_err(|e| format!("Invalid network address '{}': {}", network, e))?;
        let prefix_len: u8 = prefix_len
            .parse()
            .map_err(|e| format!("Invalid prefix length '{}': {}", prefix_len, e))?;

        Self::new(network, prefix_len)
            .ok_or_else(|| format!("Prefix length {} is out of range for {}", prefix_len, network))
    }
}

impl fmt::Display for TrustedSubnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let subnet: TrustedSubnet = "192.168.1.0/24".parse().unwrap();
        assert_eq!(subnet.to_string(), "192.168.1.0/24");
        assert!("192.168.1.0".parse::<TrustedSubnet>().is_err());
        assert!("192.168.1.0/33".parse::<TrustedSubnet>().is_err());
        assert!("not-an-ip/8".parse::<TrustedSubnet>().is_err());
    }

    #[test]
    fn test_v4_membership() {
        let subnet: TrustedSubnet = "10.0.0.0/8".parse().unwrap();
        assert!(subnet.allows(Some("10.1.2.3")));
        assert!(subnet.allows(Some(" 10.255.255.255 ")));
        assert!(!subnet.allows(Some("11.0.0.1")));
        assert!(!subnet.allows(Some("garbage")));
        assert!(!subnet.allows(None));
    }

    #[test]
    fn test_v6_membership_and_family_mismatch() {
        let subnet: TrustedSubnet = "fd00::/8".parse().unwrap();
        assert!(subnet.allows(Some("fd12:3456::1")));
        assert!(!subnet.allows(Some("fe80::1")));
        assert!(!subnet.allows(Some("10.0.0.1")));
    }

    #[test]
    fn test_zero_prefix_matches_everything_in_family() {
        let subnet: TrustedSubnet = "0.0.0.0/0".parse().unwrap();
        assert!(subnet.allows(Some("8.8.8.8")));
    }
}

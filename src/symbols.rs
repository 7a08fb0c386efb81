//! Symbol tables mapping masscan's wire and text codes to keywords.
//!
//! The text formats (list, JSON) name things by string, the binary format by
//! number. The two application-protocol tables are maintained separately:
//! their orderings and spellings differ, and the binary one must follow
//! masscan's internal enum exactly.

use crate::types::{AppProtocol, IpProtocol, PortStatus, Symbol, TcpFlag};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Status words used by the text formats.
static STATUSES: LazyLock<HashMap<&'static str, PortStatus>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("open", PortStatus::Open);
    m.insert("closed", PortStatus::Closed);
    m
});

/// IP protocol names used by the text formats.
static IP_PROTOCOLS: LazyLock<HashMap<&'static str, IpProtocol>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("tcp", IpProtocol::Tcp);
    m.insert("udp", IpProtocol::Udp);
    m.insert("icmp", IpProtocol::Icmp);
    m.insert("sctp", IpProtocol::Sctp);
    m
});

/// Application protocol names used by the text formats.
static APP_PROTOCOLS: LazyLock<HashMap<&'static str, AppProtocol>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("ssh1", AppProtocol::Ssh1);
    m.insert("ssh2", AppProtocol::Ssh2);
    m.insert("ssh", AppProtocol::Ssh);
    m.insert("http", AppProtocol::Http);
    m.insert("ftp", AppProtocol::Ftp);
    m.insert("dns-ver", AppProtocol::DnsVer);
    m.insert("snmp", AppProtocol::Snmp);
    m.insert("nbtstat", AppProtocol::Nbtstat);
    m.insert("ssl", AppProtocol::Ssl3);
    m.insert("smtp", AppProtocol::Smtp);
    m.insert("smb", AppProtocol::Smb);
    m.insert("pop", AppProtocol::Pop);
    m.insert("imap", AppProtocol::Imap);
    m.insert("X509", AppProtocol::X509);
    m.insert("zeroaccess", AppProtocol::Zeroaccess);
    m.insert("title", AppProtocol::HtmlTitle);
    m.insert("html", AppProtocol::Html);
    m.insert("ntp", AppProtocol::Ntp);
    m.insert("vuln", AppProtocol::Vuln);
    m.insert("heartbleed", AppProtocol::Heartbleed);
    m.insert("ticketbleed", AppProtocol::Ticketbleed);
    m.insert("vnc", AppProtocol::Vnc);
    m.insert("safe", AppProtocol::Safe);
    m.insert("memcached", AppProtocol::Memcached);
    m.insert("scripting", AppProtocol::Scripting);
    m.insert("versioning", AppProtocol::Versioning);
    m.insert("coap", AppProtocol::Coap);
    m.insert("telnet", AppProtocol::Telnet);
    m.insert("rdp", AppProtocol::Rdp);
    m.insert("http.server", AppProtocol::HttpServer);
    m
});

/// TCP flag names used in dash-separated reason strings (`syn-ack`).
static REASONS: LazyLock<HashMap<&'static str, TcpFlag>> =
    LazyLock::new(|| TcpFlag::ALL.iter().map(|flag| (flag.keyword(), *flag)).collect());

/// Application protocols indexed by masscan's binary ordinal.
///
/// Index 0 is "unspecified".
const BINARY_APP_PROTOCOLS: [Option<AppProtocol>; 31] = [
    None,
    Some(AppProtocol::Heur),
    Some(AppProtocol::Ssh1),
    Some(AppProtocol::Ssh2),
    Some(AppProtocol::Http),
    Some(AppProtocol::Ftp),
    Some(AppProtocol::DnsVersionbind),
    Some(AppProtocol::Snmp),
    Some(AppProtocol::Nbtstat),
    Some(AppProtocol::Ssl3),
    Some(AppProtocol::Smb),
    Some(AppProtocol::Smtp),
    Some(AppProtocol::Pop3),
    Some(AppProtocol::Imap4),
    Some(AppProtocol::UdpZeroaccess),
    Some(AppProtocol::X509Cert),
    Some(AppProtocol::HtmlTitle),
    Some(AppProtocol::HtmlFull),
    Some(AppProtocol::Ntp),
    Some(AppProtocol::Vuln),
    Some(AppProtocol::Heartbleed),
    Some(AppProtocol::Ticketbleed),
    Some(AppProtocol::VncRfb),
    Some(AppProtocol::Safe),
    Some(AppProtocol::Memcached),
    Some(AppProtocol::Scripting),
    Some(AppProtocol::Versioning),
    Some(AppProtocol::Coap),
    Some(AppProtocol::Telnet),
    Some(AppProtocol::Rdp),
    Some(AppProtocol::HttpServer),
];

/// IANA protocol numbers found in binary records.
pub mod proto_numbers {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const ICMPV6: u8 = 58;
    pub const SCTP: u8 = 132;
}

fn lookup<T: Copy>(table: &HashMap<&'static str, T>, text: &str) -> Symbol<T> {
    match table.get(text) {
        Some(value) => Symbol::Known(*value),
        None => Symbol::Raw(text.to_string()),
    }
}

/// Parse a status word.
pub fn status_of(text: &str) -> Symbol<PortStatus> {
    lookup(&STATUSES, text)
}

/// Parse an IP protocol name.
pub fn ip_protocol_of(text: &str) -> Symbol<IpProtocol> {
    lookup(&IP_PROTOCOLS, text)
}

/// Parse an application protocol name.
pub fn app_protocol_of(text: &str) -> Symbol<AppProtocol> {
    lookup(&APP_PROTOCOLS, text)
}

/// Parse a dash-separated reason string such as `syn-ack`.
pub fn reason_flags_of(text: &str) -> Vec<Symbol<TcpFlag>> {
    text.split('-')
        .filter(|flag| !flag.is_empty())
        .map(|flag| lookup(&REASONS, flag))
        .collect()
}

/// Look up an IP protocol number.
pub const fn ip_protocol_from_number(number: u8) -> Option<IpProtocol> {
    match number {
        proto_numbers::ICMP | proto_numbers::ICMPV6 => Some(IpProtocol::Icmp),
        proto_numbers::TCP => Some(IpProtocol::Tcp),
        proto_numbers::UDP => Some(IpProtocol::Udp),
        proto_numbers::SCTP => Some(IpProtocol::Sctp),
        _ => None,
    }
}

/// Look up an application protocol ordinal from the binary format.
pub fn app_protocol_from_index(index: u16) -> Option<AppProtocol> {
    BINARY_APP_PROTOCOLS
        .get(usize::from(index))
        .copied()
        .flatten()
}

/// Decode a reason bitmask into its set flags, lowest bit first.
///
/// A zero mask yields an empty list.
pub fn reason_flags_from_mask(mask: u8) -> Vec<TcpFlag> {
    TcpFlag::ALL
        .iter()
        .copied()
        .filter(|flag| mask & flag.bit() != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lookup() {
        assert_eq!(status_of("open"), PortStatus::Open);
        assert_eq!(status_of("closed"), PortStatus::Closed);
        assert_eq!(status_of("filtered"), Symbol::Raw("filtered".to_string()));
    }

    #[test]
    fn test_ip_protocol_lookup() {
        assert_eq!(ip_protocol_of("tcp"), IpProtocol::Tcp);
        assert_eq!(ip_protocol_of("sctp"), IpProtocol::Sctp);
        assert_eq!(ip_protocol_of("TCP"), Symbol::Raw("TCP".to_string()));
    }

    #[test]
    fn test_ip_protocol_numbers() {
        assert_eq!(ip_protocol_from_number(1), Some(IpProtocol::Icmp));
        assert_eq!(ip_protocol_from_number(58), Some(IpProtocol::Icmp));
        assert_eq!(ip_protocol_from_number(6), Some(IpProtocol::Tcp));
        assert_eq!(ip_protocol_from_number(17), Some(IpProtocol::Udp));
        assert_eq!(ip_protocol_from_number(132), Some(IpProtocol::Sctp));
        assert_eq!(ip_protocol_from_number(47), None);
    }

    #[test]
    fn test_app_protocol_text_table() {
        assert_eq!(app_protocol_of("http.server"), AppProtocol::HttpServer);
        assert_eq!(app_protocol_of("title"), AppProtocol::HtmlTitle);
        assert_eq!(app_protocol_of("dns-ver"), AppProtocol::DnsVer);
        assert_eq!(app_protocol_of("X509"), AppProtocol::X509);
        assert_eq!(app_protocol_of("gopher"), Symbol::Raw("gopher".to_string()));
    }

    #[test]
    fn test_app_protocol_binary_table() {
        assert_eq!(app_protocol_from_index(0), None);
        assert_eq!(app_protocol_from_index(1), Some(AppProtocol::Heur));
        assert_eq!(app_protocol_from_index(6), Some(AppProtocol::DnsVersionbind));
        assert_eq!(app_protocol_from_index(12), Some(AppProtocol::Pop3));
        assert_eq!(app_protocol_from_index(16), Some(AppProtocol::HtmlTitle));
        assert_eq!(app_protocol_from_index(30), Some(AppProtocol::HttpServer));
        assert_eq!(app_protocol_from_index(31), None);
        assert_eq!(app_protocol_from_index(u16::MAX), None);
    }

    #[test]
    fn test_reason_text() {
        assert_eq!(
            reason_flags_of("syn-ack"),
            vec![Symbol::Known(TcpFlag::Syn), Symbol::Known(TcpFlag::Ack)]
        );
        assert_eq!(
            reason_flags_of("rst-xyz"),
            vec![Symbol::Known(TcpFlag::Rst), Symbol::Raw("xyz".to_string())]
        );
        assert!(reason_flags_of("").is_empty());
    }

    #[test]
    fn test_reason_mask() {
        assert!(reason_flags_from_mask(0).is_empty());
        assert_eq!(reason_flags_from_mask(0x01), vec![TcpFlag::Fin]);
        assert_eq!(reason_flags_from_mask(0x80), vec![TcpFlag::Cwr]);
        assert_eq!(
            reason_flags_from_mask(0x02 | 0x10),
            vec![TcpFlag::Syn, TcpFlag::Ack]
        );
        assert_eq!(reason_flags_from_mask(0xff).len(), 8);
    }
}

//! Keyword enumerations shared by every decoder.

use serde::{Serialize, Serializer};
use std::fmt;

/// Defines a keyword enum with its canonical lowercase spelling.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $keyword:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The keyword used when displaying or serializing this value.
            pub const fn keyword(self) -> &'static str {
                match self {
                    $( $name::$variant => $keyword, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.keyword())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.keyword())
            }
        }
    };
}

keyword_enum! {
    /// Observed state of a port.
    pub enum PortStatus {
        Open => "open",
        Closed => "closed",
    }
}

keyword_enum! {
    /// Transport protocol a record was observed on.
    pub enum IpProtocol {
        Tcp => "tcp",
        Udp => "udp",
        /// ICMP and ICMPv6 both map here.
        Icmp => "icmp",
        Sctp => "sctp",
    }
}

keyword_enum! {
    /// Application protocol tag attached to a banner.
    ///
    /// The text formats and the binary format name some protocols differently
    /// (`dns_ver` vs `dns_versionbind`, `pop` vs `pop3`), so both spellings
    /// exist as separate variants.
    pub enum AppProtocol {
        Heur => "heur",
        Ssh1 => "ssh1",
        Ssh2 => "ssh2",
        Ssh => "ssh",
        Http => "http",
        Ftp => "ftp",
        DnsVer => "dns_ver",
        DnsVersionbind => "dns_versionbind",
        Snmp => "snmp",
        Nbtstat => "nbtstat",
        Ssl3 => "ssl3",
        Smb => "smb",
        Smtp => "smtp",
        Pop => "pop",
        Pop3 => "pop3",
        Imap => "imap",
        Imap4 => "imap4",
        Zeroaccess => "zeroaccess",
        UdpZeroaccess => "udp_zeroaccess",
        X509 => "x509",
        X509Cert => "x509_cert",
        HtmlTitle => "html_title",
        Html => "html",
        HtmlFull => "html_full",
        Ntp => "ntp",
        Vuln => "vuln",
        Heartbleed => "heartbleed",
        Ticketbleed => "ticketbleed",
        Vnc => "vnc",
        VncRfb => "vnc_rfb",
        Safe => "safe",
        Memcached => "memcached",
        Scripting => "scripting",
        Versioning => "versioning",
        Coap => "coap",
        Telnet => "telnet",
        Rdp => "rdp",
        HttpServer => "http_server",
    }
}

keyword_enum! {
    /// TCP control flag reported as the reason for a port status.
    pub enum TcpFlag {
        Fin => "fin",
        Syn => "syn",
        Rst => "rst",
        Psh => "psh",
        Ack => "ack",
        Urg => "urg",
        Ece => "ece",
        Cwr => "cwr",
    }
}

impl TcpFlag {
    /// Bit this flag occupies in a reason mask.
    pub const fn bit(self) -> u8 {
        match self {
            Self::Fin => 0x01,
            Self::Syn => 0x02,
            Self::Rst => 0x04,
            Self::Psh => 0x08,
            Self::Ack => 0x10,
            Self::Urg => 0x20,
            Self::Ece => 0x40,
            Self::Cwr => 0x80,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(PortStatus::Closed.to_string(), "closed");
        assert_eq!(IpProtocol::Icmp.keyword(), "icmp");
        assert_eq!(AppProtocol::HttpServer.to_string(), "http_server");
        assert_eq!(AppProtocol::X509Cert.to_string(), "x509_cert");
    }

    #[test]
    fn test_flag_bits_are_distinct() {
        let combined = TcpFlag::ALL.iter().fold(0u8, |acc, flag| {
            assert_eq!(acc & flag.bit(), 0);
            acc | flag.bit()
        });
        assert_eq!(combined, 0xff);
    }
}

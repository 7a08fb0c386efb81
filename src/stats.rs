//! Aggregate counts over a stream of records.

use crate::types::{PortStatus, Record, Symbol};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::net::IpAddr;

/// Running totals over decoded records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStats {
    /// Number of records seen.
    pub total: usize,
    /// Status records reporting an open port.
    pub open: usize,
    /// Status records reporting a closed port.
    pub closed: usize,
    /// Status records with an unrecognized status word.
    pub other_status: usize,
    /// Banner records.
    pub banners: usize,
    /// Earliest record timestamp.
    pub first_seen: Option<DateTime<Utc>>,
    /// Latest record timestamp.
    pub last_seen: Option<DateTime<Utc>>,
    hosts: HashSet<IpAddr>,
    ports: HashSet<u16>,
}

impl RecordStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the totals.
    pub fn add(&mut self, record: &Record) {
        self.total += 1;

        match record {
            Record::Status(status) => match status.status {
                Symbol::Known(PortStatus::Open) => self.open += 1,
                Symbol::Known(PortStatus::Closed) => self.closed += 1,
                Symbol::Raw(_) => self.other_status += 1,
            },
            Record::Banner(_) => self.banners += 1,
        }

        self.hosts.insert(record.ip());
        self.ports.insert(record.port());

        let ts = record.timestamp();
        self.first_seen = Some(self.first_seen.map_or(ts, |first| first.min(ts)));
        self.last_seen = Some(self.last_seen.map_or(ts, |last| last.max(ts)));
    }

    /// Number of distinct host addresses.
    pub fn distinct_hosts(&self) -> usize {
        self.hosts.len()
    }

    /// Number of distinct port numbers.
    pub fn distinct_ports(&self) -> usize {
        self.ports.len()
    }

    /// Seconds between the first and last record.
    pub fn span_secs(&self) -> i64 {
        match (self.first_seen, self.last_seen) {
            (Some(first), Some(last)) => (last - first).num_seconds(),
            _ => 0,
        }
    }

    /// Get a short summary of the totals.
    pub fn summary(&self) -> String {
        format!(
            "{} records - {} open, {} closed, {} banners across {} hosts, {} ports [{}s]",
            self.total,
            self.open,
            self.closed,
            self.banners,
            self.distinct_hosts(),
            self.distinct_ports(),
            self.span_secs()
        )
    }
}

impl<'a> Extend<&'a Record> for RecordStats {
    fn extend<I: IntoIterator<Item = &'a Record>>(&mut self, iter: I) {
        for record in iter {
            self.add(record);
        }
    }
}

impl<'a> FromIterator<&'a Record> for RecordStats {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        let mut stats = Self::new();
        stats.extend(iter);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Banner, IpProtocol, Status};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn status(status: Symbol<PortStatus>, ip: &str, port: u16, secs: i64) -> Record {
        Status::new(status, IpProtocol::Tcp, port, ip.parse().unwrap(), at(secs)).into()
    }

    #[test]
    fn test_empty_stats() {
        let stats = RecordStats::new();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.span_secs(), 0);
        assert!(stats.first_seen.is_none());
    }

    #[test]
    fn test_counts() {
        let records = vec![
            status(PortStatus::Open.into(), "10.0.0.1", 80, 100),
            status(PortStatus::Closed.into(), "10.0.0.1", 81, 90),
            status(Symbol::Raw("filtered".into()), "10.0.0.2", 80, 130),
            Banner::new(IpProtocol::Tcp, 80, "10.0.0.2".parse().unwrap(), at(120), None, b"x".to_vec())
                .into(),
        ];

        let stats: RecordStats = records.iter().collect();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.open, 1);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.other_status, 1);
        assert_eq!(stats.banners, 1);
        assert_eq!(stats.distinct_hosts(), 2);
        assert_eq!(stats.distinct_ports(), 2);
        assert_eq!(stats.first_seen, Some(at(90)));
        assert_eq!(stats.last_seen, Some(at(130)));
        assert_eq!(stats.span_secs(), 40);
    }

    #[test]
    fn test_summary() {
        let stats: RecordStats = [status(PortStatus::Open.into(), "10.0.0.1", 22, 5)]
            .iter()
            .collect();
        assert_eq!(
            stats.summary(),
            "1 records - 1 open, 0 closed, 0 banners across 1 hosts, 1 ports [0s]"
        );
    }
}

//! Typed, immutable discovered facts.
//!
//! A [`Value`] pairs a [`ValueKind`] with a canonical [`Payload`] and carries
//! provenance: the id of the value that led to its discovery, its depth in the
//! traversal, and the worker that produced it. Equality and hashing only look
//! at the [`DedupKey`] (kind + canonical payload), so the same fact reached via
//! two different paths compares equal.

use crate::error::{Result, SurveyorError};
use crate::types::{Timestamp, WorkerId};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;
use url::Url;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// The closed set of fact kinds the engine routes between workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueKind {
    /// Registrable DNS name, e.g. `example.com`
    Domain,
    /// Fully qualified host name, e.g. `www.example.com`
    Host,
    /// Wildcard DNS name, e.g. `*.example.com`
    Wildcard,
    /// Single IPv4 or IPv6 address
    Ip,
    /// CIDR network
    IpRange,
    /// Host and TCP port known to be listening
    OpenPort,
    /// TLS certificate
    Cert,
    /// HTTP(S) origin
    Website,
    /// Full HTTP(S) URL
    Url,
    /// Email address
    EmailAddress,
    /// Authoritative DNS server name
    Nameserver,
    /// Mail exchanger name
    Mailserver,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 12] = [
        Self::Domain,
        Self::Host,
        Self::Wildcard,
        Self::Ip,
        Self::IpRange,
        Self::OpenPort,
        Self::Cert,
        Self::Website,
        Self::Url,
        Self::EmailAddress,
        Self::Nameserver,
        Self::Mailserver,
    ];

    /// Upper-case name as used in configuration and event output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "DOMAIN",
            Self::Host => "HOST",
            Self::Wildcard => "WILDCARD",
            Self::Ip => "IP",
            Self::IpRange => "IP_RANGE",
            Self::OpenPort => "OPEN_PORT",
            Self::Cert => "CERT",
            Self::Website => "WEBSITE",
            Self::Url => "URL",
            Self::EmailAddress => "EMAIL_ADDRESS",
            Self::Nameserver => "NAMESERVER",
            Self::Mailserver => "MAILSERVER",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = SurveyorError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| SurveyorError::Validation(format!("unknown value kind '{s}'")))
    }
}

/// Identity of one constructed value, used for `parent` links.
///
/// Two equal facts discovered along different paths have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueId(uuid::Uuid);

impl ValueId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical identity of a fact: kind plus canonical payload string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DedupKey {
    /// Kind of the fact
    pub kind: ValueKind,
    /// Canonical string form of the payload
    pub canonical: String,
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.canonical)
    }
}

/// A host (name or IP literal) and TCP port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Build an endpoint, normalizing the host.
    ///
    /// # Errors
    /// Returns a reason string if the host is not a hostname or IP, or the port is 0.
    fn new(host: &str, port: u16) -> std::result::Result<Self, String> {
        if port == 0 {
            return Err("port must be between 1 and 65535".to_string());
        }
        let trimmed = host.trim().trim_start_matches('[').trim_end_matches(']');
        let host = match trimmed.parse::<IpAddr>() {
            Ok(ip) => ip.to_string(),
            Err(_) => normalize_hostname(trimmed)?,
        };
        Ok(Self { host, port })
    }

    /// Parse `host:port` or `[v6]:port`.
    fn parse(raw: &str) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        let (host, port) = if let Some(rest) = raw.strip_prefix('[') {
            rest.split_once("]:")
                .ok_or_else(|| format!("'{raw}' is missing a port"))?
        } else {
            let (host, port) = raw
                .rsplit_once(':')
                .ok_or_else(|| format!("'{raw}' is missing a port"))?;
            if host.contains(':') {
                return Err("IPv6 endpoints must be written as [address]:port".to_string());
            }
            (host, port)
        };
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("invalid port '{port}'"))?;
        Self::new(host, port)
    }

    /// Host part (hostname or IP literal).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Structured TLS certificate record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertRecord {
    /// Subject distinguished name or common name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// Serial number, hex encoded (separators are ignored for identity)
    pub serial: String,
    /// Subject alternative names
    #[serde(default)]
    pub sans: Vec<String>,
    /// Expiry, if known
    #[serde(default)]
    pub not_after: Option<Timestamp>,
}

impl CertRecord {
    fn canonical(&self) -> std::result::Result<String, String> {
        let issuer = self.issuer.trim().to_lowercase();
        let serial: String = self
            .serial
            .trim()
            .chars()
            .filter(|c| *c != ':' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        if issuer.is_empty() {
            return Err("certificate issuer cannot be empty".to_string());
        }
        if serial.is_empty() {
            return Err("certificate serial cannot be empty".to_string());
        }
        Ok(format!("{issuer}/{serial}"))
    }
}

/// Kind-specific payload of a value.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// DNS name (domains, hosts, wildcards, name and mail servers)
    Name(String),
    /// IP address
    Ip(IpAddr),
    /// CIDR network
    Range(IpNet),
    /// Host and port
    Endpoint(Endpoint),
    /// Certificate record
    Cert(CertRecord),
    /// Website origin or full URL
    Url(Url),
    /// Email address
    Email(String),
}

/// An immutable discovered fact with provenance.
///
/// Values are created through the kind-specific constructors, [`Value::parse`]
/// or [`Value::classify`], all of which produce seed values (depth 0, no
/// parent, no origin). The engine attaches provenance with [`Value::derive`],
/// which returns a new value rather than modifying the raw one.
#[derive(Debug, Clone, Serialize)]
pub struct Value {
    id: ValueId,
    #[serde(flatten)]
    key: DedupKey,
    payload: Payload,
    parent: Option<ValueId>,
    depth: u32,
    origin: Option<WorkerId>,
}

impl Value {
    fn build(kind: ValueKind, canonical: String, payload: Payload) -> Self {
        Self {
            id: ValueId::generate(),
            key: DedupKey { kind, canonical },
            payload,
            parent: None,
            depth: 0,
            origin: None,
        }
    }

    fn invalid(kind: ValueKind, reason: impl Into<String>) -> SurveyorError {
        SurveyorError::InvalidValue {
            kind,
            reason: reason.into(),
        }
    }

    fn named(kind: ValueKind, raw: &str, min_labels: usize) -> Result<Self> {
        let name = normalize_hostname(raw).map_err(|reason| Self::invalid(kind, reason))?;
        if name.parse::<IpAddr>().is_ok() {
            return Err(Self::invalid(kind, format!("'{name}' is an IP address")));
        }
        if name.split('.').count() < min_labels {
            return Err(Self::invalid(
                kind,
                format!("'{name}' must have at least {min_labels} labels"),
            ));
        }
        Ok(Self::build(kind, name.clone(), Payload::Name(name)))
    }

    /// A registrable DNS name with at least two labels.
    pub fn domain(raw: &str) -> Result<Self> {
        Self::named(ValueKind::Domain, raw, 2)
    }

    /// A host name.
    pub fn host(raw: &str) -> Result<Self> {
        Self::named(ValueKind::Host, raw, 1)
    }

    /// An authoritative name server's host name.
    pub fn nameserver(raw: &str) -> Result<Self> {
        Self::named(ValueKind::Nameserver, raw, 1)
    }

    /// A mail exchanger's host name.
    pub fn mailserver(raw: &str) -> Result<Self> {
        Self::named(ValueKind::Mailserver, raw, 1)
    }

    /// A wildcard name; accepts `*.example.com`.
    pub fn wildcard(raw: &str) -> Result<Self> {
        let kind = ValueKind::Wildcard;
        let base = raw
            .trim()
            .strip_prefix("*.")
            .ok_or_else(|| Self::invalid(kind, "wildcard must start with '*.'"))?;
        let base = normalize_hostname(base).map_err(|reason| Self::invalid(kind, reason))?;
        if base.split('.').count() < 2 {
            return Err(Self::invalid(kind, "wildcard base must have at least 2 labels"));
        }
        let name = format!("*.{base}");
        Ok(Self::build(kind, name.clone(), Payload::Name(name)))
    }

    /// A single IP address.
    #[must_use]
    pub fn ip(addr: IpAddr) -> Self {
        Self::build(ValueKind::Ip, addr.to_string(), Payload::Ip(addr))
    }

    /// A CIDR network; host bits are cleared.
    #[must_use]
    pub fn ip_range(net: IpNet) -> Self {
        let net = net.trunc();
        Self::build(ValueKind::IpRange, net.to_string(), Payload::Range(net))
    }

    /// An open TCP port on a host name or IP.
    pub fn open_port(host: &str, port: u16) -> Result<Self> {
        let endpoint =
            Endpoint::new(host, port).map_err(|reason| Self::invalid(ValueKind::OpenPort, reason))?;
        Ok(Self::build(
            ValueKind::OpenPort,
            endpoint.to_string(),
            Payload::Endpoint(endpoint),
        ))
    }

    /// A TLS certificate.
    pub fn cert(record: CertRecord) -> Result<Self> {
        let canonical = record
            .canonical()
            .map_err(|reason| Self::invalid(ValueKind::Cert, reason))?;
        Ok(Self::build(ValueKind::Cert, canonical, Payload::Cert(record)))
    }

    /// An HTTP(S) origin. Any path, query or fragment is dropped.
    pub fn website(raw: &str) -> Result<Self> {
        let kind = ValueKind::Website;
        let url = parse_http_url(raw).map_err(|reason| Self::invalid(kind, reason))?;
        let origin = url.origin().ascii_serialization();
        let origin_url = Url::parse(&origin).map_err(|e| Self::invalid(kind, e.to_string()))?;
        Ok(Self::build(kind, origin, Payload::Url(origin_url)))
    }

    /// A full HTTP(S) URL. The fragment is dropped.
    pub fn url(raw: &str) -> Result<Self> {
        let kind = ValueKind::Url;
        let url = parse_http_url(raw).map_err(|reason| Self::invalid(kind, reason))?;
        Ok(Self::build(kind, url.to_string(), Payload::Url(url)))
    }

    /// An email address.
    pub fn email(raw: &str) -> Result<Self> {
        let kind = ValueKind::EmailAddress;
        let lowered = raw.trim().to_lowercase();
        let (local, domain) = lowered
            .rsplit_once('@')
            .ok_or_else(|| Self::invalid(kind, "missing '@'"))?;
        if local.is_empty() || local.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(Self::invalid(kind, format!("invalid local part '{local}'")));
        }
        let domain = normalize_hostname(domain).map_err(|reason| Self::invalid(kind, reason))?;
        if domain.split('.').count() < 2 {
            return Err(Self::invalid(kind, "email domain must have at least 2 labels"));
        }
        let address = format!("{local}@{domain}");
        Ok(Self::build(kind, address.clone(), Payload::Email(address)))
    }

    /// Parse a raw string as the given kind.
    ///
    /// `Cert` values are structured and cannot be parsed from a string; use
    /// [`Value::cert`].
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Self> {
        match kind {
            ValueKind::Domain => Self::domain(raw),
            ValueKind::Host => Self::host(raw),
            ValueKind::Wildcard => Self::wildcard(raw),
            ValueKind::Nameserver => Self::nameserver(raw),
            ValueKind::Mailserver => Self::mailserver(raw),
            ValueKind::Ip => raw
                .trim()
                .parse::<IpAddr>()
                .map(Self::ip)
                .map_err(|e| Self::invalid(kind, e.to_string())),
            ValueKind::IpRange => raw
                .trim()
                .parse::<IpNet>()
                .map(Self::ip_range)
                .map_err(|e| Self::invalid(kind, e.to_string())),
            ValueKind::OpenPort => {
                let endpoint = Endpoint::parse(raw).map_err(|reason| Self::invalid(kind, reason))?;
                Ok(Self::build(
                    kind,
                    endpoint.to_string(),
                    Payload::Endpoint(endpoint),
                ))
            }
            ValueKind::Cert => Err(Self::invalid(
                kind,
                "certificates are structured records and cannot be parsed from text",
            )),
            ValueKind::Website => Self::website(raw),
            ValueKind::Url => Self::url(raw),
            ValueKind::EmailAddress => Self::email(raw),
        }
    }

    /// Detect the kind of a raw string and construct a seed value.
    ///
    /// Host names classify as [`ValueKind::Domain`]; `Host`, `Nameserver` and
    /// `Mailserver` must be requested explicitly through [`Value::parse`].
    ///
    /// # Errors
    /// Returns [`SurveyorError::UnknownValue`] if no kind accepts the input.
    pub fn classify(raw: &str) -> Result<Self> {
        let s = raw.trim();
        let unknown = || SurveyorError::UnknownValue {
            raw: raw.to_string(),
        };

        if s.is_empty() {
            return Err(unknown());
        }

        let classified = if s.contains("://") {
            let url = parse_http_url(s).map_err(|_| unknown())?;
            if url.path() == "/" && url.query().is_none() && !s.ends_with('/') {
                Self::website(s)
            } else {
                Self::url(s)
            }
        } else if s.contains('@') {
            Self::email(s)
        } else if s.contains('/') {
            Self::parse(ValueKind::IpRange, s)
        } else if let Ok(ip) = s.parse::<IpAddr>() {
            Ok(Self::ip(ip))
        } else if s.starts_with("*.") {
            Self::wildcard(s)
        } else if s.starts_with('[') || s.contains(':') {
            Self::parse(ValueKind::OpenPort, s)
        } else {
            Self::domain(s)
        };

        classified.map_err(|_| unknown())
    }

    /// Attach provenance to a raw worker output.
    ///
    /// Returns a new value with a fresh id, `parent = parent.id()`,
    /// `depth = parent.depth() + 1` and `origin = origin`.
    #[must_use]
    pub fn derive(self, parent: &Value, origin: WorkerId) -> Self {
        Self {
            id: ValueId::generate(),
            key: self.key,
            payload: self.payload,
            parent: Some(parent.id),
            depth: parent.depth.saturating_add(1),
            origin: Some(origin),
        }
    }

    /// Strip provenance, producing a depth-0 seed with the same identity key.
    #[must_use]
    pub fn into_seed(self) -> Self {
        Self {
            id: ValueId::generate(),
            key: self.key,
            payload: self.payload,
            parent: None,
            depth: 0,
            origin: None,
        }
    }

    /// Identity of this particular value instance.
    #[must_use]
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// Kind of fact.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.key.kind
    }

    /// Kind-specific payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Canonical string form of the payload.
    #[must_use]
    pub fn canonical(&self) -> &str {
        &self.key.canonical
    }

    /// Deduplication key.
    #[must_use]
    pub fn dedup_key(&self) -> &DedupKey {
        &self.key
    }

    /// Id of the value that led to this one, if any.
    #[must_use]
    pub fn parent(&self) -> Option<ValueId> {
        self.parent
    }

    /// Distance from the seed that started this branch.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Worker that produced this value; `None` for seeds.
    #[must_use]
    pub fn origin(&self) -> Option<&WorkerId> {
        self.origin.as_ref()
    }

    /// Whether this value was supplied by the caller rather than a worker.
    #[must_use]
    pub fn is_seed(&self) -> bool {
        self.origin.is_none()
    }

    /// The DNS name carried by name-like kinds.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match &self.payload {
            Payload::Name(name) => Some(name),
            _ => None,
        }
    }

    /// The address carried by an `Ip` value.
    #[must_use]
    pub fn as_ip(&self) -> Option<IpAddr> {
        match &self.payload {
            Payload::Ip(ip) => Some(*ip),
            _ => None,
        }
    }

    /// The URL carried by `Website` and `Url` values.
    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match &self.payload {
            Payload::Url(url) => Some(url),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.key.kind, self.key.canonical)
    }
}

/// Lowercase, strip a single trailing dot and check hostname lexical rules.
fn normalize_hostname(raw: &str) -> std::result::Result<String, String> {
    let name = raw.trim().to_ascii_lowercase();
    let name = name.strip_suffix('.').unwrap_or(&name);

    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if name.len() > MAX_HOSTNAME_LEN {
        return Err(format!(
            "name must be at most {MAX_HOSTNAME_LEN} characters, got {}",
            name.len()
        ));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(format!("'{name}' contains an empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(format!(
                "label '{label}' exceeds {MAX_LABEL_LEN} characters"
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!("label '{label}' cannot start or end with '-'"));
        }
        if let Some(bad) = label
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(format!("'{name}' contains invalid character '{bad}'"));
        }
    }

    Ok(name.to_string())
}

fn parse_http_url(raw: &str) -> std::result::Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("URL has no host".to_string());
    }
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_domain_normalization() {
        let value = Value::domain("  WWW.Example.COM. ").expect("valid domain");
        assert_eq!(value.kind(), ValueKind::Domain);
        assert_eq!(value.canonical(), "www.example.com");
        assert_eq!(value.depth(), 0);
        assert!(value.is_seed());
        assert!(value.parent().is_none());
    }

    #[test]
    fn test_name_rules() {
        let invalid = vec![
            "",
            "example",           // Domain needs two labels
            "exa mple.com",      // Space
            "-bad.example.com",  // Leading hyphen
            "bad-.example.com",  // Trailing hyphen
            "a..example.com",    // Empty label
            "93.184.216.34",     // IP address
        ];
        for raw in invalid {
            assert!(Value::domain(raw).is_err(), "Should fail for: {raw}");
        }

        let long_label = format!("{}.example.com", "a".repeat(64));
        assert!(Value::host(&long_label).is_err());

        // Hosts may be single-label, and service labels may carry underscores
        assert!(Value::host("localhost").is_ok());
        assert!(Value::host("_dmarc.example.com").is_ok());
    }

    #[test]
    fn test_equality_ignores_provenance() {
        let parent = Value::domain("example.com").expect("valid domain");
        let worker = WorkerId::new("dns/lookup").expect("valid worker ID");

        let seed = Value::host("www.example.com").expect("valid host");
        let derived = Value::host("WWW.example.com")
            .expect("valid host")
            .derive(&parent, worker);

        assert_eq!(seed, derived);
        assert_ne!(seed.id(), derived.id());
        assert_eq!(seed.dedup_key(), derived.dedup_key());

        let mut set = HashSet::new();
        set.insert(seed);
        assert!(!set.insert(derived));
    }

    #[test]
    fn test_same_name_different_kind_is_distinct() {
        let host = Value::host("ns1.example.com").expect("valid host");
        let ns = Value::nameserver("ns1.example.com").expect("valid nameserver");
        assert_ne!(host, ns);
        assert_ne!(host.dedup_key(), ns.dedup_key());
    }

    #[test]
    fn test_derive_sets_provenance() {
        let worker = WorkerId::new("dns/lookup").expect("valid worker ID");
        let domain = Value::domain("example.com").expect("valid domain");
        let host = Value::host("www.example.com")
            .expect("valid host")
            .derive(&domain, worker.clone());

        assert_eq!(host.parent(), Some(domain.id()));
        assert_eq!(host.depth(), 1);
        assert_eq!(host.origin(), Some(&worker));
        assert!(!host.is_seed());

        let ip = Value::ip("93.184.216.34".parse().expect("valid IP")).derive(&host, worker);
        assert_eq!(ip.depth(), 2);
        assert_eq!(ip.parent(), Some(host.id()));

        let reseeded = ip.into_seed();
        assert_eq!(reseeded.depth(), 0);
        assert!(reseeded.parent().is_none());
    }

    #[test]
    fn test_ip_and_range() {
        let ip = Value::parse(ValueKind::Ip, "2001:DB8::1").expect("valid IPv6");
        assert_eq!(ip.canonical(), "2001:db8::1");

        let range = Value::parse(ValueKind::IpRange, "10.1.2.3/16").expect("valid CIDR");
        assert_eq!(range.canonical(), "10.1.0.0/16");
        assert!(Value::parse(ValueKind::IpRange, "10.0.0.0/33").is_err());
    }

    #[test]
    fn test_open_port() {
        let port = Value::open_port("WWW.Example.com", 443).expect("valid endpoint");
        assert_eq!(port.canonical(), "www.example.com:443");

        let v6 = Value::parse(ValueKind::OpenPort, "[2001:db8::1]:8080").expect("valid v6 endpoint");
        assert_eq!(v6.canonical(), "[2001:db8::1]:8080");

        assert!(Value::open_port("example.com", 0).is_err());
        assert!(Value::parse(ValueKind::OpenPort, "example.com").is_err());
        assert!(Value::parse(ValueKind::OpenPort, "2001:db8::1:80").is_err());
    }

    #[test]
    fn test_website_and_url() {
        let site = Value::website("HTTPS://Example.com:443/login?next=1").expect("valid website");
        assert_eq!(site.canonical(), "https://example.com");

        let site = Value::website("http://example.com:8080").expect("valid website");
        assert_eq!(site.canonical(), "http://example.com:8080");

        let url = Value::url("https://example.com/a/b?c=d#frag").expect("valid url");
        assert_eq!(url.canonical(), "https://example.com/a/b?c=d");
        assert!(url.as_url().is_some());

        assert!(Value::url("ftp://example.com/file").is_err());
    }

    #[test]
    fn test_email() {
        let email = Value::email("Admin@Example.COM").expect("valid email");
        assert_eq!(email.canonical(), "admin@example.com");
        assert!(Value::email("@example.com").is_err());
        assert!(Value::email("admin@localhost").is_err());
    }

    #[test]
    fn test_cert_identity() {
        let record = CertRecord {
            subject: "CN=example.com".to_string(),
            issuer: "CN=Example CA".to_string(),
            serial: "0A:1B:2C".to_string(),
            sans: vec!["example.com".to_string(), "www.example.com".to_string()],
            not_after: None,
        };
        let cert = Value::cert(record.clone()).expect("valid cert");
        assert_eq!(cert.canonical(), "cn=example ca/0a1b2c");

        let reissued = CertRecord {
            sans: Vec::new(),
            serial: "0a1b2c".to_string(),
            ..record
        };
        assert_eq!(cert, Value::cert(reissued).expect("valid cert"));

        assert!(Value::parse(ValueKind::Cert, "anything").is_err());
    }

    #[test]
    fn test_classify() {
        let cases = vec![
            ("example.com", ValueKind::Domain, "example.com"),
            ("*.example.com", ValueKind::Wildcard, "*.example.com"),
            ("93.184.216.34", ValueKind::Ip, "93.184.216.34"),
            ("::1", ValueKind::Ip, "::1"),
            ("10.0.0.0/8", ValueKind::IpRange, "10.0.0.0/8"),
            ("example.com:8443", ValueKind::OpenPort, "example.com:8443"),
            ("https://example.com", ValueKind::Website, "https://example.com"),
            (
                "https://example.com/admin",
                ValueKind::Url,
                "https://example.com/admin",
            ),
            ("https://example.com/", ValueKind::Url, "https://example.com/"),
            ("ops@example.com", ValueKind::EmailAddress, "ops@example.com"),
        ];

        for (raw, kind, canonical) in cases {
            let value = Value::classify(raw).unwrap_or_else(|e| panic!("classify {raw}: {e}"));
            assert_eq!(value.kind(), kind, "kind for {raw}");
            assert_eq!(value.canonical(), canonical, "canonical for {raw}");
        }
    }

    #[test]
    fn test_classify_unknown() {
        for raw in ["", "   ", "not a value", "ftp://example.com/x", "example", "a/b"] {
            let err = Value::classify(raw).expect_err("should not classify");
            assert!(
                matches!(err, SurveyorError::UnknownValue { .. }),
                "unexpected error for {raw}: {err}"
            );
        }
    }

    #[test]
    fn test_kind_names() {
        for kind in ValueKind::ALL {
            assert_eq!(kind.as_str().parse::<ValueKind>().expect("parse kind"), kind);
        }
        assert_eq!("open-port".parse::<ValueKind>().expect("parse kind"), ValueKind::OpenPort);
        assert!("PHONE".parse::<ValueKind>().is_err());

        let json = serde_json::to_string(&ValueKind::IpRange).expect("serialize kind");
        assert_eq!(json, "\"IP_RANGE\"");
    }

    #[test]
    fn test_value_serialization() {
        let value = Value::domain("example.com").expect("valid domain");
        let json = serde_json::to_value(&value).expect("serialize value");
        assert_eq!(json["kind"], "DOMAIN");
        assert_eq!(json["canonical"], "example.com");
        assert_eq!(json["depth"], 0);
        assert!(json["parent"].is_null());
    }
}

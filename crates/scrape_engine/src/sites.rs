//! Fixed per-site configuration: specialized selector packs and the list of
//! hosts known to serve GB-family bytes without declaring a charset.

use url::Url;

/// Extraction tuning for one web-fiction site family.
#[derive(Debug)]
pub struct SitePack {
    pub name: &'static str,
    /// Domains covered by this pack; subdomains match too.
    pub domains: &'static [&'static str],
    /// Content selectors in priority order.
    pub content_selectors: &'static [&'static str],
}

static SIXNINE_SHU: SitePack = SitePack {
    name: "69shu",
    domains: &[
        "69shu.com",
        "69shuba.com",
        "69shu.pro",
        "69shuba.pro",
        "69shuba.cx",
        "69xinshu.com",
    ],
    content_selectors: &[".txtnav", "#txtcontent", ".yd_text2", "#content", ".content"],
};

static SPECIALIZED_SITES: &[&SitePack] = &[&SIXNINE_SHU];

/// Hosts that historically serve GBK/GB2312 pages with missing or wrong
/// charset headers. Consulted by the encoding detector as a domain hint.
static GBK_HOSTS: &[&str] = &[
    "69shu.com",
    "69shuba.com",
    "69shu.pro",
    "69shuba.pro",
    "69shuba.cx",
    "69xinshu.com",
    "biquge.com",
    "biquge.info",
    "booktxt.net",
    "qu.la",
];

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.to_ascii_lowercase())
}

fn domain_matches(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }
    host.strip_suffix(domain)
        .is_some_and(|prefix| prefix.ends_with('.'))
}

/// The specialized selector pack covering `url`, if any.
pub fn specialized_pack(url: &str) -> Option<&'static SitePack> {
    let host = host_of(url)?;
    SPECIALIZED_SITES.iter().copied().find(|pack| {
        pack.domains
            .iter()
            .any(|domain| domain_matches(&host, domain))
    })
}

/// Whether `url` belongs to a host on the known-GBK list.
pub fn is_known_gbk_host(url: &str) -> bool {
    host_of(url).is_some_and(|host| {
        GBK_HOSTS
            .iter()
            .any(|domain| domain_matches(&host, domain))
    })
}

//! Static registry of Indonesian news RSS/Atom feeds.
//!
//! Process-wide immutable configuration: each entry maps a source name to its
//! feed endpoints (national, economy, and tech sections where available).
//! Unreachable or malformed endpoints degrade to zero entries at scan time,
//! so stale addresses cost nothing beyond a warning in the logs.

/// Source name → feed endpoints.
pub static FEED_CATALOG: &[(&str, &[&str])] = &[
    // Mainstream national media
    (
        "Kompas",
        &[
            "https://rss.kompas.com/news",
            "https://rss.kompas.com/kompascom/ekonomi",
            "https://rss.kompas.com/kompascom/tekno",
            "https://rss.kompas.com/nasional",
        ],
    ),
    (
        "Detik",
        &[
            "https://rss.detik.com/index.php/detiknews",
            "https://rss.detik.com/index.php/finance",
            "https://rss.detik.com/index.php/detikinet",
        ],
    ),
    (
        "Tempo",
        &[
            "https://rss.tempo.co/nasional",
            "https://rss.tempo.co/bisnis",
            "https://rss.tempo.co/teknologi",
        ],
    ),
    (
        "Liputan6",
        &[
            "https://feed.liputan6.com/rss",
            "https://feed.liputan6.com/rss/bisnis",
            "https://feed.liputan6.com/rss/news",
        ],
    ),
    (
        "Tribunnews",
        &[
            "https://www.tribunnews.com/rss",
            "https://www.tribunnews.com/bisnis/rss",
        ],
    ),
    (
        "ANTARA",
        &[
            "https://www.antaranews.com/rss/top-news",
            "https://www.antaranews.com/rss/nasional",
            "https://www.antaranews.com/rss/ekonomi",
        ],
    ),
    (
        "CNN Indonesia",
        &[
            "https://www.cnnindonesia.com/nasional/rss",
            "https://www.cnnindonesia.com/ekonomi/rss",
            "https://www.cnnindonesia.com/teknologi/rss",
        ],
    ),
    (
        "CNBC Indonesia",
        &[
            "https://www.cnbcindonesia.com/news/rss",
            "https://www.cnbcindonesia.com/market/rss",
            "https://www.cnbcindonesia.com/tech/rss",
        ],
    ),
    (
        "Merdeka",
        &[
            "https://www.merdeka.com/feed/",
            "https://www.merdeka.com/uang/feed/",
        ],
    ),
    (
        "Republika",
        &[
            "https://www.republika.co.id/rss",
            "https://www.republika.co.id/rss/ekonomi",
        ],
    ),
    (
        "BeritaSatu",
        &[
            "https://www.beritasatu.com/rss/nasional",
            "https://www.beritasatu.com/rss/ekonomi",
        ],
    ),
    ("Kumparan", &["https://lapi.kumparan.com/v2.0/rss/"]),
    (
        "Viva",
        &[
            "https://www.viva.co.id/rss/berita",
            "https://www.viva.co.id/rss/bisnis",
        ],
    ),
    (
        "Okezone",
        &[
            "https://sindikasi.okezone.com/index.php/okezone/RSS2.0",
            "https://economy.okezone.com/rss",
        ],
    ),
    (
        "IDN Times",
        &[
            "https://www.idntimes.com/rss",
            "https://www.idntimes.com/business/rss",
        ],
    ),
    (
        "Sindonews",
        &[
            "https://www.sindonews.com/rss",
            "https://ekbis.sindonews.com/rss",
        ],
    ),
    (
        "Medcom",
        &["https://www.medcom.id/rss", "https://www.medcom.id/ekonomi/rss"],
    ),
    (
        "JPNN",
        &["https://www.jpnn.com/rss", "https://www.jpnn.com/ekonomi/rss"],
    ),
    // Business and finance
    (
        "Bisnis.com",
        &[
            "https://www.bisnis.com/rss",
            "https://finansial.bisnis.com/rss",
            "https://market.bisnis.com/rss",
        ],
    ),
    (
        "Kontan",
        &[
            "https://www.kontan.co.id/rss",
            "https://investasi.kontan.co.id/rss",
        ],
    ),
    (
        "Katadata",
        &["https://katadata.co.id/rss", "https://katadata.co.id/ekonomi/rss"],
    ),
    ("Investor Daily", &["https://investor.id/rss"]),
    (
        "Warta Ekonomi",
        &["https://www.wartaekonomi.co.id/rss"],
    ),
    // Digital and analytical outlets
    (
        "Tirto",
        &["https://tirto.id/rss/sekarang", "https://tirto.id/rss/ekonomi"],
    ),
    (
        "The Conversation Indonesia",
        &["https://theconversation.com/id/articles.atom"],
    ),
    (
        "Media Indonesia",
        &[
            "https://mediaindonesia.com/rss",
            "https://mediaindonesia.com/ekonomi/rss",
        ],
    ),
    (
        "Tempo English",
        &["https://en.tempo.co/rss/national", "https://en.tempo.co/rss/business"],
    ),
    (
        "Jakarta Post",
        &[
            "https://www.thejakartapost.com/rss",
            "https://www.thejakartapost.com/business/rss",
        ],
    ),
    (
        "Suara",
        &["https://www.suara.com/rss", "https://www.suara.com/bisnis/rss"],
    ),
    ("RRI", &["https://rri.co.id/feed"]),
    ("Inilah.com", &["https://inilah.com/rss"]),
    // Regional
    (
        "Pikiran Rakyat",
        &[
            "https://www.pikiran-rakyat.com/feed",
            "https://www.pikiran-rakyat.com/jawa-barat/rss",
            "https://www.pikiran-rakyat.com/ekonomi/rss",
        ],
    ),
    (
        "Jawa Pos",
        &[
            "https://www.jawapos.com/feed/",
            "https://www.jawapos.com/ekonomi-bisnis/feed/",
        ],
    ),
    ("Tribun Jabar", &["https://jabar.tribunnews.com/rss"]),
    ("Tribun Surabaya", &["https://surabaya.tribunnews.com/rss"]),
    (
        "Antara Jabar",
        &["https://jabar.antaranews.com/rss"],
    ),
    ("PRFM News", &["https://www.prfmnews.id/rss"]),
    ("Jabar Ekspres", &["https://jabarekspres.com/rss"]),
    ("Galamedia", &["https://galamedia.pikiran-rakyat.com/feed"]),
    ("Bali Post", &["https://www.balipost.com/feed"]),
    ("Solopos", &["https://www.solopos.com/feed"]),
    ("Suara Surabaya", &["https://rss.suarasurabaya.net/rss"]),
    ("Tribun Jogja", &["https://jogja.tribunnews.com/rss"]),
    // Tech and startup
    (
        "Dailysocial",
        &["https://dailysocial.id/rss"],
    ),
    ("Tech in Asia Indonesia", &["https://id.techinasia.com/feed"]),
    ("Teknologi ID", &["https://teknologi.id/rss"]),
    ("Gadgetren", &["https://gadgetren.com/feed"]),
    // Government / official
    ("Setkab", &["https://setkab.go.id/feed/"]),
    (
        "Kemenkeu",
        &["https://www.kemenkeu.go.id/feed/"],
    ),
];

/// Flatten the catalog into (source, feed-url) pairs, one per retrieval task.
pub fn all_feeds() -> Vec<(&'static str, &'static str)> {
    FEED_CATALOG
        .iter()
        .flat_map(|(source, urls)| urls.iter().map(move |url| (*source, *url)))
        .collect()
}

//! Server-rendered HTML for the gallery pages.
//!
//! Plain formatted strings with explicit escaping; every dynamic value goes
//! through [`escape`]. View models are assembled by the handlers so nothing
//! here performs I/O.

use crate::mint::{ButtonIcon, MintFlow};
use crate::session::{PageView, Toast, ToastKind};

/// One card on the listing grid.
#[derive(Debug, Clone)]
pub struct CollectionCard {
    pub title: String,
    pub description: String,
    pub name: String,
    pub slug: String,
    pub preview_url: Option<String>,
}

/// Everything the detail page renders.
#[derive(Debug, Clone)]
pub struct DetailView {
    pub title: String,
    pub description: String,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub page: PageView,
}

const STYLE: &str = "\
body{font-family:sans-serif;margin:0;background:#0b0b10;color:#eee}\
main{max-width:960px;margin:0 auto;padding:2rem 1rem}\
a{color:#a78bfa;text-decoration:none}\
h1 .accent{color:#8b5cf6}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(260px,1fr));gap:1.5rem}\
.card{border:1px solid #2d2d3a;border-radius:12px;padding:1rem;background:#14141c}\
.card h2{color:#fbbf24;margin:.5rem 0}\
.card .name{color:#a78bfa;font-weight:600}\
.card img{width:100%;border-radius:8px}\
.supply{display:inline-block;background:#14141c;color:#22c55e;padding:.6rem 1rem;\
border-radius:8px;text-transform:uppercase;font-weight:600}\
.mint{display:flex;gap:1rem;margin-top:1.5rem}\
button{border:0;border-radius:8px;padding:1rem 1.75rem;font-size:1rem;cursor:pointer;\
background:#fff;color:#111}\
button:disabled{background:#4b5563;color:#d1d5db;cursor:not-allowed}\
.toast{position:fixed;bottom:1.5rem;left:50%;transform:translateX(-50%);\
padding:.9rem 1.75rem;border-radius:8px;background:#14141c;font-size:1.05rem}\
.toast-success{color:#22c55e}.toast-error{color:#ef4444}.toast-progress{color:#22c55e}\
.dialog{position:fixed;inset:0;display:flex;align-items:center;justify-content:center;\
background:rgba(0,0,0,.6)}\
.dialog-box{background:#14141c;border-radius:16px;padding:2rem;max-width:28rem}\
.dialog-box h3{margin-top:0}\
footer{border-top:1px solid #2d2d3a;padding:1.5rem;text-align:center;\
text-transform:uppercase;font-size:.85rem}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{}</title><style>{STYLE}</style></head>\
<body><main>{body}</main>\
<footer>made by <span class=\"accent\">butters</span></footer>\
</body></html>",
        escape(title)
    )
}

/// Listing page: hero copy plus the card grid. Zero collections renders an
/// empty grid without error.
pub fn listing(collections: &[CollectionCard]) -> String {
    let mut cards = String::new();
    for c in collections {
        let image = match &c.preview_url {
            Some(url) => format!("<img src=\"{}\" alt=\"\">", escape(url)),
            None => String::new(),
        };
        cards.push_str(&format!(
            "<a href=\"/nft/{slug}\"><article class=\"card\">{image}\
<h2>{title}</h2><p>{description}</p><p class=\"name\">{name}</p></article></a>",
            slug = escape(&c.slug),
            title = escape(&c.title),
            description = escape(&c.description),
            name = escape(&c.name),
        ));
    }

    let body = format!(
        "<h1>The best <span class=\"accent\">NFTS</span> in one place</h1>\
<section><h1><span class=\"accent\">Explore</span> the collections:</h1>\
<div class=\"grid\">{cards}</div></section>"
    );
    layout("NFT Drop Gallery", &body)
}

/// Detail page: collection hero, supply line, the single mint button, plus
/// any pending toast and the success dialog.
pub fn detail(view: &DetailView) -> String {
    let image = match &view.image_url {
        Some(url) => format!("<img class=\"hero\" src=\"{}\" alt=\"\" width=\"400\">", escape(url)),
        None => String::new(),
    };

    let supply = match &view.page.ctx {
        Some(ctx) => format!(
            "<p class=\"supply\">{} / {} NFT's claimed</p>",
            ctx.claimed, ctx.total
        ),
        None => "<p class=\"supply\">Loading supply count ...</p>".to_string(),
    };

    let button = mint_button(&view.page.flow, &view.slug);

    let toast = match (&view.page.toast, view.page.flow.in_flight()) {
        (Some(t), _) => toast_html(t),
        (None, true) => "<div class=\"toast toast-progress\">Minting...</div>".to_string(),
        (None, false) => String::new(),
    };

    let dialog = if view.page.dialog_open {
        success_dialog(&view.name, &view.slug)
    } else {
        String::new()
    };

    let body = format!(
        "{image}<h1>{title}</h1>\
<p class=\"tagline\"><strong>THE</strong> {description}</p>\
<p>Discover, collect, and sell extraordinary NFTs and become an owner today. \
Connect your wallet to get started.</p>\
{supply}\
<div class=\"mint\">{button}\
<a href=\"/\"><button type=\"button\">Go Back</button></a></div>\
{toast}{dialog}",
        title = escape(&view.title),
        description = escape(&view.description),
    );
    layout(&view.title, &body)
}

fn mint_button(flow: &MintFlow, slug: &str) -> String {
    let button = flow.button();
    let disabled = if button.enabled { "" } else { " disabled" };
    let icon = match button.icon {
        ButtonIcon::Spinner => "&#10227;",
        ButtonIcon::Slash => "&#8856;",
        ButtonIcon::Camera => "&#128247;",
    };
    format!(
        "<form method=\"post\" action=\"/nft/{}/mint\">\
<button type=\"submit\"{disabled}><span class=\"icon\">{icon}</span> {}</button></form>",
        escape(slug),
        escape(&button.label),
    )
}

fn toast_html(toast: &Toast) -> String {
    let class = match toast.kind {
        ToastKind::Success => "toast-success",
        ToastKind::Error => "toast-error",
    };
    format!(
        "<div class=\"toast {class}\">{}</div>",
        escape(&toast.message)
    )
}

fn success_dialog(name: &str, slug: &str) -> String {
    format!(
        "<div class=\"dialog\"><div class=\"dialog-box\">\
<h3>Payment successful!</h3>\
<p>Your payment has been successfully submitted. Congratulations on your new \
<strong class=\"accent\">{}</strong>.</p>\
<form method=\"post\" action=\"/nft/{}/dialog/close\">\
<button type=\"submit\">Got it, thanks!</button></form>\
</div></div>",
        escape(name),
        escape(slug),
    )
}

/// Terminal 404 for an unknown collection slug.
pub fn not_found(slug: &str) -> String {
    let body = format!(
        "<h1>Collection not found</h1>\
<p>No collection matches <strong>{}</strong>.</p>\
<p><a href=\"/\">Back to the gallery</a></p>",
        escape(slug)
    );
    layout("Not found", &body)
}

/// Generic page-level error for upstream read failures.
pub fn error_page() -> String {
    let body = "<h1>Something went wrong</h1>\
<p>The gallery is temporarily unavailable. Please try again shortly.</p>\
<p><a href=\"/\">Back to the gallery</a></p>";
    layout("Error", body)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

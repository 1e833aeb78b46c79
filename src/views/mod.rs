//! Server-rendered HTML pages.
//!
//! Pages are plain strings assembled from small fragments. Every value that
//! did not come from a literal in this module goes through [`escape`].

pub mod auth_forms;
pub mod home;
pub mod tools;

use std::fmt::Write;

use crate::models::Identity;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Wrap page content in the site shell (head, header, footer).
pub fn layout(title: &str, identity: Option<&Identity>, content: &str) -> String {
    let mut page = String::with_capacity(content.len() + 4096);
    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | TCC Predictor</title>
<style>{STYLE}</style>
</head>
<body>
{header}
<main>
{content}
</main>
{footer}
</body>
</html>
"#,
        title = escape(title),
        header = header(identity),
        footer = FOOTER,
    );
    page
}

fn header(identity: Option<&Identity>) -> String {
    let account = match identity {
        Some(identity) => format!(
            r#"<span class="chip" data-uid="{uid}">{label}</span>
<form method="post" action="/logout" class="inline"><button type="submit" class="btn ghost">Sign Out</button></form>"#,
            uid = escape(&identity.uid),
            label = escape(identity.label()),
        ),
        None => r#"<a href="/login" class="btn ghost">Sign In</a>
<a href="/signup" class="btn">Sign Up</a>"#
            .to_string(),
    };

    format!(
        r#"<header class="site-header">
<a href="/" class="brand">TCC Predictor</a>
<nav>
<a href="/#about">About TCCs</a>
<a href="/#science">Science</a>
<a href="/#algorithms">Algorithms</a>
<a href="/tools">Try Tools</a>
</nav>
<div class="account">
{account}
</div>
</header>"#
    )
}

/// Inline error banner, or nothing.
pub fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(
            r#"<div class="error" role="alert">{}</div>"#,
            escape(message)
        ),
        None => String::new(),
    }
}

/// Bulleted list.
pub fn bullet_list(items: &[&str]) -> String {
    let mut list = String::from("<ul class=\"bullets\">");
    for item in items {
        let _ = write!(list, "<li>{}</li>", escape(item));
    }
    list.push_str("</ul>");
    list
}

const FOOTER: &str = r#"<footer class="site-footer">
<div class="footer-grid">
<div>
<p class="brand">TCC Predictor</p>
<p class="muted">AI-powered detection, tracking and cyclogenesis prediction of Tropical Cloud Clusters.</p>
</div>
<div>
<h4>Product</h4>
<a href="/tools?mode=single">Single Image Detection</a>
<a href="/tools?mode=multi">Multi-Image Tracking</a>
</div>
<div>
<h4>Learn</h4>
<a href="/#about">What are TCCs?</a>
<a href="/#science">Cyclogenesis Process</a>
<a href="/#algorithms">Our AI Algorithms</a>
</div>
<div>
<h4>Account</h4>
<a href="/login">Sign In</a>
<a href="/signup">Create Account</a>
</div>
</div>
<p class="muted small">Supports UN SDG 13: Climate Action.</p>
</footer>"#;

const STYLE: &str = r#"
:root{--bg:#0b1220;--panel:rgba(255,255,255,.05);--line:rgba(255,255,255,.1);--accent:#38bdf8;--accent-dark:#0ea5e9;--text:#e2e8f0;--muted:#94a3b8;--error:#fca5a5}
*{box-sizing:border-box}
body{margin:0;font-family:system-ui,sans-serif;background:var(--bg);color:var(--text);line-height:1.5}
a{color:inherit;text-decoration:none}
main{max-width:72rem;margin:0 auto;padding:6rem 1.5rem 3rem}
.site-header{position:fixed;top:0;left:0;right:0;display:flex;align-items:center;gap:2rem;padding:1rem 1.5rem;background:rgba(11,18,32,.9);border-bottom:1px solid var(--line);z-index:10}
.site-header nav{display:flex;gap:1.25rem;flex:1}
.site-header nav a:hover{color:var(--accent)}
.brand{font-weight:800;color:var(--accent)}
.account{display:flex;align-items:center;gap:.75rem}
.chip{padding:.25rem .75rem;border:1px solid var(--line);border-radius:999px;background:var(--panel)}
.inline{display:inline}
.btn{display:inline-block;padding:.6rem 1.2rem;border-radius:1rem;border:0;background:linear-gradient(90deg,var(--accent),var(--accent-dark));color:#0b1220;font-weight:600;cursor:pointer}
.btn.ghost{background:transparent;color:var(--text);border:1px solid var(--line)}
.btn:disabled{opacity:.5;cursor:not-allowed}
.badge{display:inline-block;padding:.4rem 1rem;border:1px solid var(--line);border-radius:999px;background:var(--panel);color:var(--accent);font-weight:600;font-size:.875rem}
.badge.warn{color:#fdba74;border-color:rgba(251,146,60,.3)}
.card{background:var(--panel);border:1px solid var(--line);border-radius:1.25rem;padding:1.5rem}
.grid{display:grid;gap:1.25rem;grid-template-columns:repeat(auto-fit,minmax(14rem,1fr))}
.center{text-align:center}
.muted{color:var(--muted)}
.small{font-size:.8rem}
.stat{font-size:1.6rem;font-weight:800;color:var(--accent)}
.bullets{padding-left:1.1rem;color:var(--muted)}
.error{margin:1rem auto;max-width:40rem;padding:1rem;border:1px solid rgba(239,68,68,.3);border-radius:.75rem;background:rgba(239,68,68,.1);color:var(--error)}
.error form{display:inline;margin-left:1rem}
.tabs{display:flex;gap:.5rem;max-width:36rem;margin:1.5rem auto;padding:.4rem;border:1px solid var(--line);border-radius:1rem}
.tabs a{flex:1;text-align:center;padding:.7rem;border-radius:.75rem}
.tabs a.active{background:linear-gradient(90deg,var(--accent),var(--accent-dark));color:#0b1220;font-weight:600}
.dropzone{margin-top:1.25rem;min-height:14rem;display:flex;flex-direction:column;align-items:center;justify-content:center;gap:.75rem;border:1px dashed var(--line);border-radius:1rem;text-align:center;padding:1rem}
.progress{width:100%;max-width:18rem;height:.5rem;border-radius:999px;background:var(--line)}
.progress div{height:100%;border-radius:999px;background:var(--accent)}
.ok{color:#86efac;font-weight:600}
.auth{max-width:28rem;margin:0 auto}
.auth label{display:block;margin:1rem 0 .4rem;color:var(--muted);font-size:.9rem}
.auth input{width:100%;padding:.75rem 1rem;border-radius:.75rem;border:1px solid var(--line);background:var(--panel);color:var(--text)}
.auth .btn{width:100%;margin-top:1.5rem}
.divider{margin:1.5rem 0;text-align:center;color:var(--muted);font-size:.875rem}
.site-footer{border-top:1px solid var(--line);padding:2rem 1.5rem;max-width:72rem;margin:0 auto}
.footer-grid{display:grid;gap:1.5rem;grid-template-columns:repeat(auto-fit,minmax(10rem,1fr))}
.footer-grid a{display:block;color:var(--muted);margin:.25rem 0}
section{margin:3rem 0}
"#;

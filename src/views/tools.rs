//! Tools page: mode tabs, upload card and results placeholder.

use std::fmt::Write;

use super::{escape, layout};
use crate::models::{AnalysisMode, Identity};
use crate::services::upload::validator::ALLOWED_TYPES;
use crate::services::upload::{UploadPhase, UploadState};

struct ToolCard {
    title: &'static str,
    description: &'static str,
    cta: &'static str,
}

fn card_for(mode: AnalysisMode) -> ToolCard {
    match mode {
        AnalysisMode::Single => ToolCard {
            title: "Upload Satellite Image",
            description: "Drag & drop or click to upload. Supports: PNG, JPG, TIFF",
            cta: "Detect TCC",
        },
        AnalysisMode::Multi => ToolCard {
            title: "Upload Image Sequence",
            description: "Upload multiple images for tracking: select 3-10 sequential satellite images",
            cta: "Track & Predict",
        },
    }
}

/// Render the tools page for `mode` with the browser's upload state.
pub fn render(identity: Option<&Identity>, mode: AnalysisMode, state: &UploadState) -> String {
    let card = card_for(mode);
    let mut body = String::with_capacity(8 * 1024);

    body.push_str(
        r#"<section class="center">
<span class="badge">Analysis Tools</span>
<h1>TCC Detection &amp; Tracking Tools</h1>
<p class="muted">Upload satellite imagery to detect TCCs and predict their evolution. Our AI models provide real-time analysis and cyclogenesis probability.</p>
</section>
<div class="tabs">"#,
    );
    for tab in [AnalysisMode::Single, AnalysisMode::Multi] {
        let _ = write!(
            body,
            r#"<a href="/tools?mode={}"{}>{}</a>"#,
            tab,
            if tab == mode { r#" class="active""# } else { "" },
            tab.title()
        );
    }
    body.push_str("</div>\n");

    if let Some(error) = state.error.as_deref() {
        let _ = write!(
            body,
            r#"<div class="error" role="alert">{}<form method="post" action="/tools/dismiss"><button type="submit" class="btn ghost">Dismiss</button></form></div>"#,
            escape(error)
        );
    }

    let _ = write!(
        body,
        r#"<div class="grid">
<div class="card">
<h3>{title}</h3>
<div class="dropzone" id="dropzone">
{zone}
</div>
<button class="btn" type="button" disabled>{cta}</button>
</div>
<div class="card">
<h3>Analysis Results</h3>
<div class="dropzone"><p class="muted">Upload an image and run analysis to see results</p></div>
</div>
</div>
"#,
        title = card.title,
        zone = drop_zone(identity, mode, state, card.description),
        cta = escape(card.cta),
    );

    if identity.is_some() {
        body.push_str(LIVE_UPDATES);
    }

    layout("Try Tools", identity, &body)
}

fn drop_zone(
    identity: Option<&Identity>,
    mode: AnalysisMode,
    state: &UploadState,
    description: &str,
) -> String {
    let mut zone = String::new();

    if identity.is_none() {
        zone.push_str(r#"<span class="badge warn">Sign in required</span>"#);
    }

    match state.phase {
        UploadPhase::Uploading => {
            let _ = write!(
                zone,
                r#"<p class="muted">Uploading images...</p>
<div class="progress"><div id="progress-bar" style="width:{pct}%"></div></div>
<p class="muted small" id="progress-label">{pct}%</p>"#,
                pct = state.progress.round()
            );
        }
        UploadPhase::Succeeded if !state.batch.is_empty() => {
            let count = state.batch.len();
            let _ = write!(
                zone,
                r#"<div class="progress"><div style="width:100%"></div></div>
<p class="ok">{} image{} uploaded successfully!</p>"#,
                count,
                if count > 1 { "s" } else { "" }
            );
            for name in &state.batch {
                let _ = write!(zone, r#"<p class="muted small">{}</p>"#, escape(name));
            }
        }
        _ if identity.is_none() => {
            let _ = write!(
                zone,
                r#"<p class="muted">{}</p>
<a href="/login" class="btn ghost">Click to sign in and upload</a>"#,
                escape(description)
            );
        }
        _ => {
            let _ = write!(
                zone,
                r#"<p class="muted">{description}</p>
<form method="post" action="/tools/upload" enctype="multipart/form-data">
<input type="hidden" name="mode" value="{mode}">
<input type="file" name="files" accept="{accept}" multiple>
<button type="submit" class="btn">Upload</button>
</form>"#,
                description = escape(description),
                mode = mode,
                accept = ALLOWED_TYPES.join(","),
            );
        }
    }

    zone
}

/// Follows the browser's upload events and reloads when the shown state goes stale.
const LIVE_UPDATES: &str = r#"<script>
(function () {
  var scheme = location.protocol === "https:" ? "wss://" : "ws://";
  var ws = new WebSocket(scheme + location.host + "/api/v1/ws");
  ws.onmessage = function (msg) {
    var event = JSON.parse(msg.data);
    if (event.type === "upload_progress") {
      var bar = document.getElementById("progress-bar");
      var label = document.getElementById("progress-label");
      if (!bar) { location.reload(); return; }
      bar.style.width = event.payload.progress + "%";
      label.textContent = Math.round(event.payload.progress) + "%";
    } else {
      location.reload();
    }
  };
})();
</script>
"#;

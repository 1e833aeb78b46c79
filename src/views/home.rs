//! Landing page.

use std::fmt::Write;

use super::{bullet_list, escape, layout};
use crate::models::Identity;

struct Stage {
    title: &'static str,
    detail: &'static str,
}

const STAGES: &[Stage] = &[
    Stage {
        title: "Tropical Cloud Cluster",
        detail: "Disorganized convection begins to cluster over warm ocean waters. No defined circulation center exists yet.",
    },
    Stage {
        title: "Tropical Disturbance",
        detail: "Convection becomes more organized with a weak low-pressure area forming. Wind speeds remain below 25 knots.",
    },
    Stage {
        title: "Tropical Depression",
        detail: "A closed circulation develops with sustained winds of 25-33 knots. The system receives an official designation.",
    },
    Stage {
        title: "Tropical Storm",
        detail: "Winds strengthen to 34-63 knots with a more defined structure. The storm receives a name.",
    },
    Stage {
        title: "Tropical Cyclone",
        detail: "Winds exceed 64 knots with a well-defined eye. The system becomes a hurricane/typhoon/cyclone depending on basin.",
    },
];

const STATS: &[(&str, &str)] = &[
    ("95%+", "Detection Accuracy"),
    ("72hr", "Prediction Window"),
    ("Real-time", "Processing Speed"),
    ("Global", "Coverage Area"),
];

const KEY_FACTORS: &[(&str, &str, &str)] = &[
    (
        "> 26.5°C",
        "Sea Surface Temperature",
        "Warm ocean waters provide the energy source through evaporation and latent heat release.",
    ),
    (
        "< 10 m/s",
        "Vertical Wind Shear",
        "Low wind shear allows the storm structure to remain vertically aligned and strengthen.",
    ),
    (
        "> 5° latitude",
        "Coriolis Effect",
        "Sufficient distance from the equator provides the rotation needed for cyclonic development.",
    ),
];

const ABOUT: &[(&str, &str)] = &[
    (
        "Definition",
        "Tropical Cloud Clusters (TCCs) are organized systems of convective clouds that form over warm tropical oceans. They appear as clusters of thunderstorms on satellite imagery, typically spanning 100–600 km in diameter, and represent the earliest identifiable stage of potential tropical cyclone development.",
    ),
    (
        "Formation Conditions",
        "TCCs form when sea surface temperatures exceed 26.5°C, combined with low vertical wind shear, sufficient Coriolis force (typically 5° or more from the equator), and atmospheric instability. These conditions allow deep convection to organize and potentially intensify.",
    ),
    (
        "Why They Matter",
        "While only 10–20% of TCCs develop into tropical cyclones, identifying which ones will intensify is crucial for early warning systems. Early detection can provide 3–5 additional days of preparation time for coastal communities.",
    ),
];

const ALGORITHMS: &[(&str, &[&str])] = &[
    (
        "Convolutional Neural Networks (CNN)",
        &[
            "Multi-scale feature extraction",
            "Spatial pattern recognition",
            "Real-time inference capability",
        ],
    ),
    (
        "Recurrent Neural Networks (LSTM)",
        &[
            "Temporal pattern learning",
            "Trajectory prediction",
            "72-hour forecasting",
        ],
    ),
    (
        "U-Net Segmentation",
        &[
            "Pixel-level classification",
            "Boundary detection",
            "Area quantification",
        ],
    ),
    (
        "Ensemble Methods",
        &[
            "Multi-model fusion",
            "Confidence scoring",
            "Uncertainty quantification",
        ],
    ),
];

struct Process {
    subtitle: &'static str,
    title: &'static str,
    steps: &'static [&'static str],
    footer: &'static str,
}

const PROCESSES: &[Process] = &[
    Process {
        subtitle: "Simple steps",
        title: "How TCC Detection Works",
        steps: &[
            "Extract IRBT",
            "Apply temperature threshold (Tb ≤ 240K)",
            "Cluster cold pixels with DBSCAN",
            "Use U-Net segmentation",
            "Filter valid TCCs by area and radius",
        ],
        footer: "Supports UN SDG 13: Climate Action using INSAT-3D Infrared Brightness Temperature (IRBT) data.",
    },
    Process {
        subtitle: "Follow the movement",
        title: "How TCC Tracking Works",
        steps: &[
            "Compare sequential satellite images",
            "Centroid matching of detected clusters",
            "Assess shape similarity across frames",
            "Assign unique Track IDs and paths",
        ],
        footer: "Multiple satellite images are compared to follow cluster movement.",
    },
    Process {
        subtitle: "Forecast the future",
        title: "Cyclogenesis Prediction",
        steps: &[
            "Track cooling rate, area growth, and intensity over time",
            "Extract temporal features for each cluster",
            "Predict cyclone probability with LSTM / ConvLSTM",
        ],
        footer: "An LSTM / ConvLSTM model predicts cyclone formation probability.",
    },
];

/// Render the landing page.
pub fn render(identity: Option<&Identity>) -> String {
    let mut body = String::with_capacity(12 * 1024);

    body.push_str(
        r##"<section class="hero">
<span class="badge">AI-Powered Weather Intelligence</span>
<h1>Tropical Cloud Cluster<br>Detection &amp; Prediction</h1>
<p>Advanced artificial intelligence for detecting, tracking, and predicting the evolution of Tropical Cloud Clusters into tropical cyclones. Empowering meteorologists with cutting-edge deep learning technology.</p>
<p><a href="/tools" class="btn">Try Detection Tools →</a> <a href="#about" class="btn ghost">Learn More</a></p>
<div class="grid">"##,
    );
    for (value, label) in STATS {
        let _ = write!(
            body,
            r#"<div class="card center"><p class="stat">{}</p><p class="muted">{}</p></div>"#,
            escape(value),
            escape(label)
        );
    }
    body.push_str("</div>\n</section>\n");

    body.push_str(
        r#"<section id="about">
<div class="center"><span class="badge">Understanding TCCs</span>
<h2>What are Tropical Cloud Clusters?</h2>
<p class="muted">Tropical Cloud Clusters are the precursors to some of Earth&#39;s most powerful weather systems.</p></div>
<div class="grid">"#,
    );
    for (title, text) in ABOUT {
        let _ = write!(
            body,
            r#"<div class="card"><h3>{}</h3><p class="muted">{}</p></div>"#,
            escape(title),
            escape(text)
        );
    }
    body.push_str("</div>\n</section>\n");

    body.push_str(
        r#"<section id="science">
<div class="center"><span class="badge">Cyclogenesis Process</span>
<h2>From Cloud Cluster to Cyclone</h2>
<p class="muted">Understanding the evolution process is key to accurate prediction. Here&#39;s how a TCC transforms into a powerful tropical cyclone.</p></div>
<div class="grid">"#,
    );
    for (idx, stage) in STAGES.iter().enumerate() {
        let _ = write!(
            body,
            r#"<div class="card"><p class="badge">Stage {}</p><h3>{}</h3><p class="muted">{}</p></div>"#,
            idx + 1,
            escape(stage.title),
            escape(stage.detail)
        );
    }
    body.push_str("</div>\n<div class=\"grid\">");
    for (value, label, detail) in KEY_FACTORS {
        let _ = write!(
            body,
            r#"<div class="card center"><p class="stat">{}</p><h4>{}</h4><p class="muted">{}</p></div>"#,
            escape(value),
            escape(label),
            escape(detail)
        );
    }
    body.push_str("</div>\n</section>\n");

    body.push_str(
        r#"<section id="algorithms">
<div class="center"><span class="badge">AI Technology</span>
<h2>Our AI Algorithms</h2>
<p class="muted">State-of-the-art deep learning models trained on decades of satellite data to detect and predict tropical cyclone development.</p></div>
<div class="grid">"#,
    );
    for (title, bullets) in ALGORITHMS {
        let _ = write!(
            body,
            r#"<div class="card"><h3>{}</h3>{}</div>"#,
            escape(title),
            bullet_list(bullets)
        );
    }
    body.push_str("</div>\n</section>\n<section class=\"grid\">");

    for process in PROCESSES {
        let _ = write!(
            body,
            r#"<div class="card"><p class="badge">{}</p><h3>{}</h3>{}<p class="muted small">{}</p></div>"#,
            escape(process.subtitle),
            escape(process.title),
            bullet_list(process.steps),
            escape(process.footer)
        );
    }
    body.push_str("</section>\n");

    layout("Tropical Cloud Cluster Detection", identity, &body)
}

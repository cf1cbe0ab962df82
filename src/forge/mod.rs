//! The built-in HTML → PDF engine.
//!
//! The pipeline stages are:
//!
//! 1. **Parse** – HTML string → DOM tree ([`dom`])
//! 2. **Style** – apply the document stylesheet and inline styles ([`style`])
//! 3. **Layout** – compute flexbox layout with Taffy ([`layout`])
//! 4. **Paginate** – split into pages and place text lines ([`pagination`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! Directional runs are ordered by [`bidi`] and shaped by [`fonts`].

pub mod bidi;
pub mod dom;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod style;

pub use fonts::FontManager;
pub use layout_config::LayoutConfig;
pub use pipeline::{compute_layout_config, generate_pdf, PipelineConfig};

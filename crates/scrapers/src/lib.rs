//! Tracker site clients for shelfsync
//!
//! Each supported reading tracker implements [`PlatformClient`], turning a
//! configuration snapshot into a [`shelfsync_core::BookSet`]. Parsing is kept
//! in plain functions over HTML strings so it can be exercised without a
//! network.

mod error;
mod goodreads;
mod registry;
mod render;
mod selectors;
mod storygraph;
mod text;
mod traits;

pub use error::{ScrapeError, ScrapeResult};
pub use goodreads::{parse_goodreads_html, GoodreadsClient};
pub use registry::PlatformClients;
pub use render::{PageRenderer, RenderRequest, RenderedPage, SessionCookie, WebDriverRenderer};
pub use storygraph::{is_login_page, parse_storygraph_html, StoryGraphClient};
pub use traits::PlatformClient;

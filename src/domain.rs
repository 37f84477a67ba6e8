//! Domain module - catalog entities and page addressing rules
//!
//! Everything here is pure: no browser, no I/O.
//! - `product`: the scraped `ProductCard` row
//! - `pagination`: page URL construction per site policy
//! - `site`: supported marketplaces and their fixed identities

pub mod pagination;
pub mod product;
pub mod site;

pub use pagination::{FirstPagePolicy, build_page_url};
pub use product::ProductCard;
pub use site::Site;

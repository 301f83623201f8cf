//! Route resolution
//!
//! Storefront-style paths (`/products?category=c-1`, `/payment?orderId=...`)
//! are accepted as deep links via `--route` and the `:open` command and
//! resolved to a view before any data is fetched. Guards run here: a payment
//! route without an order id redirects to the cart instead of fetching.

use crate::resource::registry::get_resource;
use std::collections::HashMap;

/// Variant of the terms-and-conditions page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermsKind {
    #[default]
    General,
    Privacy,
    Returns,
    Vendor,
}

impl TermsKind {
    /// Parse the `type` query parameter. Unknown or missing values fall
    /// back to the general terms.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::to_uppercase).as_deref() {
            Some("PRIVACY") => Self::Privacy,
            Some("RETURNS") => Self::Returns,
            Some("VENDOR") => Self::Vendor,
            _ => Self::General,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Privacy => "PRIVACY",
            Self::Returns => "RETURNS",
            Self::Vendor => "VENDOR",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::General => "Terms & Conditions",
            Self::Privacy => "Privacy Policy",
            Self::Returns => "Return Policy",
            Self::Vendor => "Vendor Agreement",
        }
    }
}

/// A resolved view target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Products { category: Option<String> },
    ProductDetail { id: String },
    Cart,
    Payment { order_id: String },
    Terms { kind: TermsKind },
    /// Admin table view for a registry resource, e.g. `/admin/vendors`
    Resource { key: String },
}

/// Result of resolving a path: either a route to show or a redirect that
/// must be followed before anything is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Show(Route),
    Redirect(String),
}

/// Resolve a path string to a route. Unknown paths redirect home.
pub fn resolve(path: &str) -> RouteOutcome {
    let (path, query) = split_query(path);
    let params = parse_query(query);
    let segments: Vec<&str> = path.trim_matches('/').split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => RouteOutcome::Show(Route::Home),
        ["products"] => RouteOutcome::Show(Route::Products {
            category: params.get("category").cloned(),
        }),
        ["products", id] => RouteOutcome::Show(Route::ProductDetail {
            id: (*id).to_string(),
        }),
        ["cart"] => RouteOutcome::Show(Route::Cart),
        ["payment"] => match params.get("orderId") {
            Some(order_id) if !order_id.is_empty() => RouteOutcome::Show(Route::Payment {
                order_id: order_id.clone(),
            }),
            // No order to pay for; back to the cart, nothing fetched.
            _ => RouteOutcome::Redirect("/cart".to_string()),
        },
        ["terms"] => RouteOutcome::Show(Route::Terms {
            kind: TermsKind::from_param(params.get("type").map(String::as_str)),
        }),
        ["admin", resource] if get_resource(resource).is_some() => {
            RouteOutcome::Show(Route::Resource {
                key: (*resource).to_string(),
            })
        }
        _ => RouteOutcome::Redirect("/".to_string()),
    }
}

fn split_query(path: &str) -> (&str, &str) {
    match path.split_once('?') {
        Some((p, q)) => (p, q),
        None => (path, ""),
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_without_order_redirects_to_cart() {
        assert_eq!(
            resolve("/payment"),
            RouteOutcome::Redirect("/cart".to_string())
        );
        assert_eq!(
            resolve("/payment?orderId="),
            RouteOutcome::Redirect("/cart".to_string())
        );
    }

    #[test]
    fn test_payment_with_order_shows_payment() {
        assert_eq!(
            resolve("/payment?orderId=ord-42"),
            RouteOutcome::Show(Route::Payment {
                order_id: "ord-42".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_terms_kind_falls_back_to_general() {
        assert_eq!(TermsKind::from_param(Some("UNKNOWN_TYPE")), TermsKind::General);
        assert_eq!(TermsKind::from_param(None), TermsKind::General);
        assert_eq!(TermsKind::from_param(Some("privacy")), TermsKind::Privacy);
        assert_eq!(
            resolve("/terms?type=BOGUS"),
            RouteOutcome::Show(Route::Terms {
                kind: TermsKind::General
            })
        );
    }

    #[test]
    fn test_products_with_category_filter() {
        assert_eq!(
            resolve("/products?category=c-7"),
            RouteOutcome::Show(Route::Products {
                category: Some("c-7".to_string())
            })
        );
        assert_eq!(
            resolve("/products"),
            RouteOutcome::Show(Route::Products { category: None })
        );
    }

    #[test]
    fn test_product_detail() {
        assert_eq!(
            resolve("/products/p-9"),
            RouteOutcome::Show(Route::ProductDetail {
                id: "p-9".to_string()
            })
        );
    }

    #[test]
    fn test_admin_resource_routes() {
        assert_eq!(
            resolve("/admin/vendors"),
            RouteOutcome::Show(Route::Resource {
                key: "vendors".to_string()
            })
        );
        assert_eq!(
            resolve("/admin/nonexistent"),
            RouteOutcome::Redirect("/".to_string())
        );
    }

    #[test]
    fn test_unknown_path_redirects_home() {
        assert_eq!(resolve("/bogus/deep/path"), RouteOutcome::Redirect("/".to_string()));
        assert_eq!(resolve("/"), RouteOutcome::Show(Route::Home));
        assert_eq!(resolve(""), RouteOutcome::Show(Route::Home));
    }
}

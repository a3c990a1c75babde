// src/insight/prompt.rs — Prompt templates and the canned fallback responses

use minijinja::{context, Environment};

use super::AnalysisRequest;

const SYSTEM_TEMPLATE: &str = "\
You are a conversion-rate optimization consultant reviewing a live website.

Website: {{ website_url }}
Page under review: {{ current_page }}
Product type: {{ product_type }}

Answer the visitor's question about this page. Be specific to the page and \
product type. Finish with 3-4 concrete, actionable recommendations, each on \
its own line starting with \"- \". Keep the whole answer under 250 words.";

const USER_TEMPLATE: &str = "{{ question }}";

/// Render the system prompt for an analysis request.
pub fn system_prompt(req: &AnalysisRequest) -> Result<String, minijinja::Error> {
    Environment::new().render_str(
        SYSTEM_TEMPLATE,
        context! {
            website_url => req.website_url,
            current_page => req.current_page,
            product_type => req.product_type,
        },
    )
}

pub fn user_prompt(req: &AnalysisRequest) -> Result<String, minijinja::Error> {
    Environment::new().render_str(USER_TEMPLATE, context! { question => req.user_question })
}

// ─── Fallback ───────────────────────────────────────────────────────────────

/// Which canned response applies, picked from the page name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Pricing,
    Product,
    Home,
    Generic,
}

impl PageKind {
    /// Case-insensitive substring match, checked in this order.
    pub fn classify(current_page: &str) -> Self {
        let page = current_page.to_lowercase();
        if page.contains("pricing") {
            Self::Pricing
        } else if page.contains("product") {
            Self::Product
        } else if page.contains("home") {
            Self::Home
        } else {
            Self::Generic
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Pricing => "pricing",
            Self::Product => "product",
            Self::Home => "home",
            Self::Generic => "generic",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Self::Pricing => PRICING_RESPONSE,
            Self::Product => PRODUCT_RESPONSE,
            Self::Home => HOME_RESPONSE,
            Self::Generic => GENERIC_RESPONSE,
        }
    }
}

const PRICING_RESPONSE: &str = "\
Pricing pages convert when the choice feels easy and low-risk. Based on common patterns for this page type:

- Highlight one recommended plan so visitors are not left comparing every tier
- Show annual savings next to the monthly price to anchor the value
- Place a short FAQ about billing, cancellation and refunds below the plans
- Add a trust signal such as a money-back guarantee near each purchase button";

const PRODUCT_RESPONSE: &str = "\
Product pages need to answer \"what does this do for me\" within a few seconds. Based on common patterns for this page type:

- Lead with the main outcome the product delivers, not its feature list
- Add a short demo video or annotated screenshot above the fold
- Group features into benefit-oriented sections with scannable headings
- Repeat the primary call-to-action after each major section";

const HOME_RESPONSE: &str = "\
Home pages carry the first impression and route visitors onward. Based on common patterns for this page type:

- State who the product is for and the problem it solves in the headline
- Keep a single primary call-to-action visible without scrolling
- Show recognizable customer logos or a headline metric as social proof
- Simplify the navigation so key pages are reachable in one click";

const GENERIC_RESPONSE: &str = "\
Here are improvements that apply to most marketing pages:

- Make the page headline describe a concrete benefit for the visitor
- Ensure every section ends with a clear next step or call-to-action
- Cut page weight by compressing images and lazy-loading below-the-fold media
- Add testimonials or case studies close to decision points";

/// Context sentences keyed by `(product_type, page)`.
const CONTEXT_TABLE: &[((&str, &str), &str)] = &[
    (("saas", "pricing"), "For SaaS products, a free trial or freemium tier on the pricing page typically lifts signups more than discounts do."),
    (("saas", "home"), "For SaaS products, visitors on the home page usually look for integrations and security credentials before signing up."),
    (("saas", "product"), "For SaaS products, interactive tours tend to outperform static feature grids on product pages."),
    (("ecommerce", "pricing"), "For e-commerce, free-shipping thresholds shown alongside prices reduce cart abandonment."),
    (("ecommerce", "product"), "For e-commerce, high-quality images, reviews and stock indicators near the buy button drive conversions."),
    (("ecommerce", "home"), "For e-commerce, featuring best sellers and current promotions on the home page shortens the path to purchase."),
    (("agency", "home"), "For agencies, portfolio highlights and a clear services summary on the home page build credibility quickly."),
    (("agency", "pricing"), "For agencies, package-based pricing with a custom-quote option reduces friction for larger clients."),
];

const DEFAULT_CONTEXT: &str =
    "These recommendations are based on general conversion best practices; connect a model provider for page-specific analysis.";

/// Context sentence for a product type and page kind, or the generic default.
pub fn context_sentence(product_type: &str, page: PageKind) -> &'static str {
    let product = product_type.trim().to_lowercase();
    CONTEXT_TABLE
        .iter()
        .find(|((p, k), _)| *p == product && *k == page.key())
        .map(|(_, sentence)| *sentence)
        .unwrap_or(DEFAULT_CONTEXT)
}

/// Deterministic response used whenever the model call fails.
pub fn fallback_response(current_page: &str, product_type: &str) -> String {
    let page = PageKind::classify(current_page);
    format!(
        "{}\n\n{}",
        page.template(),
        context_sentence(product_type, page)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            website_url: "https://example.com".into(),
            current_page: "Pricing".into(),
            product_type: "saas".into(),
            user_question: "Why don't visitors upgrade?".into(),
        }
    }

    #[test]
    fn test_system_prompt_includes_inputs() {
        let prompt = system_prompt(&request()).unwrap();
        assert!(prompt.contains("Website: https://example.com"));
        assert!(prompt.contains("Page under review: Pricing"));
        assert!(prompt.contains("Product type: saas"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_user_prompt_is_question() {
        assert_eq!(user_prompt(&request()).unwrap(), "Why don't visitors upgrade?");
    }

    #[test]
    fn test_classify_page() {
        assert_eq!(PageKind::classify("Pricing Page"), PageKind::Pricing);
        assert_eq!(PageKind::classify("/PRODUCTS/widget"), PageKind::Product);
        assert_eq!(PageKind::classify("homepage"), PageKind::Home);
        assert_eq!(PageKind::classify("/blog/post-1"), PageKind::Generic);
        // pricing wins over product when both appear
        assert_eq!(PageKind::classify("product-pricing"), PageKind::Pricing);
    }

    #[test]
    fn test_context_lookup() {
        assert!(context_sentence("SaaS", PageKind::Pricing).starts_with("For SaaS"));
        assert_eq!(context_sentence("saas", PageKind::Generic), DEFAULT_CONTEXT);
        assert_eq!(context_sentence("nonprofit", PageKind::Home), DEFAULT_CONTEXT);
    }

    #[test]
    fn test_fallback_response_is_deterministic() {
        let a = fallback_response("pricing", "ecommerce");
        let b = fallback_response("pricing", "ecommerce");
        assert_eq!(a, b);
        assert!(a.starts_with(PRICING_RESPONSE));
        assert!(a.ends_with("reduce cart abandonment."));
    }
}
